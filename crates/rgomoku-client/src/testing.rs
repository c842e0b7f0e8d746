//! In-memory engine doubles.
//!
//! [`pipe`] is a closable byte pipe. [`scripted_engine`] builds on it: the write
//! half records every command line and feeds it to a responder closure whose
//! replies appear on the read half, so an [`EngineSession`] can be driven
//! without spawning a process.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::config::SessionOptions;
use crate::line_source::LineSource;
use crate::session::EngineSession;

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read half of [`pipe`]. Returns EOF once the writer has been closed and drained.
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Write half of [`pipe`]. Clones write into the same pipe.
#[derive(Clone)]
pub struct PipeWriter {
    tx: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
}

impl PipeWriter {
    /// Write `line` followed by a newline.
    pub fn send_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        if let Some(tx) = lock_or_recover(&self.tx).as_ref() {
            let _ = tx.send(bytes);
        }
    }

    /// Close the pipe. The reader sees EOF after the queued bytes.
    pub fn close(&self) {
        lock_or_recover(&self.tx).take();
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match lock_or_recover(&self.tx).as_ref() {
            Some(tx) if !buf.is_empty() => tx
                .send(buf.to_vec())
                .map(|()| buf.len())
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe)),
            Some(_) => Ok(0),
            None => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = unbounded();
    (
        PipeWriter {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        PipeReader {
            rx,
            pending: Vec::new(),
            pos: 0,
        },
    )
}

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

/// Engine stdin stand-in: records command lines and answers through the responder.
pub struct ScriptedInput {
    buf: Vec<u8>,
    responder: Responder,
    output: PipeWriter,
    log: Arc<Mutex<Vec<String>>>,
}

impl Write for ScriptedInput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
            let replies = (self.responder)(&line);
            lock_or_recover(&self.log).push(line);
            for reply in replies {
                self.output.send_line(&reply);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Test-side view of a scripted engine.
#[derive(Clone)]
pub struct ScriptHandle {
    log: Arc<Mutex<Vec<String>>>,
    output: PipeWriter,
}

impl ScriptHandle {
    /// Every command line received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        lock_or_recover(&self.log).clone()
    }

    /// Emit an unsolicited output line.
    pub fn emit(&self, line: &str) {
        self.output.send_line(line);
    }

    /// Simulate the engine exiting.
    pub fn close(&self) {
        self.output.close();
    }
}

/// Build a scripted engine. `responder` receives each command line and returns the
/// lines the engine prints in reply.
pub fn scripted_engine<F>(responder: F) -> (ScriptedInput, PipeReader, ScriptHandle)
where
    F: FnMut(&str) -> Vec<String> + Send + 'static,
{
    let (output, reader) = pipe();
    let log = Arc::new(Mutex::new(Vec::new()));
    let input = ScriptedInput {
        buf: Vec::new(),
        responder: Box::new(responder),
        output: output.clone(),
        log: Arc::clone(&log),
    };
    (input, reader, ScriptHandle { log, output })
}

/// An [`EngineSession`] wired to a scripted engine.
pub fn scripted_session<F>(
    responder: F,
    options: SessionOptions,
) -> io::Result<(EngineSession<ScriptedInput>, ScriptHandle)>
where
    F: FnMut(&str) -> Vec<String> + Send + 'static,
{
    let (input, reader, handle) = scripted_engine(responder);
    let lines = LineSource::spawn(reader, "scripted")?;
    Ok((EngineSession::new(input, lines, options), handle))
}

/// Session options with a short poll window, for tests.
pub fn fast_options() -> SessionOptions {
    SessionOptions {
        poll_interval_ms: 50,
        response_timeout_ms: 2_000,
        ..SessionOptions::default()
    }
}

/// Convert a list of string literals into owned reply lines.
pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
