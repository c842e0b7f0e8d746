//! Non-blocking line reader over an engine output stream.
//!
//! A dedicated thread performs the blocking reads and pushes every non-empty line
//! onto an unbounded channel. Consumers only ever wait for a bounded time through
//! [`LineSource::poll`].

use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

/// Default wait window of a single poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    Line(String),
    /// Nothing arrived within the wait window
    Idle,
    /// The reader has stopped and every queued line has been consumed
    Closed,
}

/// Handle on the queue filled by the reader thread.
///
/// Cloning the handle does not start another reader; clones share the queue.
#[derive(Clone)]
pub struct LineSource {
    rx: Receiver<String>,
    label: Arc<str>,
}

impl LineSource {
    /// Start the reader thread for `stream`.
    pub fn spawn<R>(stream: R, label: &str) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = unbounded::<String>();
        let thread_label = label.to_string();
        thread::Builder::new()
            .name(format!("{label}-reader"))
            .spawn(move || read_lines(stream, &tx, &thread_label))?;
        Ok(Self {
            rx,
            label: Arc::from(label),
        })
    }

    /// Wait at most `timeout` for the next line.
    pub fn poll(&self, timeout: Duration) -> Polled {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => Polled::Line(line),
            Err(RecvTimeoutError::Timeout) => Polled::Idle,
            Err(RecvTimeoutError::Disconnected) => Polled::Closed,
        }
    }

    /// Take an already queued line without waiting.
    pub fn try_next(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn read_lines<R: Read>(stream: R, tx: &Sender<String>, label: &str) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                log::debug!("{label}: output stream closed");
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\r', '\n']);
                if line.trim().is_empty() {
                    continue;
                }
                log::debug!("{label} -> {line}");
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("{label}: read error, reader exiting: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pipe;
    use std::io::{Cursor, Write};

    const WAIT: Duration = Duration::from_millis(500);

    #[test]
    fn drains_lines_in_order_then_reports_closed() {
        let input = b"OK\r\n\nMESSAGE depth 1\n   \n7,7\nno trailing newline".to_vec();
        let source = LineSource::spawn(Cursor::new(input), "test").unwrap();

        let mut lines = Vec::new();
        loop {
            match source.poll(WAIT) {
                Polled::Line(line) => lines.push(line),
                Polled::Idle => continue,
                Polled::Closed => break,
            }
        }
        assert_eq!(lines, vec!["OK", "MESSAGE depth 1", "7,7", "no trailing newline"]);
        assert_eq!(source.poll(Duration::from_millis(10)), Polled::Closed);
    }

    #[test]
    fn idle_is_distinct_from_closed() {
        let (mut writer, reader) = pipe();
        let source = LineSource::spawn(reader, "test").unwrap();

        assert_eq!(source.poll(Duration::from_millis(20)), Polled::Idle);
        writer.write_all(b"OK\n").unwrap();
        assert_eq!(source.poll(WAIT), Polled::Line("OK".to_string()));
        assert_eq!(source.poll(Duration::from_millis(20)), Polled::Idle);

        writer.close();
        assert_eq!(source.poll(WAIT), Polled::Closed);
    }

    #[test]
    fn preserves_order_under_irregular_polling() {
        let (mut writer, reader) = pipe();
        let source = LineSource::spawn(reader, "test").unwrap();
        let producer = thread::spawn(move || {
            for i in 0..200 {
                // 行の途中で分割して書き込む
                writer.write_all(format!("line {i}").as_bytes()).unwrap();
                if i % 7 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
                writer.write_all(b"\n").unwrap();
            }
            writer.close();
        });

        let mut received = Vec::new();
        let mut timeouts = [0u64, 1, 5].iter().cycle();
        loop {
            let timeout = Duration::from_millis(*timeouts.next().unwrap());
            match source.poll(timeout) {
                Polled::Line(line) => received.push(line),
                Polled::Idle => {}
                Polled::Closed => break,
            }
        }
        producer.join().unwrap();

        let expected: Vec<String> = (0..200).map(|i| format!("line {i}")).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn clones_share_one_queue() {
        let source = LineSource::spawn(Cursor::new(b"a\nb\n".to_vec()), "test").unwrap();
        let other = source.clone();
        assert_eq!(source.poll(WAIT), Polled::Line("a".to_string()));
        assert_eq!(other.poll(WAIT), Polled::Line("b".to_string()));
        assert_eq!(other.label(), "test");
    }
}
