//! Interactive (non-blocking) analysis.
//!
//! A worker thread polls the engine output and reports every relevant line as an
//! [`AnalysisEvent`] over a channel. The foreground keeps its own view of the
//! analysis (the lock flag and the last diagnostic) and only updates it from those
//! events. Cancellation is cooperative: `STOP` goes to the engine and an atomic
//! flag tells the worker to finish once the engine has gone quiet, or after the
//! response timeout if it never does.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::{SessionError, SessionResult};
use crate::line_source::{LineSource, Polled};
use crate::protocol::{BestMove, DiagnosticInfo, ResponseLine};
use crate::session::{EngineSession, NO_ARGS};

/// Observer invoked from the worker thread for every event, before the event is
/// queued for the foreground.
pub type EventMonitor = Arc<dyn Fn(&AnalysisEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    Diagnostic(DiagnosticInfo),
    /// The engine's final answer
    Result(String),
    /// The engine output stream ended
    Closed,
}

/// Progress of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Nothing received yet
    NotStarted,
    /// At least one diagnostic received, no result yet
    Pending,
    /// Result received
    Done,
}

/// Foreground view of the analysis in flight.
#[derive(Debug)]
struct SessionLock {
    active: bool,
    state: AnalysisState,
    last_message: Option<DiagnosticInfo>,
    result: Option<String>,
    closed: bool,
}

impl SessionLock {
    fn engaged() -> Self {
        Self {
            active: true,
            state: AnalysisState::NotStarted,
            last_message: None,
            result: None,
            closed: false,
        }
    }

    fn apply(&mut self, event: AnalysisEvent) {
        match event {
            AnalysisEvent::Diagnostic(info) => {
                if self.state == AnalysisState::NotStarted {
                    self.state = AnalysisState::Pending;
                }
                self.last_message = Some(info);
            }
            AnalysisEvent::Result(text) => {
                self.state = AnalysisState::Done;
                self.result = Some(text);
                self.active = false;
            }
            AnalysisEvent::Closed => {
                self.closed = true;
                self.active = false;
            }
        }
    }
}

/// Handle on a running interactive analysis.
///
/// Holds the session exclusively, so no other command can be written to the engine
/// until the handle is dropped. Dropping an unfinished analysis stops it.
pub struct Analysis<'s, W: Write> {
    session: &'s mut EngineSession<W>,
    worker: Option<JoinHandle<AnalysisState>>,
    events: Receiver<AnalysisEvent>,
    stop: Arc<AtomicBool>,
    lock: SessionLock,
}

impl<'s, W: Write> Analysis<'s, W> {
    pub(crate) fn start(
        session: &'s mut EngineSession<W>,
        monitor: Option<EventMonitor>,
    ) -> SessionResult<Self> {
        let (tx, events) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let lines = session.lines().clone();
        let poll_interval = session.options().poll_interval();
        let stop_grace = session.options().response_timeout();
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name(format!("{}-analysis", lines.label()))
            .spawn(move || {
                run_worker(
                    &lines,
                    &worker_stop,
                    &tx,
                    monitor.as_ref(),
                    poll_interval,
                    stop_grace,
                )
            })?;
        log::debug!("analysis started");
        Ok(Self {
            session,
            worker: Some(worker),
            events,
            stop,
            lock: SessionLock::engaged(),
        })
    }

    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.lock.apply(event);
        }
    }

    /// True while the engine is still thinking and the analysis has not been stopped.
    pub fn is_active(&mut self) -> bool {
        self.pump();
        self.lock.active
    }

    /// Latest diagnostic, cleared by [`stop`](Self::stop).
    pub fn last_message(&mut self) -> Option<&DiagnosticInfo> {
        self.pump();
        self.lock.last_message.as_ref()
    }

    pub fn state(&mut self) -> AnalysisState {
        self.pump();
        self.lock.state
    }

    /// The engine's answer, once it has arrived.
    pub fn result(&mut self) -> Option<&str> {
        self.pump();
        self.lock.result.as_deref()
    }

    /// Stop the analysis and wait for the worker to finish.
    ///
    /// Sends `STOP` if the engine is still thinking. On return the lock and the last
    /// message are cleared; whatever the engine answered to `STOP` is available from
    /// [`result`](Self::result).
    pub fn stop(&mut self) -> SessionResult<AnalysisState> {
        let sent = if self.is_active() {
            self.session.send("stop", NO_ARGS)
        } else {
            Ok(())
        };
        self.stop.store(true, Ordering::Release);
        let state = self.join();
        self.lock.active = false;
        self.lock.last_message = None;
        log::debug!("analysis stopped in state {state:?}");
        sent.map(|()| state)
    }

    /// Block until the engine answers, then return its move.
    pub fn wait(&mut self) -> SessionResult<BestMove> {
        while self.lock.result.is_none() && !self.lock.closed {
            match self.events.recv() {
                Ok(event) => self.lock.apply(event),
                Err(_) => break,
            }
        }
        self.join();
        match self.lock.result.as_deref() {
            Some(text) => BestMove::parse(text, self.session.board_size()),
            None => Err(SessionError::EngineClosed),
        }
    }

    fn join(&mut self) -> AnalysisState {
        let Some(worker) = self.worker.take() else {
            return self.lock.state;
        };
        let state = worker.join().unwrap_or_else(|_| {
            log::error!("analysis worker panicked");
            AnalysisState::Done
        });
        self.pump();
        state
    }
}

impl<W: Write> Drop for Analysis<'_, W> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                log::warn!("failed to stop analysis: {e}");
            }
        }
    }
}

fn run_worker(
    lines: &LineSource,
    stop: &AtomicBool,
    tx: &Sender<AnalysisEvent>,
    monitor: Option<&EventMonitor>,
    poll_interval: Duration,
    stop_grace: Duration,
) -> AnalysisState {
    let emit = |event: AnalysisEvent| {
        if let Some(monitor) = monitor {
            monitor(&event);
        }
        let _ = tx.send(event);
    };

    let mut state = AnalysisState::NotStarted;
    let mut stop_seen: Option<Instant> = None;
    loop {
        if stop_seen.is_none() && stop.load(Ordering::Acquire) {
            stop_seen = Some(Instant::now());
        }
        // STOP を無視して出力し続けるエンジンでも停止は猶予時間内に終わる
        if stop_seen.is_some_and(|at| at.elapsed() >= stop_grace) {
            log::warn!("{}: engine kept talking after STOP, giving up", lines.label());
            return state;
        }
        match lines.poll(poll_interval) {
            Polled::Line(line) => match ResponseLine::classify(&line) {
                Some(ResponseLine::Diagnostic(payload)) => {
                    state = AnalysisState::Pending;
                    emit(AnalysisEvent::Diagnostic(DiagnosticInfo::parse(&payload)));
                }
                Some(ResponseLine::Result(text)) => {
                    emit(AnalysisEvent::Result(text));
                    return AnalysisState::Done;
                }
                None => {}
            },
            // 停止要求後に出力が途切れたら終了。それまでは状態に関係なく待ち続ける
            Polled::Idle if stop_seen.is_some() => return state,
            Polled::Idle => {}
            Polled::Closed => {
                emit(AnalysisEvent::Closed);
                return state;
            }
        }
    }
}
