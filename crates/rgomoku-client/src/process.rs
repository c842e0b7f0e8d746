//! エンジンを子プロセスとして起動する。

use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::config::SessionOptions;
use crate::line_source::LineSource;
use crate::session::{EngineSession, NO_ARGS};

pub const ENGINE_QUIT_TIMEOUT: Duration = Duration::from_millis(300);
pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 子プロセスのエンジンと、その標準入出力に接続したセッション。
///
/// drop 時に `END` を送り、猶予時間内に終了しなければ kill する。
pub struct EngineProcess {
    child: Child,
    session: EngineSession<BufWriter<ChildStdin>>,
}

impl EngineProcess {
    pub fn spawn(path: &Path, args: &[String], options: SessionOptions) -> Result<Self> {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "engine".to_string());

        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn engine at {}", path.display()))?;
        let stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow!("no stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| anyhow!("no stderr"))?;

        let stderr_label = label.clone();
        thread::Builder::new()
            .name(format!("{label}-stderr"))
            .spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    match line {
                        Ok(line) => log::debug!("{stderr_label} stderr: {line}"),
                        Err(_) => break,
                    }
                }
            })
            .context("failed to start stderr forwarder")?;

        let lines = LineSource::spawn(stdout, &label).context("failed to start output reader")?;
        log::info!("spawned engine {} (pid {})", path.display(), child.id());
        Ok(Self {
            child,
            session: EngineSession::new(BufWriter::new(stdin), lines, options),
        })
    }

    pub fn session(&mut self) -> &mut EngineSession<BufWriter<ChildStdin>> {
        &mut self.session
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.session.send("end", NO_ARGS);
        let deadline = Instant::now() + ENGINE_QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(status)) = self.child.try_wait() {
                log::debug!("engine exited with {status}");
                return;
            }
            thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }
        log::warn!("engine did not exit after END, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
