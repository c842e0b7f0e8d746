//! エンジン 1 本との対話を管理するセッション。
//!
//! 書き込みは常に `EngineSession` の所有者だけが行い、読み取りは [`LineSource`]
//! 経由で行う。対話的解析中は [`Analysis`] がセッションを排他的に借用する。

use std::io::Write;
use std::time::Instant;

use rgomoku_core::{CoordError, MAX_BOARD_SIZE, Square, owner_for};

use crate::analysis::{Analysis, EventMonitor};
use crate::config::{EngineConfig, PONDERING_KEY, SessionOptions, TimeLimit};
use crate::error::{SessionError, SessionResult};
use crate::identity::EngineIdentity;
use crate::line_source::{LineSource, Polled};
use crate::protocol::{BestMove, DiagnosticInfo, ResponseLine, format_command};

/// 引数なしのコマンド用
pub(crate) const NO_ARGS: [&str; 0] = [];

pub struct EngineSession<W: Write> {
    writer: W,
    lines: LineSource,
    options: SessionOptions,
    config: EngineConfig,
    identity: EngineIdentity,
}

impl<W: Write> EngineSession<W> {
    pub fn new(writer: W, lines: LineSource, options: SessionOptions) -> Self {
        Self {
            writer,
            lines,
            options,
            config: EngineConfig::default(),
            identity: EngineIdentity::default(),
        }
    }

    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    /// 直近に送信した `INFO` 設定
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn lines(&self) -> &LineSource {
        &self.lines
    }

    /// コマンドを 1 行送信する。
    ///
    /// 行全体を 1 回で書き込んで flush する。改行を含む引数はエラー (何も送信しない)。
    pub fn send<I>(&mut self, command: &str, args: I) -> SessionResult<()>
    where
        I: IntoIterator,
        I::Item: std::fmt::Display,
    {
        let mut line = format_command(command, args)?;
        log::debug!("{} <- {}", self.lines.label(), line);
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// `START n` を送り、エンジンが `OK` を返すか確認する。
    ///
    /// `OK` 以外の行を受け取った後に出力が途切れた場合は `false`。
    /// 1 行も返らないまま応答待ち時間を過ぎた場合は `ProtocolTimeout`。
    pub fn check_ready(&mut self, board_size: u8) -> SessionResult<bool> {
        if board_size == 0 || board_size > MAX_BOARD_SIZE {
            return Err(CoordError::BoardSize(board_size).into());
        }
        self.send("start", [board_size])?;

        let start = Instant::now();
        let mut saw_line = false;
        loop {
            match self.lines.poll(self.options.poll_interval()) {
                Polled::Line(line) => {
                    if line.trim().eq_ignore_ascii_case("ok") {
                        self.options.board_size = board_size;
                        log::info!("{}: ready on {board_size}x{board_size}", self.lines.label());
                        return Ok(true);
                    }
                    log::warn!("{}: unexpected line while starting: {line}", self.lines.label());
                    saw_line = true;
                }
                Polled::Idle if saw_line => return Ok(false),
                Polled::Idle => {
                    if start.elapsed() >= self.options.response_timeout() {
                        return Err(SessionError::ProtocolTimeout(self.options.response_timeout()));
                    }
                }
                Polled::Closed => return Err(SessionError::EngineClosed),
            }
        }
    }

    /// 現在の設定に `overrides` を反映し、全キーを `INFO` として送信する。
    pub fn configure<I, K>(&mut self, overrides: I) -> SessionResult<()>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut config = self.config.merged(overrides);
        if self.identity.ponder {
            config = config.merged([(PONDERING_KEY, 1)]);
        }
        for (key, value) in config.iter() {
            self.send("info", [key.to_string(), value.to_string()])?;
        }
        self.config = config;
        Ok(())
    }

    /// 対局全体と 1 手の制限時間を設定する。変更した 2 キーだけを送信する。
    pub fn set_time_limit(&mut self, limit: TimeLimit) -> SessionResult<()> {
        let overrides = limit.overrides();
        for (key, value) in overrides {
            self.send("info", [key.to_string(), value.to_string()])?;
        }
        self.config = self.config.merged(overrides);
        log::info!("{}: time limit set to {limit:?}", self.lines.label());
        Ok(())
    }

    /// `ABOUT` を送り、最後の応答行からエンジン情報を更新する。
    ///
    /// 解析できない応答は警告を出して無視し、以前の値を保つ。
    pub fn identify(&mut self) -> SessionResult<&EngineIdentity> {
        self.send("about", NO_ARGS)?;

        let start = Instant::now();
        let mut saw_line = false;
        let mut last = None;
        loop {
            match self.lines.poll(self.options.poll_interval()) {
                Polled::Line(line) => {
                    saw_line = true;
                    if let Some(ResponseLine::Result(text)) = ResponseLine::classify(&line) {
                        last = Some(text);
                    }
                }
                Polled::Idle if saw_line => break,
                Polled::Idle => {
                    if start.elapsed() >= self.options.response_timeout() {
                        return Err(SessionError::ProtocolTimeout(self.options.response_timeout()));
                    }
                }
                Polled::Closed => return Err(SessionError::EngineClosed),
            }
        }

        let Some(line) = last else {
            log::warn!("{}: ABOUT produced no identity line", self.lines.label());
            return Ok(&self.identity);
        };
        match self.identity.with_about(&line) {
            Ok(identity) => {
                log::info!(
                    "{}: engine {} {}",
                    self.lines.label(),
                    identity.name.as_deref().unwrap_or("?"),
                    identity.version.as_deref().unwrap_or("")
                );
                self.identity = identity;
            }
            Err(e) => log::warn!("{}: ignoring identity: {e}", self.lines.label()),
        }
        Ok(&self.identity)
    }

    /// 通常の局面設定 (`BOARD` ... `DONE`)。エンジンはすぐに思考を始める。
    pub fn play_position(&mut self, moves: &[Square]) -> SessionResult<()> {
        self.send_board("board", moves)
    }

    /// swap2 用の局面設定 (`YXBOARD` ... `DONE` + `YXBALANCETWO 0`)。
    pub fn play_swap2_position(&mut self, moves: &[Square]) -> SessionResult<()> {
        self.send_board("yxboard", moves)?;
        self.send("yxbalancetwo", [0])
    }

    fn send_board(&mut self, command: &str, moves: &[Square]) -> SessionResult<()> {
        let size = self.options.board_size;
        if let Some(sq) = moves.iter().find(|sq| !sq.is_on_board(size)) {
            return Err(CoordError::OutOfBoard {
                square: sq.to_human(),
                size,
            }
            .into());
        }
        self.discard_pending();

        self.send(command, NO_ARGS)?;
        for (index, sq) in moves.iter().enumerate() {
            let owner = owner_for(index, moves.len());
            self.send(&format!("{},{}", sq.to_protocol(), owner.code()), NO_ARGS)?;
        }
        self.send("done", NO_ARGS)
    }

    /// 既に届いている古い出力を捨てる。捨てた行数を返す。
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while let Some(line) = self.lines.try_next() {
            log::debug!("{}: discarding stale line: {line}", self.lines.label());
            discarded += 1;
        }
        discarded
    }

    /// 応答が揃うまで待って最善手を返す (同期解析)。
    ///
    /// 途中経過は `on_diagnostic` にだけ渡す。応答行を受け取り、かつ出力が途切れた
    /// 時点で終了し、最後の応答行を採用する。
    pub fn request_best_move(
        &mut self,
        mut on_diagnostic: Option<&mut dyn FnMut(&DiagnosticInfo)>,
    ) -> SessionResult<BestMove> {
        let start = Instant::now();
        let mut last: Option<String> = None;
        loop {
            match self.lines.poll(self.options.poll_interval()) {
                Polled::Line(line) => match ResponseLine::classify(&line) {
                    Some(ResponseLine::Diagnostic(payload)) => {
                        if let Some(ref mut callback) = on_diagnostic {
                            callback(&DiagnosticInfo::parse(&payload));
                        }
                    }
                    Some(ResponseLine::Result(text)) => last = Some(text),
                    None => {}
                },
                Polled::Idle => {
                    if let Some(text) = last.take() {
                        let best = BestMove::parse(&text, self.options.board_size)?;
                        log::info!(
                            "{}: best move {best} after {:.1}s",
                            self.lines.label(),
                            start.elapsed().as_secs_f64()
                        );
                        return Ok(best);
                    }
                }
                Polled::Closed => {
                    return match last {
                        Some(text) => BestMove::parse(&text, self.options.board_size),
                        None => Err(SessionError::EngineClosed),
                    };
                }
            }
        }
    }

    /// 対話的解析を開始してすぐに戻る。
    ///
    /// 局面は事前に [`play_position`](Self::play_position) などで送っておくこと。
    /// `monitor` はワーカースレッドから各イベントごとに呼ばれる。
    pub fn start_analysis(
        &mut self,
        monitor: Option<EventMonitor>,
    ) -> SessionResult<Analysis<'_, W>> {
        Analysis::start(self, monitor)
    }

    pub(crate) fn board_size(&self) -> u8 {
        self.options.board_size
    }
}
