//! 対話ループ。
//!
//! オペレーターの入力を [`CommandMatcher`] で語彙に解決し、局面設定・解析・
//! 解析中の操作 (停止・盤面表示・リンク出力) をセッションに中継する。

use std::io::{self, BufRead, Write};

use rgomoku_core::{Board, Square, format_moves, parse_moves};

use crate::analysis::{Analysis, AnalysisEvent, EventMonitor};
use crate::command::{OperatorCommand, VOCABULARY};
use crate::config::TimeLimit;
use crate::error::{SessionError, SessionResult};
use crate::matcher::CommandMatcher;
use crate::protocol::{BestMove, DiagnosticInfo};
use crate::session::EngineSession;

const NOT_VALID: &str = "--> Not valid!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct InteractionLoop<'a, W: Write, R: BufRead, O: Write> {
    session: &'a mut EngineSession<W>,
    input: R,
    output: O,
    matcher: CommandMatcher,
    monitor: Option<EventMonitor>,
}

impl<'a, W: Write, R: BufRead, O: Write> InteractionLoop<'a, W, R, O> {
    pub fn new(session: &'a mut EngineSession<W>, input: R, output: O) -> Self {
        Self {
            session,
            input,
            output,
            matcher: CommandMatcher::new(VOCABULARY),
            monitor: None,
        }
    }

    pub fn with_matcher(mut self, matcher: CommandMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// 途中経過の表示先。自動解析・対話的解析の両方で呼ばれる。
    pub fn with_monitor(mut self, monitor: EventMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// `quit` か入力終端まで繰り返す。
    ///
    /// エンジンの終了と入出力エラー以外は表示して続行する。
    pub fn run(&mut self) -> SessionResult<()> {
        loop {
            let Some(line) = prompt(&mut self.input, &mut self.output, "Input: ")? else {
                return Ok(());
            };
            let command = self.matcher.resolve(&line).and_then(OperatorCommand::from_word);
            let outcome = match command {
                Some(OperatorCommand::Analyze) => self.analyze(None),
                Some(OperatorCommand::PlayByTime) => self.analyze(Some(Mode::Auto)),
                Some(OperatorCommand::Quit) => return Ok(()),
                _ => {
                    log::debug!("unrecognised top-level input: {line:?}");
                    writeln!(self.output, "{NOT_VALID}")?;
                    continue;
                }
            };
            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(e @ (SessionError::EngineClosed | SessionError::Io(_))) => return Err(e),
                Err(e) => {
                    log::warn!("analysis failed: {e}");
                    writeln!(self.output, "--> {e}")?;
                }
            }
        }
    }

    fn analyze(&mut self, fixed_mode: Option<Mode>) -> SessionResult<Flow> {
        let Self {
            session,
            input,
            output,
            matcher,
            monitor,
        } = self;
        let size = session.options().board_size;

        let moves = loop {
            let Some(text) = prompt(input, output, "Position: ")? else {
                return Ok(Flow::Quit);
            };
            match parse_moves(&text, size) {
                Ok(moves) => break moves,
                Err(e) => {
                    log::debug!("rejected position {text:?}: {e}");
                    writeln!(output, "{NOT_VALID}")?;
                }
            }
        };
        writeln!(output, "-> Pos: {}", format_moves(&moves))?;

        writeln!(output, "-> Time set by seconds (-1: unlimited).")?;
        let limit = loop {
            let Some(text) = prompt(input, output, "Time: ")? else {
                return Ok(Flow::Quit);
            };
            match TimeLimit::parse(&text) {
                // 自動解析は終わらない思考を待てない
                Some(TimeLimit::Unlimited) if fixed_mode == Some(Mode::Auto) => {
                    writeln!(output, "{NOT_VALID}")?
                }
                Some(limit) => break limit,
                None => writeln!(output, "{NOT_VALID}")?,
            }
        };
        session.set_time_limit(limit)?;

        let mode = match (limit, fixed_mode) {
            (TimeLimit::Unlimited, _) => Mode::Manual,
            (_, Some(mode)) => mode,
            (_, None) => {
                let Some(mode) = choose(input, output, matcher, "(Manual/Auto): ", |cmd| match cmd {
                    OperatorCommand::Manual => Some(Mode::Manual),
                    OperatorCommand::Auto => Some(Mode::Auto),
                    _ => None,
                })?
                else {
                    return Ok(Flow::Quit);
                };
                mode
            }
        };
        writeln!(output, "-> Type: {}", if mode == Mode::Manual { "manual" } else { "auto" })?;

        let Some(swap2) = choose(input, output, matcher, "(Swap2/Best move): ", |cmd| match cmd {
            OperatorCommand::Swap2 => Some(true),
            OperatorCommand::BestMove => Some(false),
            _ => None,
        })?
        else {
            return Ok(Flow::Quit);
        };
        if swap2 {
            writeln!(output, "==Make Swap2==")?;
            session.play_swap2_position(&moves)?;
        } else {
            writeln!(output, "==Best Move==")?;
            session.play_position(&moves)?;
        }

        match mode {
            Mode::Auto => {
                let mut forward = |info: &DiagnosticInfo| {
                    if let Some(monitor) = monitor.as_ref() {
                        monitor(&AnalysisEvent::Diagnostic(info.clone()));
                    }
                };
                let callback: &mut dyn FnMut(&DiagnosticInfo) = &mut forward;
                let best = session.request_best_move(Some(callback))?;
                writeln!(output, "--> Best move: {best}")?;
                Ok(Flow::Continue)
            }
            Mode::Manual => {
                let analysis = session.start_analysis(monitor.clone())?;
                manual_loop(analysis, input, output, matcher, &moves, size)
            }
        }
    }
}

/// 対話的解析中の `Command:` ループ。
fn manual_loop<W: Write, R: BufRead, O: Write>(
    mut analysis: Analysis<'_, W>,
    input: &mut R,
    output: &mut O,
    matcher: &CommandMatcher,
    moves: &[Square],
    size: u8,
) -> SessionResult<Flow> {
    loop {
        if !analysis.is_active() {
            match analysis.result().map(str::to_string) {
                Some(raw) => match BestMove::parse(&raw, size) {
                    Ok(best) => writeln!(output, "--> Best move: {best}")?,
                    Err(e) => {
                        log::warn!("{e}");
                        writeln!(output, "--> Result: {raw}")?;
                    }
                },
                None => {
                    analysis.stop()?;
                    return Err(SessionError::EngineClosed);
                }
            }
            analysis.stop()?;
            return Ok(Flow::Continue);
        }

        let Some(line) = prompt(input, output, "Command: ")? else {
            analysis.stop()?;
            return Ok(Flow::Quit);
        };
        let (text, count) = split_count(&line);
        let max_cost = text.chars().count();
        match matcher.resolve_within(text, max_cost).and_then(OperatorCommand::from_word) {
            Some(OperatorCommand::Stop) => {
                analysis.stop()?;
                writeln!(output, "--> Stopped")?;
                return Ok(Flow::Continue);
            }
            Some(OperatorCommand::GetLink) => {
                let pv = analysis.last_message().map(|m| m.pv.clone()).unwrap_or_default();
                writeln!(output, "{}", playok_link(moves, &pv))?;
            }
            Some(OperatorCommand::Display) => {
                let pv = match analysis.last_message().map(|m| m.pv_squares(size)) {
                    Some(Ok(pv)) => pv,
                    Some(Err(e)) => {
                        writeln!(output, "--> Cannot display: {e}")?;
                        continue;
                    }
                    None => Vec::new(),
                };
                let shown = count.map_or(pv.len(), |n| n.min(pv.len()));
                let mut line_up = moves.to_vec();
                line_up.extend_from_slice(&pv[..shown]);
                match Board::from_moves(size, &line_up) {
                    Ok(board) => writeln!(output, "{}", board.render())?,
                    Err(e) => writeln!(output, "--> Cannot display: {e}")?,
                }
            }
            _ => writeln!(output, "{NOT_VALID}")?,
        }
    }
}

/// 語彙から選択させる。`pick` が `None` を返す入力は再入力させる。入力終端で `None`。
fn choose<R: BufRead, O: Write, T>(
    input: &mut R,
    output: &mut O,
    matcher: &CommandMatcher,
    text: &str,
    pick: impl Fn(OperatorCommand) -> Option<T>,
) -> io::Result<Option<T>> {
    loop {
        let Some(line) = prompt(input, output, text)? else {
            return Ok(None);
        };
        match matcher.resolve(&line).and_then(OperatorCommand::from_word).and_then(&pick) {
            Some(choice) => return Ok(Some(choice)),
            None => writeln!(output, "{NOT_VALID}")?,
        }
    }
}

/// プロンプトを表示して 1 行読む。入力終端で `None`。
fn prompt<R: BufRead, O: Write>(input: &mut R, output: &mut O, text: &str) -> io::Result<Option<String>> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `display 5` のような末尾の手数指定を切り離す。
fn split_count(line: &str) -> (&str, Option<usize>) {
    let line = line.trim();
    if let Some((head, tail)) = line.rsplit_once(char::is_whitespace) {
        if let Ok(n) = tail.parse() {
            return (head.trim_end(), Some(n));
        }
    }
    (line, None)
}

/// 局面と読み筋を playok の棋譜リンクにする。
pub fn playok_link(moves: &[Square], pv: &[String]) -> String {
    let mut all: Vec<String> = moves.iter().map(|sq| sq.to_human()).collect();
    all.extend(pv.iter().map(|mv| mv.to_lowercase()));
    format!(
        "https://www.playok.com/p/?g=gm+{}#{}",
        all.concat(),
        all.len().saturating_sub(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_concatenates_position_and_variation() {
        let moves = parse_moves("h8 h9", 15).unwrap();
        let pv = vec!["I9".to_string(), "j10".to_string()];
        assert_eq!(playok_link(&moves, &pv), "https://www.playok.com/p/?g=gm+h8h9i9j10#3");
        assert_eq!(playok_link(&[], &[]), "https://www.playok.com/p/?g=gm+#0");
    }

    #[test]
    fn trailing_count_is_split_off() {
        assert_eq!(split_count("display 5"), ("display", Some(5)));
        assert_eq!(split_count(" dispaly  12 "), ("dispaly", Some(12)));
        assert_eq!(split_count("display"), ("display", None));
        assert_eq!(split_count("get link"), ("get link", None));
        assert_eq!(split_count("7"), ("7", None));
    }

    #[test]
    fn prompt_trims_and_reports_end_of_input() {
        let mut input = io::Cursor::new(b"  h8 h9 \r\n".to_vec());
        let mut output = Vec::new();
        assert_eq!(
            prompt(&mut input, &mut output, "Position: ").unwrap(),
            Some("h8 h9".to_string())
        );
        assert_eq!(prompt(&mut input, &mut output, "Time: ").unwrap(), None);
        assert_eq!(String::from_utf8(output).unwrap(), "Position: Time: ");
    }
}
