//! Gomocup (pbrain) プロトコルの行フォーマットと応答行の分類。
//!
//! 送信: 1 行 1 コマンド、先頭トークンは大文字、引数は半角スペース区切り、LF 終端。
//! 受信: `MESSAGE` / `DEBUG` を含む行は途中経過 (Diagnostic)、それ以外の非空行は
//! 応答 (Result) 候補として扱う。

use std::fmt;

use rgomoku_core::{Eval, Square};

use crate::error::{SessionError, SessionResult};

/// 途中経過行を示すマーカー。行内のどこにあってもよく、大文字小文字は区別しない。
pub const DIAGNOSTIC_MARKERS: [&str; 2] = ["MESSAGE", "DEBUG"];

/// 要約に含める PV の最大手数
const SUMMARY_PV_LEN: usize = 10;

/// コマンド行を組み立てる (改行は含まない)。
///
/// 引数に改行が含まれる場合は行の区切りが壊れるため拒否する。
pub fn format_command<I>(command: &str, args: I) -> SessionResult<String>
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut tokens = vec![command.to_uppercase()];
    tokens.extend(args.into_iter().map(|arg| arg.to_string()));
    for token in &tokens {
        if token.contains(['\n', '\r']) {
            return Err(SessionError::EmbeddedNewline(token.clone()));
        }
    }
    Ok(tokens.join(" "))
}

/// エンジン出力 1 行の分類結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// 要求に対する最終応答 (`OK`, `7,7` など)
    Result(String),
    /// マーカー以降のペイロード
    Diagnostic(String),
}

impl ResponseLine {
    /// 空行 (空白のみを含む行) は `None`。
    pub fn classify(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        // ASCII の大文字化はバイト位置を変えない
        let upper = line.to_ascii_uppercase();
        let marker = DIAGNOSTIC_MARKERS
            .iter()
            .filter_map(|m| upper.find(m).map(|at| at + m.len()))
            .min();
        Some(match marker {
            Some(end) => {
                let payload = line[end..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
                ResponseLine::Diagnostic(payload.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            None => ResponseLine::Result(line.to_string()),
        })
    }
}

/// 途中経過行の解析結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticInfo {
    pub text: String,
    /// `EV <score>`
    pub eval: Option<Eval>,
    /// `PV <moves...>` (小文字化済み)
    pub pv: Vec<String>,
}

impl DiagnosticInfo {
    pub fn parse(payload: &str) -> Self {
        let tokens: Vec<&str> = payload.split_whitespace().collect();
        let mut info = DiagnosticInfo {
            text: tokens.join(" "),
            ..Default::default()
        };
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].eq_ignore_ascii_case("ev") {
                if let Some(tok) = tokens.get(i + 1) {
                    info.eval = Eval::parse(tok);
                    i += 1;
                }
            } else if tokens[i].eq_ignore_ascii_case("pv") {
                info.pv = tokens[i + 1..].iter().map(|t| t.to_lowercase()).collect();
                break;
            }
            i += 1;
        }
        info
    }

    /// 表示用の 1 行要約。PV は先頭 10 手までに切り詰め、勝率を付ける。
    pub fn summary(&self) -> String {
        let tokens: Vec<&str> = self.text.split_whitespace().collect();
        let pv_at = tokens.iter().position(|t| t.eq_ignore_ascii_case("pv"));
        let mut parts: Vec<String> = match pv_at {
            Some(idx) => {
                let mut parts: Vec<String> =
                    tokens[..=idx].iter().map(|t| t.to_string()).collect();
                parts.extend(self.pv.iter().take(SUMMARY_PV_LEN).cloned());
                if self.pv.len() > SUMMARY_PV_LEN {
                    parts.push("...".to_string());
                }
                parts
            }
            None => tokens.iter().map(|t| t.to_string()).collect(),
        };
        if let Some(eval) = self.eval {
            parts.push(format!("(WINRATE: {}%)", eval.winrate()));
        }
        parts.join(" ").to_uppercase()
    }

    /// PV を座標列として取り出す。
    pub fn pv_squares(&self, board_size: u8) -> SessionResult<Vec<Square>> {
        self.pv
            .iter()
            .map(|mv| Square::from_human(mv, board_size).map_err(SessionError::from))
            .collect()
    }
}

/// 着手要求に対するエンジンの応答。swap2 では複数の座標が返ることがある。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    pub raw: String,
    pub moves: Vec<Square>,
}

impl BestMove {
    /// `7,7` / `7,7 8,8 9,9` 形式の応答を解析する。
    pub fn parse(raw: &str, board_size: u8) -> SessionResult<Self> {
        let moves = raw
            .split_whitespace()
            .map(|tok| Square::from_protocol(tok, board_size))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::MalformedResponse(format!("{raw:?}: {e}")))?;
        if moves.is_empty() {
            return Err(SessionError::MalformedResponse(format!("{raw:?}: no move")));
        }
        Ok(Self {
            raw: raw.to_string(),
            moves,
        })
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rgomoku_core::format_moves(&self.moves))
    }
}
