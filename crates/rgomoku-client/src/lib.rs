//! Gomocup (pbrain) プロトコルのエンジンを操作するクライアント。
//!
//! - [`line_source`]: エンジン出力を別スレッドで読み、待ち時間付きで取り出す
//! - [`session`]: コマンド送信と同期的な応答待ち (準備確認・情報取得・最善手)
//! - [`analysis`]: 停止可能な対話的解析
//! - [`matcher`]: 打ち間違いを許容するコマンド解決
//! - [`interaction`]: オペレーター向けの対話ループ
//! - [`process`]: エンジンの子プロセス起動
//! - `testing`: プロセスを使わないスクリプト化エンジン (`testing` feature)

pub mod analysis;
pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod interaction;
pub mod line_source;
pub mod matcher;
pub mod process;
pub mod protocol;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::{Analysis, AnalysisEvent, AnalysisState, EventMonitor};
pub use command::{OperatorCommand, VOCABULARY};
pub use config::{ClientConfig, EngineConfig, SessionOptions, TimeLimit};
pub use error::{ConfigError, SessionError, SessionResult};
pub use identity::EngineIdentity;
pub use interaction::InteractionLoop;
pub use line_source::{LineSource, Polled};
pub use matcher::CommandMatcher;
pub use process::EngineProcess;
pub use protocol::{BestMove, DiagnosticInfo, ResponseLine};
pub use session::EngineSession;
