//! 五目並べ / 連珠エンジンのフロントエンドで共有する基本型。
//!
//! - [`coord`]: 盤上座標と人間向け表記 (`h8`) / プロトコル表記 (`7,7`) の相互変換
//! - [`position`]: 着手列の解析と、プロトコル上の石の所有者 (自分 / 相手) の割り当て
//! - [`board`]: 盤面のテキスト描画
//! - [`winrate`]: エンジン評価値から勝率への変換

pub mod board;
pub mod coord;
pub mod position;
pub mod winrate;

pub use board::{Board, Stone};
pub use coord::{CoordError, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, Square};
pub use position::{Owner, format_moves, owner_for, parse_moves};
pub use winrate::{Eval, winrate_percent};
