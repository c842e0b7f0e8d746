//! 盤上座標。
//!
//! 座標は 0 始まりで、`(0, 0)` が左下。人間向け表記は列を英小文字、行を 1 始まりの
//! 数字で表す (`h8` = `(7, 7)`)。エンジンとのプロトコルでは `x,y` 形式を使う。

use std::fmt;

use thiserror::Error;

/// 標準の盤サイズ (15路)。
pub const DEFAULT_BOARD_SIZE: u8 = 15;

/// 列を英字 1 文字で表せる上限。
pub const MAX_BOARD_SIZE: u8 = 26;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    #[error("malformed coordinate: {0:?}")]
    Malformed(String),

    #[error("{square} is outside a {size}x{size} board")]
    OutOfBoard { square: String, size: u8 },

    #[error("unsupported board size {0} (expected 1..={MAX_BOARD_SIZE})")]
    BoardSize(u8),

    #[error("square {0} is played more than once")]
    Duplicate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub x: u8,
    pub y: u8,
}

impl Square {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 人間向け表記 (`h8`) を解析する。大文字小文字は区別しない。
    pub fn from_human(text: &str, size: u8) -> Result<Self, CoordError> {
        check_board_size(size)?;
        let text = text.trim();
        let mut chars = text.chars();
        let column = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .ok_or_else(|| CoordError::Malformed(text.to_string()))?;
        let row = chars.as_str();
        if row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoordError::Malformed(text.to_string()));
        }
        let row: u32 = row.parse().map_err(|_| CoordError::Malformed(text.to_string()))?;
        let x = u32::from(column.to_ascii_lowercase() as u8 - b'a');
        if row == 0 || row > u32::from(size) || x >= u32::from(size) {
            return Err(CoordError::OutOfBoard {
                square: text.to_ascii_lowercase(),
                size,
            });
        }
        Ok(Self::new(x as u8, (row - 1) as u8))
    }

    /// プロトコル表記 (`7,7`) を解析する。
    pub fn from_protocol(text: &str, size: u8) -> Result<Self, CoordError> {
        check_board_size(size)?;
        let (x, y) = text
            .trim()
            .split_once(',')
            .ok_or_else(|| CoordError::Malformed(text.to_string()))?;
        let x: u8 = x.trim().parse().map_err(|_| CoordError::Malformed(text.to_string()))?;
        let y: u8 = y.trim().parse().map_err(|_| CoordError::Malformed(text.to_string()))?;
        let square = Self::new(x, y);
        if !square.is_on_board(size) {
            return Err(CoordError::OutOfBoard {
                square: text.trim().to_string(),
                size,
            });
        }
        Ok(square)
    }

    pub fn is_on_board(self, size: u8) -> bool {
        self.x < size && self.y < size
    }

    /// 人間向け表記。英字で表せない列はプロトコル表記になる。
    pub fn to_human(self) -> String {
        if self.x >= MAX_BOARD_SIZE {
            return self.to_protocol();
        }
        format!("{}{}", (b'a' + self.x) as char, u32::from(self.y) + 1)
    }

    pub fn to_protocol(self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}

pub(crate) fn check_board_size(size: u8) -> Result<(), CoordError> {
    if size == 0 || size > MAX_BOARD_SIZE {
        return Err(CoordError::BoardSize(size));
    }
    Ok(())
}
