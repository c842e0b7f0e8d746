//! 盤面のテキスト描画。

use std::fmt;

use crate::coord::{CoordError, Square, check_board_size};

const CELL_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stone {
    /// 先手 (黒)
    Black,
    /// 後手 (白)
    White,
}

impl Stone {
    /// 初手からの手数 (0 始まり) で石の色を決める。
    pub fn for_ply(ply: usize) -> Self {
        if ply % 2 == 0 { Stone::Black } else { Stone::White }
    }

    fn glyph(self) -> char {
        match self {
            Stone::Black => '●',
            Stone::White => '○',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: u8,
    cells: Vec<Option<Stone>>,
}

impl Board {
    pub fn new(size: u8) -> Result<Self, CoordError> {
        check_board_size(size)?;
        let n = usize::from(size);
        Ok(Self {
            size,
            cells: vec![None; n * n],
        })
    }

    /// 初手から交互に石を置いた盤面を作る。
    pub fn from_moves(size: u8, moves: &[Square]) -> Result<Self, CoordError> {
        let mut board = Self::new(size)?;
        for (ply, &sq) in moves.iter().enumerate() {
            board.place(sq, Stone::for_ply(ply))?;
        }
        Ok(board)
    }

    pub fn place(&mut self, sq: Square, stone: Stone) -> Result<(), CoordError> {
        let idx = self.index(sq)?;
        self.cells[idx] = Some(stone);
        Ok(())
    }

    pub fn get(&self, sq: Square) -> Option<Stone> {
        self.index(sq).ok().and_then(|idx| self.cells[idx])
    }

    fn index(&self, sq: Square) -> Result<usize, CoordError> {
        if !sq.is_on_board(self.size) {
            return Err(CoordError::OutOfBoard {
                square: sq.to_human(),
                size: self.size,
            });
        }
        Ok(usize::from(sq.y) * usize::from(self.size) + usize::from(sq.x))
    }

    /// 上端が最終行、右端に行番号、最下行に列記号を置いたテキストを返す。
    pub fn render(&self) -> String {
        let center = (self.size - 1) / 2;
        let mut lines = Vec::with_capacity(usize::from(self.size) + 1);
        for y in (0..self.size).rev() {
            let mut line = String::new();
            for x in 0..self.size {
                let sq = Square::new(x, y);
                let glyph = match self.get(sq) {
                    Some(stone) => stone.glyph(),
                    None if x == center && y == center => '*',
                    None => '.',
                };
                line.push_str(&format!("{glyph:^CELL_WIDTH$}"));
            }
            line.push_str(&format!("{:>CELL_WIDTH$}", u32::from(y) + 1));
            lines.push(line);
        }
        let footer: String = (0..self.size)
            .map(|x| format!("{:^CELL_WIDTH$}", (b'A' + x) as char))
            .collect();
        lines.push(footer);
        lines.join("\n")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
