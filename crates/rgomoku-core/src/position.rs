//! 着手列の解析と石の所有者の割り当て。

use std::collections::HashSet;

use crate::coord::{CoordError, Square, check_board_size};

/// プロトコル上の石の所有者。
///
/// `BOARD` / `YXBOARD` の各行は `x,y,owner` で、`1` が手番側 (エンジン自身) の石、
/// `2` が相手の石を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Own = 1,
    Opponent = 2,
}

impl Owner {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// `len` 手の局面で `index` 番目 (0 始まり) の石の所有者を返す。
///
/// 手番は手数の偶奇で決まるため、`index` と `len` の偶奇が一致する石が手番側の石になる。
pub fn owner_for(index: usize, len: usize) -> Owner {
    if index % 2 == len % 2 {
        Owner::Own
    } else {
        Owner::Opponent
    }
}

/// 着手列を解析する。
///
/// `h8 h9 h10` のような空白区切りでも `h8h9h10` のような連結でも受け付ける。
/// カンマは区切りとして無視する。盤外の座標、形式不正、同じ点への重複着手はエラー。
pub fn parse_moves(text: &str, size: u8) -> Result<Vec<Square>, CoordError> {
    check_board_size(size)?;
    let mut moves = Vec::new();
    let mut seen = HashSet::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }
        if !c.is_ascii_alphabetic() {
            return Err(CoordError::Malformed(text[start..].to_string()));
        }
        chars.next();
        let mut end = start + c.len_utf8();
        while let Some(&(idx, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            end = idx + d.len_utf8();
            chars.next();
        }
        let square = Square::from_human(&text[start..end], size)?;
        if !seen.insert(square) {
            return Err(CoordError::Duplicate(square.to_human()));
        }
        moves.push(square);
    }

    Ok(moves)
}

/// 着手列を空白区切りの人間向け表記にする。
pub fn format_moves(moves: &[Square]) -> String {
    moves.iter().map(|sq| sq.to_human()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::DEFAULT_BOARD_SIZE;

    fn owners(len: usize) -> Vec<u8> {
        (0..len).map(|i| owner_for(i, len).code()).collect()
    }

    #[test]
    fn owner_alternates_with_move_count_parity() {
        assert!(owners(0).is_empty());
        assert_eq!(owners(1), vec![2]);
        assert_eq!(owners(2), vec![1, 2]);
        assert_eq!(owners(3), vec![2, 1, 2]);
    }

    #[test]
    fn last_stone_always_belongs_to_the_opponent() {
        for len in 1..10 {
            assert_eq!(owner_for(len - 1, len), Owner::Opponent);
        }
    }

    #[test]
    fn parses_spaced_and_concatenated_moves() {
        let spaced = parse_moves("h8 h9 h10", DEFAULT_BOARD_SIZE).unwrap();
        let packed = parse_moves("h8h9h10", DEFAULT_BOARD_SIZE).unwrap();
        assert_eq!(spaced, packed);
        assert_eq!(spaced, vec![Square::new(7, 7), Square::new(7, 8), Square::new(7, 9)]);
        assert_eq!(format_moves(&spaced), "h8 h9 h10");
        assert!(parse_moves("   ", DEFAULT_BOARD_SIZE).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_positions() {
        assert!(matches!(
            parse_moves("h8 z9", DEFAULT_BOARD_SIZE),
            Err(CoordError::OutOfBoard { .. })
        ));
        assert!(matches!(
            parse_moves("h8 h8", DEFAULT_BOARD_SIZE),
            Err(CoordError::Duplicate(sq)) if sq == "h8"
        ));
        assert!(matches!(
            parse_moves("h8 ?", DEFAULT_BOARD_SIZE),
            Err(CoordError::Malformed(_))
        ));
        assert!(matches!(parse_moves("hh8", DEFAULT_BOARD_SIZE), Err(CoordError::Malformed(_))));
    }
}
