//! 評価値から勝率への変換。

use std::fmt;

/// cp → 勝率のロジスティック変換の尺度。
const WINRATE_SCALE: f64 = 200.0;

/// エンジンが報告する評価値。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eval {
    /// 手番側から見た評価値
    Cp(i32),
    /// 詰み手数。正なら手番側の勝ち、負なら負け
    Mate(i32),
}

impl Eval {
    /// `35`, `-120`, `M9`, `+M9`, `-M9` 形式を解析する。
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (negative, body) = match token.as_bytes().first()? {
            b'-' => (true, &token[1..]),
            b'+' => (false, &token[1..]),
            _ => (false, token),
        };
        if let Some(plies) = body.strip_prefix(['m', 'M']) {
            let plies: i32 = if plies.is_empty() { 0 } else { plies.parse().ok()? };
            return Some(Eval::Mate(if negative { -plies } else { plies }));
        }
        let cp: i32 = body.parse().ok()?;
        Some(Eval::Cp(if negative { -cp } else { cp }))
    }

    pub fn winrate(self) -> u32 {
        match self {
            Eval::Cp(cp) => winrate_percent(cp),
            Eval::Mate(plies) if plies < 0 => 0,
            Eval::Mate(_) => 100,
        }
    }
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eval::Cp(cp) => write!(f, "{cp}"),
            Eval::Mate(plies) if *plies < 0 => write!(f, "-M{}", -plies),
            Eval::Mate(plies) => write!(f, "M{plies}"),
        }
    }
}

/// cp 評価値を勝率 (0..=100 の整数 %) に変換する。
pub fn winrate_percent(cp: i32) -> u32 {
    let x = f64::from(cp) / WINRATE_SCALE;
    let rate = 100.0 / (1.0 + (-x).exp());
    rate.round().clamp(0.0, 100.0) as u32
}
