//! エンジン設定 (`INFO` オプション) と設定ファイル。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rgomoku_core::DEFAULT_BOARD_SIZE;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::line_source::DEFAULT_POLL_INTERVAL;
use crate::matcher::DEFAULT_MAX_COST;

/// 既定の `INFO` オプション (送信順)。
pub const DEFAULT_INFO: [(&str, i64); 6] = [
    ("timeout_match", 60_000),
    ("timeout_turn", 60_000),
    ("game_type", 1),
    ("rule", 1),
    ("time_left", 60_000),
    ("max_memory", 0),
];

/// pondering 対応エンジンに付与する `INFO` キー
pub const PONDERING_KEY: &str = "pondering";

/// `ABOUT` / `START` が 1 行も返さない場合に諦めるまでの時間
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// `INFO key value` として送るエンジン設定。
///
/// 値は不変で、[`EngineConfig::merged`] が上書きを反映した新しい値を返す。
/// キーは削除されず、既存キーは送信順を保ったまま上書きされる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    entries: Vec<(String, i64)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entries: DEFAULT_INFO.iter().map(|&(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

impl EngineConfig {
    pub fn get(&self, key: &str) -> Option<i64> {
        self.entries.iter().find(|(k, _)| k == key).map(|&(_, v)| v)
    }

    /// `overrides` を反映した設定を返す。衝突時は `overrides` が勝ち、新しいキーは末尾に追加する。
    pub fn merged<I, K>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut entries = self.entries.clone();
        for (key, value) in overrides {
            let key = key.as_ref();
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key.to_string(), value)),
            }
        }
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// 思考時間の指定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    Seconds(u32),
    /// 無制限。`-1` として送信され、対話ループでは手動解析になる
    Unlimited,
}

impl TimeLimit {
    /// 秒数の文字列を解析する。`-1` は無制限。
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().parse::<i64>().ok()? {
            -1 => Some(TimeLimit::Unlimited),
            secs if secs >= 0 => u32::try_from(secs).ok().map(TimeLimit::Seconds),
            _ => None,
        }
    }

    pub fn as_millis(self) -> i64 {
        match self {
            TimeLimit::Seconds(secs) => i64::from(secs) * 1000,
            TimeLimit::Unlimited => -1,
        }
    }

    /// 対局全体と 1 手の制限時間を同じ値にする `INFO` 上書き。
    pub fn overrides(self) -> [(&'static str, i64); 2] {
        let ms = self.as_millis();
        [("timeout_match", ms), ("timeout_turn", ms)]
    }
}

/// `EngineSession` の動作パラメータ。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOptions {
    pub board_size: u8,
    pub poll_interval_ms: u64,
    pub response_timeout_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SessionOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// 起動するエンジンの指定。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherOptions {
    pub max_cost: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            max_cost: DEFAULT_MAX_COST,
        }
    }
}

/// 設定ファイル全体。すべてのセクション・キーは省略可能。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub engine: EngineSection,
    pub session: SessionOptions,
    pub matcher: MatcherOptions,
    /// 起動時に適用する `INFO` 上書き
    pub info: BTreeMap<String, i64>,
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
