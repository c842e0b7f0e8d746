//! `ABOUT` 応答 (エンジン情報) の解析。
//!
//! 応答は `name="Rapfi", version="0.41", author="A, B", ...` の形式。値の中の
//! `", "` でも分割されてしまうため、`=` を含まない断片は直前の値に連結し直す。

use crate::error::{SessionError, SessionResult};

/// 非同期の先読み (pondering) に対応していると分かっているエンジン名
const PONDERING_ENGINES: [&str; 1] = ["RAPFI"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub www: Option<String>,
    /// エンジン名から推定した pondering 対応
    pub ponder: bool,
}

impl EngineIdentity {
    /// `ABOUT` 応答行を適用した新しい値を返す。応答に含まれないキーは現在の値のまま。
    pub fn with_about(&self, line: &str) -> SessionResult<Self> {
        let mut identity = self.clone();
        for (key, value) in parse_about(line)? {
            let slot = match key.to_ascii_lowercase().as_str() {
                "name" => &mut identity.name,
                "version" => &mut identity.version,
                "author" => &mut identity.author,
                "email" => &mut identity.email,
                "country" => &mut identity.country,
                "www" => &mut identity.www,
                _ => continue,
            };
            *slot = Some(value);
        }
        identity.ponder = identity.name.as_deref().is_some_and(|name| {
            PONDERING_ENGINES.iter().any(|known| name.trim().eq_ignore_ascii_case(known))
        });
        Ok(identity)
    }
}

/// `key="value"` 断片の列に分解する。
///
/// `=` を含まない断片が先頭に来た場合は連結先がないため `MalformedResponse`。
pub fn parse_about(line: &str) -> SessionResult<Vec<(String, String)>> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SessionError::MalformedResponse("empty ABOUT response".to_string()));
    }
    let mut pairs: Vec<(String, String)> = Vec::new();
    for fragment in line.split(", ") {
        match fragment.split_once('=') {
            Some((key, value)) => {
                pairs.push((key.trim().to_string(), unquote(value)));
            }
            None => {
                let Some((_, last)) = pairs.last_mut() else {
                    return Err(SessionError::MalformedResponse(format!(
                        "ABOUT fragment without key: {fragment:?}"
                    )));
                };
                let tail = fragment.split('"').next().unwrap_or_default();
                last.push_str(", ");
                last.push_str(tail);
            }
        }
    }
    Ok(pairs)
}

/// 先頭の引用符から次の引用符 (なければ末尾) までを取り出す。
fn unquote(value: &str) -> String {
    let value = value.trim();
    match value.strip_prefix('"') {
        Some(rest) => rest.split('"').next().unwrap_or_default().to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAPFI_ABOUT: &str = r#"name="Rapfi", version="0.41.240315", author="Rapfi developers (see AUTHORS), and contributors", country="China", www="https://github.com/dhbloo/rapfi", email="dhbloo@example.com""#;

    #[test]
    fn parses_rapfi_identity() {
        let id = EngineIdentity::default().with_about(RAPFI_ABOUT).unwrap();
        assert_eq!(id.name.as_deref(), Some("Rapfi"));
        assert_eq!(id.version.as_deref(), Some("0.41.240315"));
        assert_eq!(
            id.author.as_deref(),
            Some("Rapfi developers (see AUTHORS), and contributors")
        );
        assert_eq!(id.country.as_deref(), Some("China"));
        assert_eq!(id.www.as_deref(), Some("https://github.com/dhbloo/rapfi"));
        assert_eq!(id.email.as_deref(), Some("dhbloo@example.com"));
        assert!(id.ponder);
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_keys_keep_prior_values() {
        let prior = EngineIdentity {
            email: Some("old@example.com".to_string()),
            ..Default::default()
        };
        let id = prior.with_about(r#"name="pbrain-embryo", license="MIT""#).unwrap();
        assert_eq!(id.name.as_deref(), Some("pbrain-embryo"));
        assert_eq!(id.email.as_deref(), Some("old@example.com"));
        assert!(!id.ponder);
    }

    #[test]
    fn keyless_leading_fragment_is_malformed() {
        let prior = EngineIdentity {
            name: Some("Rapfi".to_string()),
            ponder: true,
            ..Default::default()
        };
        assert!(matches!(
            prior.with_about(r#"dangling", name="Other""#),
            Err(SessionError::MalformedResponse(_))
        ));
        assert!(matches!(prior.with_about("  "), Err(SessionError::MalformedResponse(_))));
    }

    #[test]
    fn unquoted_values_are_kept_verbatim() {
        let pairs = parse_about("name=Foo, version=1.0").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "Foo".to_string()),
                ("version".to_string(), "1.0".to_string())
            ]
        );
    }
}
