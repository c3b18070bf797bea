//! C2 — `LabelParser` (spec.md §4.2).

use std::collections::BTreeMap;

use crate::constants::APP_ID_LABEL_KEY;
use crate::error::SubmitError;

/// Parses a `k=v,k2=v2` custom-label string.
///
/// Empty or absent input yields an empty map. Tokens are trimmed; empty
/// tokens (from repeated or trailing commas) are dropped. Duplicate keys:
/// last one wins.
pub fn parse(raw: Option<&str>) -> Result<BTreeMap<String, String>, SubmitError> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };

    let mut out = BTreeMap::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let Some(value) = parts.next() else {
            return Err(SubmitError::MalformedLabel(token.to_string()));
        };
        let value = value.trim();
        if key.is_empty() {
            return Err(SubmitError::MalformedLabel(token.to_string()));
        }
        if key == APP_ID_LABEL_KEY {
            return Err(SubmitError::ReservedLabel(key.to_string()));
        }
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_map() {
        assert_eq!(parse(None).unwrap(), BTreeMap::new());
        assert_eq!(parse(Some("")).unwrap(), BTreeMap::new());
    }

    #[test]
    fn parses_trimmed_pairs() {
        let parsed = parse(Some("team=ads, tier=gold")).unwrap();
        assert_eq!(parsed.get("team").unwrap(), "ads");
        assert_eq!(parsed.get("tier").unwrap(), "gold");
    }

    #[test]
    fn rejects_token_without_equals() {
        assert!(matches!(
            parse(Some("team=ads,bad")),
            Err(SubmitError::MalformedLabel(s)) if s == "bad"
        ));
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(parse(Some("=value")), Err(SubmitError::MalformedLabel(_))));
    }

    #[test]
    fn rejects_reserved_key() {
        assert!(matches!(
            parse(Some("driver-app-selector=x")),
            Err(SubmitError::ReservedLabel(_))
        ));
    }

    #[test]
    fn last_duplicate_wins() {
        let parsed = parse(Some("team=ads,team=infra")).unwrap();
        assert_eq!(parsed.get("team").unwrap(), "infra");
    }

    #[test]
    fn round_trips_valid_input() {
        let parsed = parse(Some("a=1,b=2")).unwrap();
        let rendered: Vec<String> = parsed.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(rendered, vec!["a=1".to_string(), "b=2".to_string()]);
    }
}
