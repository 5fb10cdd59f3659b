use serde_json::Value;

use crate::config::ConfigError;

/// Source of raw configuration values, keyed by environment variable name.
pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn require_non_empty(lookup: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    optional_trimmed(lookup, key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

pub(crate) fn parse_u64(lookup: Lookup<'_>, key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_trimmed(lookup, key) {
        Some(value) => value.parse::<u64>().map_err(|_| ConfigError::ParseInt {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

pub(crate) fn parse_origin_list_env(lookup: Lookup<'_>, key: &str, default: &[&str]) -> Vec<String> {
    let parsed = optional_trimmed(lookup, key)
        .map(|raw| parse_origin_list(&raw))
        .unwrap_or_default();

    if parsed.is_empty() {
        default.iter().map(|item| (*item).to_string()).collect()
    } else {
        parsed
    }
}

pub(crate) fn optional_trimmed(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Accepts either a JSON array of strings or a comma-separated list.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw)
        && items.iter().all(Value::is_string)
    {
        return items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect();
    }

    parse_csv_list(raw)
}

fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{optional_trimmed, parse_origin_list, parse_origin_list_env, parse_u64};
    use crate::config::ConfigError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn json_array_and_csv_normalize_to_the_same_origins() {
        let expected = vec!["http://a".to_string(), "http://b".to_string()];

        assert_eq!(parse_origin_list(r#"["http://a","http://b"]"#), expected);
        assert_eq!(parse_origin_list("http://a,http://b"), expected);
        assert_eq!(parse_origin_list(" http://a , ,http://b, "), expected);
        assert_eq!(parse_origin_list(r#"[" http://a", "", "http://b "]"#), expected);
    }

    #[test]
    fn parsing_is_idempotent_when_reencoded() {
        let first = parse_origin_list("http://a,http://b");
        let reencoded = serde_json::to_string(&first).expect("origins should serialize");

        assert_eq!(parse_origin_list(&reencoded), first);
        assert_eq!(parse_origin_list(&first.join(",")), first);
    }

    #[test]
    fn non_string_json_falls_through_to_comma_splitting() {
        assert_eq!(parse_origin_list("[1,2]"), vec!["[1", "2]"]);
        assert_eq!(
            parse_origin_list(r#"{"a":"http://a"}"#),
            vec![r#"{"a":"http://a"}"#]
        );
    }

    #[test]
    fn origin_env_falls_back_to_default_when_empty() {
        let lookup = lookup_from(&[("CORS_ORIGINS", " , ")]);
        assert_eq!(
            parse_origin_list_env(&lookup, "CORS_ORIGINS", &["http://localhost:3000"]),
            vec!["http://localhost:3000".to_string()]
        );

        let missing = lookup_from(&[]);
        assert_eq!(
            parse_origin_list_env(&missing, "CORS_ORIGINS", &["http://localhost:3000"]),
            vec!["http://localhost:3000".to_string()]
        );
    }

    #[test]
    fn whitespace_values_count_as_unset() {
        let lookup = lookup_from(&[("KEY", "   ")]);
        assert!(optional_trimmed(&lookup, "KEY").is_none());
    }

    #[test]
    fn parse_u64_reports_key_and_value() {
        let lookup = lookup_from(&[("OPENROUTER_TIMEOUT_MS", "soon")]);
        let err = parse_u64(&lookup, "OPENROUTER_TIMEOUT_MS", 10).expect_err("should fail");

        assert!(matches!(
            err,
            ConfigError::ParseInt { ref key, ref value }
                if key == "OPENROUTER_TIMEOUT_MS" && value == "soon"
        ));
    }
}
