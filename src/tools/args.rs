//! Argument extraction shared by the tool handlers.
//!
//! Every helper returns the human-readable reason on failure; handlers turn
//! it into an in-band error result.

use rmcp::model::JsonObject;
use serde_json::{Number, Value};

pub(crate) fn number_arg<'a>(args: &'a JsonObject, key: &str) -> Result<&'a Number, String> {
    match args.get(key) {
        Some(Value::Number(n)) => Ok(n),
        Some(other) => Err(format!(
            "argument `{}` must be a number, got {}",
            key,
            other
        )),
        None => Err(format!("missing required argument `{}`", key)),
    }
}

pub(crate) fn string_arg<'a>(args: &'a JsonObject, key: &str) -> Result<&'a str, String> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(format!("argument `{}` must be a string, got {}", key, other)),
        None => Err(format!("missing required argument `{}`", key)),
    }
}

/// Optional row limit, `default` when absent or null. Any non-negative
/// integer that fits in `u32` is passed on; the backend owns the policy.
pub(crate) fn limit_arg(args: &JsonObject, key: &str, default: u32) -> Result<u32, String> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(v) => v,
    };

    value
        .as_u64()
        .and_then(|limit| u32::try_from(limit).ok())
        .ok_or_else(|| {
            format!(
                "argument `{}` must be a non-negative integer no larger than {}, got {}",
                key,
                u32::MAX,
                value
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_arg() {
        let args = obj(json!({"a": 2, "b": "3"}));
        assert_eq!(number_arg(&args, "a").unwrap().as_i64(), Some(2));
        assert!(number_arg(&args, "b").unwrap_err().contains("must be a number"));
        assert!(number_arg(&args, "c").unwrap_err().contains("missing"));
    }

    #[test]
    fn test_string_arg() {
        let args = obj(json!({"id": "s1", "blank": "  ", "num": 3}));
        assert_eq!(string_arg(&args, "id").unwrap(), "s1");
        assert_eq!(string_arg(&args, "blank").unwrap(), "  ");
        assert!(string_arg(&args, "num").unwrap_err().contains("must be a string"));
        assert!(string_arg(&args, "missing").unwrap_err().contains("missing"));
    }

    #[test]
    fn test_limit_arg() {
        assert_eq!(limit_arg(&obj(json!({})), "limit", 10), Ok(10));
        assert_eq!(limit_arg(&obj(json!({"limit": null})), "limit", 10), Ok(10));
        assert_eq!(limit_arg(&obj(json!({"limit": 25})), "limit", 10), Ok(25));
        assert_eq!(limit_arg(&obj(json!({"limit": 0})), "limit", 10), Ok(0));
        assert_eq!(limit_arg(&obj(json!({"limit": 5000})), "limit", 10), Ok(5000));
        assert_eq!(
            limit_arg(&obj(json!({"limit": u32::MAX})), "limit", 10),
            Ok(u32::MAX)
        );
        assert!(limit_arg(&obj(json!({"limit": u64::from(u32::MAX) + 1})), "limit", 10).is_err());
        assert!(limit_arg(&obj(json!({"limit": -5})), "limit", 10).is_err());
        assert!(limit_arg(&obj(json!({"limit": 2.5})), "limit", 10).is_err());
    }
}
