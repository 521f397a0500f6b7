//! Handler for the `add` tool.

use std::future::Future;
use std::pin::Pin;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Number, json};

use crate::tools::args::number_arg;
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};

fn as_wide_int(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Sum two JSON numbers.
///
/// Integer inputs give an exact integer sum whenever it fits in `i64` or
/// `u64`. Fractional inputs, or an integer sum outside both ranges, are
/// added as `f64`. Errors only when the `f64` sum is not finite.
pub fn add_numbers(a: &Number, b: &Number) -> Result<Number, String> {
    if let (Some(x), Some(y)) = (as_wide_int(a), as_wide_int(b)) {
        if let Some(sum) = x.checked_add(y) {
            if let Ok(sum) = i64::try_from(sum) {
                return Ok(Number::from(sum));
            }
            if let Ok(sum) = u64::try_from(sum) {
                return Ok(Number::from(sum));
            }
        }
    }

    let x = a.as_f64().unwrap_or_default();
    let y = b.as_f64().unwrap_or_default();
    Number::from_f64(x + y).ok_or_else(|| format!("{} + {} is not a finite number", a, b))
}

/// Handler for the `add` tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddToolHandler;

impl AddToolHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ToolHandler for AddToolHandler {
    fn name(&self) -> &str {
        "add"
    }

    fn title(&self) -> Option<&str> {
        Some("Add Two Numbers")
    }

    fn description(&self) -> &str {
        "Add two numbers and return their sum."
    }

    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));

        let mut properties = serde_json::Map::new();
        properties.insert(
            "a".to_string(),
            json!({ "type": "number", "description": "First addend." }),
        );
        properties.insert(
            "b".to_string(),
            json!({ "type": "number", "description": "Second addend." }),
        );

        schema.insert("properties".to_string(), json!(properties));
        schema.insert("required".to_string(), json!(["a", "b"]));
        schema
    }

    fn output_schema(&self) -> Option<JsonObject> {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert(
            "properties".to_string(),
            json!({ "result": { "type": "number" } }),
        );
        schema.insert("required".to_string(), json!(["result"]));
        Some(schema)
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let sum = number_arg(&args, "a")
                .and_then(|a| number_arg(&args, "b").map(|b| (a, b)))
                .and_then(|(a, b)| add_numbers(a, b));

            Ok(match sum {
                Ok(sum) => success_result(sum.to_string(), json!({ "result": sum })),
                Err(reason) => error_result(reason),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn n(value: Value) -> Number {
        match value {
            Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    async fn call(args: Value) -> CallToolResult {
        let args = args.as_object().cloned().unwrap();
        AddToolHandler::new()
            .execute(args, &ToolContext::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_add_integers() {
        assert_eq!(add_numbers(&n(json!(2)), &n(json!(3))).unwrap(), n(json!(5)));
        assert_eq!(add_numbers(&n(json!(-1)), &n(json!(1))).unwrap(), n(json!(0)));
        assert_eq!(add_numbers(&n(json!(0)), &n(json!(0))).unwrap(), n(json!(0)));
        assert_eq!(add_numbers(&n(json!(-7)), &n(json!(-8))).unwrap(), n(json!(-15)));
    }

    #[test]
    fn test_add_floats() {
        let sum = add_numbers(&n(json!(1.5)), &n(json!(2.25))).unwrap();
        assert_eq!(sum.as_f64(), Some(3.75));

        let sum = add_numbers(&n(json!(2)), &n(json!(0.5))).unwrap();
        assert_eq!(sum.as_f64(), Some(2.5));
    }

    #[test]
    fn test_add_past_i64_range_stays_exact() {
        let sum = add_numbers(&n(json!(i64::MAX)), &n(json!(2))).unwrap();
        assert_eq!(sum.as_u64(), Some(9_223_372_036_854_775_809));
        assert_eq!(sum.to_string(), "9223372036854775809");

        let sum = add_numbers(&n(json!(u64::MAX)), &n(json!(-1))).unwrap();
        assert_eq!(sum.as_u64(), Some(u64::MAX - 1));

        let sum = add_numbers(&n(json!(u64::MAX)), &n(json!(i64::MIN))).unwrap();
        assert_eq!(sum.as_i64(), Some(i64::MAX));
    }

    #[test]
    fn test_add_outside_u64_and_i64_falls_back_to_float() {
        let sum = add_numbers(&n(json!(u64::MAX)), &n(json!(1))).unwrap();
        assert!(sum.is_f64());
        assert_eq!(sum.as_f64(), Some(u64::MAX as f64 + 1.0));

        let sum = add_numbers(&n(json!(i64::MIN)), &n(json!(-1))).unwrap();
        assert!(sum.is_f64());
    }

    #[test]
    fn test_add_non_finite_is_error() {
        assert!(add_numbers(&n(json!(f64::MAX)), &n(json!(f64::MAX))).is_err());
    }

    #[tokio::test]
    async fn test_execute_returns_sum() {
        let result = call(json!({"a": 2, "b": 3})).await;
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content, Some(json!({"result": 5})));
        let text = result.content[0].as_text().map(|t| t.text.clone());
        assert_eq!(text.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_execute_is_idempotent() {
        let first = call(json!({"a": -1, "b": 1})).await;
        let second = call(json!({"a": -1, "b": 1})).await;
        assert_eq!(first.structured_content, Some(json!({"result": 0})));
        assert_eq!(first.structured_content, second.structured_content);
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_arguments() {
        let result = call(json!({"a": 2})).await;
        assert_eq!(result.is_error, Some(true));

        let result = call(json!({"a": "2", "b": 3})).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_schema_requires_both_addends() {
        let schema = AddToolHandler::new().input_schema();
        assert_eq!(schema.get("required"), Some(&json!(["a", "b"])));
        assert_eq!(schema["properties"]["a"]["type"], "number");
    }
}
