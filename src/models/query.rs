//! Query parameter models.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum number of primary keys accepted by one export request.
pub const MAX_EXPORT_IDS: usize = 5000;

/// A value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Convert a JSON scalar into a parameter. Arrays and objects become strings.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(QueryParam::from_json(&json!(null)), QueryParam::Null);
        assert_eq!(QueryParam::from_json(&json!(true)), QueryParam::Bool(true));
        assert_eq!(QueryParam::from_json(&json!(42)), QueryParam::Int(42));
        assert_eq!(QueryParam::from_json(&json!(1.5)), QueryParam::Float(1.5));
        assert_eq!(
            QueryParam::from_json(&json!("NF-1")),
            QueryParam::String("NF-1".to_string())
        );
    }

    #[test]
    fn test_from_json_composite_becomes_string() {
        assert_eq!(
            QueryParam::from_json(&json!([1, 2])),
            QueryParam::String("[1,2]".to_string())
        );
    }

    #[test]
    fn test_deserialize_untagged() {
        let params: Vec<QueryParam> = serde_json::from_str(r#"[1, "a", null]"#).unwrap();
        assert_eq!(
            params,
            vec![
                QueryParam::Int(1),
                QueryParam::String("a".to_string()),
                QueryParam::Null
            ]
        );
        assert_eq!(params[0].type_name(), "int");
        assert_eq!(params[2].type_name(), "null");
    }
}
