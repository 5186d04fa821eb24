//! Type Operator
//!
//! Per-type parse/render/zero operations for argument values. Argument and
//! flag processors are generic over `ArgValue`; the operator is what turns
//! input tokens into typed values and typed values back into tokens so that
//! shortcuts snapshot the transformed form.

use super::data::Value;

/// Operations every argument value type supports.
///
/// Implemented for `String`, `i64`, `f64`, `bool` and `Vec<_>` of each.
/// Parse errors carry the underlying parser's message verbatim.
pub trait ArgValue: Clone + Send + Sync + 'static {
    /// Short type label used in usage and debug output.
    fn type_name() -> &'static str;

    /// Parse the popped tokens into a value. Single-valued types receive
    /// exactly one token; list types receive the whole run.
    fn parse_tokens(tokens: &[String]) -> Result<Self, String>;

    /// Render the value back into tokens, one per tape cell.
    fn render(&self) -> Vec<String>;

    /// The zero value, used when a completer is invoked on an unparseable
    /// cursor token and for absent bool-value flags.
    fn zero() -> Self;

    fn to_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;

    /// Number of tape cells this value occupies.
    fn token_len(&self) -> usize {
        1
    }

    /// Whether this type consumes a run of tokens rather than one.
    fn is_list() -> bool {
        false
    }
}

fn parse_bool(token: &str) -> Result<bool, String> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(format!("invalid bool value: \"{}\"", token)),
    }
}

fn single_token(tokens: &[String], type_name: &str) -> Result<String, String> {
    match tokens {
        [t] => Ok(t.clone()),
        _ => Err(format!(
            "expected exactly one {} token, got {}",
            type_name,
            tokens.len()
        )),
    }
}

impl ArgValue for String {
    fn type_name() -> &'static str {
        "string"
    }

    fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
        single_token(tokens, Self::type_name())
    }

    fn render(&self) -> Vec<String> {
        vec![self.clone()]
    }

    fn zero() -> Self {
        String::new()
    }

    fn to_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ArgValue for i64 {
    fn type_name() -> &'static str {
        "int"
    }

    fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
        single_token(tokens, Self::type_name())?
            .parse::<i64>()
            .map_err(|e| e.to_string())
    }

    fn render(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    fn zero() -> Self {
        0
    }

    fn to_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl ArgValue for f64 {
    fn type_name() -> &'static str {
        "float"
    }

    fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
        single_token(tokens, Self::type_name())?
            .parse::<f64>()
            .map_err(|e| e.to_string())
    }

    fn render(&self) -> Vec<String> {
        // Render integral floats without the trailing ".0" so a value that
        // arrived as "4" snapshots back as "4".
        if self.fract() == 0.0 && self.is_finite() {
            vec![format!("{}", *self as i64)]
        } else {
            vec![self.to_string()]
        }
    }

    fn zero() -> Self {
        0.0
    }

    fn to_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl ArgValue for bool {
    fn type_name() -> &'static str {
        "bool"
    }

    fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
        parse_bool(&single_token(tokens, Self::type_name())?)
    }

    fn render(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    fn zero() -> Self {
        false
    }

    fn to_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! list_arg_value {
    ($elem:ty, $name:expr, $variant:ident, $parse:expr) => {
        impl ArgValue for Vec<$elem> {
            fn type_name() -> &'static str {
                $name
            }

            fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
                tokens.iter().map(|t| $parse(t)).collect()
            }

            fn render(&self) -> Vec<String> {
                self.iter().flat_map(|v| v.render()).collect()
            }

            fn zero() -> Self {
                Vec::new()
            }

            fn to_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn token_len(&self) -> usize {
                self.len()
            }

            fn is_list() -> bool {
                true
            }
        }
    };
}

list_arg_value!(String, "string list", StringList, |t: &String| Ok::<_, String>(t.clone()));
list_arg_value!(i64, "int list", IntList, |t: &String| t
    .parse::<i64>()
    .map_err(|e| e.to_string()));
list_arg_value!(f64, "float list", FloatList, |t: &String| t
    .parse::<f64>()
    .map_err(|e| e.to_string()));
list_arg_value!(bool, "bool list", BoolList, |t: &String| parse_bool(t));

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(i64::parse_tokens(&toks(&["9"])), Ok(9));
        assert!(i64::parse_tokens(&toks(&["x"])).unwrap_err().contains("invalid digit"));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(f64::parse_tokens(&toks(&["2.2"])), Ok(2.2));
        assert_eq!(f64::parse_tokens(&toks(&["4"])), Ok(4.0));
    }

    #[test]
    fn test_parse_bool_forms() {
        for t in ["true", "T", "1"] {
            assert_eq!(bool::parse_tokens(&toks(&[t])), Ok(true));
        }
        for t in ["false", "F", "0"] {
            assert_eq!(bool::parse_tokens(&toks(&[t])), Ok(false));
        }
        assert!(bool::parse_tokens(&toks(&["yes"])).is_err());
    }

    #[test]
    fn test_list_parse_and_render() {
        let v = Vec::<i64>::parse_tokens(&toks(&["1", "2", "4"])).unwrap();
        assert_eq!(v, vec![1, 2, 4]);
        assert_eq!(v.render(), toks(&["1", "2", "4"]));
        assert_eq!(v.token_len(), 3);
    }

    #[test]
    fn test_float_render_round_trip() {
        // parse(render(v)) == v for shell-emittable values.
        for v in [4.0f64, 2.2, -1.5, 0.0] {
            let rendered = v.render();
            assert_eq!(f64::parse_tokens(&rendered), Ok(v));
        }
    }

    #[test]
    fn test_list_parse_error_position_independent() {
        let err = Vec::<i64>::parse_tokens(&toks(&["1", "x"])).unwrap_err();
        assert!(err.contains("invalid digit"));
    }
}
