use crate::intern::intern_owned;
use crate::value::{Dict, Value, CLASS_KEY};
use serde_json::Value as JsonValue;

// json of: class markers are dropped and functions have no wire form.
// Integral numbers below 1e15 go out without a decimal point, so counts
// and ids survive a round trip textually unchanged.
fn value_to_json(value: &Value) -> JsonValue
{
    match value
    {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) =>
        {
            if *n == n.floor() && n.abs() < 1e15
            {
                JsonValue::Number(serde_json::Number::from(*n as i64))
            }
            else
            {
                serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        Value::Str(s) => JsonValue::String(s.as_str().to_string()),
        Value::List(list) =>
        {
            let items = list.borrow().iter().map(value_to_json).collect();
            JsonValue::Array(items)
        }
        Value::Dict(dict) =>
        {
            // serde_json's preserve_order map keeps insertion order
            let mut out = serde_json::Map::new();
            for (key, val) in dict.borrow().iter()
            {
                if key.as_str() == CLASS_KEY
                {
                    continue;
                }
                out.insert(key.as_str().to_string(), value_to_json(val));
            }
            JsonValue::Object(out)
        }
        Value::Function(_)
        | Value::NativeFunction(_)
        | Value::BoundMethod(_)
        | Value::ListMap(_) => JsonValue::Null,
    }
}

fn json_to_value(json: JsonValue) -> Value
{
    match json
    {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => Value::Str(intern_owned(s)),
        JsonValue::Array(items) =>
        {
            Value::list(items.into_iter().map(json_to_value).collect())
        }
        JsonValue::Object(map) =>
        {
            let mut out = Dict::new();
            for (key, val) in map
            {
                out.insert(intern_owned(key), json_to_value(val));
            }
            Value::dict(out)
        }
    }
}

pub fn json_of(value: &Value) -> String
{
    serde_json::to_string(&value_to_json(value)).unwrap_or_else(|_| "null".to_string())
}

// Malformed input is a null value, not an error; scripts probe the result.
pub fn parse_json(text: &str) -> Value
{
    match serde_json::from_str::<JsonValue>(text)
    {
        Ok(json) => json_to_value(json),
        Err(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::intern::intern;

    #[test]
    fn round_trip_preserves_key_order()
    {
        let mut map = Dict::new();
        map.insert(intern("name"), Value::string("ada"));
        map.insert(
            intern("ages"),
            Value::list(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]),
        );
        map.insert(intern("ok"), Value::Bool(true));
        let v = Value::dict(map);

        let text = json_of(&v);
        assert_eq!(text, "{\"name\":\"ada\",\"ages\":[1,2,3],\"ok\":true}");
        assert_eq!(json_of(&parse_json(&text)), text);
    }

    #[test]
    fn integral_numbers_have_no_decimal_point()
    {
        assert_eq!(json_of(&Value::Number(3.0)), "3");
        assert_eq!(json_of(&Value::Number(-12.0)), "-12");
        assert_eq!(json_of(&Value::Number(2.5)), "2.5");
    }

    #[test]
    fn class_marker_is_omitted()
    {
        let mut map = Dict::new();
        map.insert(intern(CLASS_KEY), Value::string("Point"));
        map.insert(intern("x"), Value::Number(1.0));
        assert_eq!(json_of(&Value::dict(map)), "{\"x\":1}");
    }

    #[test]
    fn strings_escape_control_characters()
    {
        assert_eq!(json_of(&Value::string("a\"b\\c\nd\te")), "\"a\\\"b\\\\c\\nd\\te\"");
    }

    #[test]
    fn malformed_input_parses_to_null()
    {
        assert!(matches!(parse_json("not json"), Value::Null));
        assert!(matches!(parse_json(""), Value::Null));
    }

    #[test]
    fn scalars_round_trip()
    {
        for text in ["null", "true", "false", "42", "-3.5", "\"hi\""]
        {
            assert_eq!(json_of(&parse_json(text)), text);
        }
    }
}
