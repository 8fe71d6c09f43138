use crate::intern::intern;
use crate::value::{Environment, Value};
use std::cell::RefCell;
use std::rc::Rc;

// Numeric prefix parse in the strtod manner: "12abc" is 12, "x" is nothing.
fn parse_number_prefix(text: &str) -> Option<f64>
{
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-')
    {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit()
    {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.'
    {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit()
        {
            end += 1;
        }
    }
    if end == digits_start
    {
        return None;
    }
    // optional exponent, only when digits follow it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E')
    {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-')
        {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit()
        {
            exp_end += 1;
        }
        if exp_end > exp_digits
        {
            end = exp_end;
        }
    }
    trimmed[..end].parse().ok()
}

fn native_parse_int(args: &[Value]) -> Result<Value, String>
{
    let Some(arg) = args.first()
    else
    {
        return Ok(Value::Null);
    };
    match parse_number_prefix(&arg.to_string())
    {
        Some(n) => Ok(Value::Number(n.trunc())),
        None => Ok(Value::Null),
    }
}

fn native_parse_float(args: &[Value]) -> Result<Value, String>
{
    let Some(arg) = args.first()
    else
    {
        return Ok(Value::Null);
    };
    match parse_number_prefix(&arg.to_string())
    {
        Some(n) => Ok(Value::Number(n)),
        None => Ok(Value::Null),
    }
}

fn native_to_string(args: &[Value]) -> Result<Value, String>
{
    match args.first()
    {
        Some(arg) => Ok(Value::string(arg.to_string())),
        None => Ok(Value::string("")),
    }
}

fn native_len(args: &[Value]) -> Result<Value, String>
{
    let len = match args.first()
    {
        Some(Value::Str(s)) => s.len(),
        Some(Value::List(list)) => list.borrow().len(),
        _ => 0,
    };
    Ok(Value::Number(len as f64))
}

// stdlib convenience: add(a, b)
pub fn native_add(args: &[Value]) -> Result<Value, String>
{
    match (args.first(), args.get(1))
    {
        (Some(Value::Number(a)), Some(Value::Number(b))) => Ok(Value::Number(a + b)),
        _ => Err("add expects two numbers".to_string()),
    }
}

// Every program starts with these bindings in the root environment.
pub fn register_globals(env: &Rc<RefCell<Environment>>, script_args: &[String])
{
    let mut env = env.borrow_mut();
    env.define(intern("parseInt"), Value::NativeFunction(native_parse_int));
    env.define(intern("parseFloat"), Value::NativeFunction(native_parse_float));
    env.define(intern("toString"), Value::NativeFunction(native_to_string));
    env.define(intern("len"), Value::NativeFunction(native_len));
    env.define(intern("math"), super::math::build_math_module());
    env.define(
        intern("args"),
        Value::list(script_args.iter().map(|a| Value::string(a.clone())).collect()),
    );
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parse_int_truncates_and_accepts_prefixes()
    {
        let v = native_parse_int(&[Value::string("42abc")]).unwrap();
        assert_eq!(v.to_string(), "42");
        let v = native_parse_int(&[Value::string("-3.9")]).unwrap();
        assert_eq!(v.to_string(), "-3");
        assert!(matches!(
            native_parse_int(&[Value::string("abc")]).unwrap(),
            Value::Null
        ));
        assert!(matches!(native_parse_int(&[]).unwrap(), Value::Null));
    }

    #[test]
    fn parse_float_keeps_fractions_and_exponents()
    {
        let v = native_parse_float(&[Value::string("2.5")]).unwrap();
        assert_eq!(v.to_string(), "2.5");
        let v = native_parse_float(&[Value::string("1e3")]).unwrap();
        assert_eq!(v.to_string(), "1000");
        // a bare exponent marker is not part of the number
        let v = native_parse_float(&[Value::string("7e")]).unwrap();
        assert_eq!(v.to_string(), "7");
    }

    #[test]
    fn len_counts_strings_and_lists()
    {
        assert_eq!(native_len(&[Value::string("abc")]).unwrap().to_string(), "3");
        let list = Value::list(vec![Value::Null, Value::Null]);
        assert_eq!(native_len(&[list]).unwrap().to_string(), "2");
        assert_eq!(native_len(&[Value::Number(9.0)]).unwrap().to_string(), "0");
    }
}
