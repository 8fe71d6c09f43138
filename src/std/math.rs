use crate::intern::intern;
use crate::value::{Dict, Value};

fn num_arg(args: &[Value], idx: usize, name: &str) -> Result<f64, String>
{
    match args.get(idx)
    {
        Some(Value::Number(n)) => Ok(*n),
        _ => Err(format!("{name} expects a number")),
    }
}

fn native_math_abs(args: &[Value]) -> Result<Value, String>
{
    Ok(Value::Number(num_arg(args, 0, "math.abs")?.abs()))
}

fn native_math_floor(args: &[Value]) -> Result<Value, String>
{
    Ok(Value::Number(num_arg(args, 0, "math.floor")?.floor()))
}

fn native_math_ceil(args: &[Value]) -> Result<Value, String>
{
    Ok(Value::Number(num_arg(args, 0, "math.ceil")?.ceil()))
}

fn native_math_sqrt(args: &[Value]) -> Result<Value, String>
{
    Ok(Value::Number(num_arg(args, 0, "math.sqrt")?.sqrt()))
}

fn native_math_random(_args: &[Value]) -> Result<Value, String>
{
    Ok(Value::Number(rand::random::<f64>()))
}

fn native_math_pow(args: &[Value]) -> Result<Value, String>
{
    let base = num_arg(args, 0, "math.pow")?;
    let exp = num_arg(args, 1, "math.pow")?;
    Ok(Value::Number(base.powf(exp)))
}

pub fn build_math_module() -> Value
{
    let mut map = Dict::new();
    map.insert(intern("abs"), Value::NativeFunction(native_math_abs));
    map.insert(intern("floor"), Value::NativeFunction(native_math_floor));
    map.insert(intern("ceil"), Value::NativeFunction(native_math_ceil));
    map.insert(intern("sqrt"), Value::NativeFunction(native_math_sqrt));
    map.insert(intern("random"), Value::NativeFunction(native_math_random));
    map.insert(intern("pow"), Value::NativeFunction(native_math_pow));
    Value::dict(map)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn math_natives_compute()
    {
        assert_eq!(
            native_math_abs(&[Value::Number(-4.0)]).unwrap().to_string(),
            "4"
        );
        assert_eq!(
            native_math_pow(&[Value::Number(2.0), Value::Number(10.0)])
                .unwrap()
                .to_string(),
            "1024"
        );
        assert!(native_math_sqrt(&[Value::string("x")]).is_err());
    }

    #[test]
    fn random_stays_in_unit_interval()
    {
        for _ in 0..32
        {
            let Value::Number(n) = native_math_random(&[]).unwrap()
            else
            {
                panic!()
            };
            assert!((0.0..1.0).contains(&n));
        }
    }
}
