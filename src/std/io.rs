use crate::intern::intern;
use crate::value::{Dict, Value};
use std::io::{self, BufRead, Write};

// Terminal collaborator for `ask` and `pause`: one buffered line at a time,
// trailing newline stripped. EOF reads as an empty string.
pub fn read_line() -> String
{
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err()
    {
        return String::new();
    }
    while line.ends_with('\n') || line.ends_with('\r')
    {
        line.pop();
    }
    line
}

pub fn print_prompt(prompt: &str)
{
    if !prompt.is_empty()
    {
        print!("{} ", prompt);
        let _ = io::stdout().flush();
    }
}

fn native_io_alert(args: &[Value]) -> Result<Value, String>
{
    let message = args.first().map(|v| v.to_string()).unwrap_or_default();
    println!("[ALERT] {}", message);
    Ok(Value::Null)
}

fn native_io_prompt(args: &[Value]) -> Result<Value, String>
{
    if let Some(prompt) = args.first()
    {
        print_prompt(&prompt.to_string());
    }
    Ok(Value::string(read_line()))
}

fn native_io_confirm(args: &[Value]) -> Result<Value, String>
{
    if let Some(prompt) = args.first()
    {
        print!("{} (y/n) ", prompt);
        let _ = io::stdout().flush();
    }
    let answer = read_line();
    Ok(Value::Bool(answer == "y" || answer == "Y" || answer == "yes"))
}

pub fn build_io_module() -> Value
{
    let mut map = Dict::new();
    map.insert(intern("alert"), Value::NativeFunction(native_io_alert));
    map.insert(intern("prompt"), Value::NativeFunction(native_io_prompt));
    map.insert(intern("confirm"), Value::NativeFunction(native_io_confirm));
    Value::dict(map)
}
