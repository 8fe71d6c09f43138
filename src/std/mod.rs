pub mod file;
pub mod globals;
pub mod http;
pub mod io;
pub mod math;
pub mod os;

use crate::intern::intern;
use crate::value::{Dict, Value};

// The dict handed out for `get "std"` / `get "stdlib"`.
pub fn build_stdlib_module() -> Value
{
    let mut map = Dict::new();
    map.insert(intern("math"), math::build_math_module());
    map.insert(intern("io"), io::build_io_module());
    map.insert(intern("add"), Value::NativeFunction(globals::native_add));
    Value::dict(map)
}
