use crate::ast::{Block, ExprRef, Name};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

// Reserved dict key marking a class instance. The evaluator writes it once
// at construction; it is invisible to keys/values/has/json and to rendering.
pub const CLASS_KEY: &str = "__class__";

pub type NativeFunction = fn(&[Value]) -> Result<Value, String>;
pub type ListRef = Rc<RefCell<Vec<Value>>>;
// Insertion order is part of the language: dict literals, keys of, and the
// JSON round trip all observe it.
pub type Dict = IndexMap<Name, Value>;
pub type DictRef = Rc<RefCell<Dict>>;

#[derive(Debug)]
pub struct FunctionData
{
    pub params: Rc<Vec<Name>>,
    pub body: Block,
    pub env: Rc<RefCell<Environment>>,
}

// Methods fetched off an instance keep their receiver, so passing obj.m
// around as a callback preserves self.
#[derive(Debug)]
pub struct BoundMethod
{
    pub receiver: Value,
    pub method: Rc<FunctionData>,
}

#[derive(Debug)]
pub struct ClassDef
{
    pub name: Name,
    pub fields: Vec<(Name, ExprRef)>,
    pub methods: FxHashMap<Name, Rc<FunctionData>>,
    pub env: Rc<RefCell<Environment>>,
}

#[derive(Debug, Clone)]
pub enum Value
{
    Null,
    Bool(bool),
    Number(f64),
    Str(Name),
    List(ListRef),
    Dict(DictRef),
    Function(Rc<FunctionData>),
    NativeFunction(NativeFunction),
    BoundMethod(Rc<BoundMethod>),
    // the virtual .map member of lists
    ListMap(ListRef),
}

impl Value
{
    pub fn string(s: impl Into<String>) -> Self
    {
        Value::Str(crate::intern::intern_owned(s.into()))
    }

    pub fn list(items: Vec<Value>) -> Self
    {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(map: Dict) -> Self
    {
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    pub fn is_truthy(&self) -> bool
    {
        match self
        {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_)
            | Value::NativeFunction(_)
            | Value::BoundMethod(_)
            | Value::ListMap(_) => "function",
        }
    }

    pub fn as_number(&self) -> Option<f64>
    {
        match self
        {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    // The class marker, if this value is a class instance.
    pub fn class_name(&self) -> Option<Name>
    {
        match self
        {
            Value::Dict(dict) => match dict.borrow().get(&crate::intern::intern(CLASS_KEY))
            {
                Some(Value::Str(name)) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

pub fn format_number(n: f64) -> String
{
    if n == n.floor() && n.abs() < 1e15
    {
        format!("{}", n as i64)
    }
    else
    {
        format!("{}", n)
    }
}

impl fmt::Display for Value
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(list) =>
            {
                write!(f, "[")?;
                for (i, item) in list.borrow().iter().enumerate()
                {
                    if i > 0
                    {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(dict) =>
            {
                let map = dict.borrow();
                if let Some(Value::Str(class)) = map.get(&crate::intern::intern(CLASS_KEY))
                {
                    write!(f, "{}{{ ", class)?;
                    let mut first = true;
                    for (key, val) in map.iter()
                    {
                        if key.as_str() == CLASS_KEY
                        {
                            continue;
                        }
                        if !first
                        {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: {}", key, val)?;
                        first = false;
                    }
                    return write!(f, " }}");
                }
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate()
                {
                    if i > 0
                    {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", key, val)?;
                }
                write!(f, "}}")
            }
            Value::Function(_)
            | Value::NativeFunction(_)
            | Value::BoundMethod(_)
            | Value::ListMap(_) => write!(f, "<function>"),
        }
    }
}

#[derive(Debug)]
pub struct Environment
{
    pub vars: IndexMap<Name, Value>,
    pub parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment
{
    pub fn new(parent: Option<Rc<RefCell<Environment>>>) -> Self
    {
        Self {
            vars: IndexMap::new(),
            parent,
        }
    }

    pub fn child(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>>
    {
        Rc::new(RefCell::new(Environment::new(Some(parent.clone()))))
    }

    pub fn get(&self, name: &Name) -> Option<Value>
    {
        if let Some(val) = self.vars.get(name)
        {
            return Some(val.clone());
        }
        match &self.parent
        {
            Some(parent) => parent.borrow().get(name),
            None => None,
        }
    }

    // `let` always lands in the current scope.
    pub fn define(&mut self, name: Name, value: Value)
    {
        self.vars.insert(name, value);
    }

    // `set x = ...` updates wherever the binding lives; false when the name
    // is not bound anywhere on the chain.
    pub fn assign(&mut self, name: &Name, value: Value) -> bool
    {
        if let Some(slot) = self.vars.get_mut(name)
        {
            *slot = value;
            return true;
        }
        match &self.parent
        {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::intern::intern;

    #[test]
    fn truthiness_table()
    {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-2.5).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(Value::list(Vec::new()).is_truthy());
        assert!(Value::dict(Dict::new()).is_truthy());
    }

    #[test]
    fn numbers_render_integral_without_decimal_point()
    {
        assert_eq!(Value::Number(55.0).to_string(), "55");
        assert_eq!(Value::Number(-7.0).to_string(), "-7");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(1e15).to_string(), "1000000000000000");
        assert_eq!(Value::Number(1e16).to_string(), "10000000000000000");
    }

    #[test]
    fn lists_and_dicts_render_recursively()
    {
        let inner = Value::list(vec![Value::Number(1.0), Value::Number(2.0)]);
        let list = Value::list(vec![inner, Value::string("x")]);
        assert_eq!(list.to_string(), "[[1,2],x]");

        let mut map = Dict::new();
        map.insert(intern("b"), Value::Number(2.0));
        map.insert(intern("a"), Value::Number(1.0));
        // insertion order, not key order
        assert_eq!(Value::dict(map).to_string(), "{b:2,a:1}");
    }

    #[test]
    fn class_instances_render_with_their_name()
    {
        let mut map = Dict::new();
        map.insert(intern(CLASS_KEY), Value::string("Point"));
        map.insert(intern("x"), Value::Number(3.0));
        map.insert(intern("y"), Value::Number(4.0));
        let instance = Value::dict(map);
        assert_eq!(instance.to_string(), "Point{ x: 3, y: 4 }");
        assert_eq!(instance.class_name().unwrap().as_str(), "Point");
    }

    #[test]
    fn environment_chain_lookup_and_assignment()
    {
        let root = Rc::new(RefCell::new(Environment::new(None)));
        let x = intern("x");
        root.borrow_mut().define(x.clone(), Value::Number(1.0));

        let child = Environment::child(&root);
        assert_eq!(child.borrow().get(&x).unwrap().to_string(), "1");

        // assignment walks to the owning scope
        assert!(child.borrow_mut().assign(&x, Value::Number(2.0)));
        assert_eq!(root.borrow().get(&x).unwrap().to_string(), "2");

        // definition shadows locally
        child.borrow_mut().define(x.clone(), Value::Number(9.0));
        assert_eq!(child.borrow().get(&x).unwrap().to_string(), "9");
        assert_eq!(root.borrow().get(&x).unwrap().to_string(), "2");

        assert!(!child.borrow_mut().assign(&intern("missing"), Value::Null));
    }
}
