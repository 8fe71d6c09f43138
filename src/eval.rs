use crate::ast::{BinOp, Block, Expr, ExprKind, ExprRef, Name, Stmt, StmtKind, UnOp};
use crate::intern::intern;
use crate::ironwood_std as std_mod;
use crate::json;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{BoundMethod, ClassDef, Dict, Environment, FunctionData, Value, CLASS_KEY};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct RuntimeError
{
    pub line: usize,
    pub message: String,
}

// The unwind channel. Return/Break/Continue/Throw are control flow, not
// errors: try/catch observes Throw and Error and nothing else.
#[derive(Debug)]
pub enum Signal
{
    Return(Value),
    Break(usize),
    Continue(usize),
    Throw(usize, String),
    Error(RuntimeError),
}

fn fail(line: usize, message: impl Into<String>) -> Signal
{
    Signal::Error(RuntimeError {
        line,
        message: message.into(),
    })
}

type EvalResult = Result<Value, Signal>;

pub struct Interpreter
{
    globals: Rc<RefCell<Environment>>,
    classes: FxHashMap<Name, Rc<ClassDef>>,
    // Loaded module trees and environments stay alive for the whole run:
    // module functions may close over module locals and be called long
    // after the module's top-level script finishes.
    module_asts: Vec<Block>,
    module_envs: Vec<Rc<RefCell<Environment>>>,
}

impl Interpreter
{
    pub fn new(script_args: Vec<String>) -> Self
    {
        let globals = Rc::new(RefCell::new(Environment::new(None)));
        std_mod::globals::register_globals(&globals, &script_args);
        Self {
            globals,
            classes: FxHashMap::default(),
            module_asts: Vec::new(),
            module_envs: Vec::new(),
        }
    }

    pub fn run(&mut self, program: &[Stmt]) -> Result<Value, RuntimeError>
    {
        let env = self.globals.clone();
        match self.exec_block(program, &env)
        {
            Ok(value) => Ok(value),
            Err(Signal::Error(err)) => Err(err),
            Err(Signal::Throw(line, message)) => Err(RuntimeError {
                line,
                message: format!("Uncaught error: {}", message),
            }),
            Err(Signal::Break(line)) => Err(RuntimeError {
                line,
                message: "'break' used outside of a loop".to_string(),
            }),
            Err(Signal::Continue(line)) => Err(RuntimeError {
                line,
                message: "'continue' used outside of a loop".to_string(),
            }),
            Err(Signal::Return(_)) => Err(RuntimeError {
                line: 0,
                message: "'return' used outside of a function".to_string(),
            }),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Rc<RefCell<Environment>>) -> EvalResult
    {
        let mut last = Value::Null;
        for stmt in stmts
        {
            last = self.exec_stmt(stmt, env)?;
        }
        Ok(last)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Rc<RefCell<Environment>>) -> EvalResult
    {
        let line = stmt.line;
        match &stmt.kind
        {
            StmtKind::Let { name, init } =>
            {
                let value = self.eval_expr(init, env)?;
                env.borrow_mut().define(name.clone(), value);
                Ok(Value::Null)
            }
            StmtKind::Set { target, value } =>
            {
                let value = self.eval_expr(value, env)?;
                self.assign_lvalue(target, value, env)?;
                Ok(Value::Null)
            }
            StmtKind::AddTo { value, target } =>
            {
                let value = self.eval_expr(value, env)?;
                let target = self.eval_expr(target, env)?;
                match target
                {
                    Value::List(list) =>
                    {
                        list.borrow_mut().push(value);
                        Ok(Value::Null)
                    }
                    _ => Err(fail(line, "Can't add to that — it's not a list.")),
                }
            }
            StmtKind::Say(expr) =>
            {
                let value = self.eval_expr(expr, env)?;
                println!("{}", value);
                Ok(Value::Null)
            }
            StmtKind::Ask { name, prompt } =>
            {
                let prompt = self.eval_expr(prompt, env)?.to_string();
                std_mod::io::print_prompt(&prompt);
                let input = Value::string(std_mod::io::read_line());
                if !env.borrow_mut().assign(name, input.clone())
                {
                    env.borrow_mut().define(name.clone(), input);
                }
                Ok(Value::Null)
            }
            StmtKind::Pause =>
            {
                std_mod::io::print_prompt("[Press Enter to continue...]");
                std_mod::io::read_line();
                Ok(Value::Null)
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } =>
            {
                let branch_env = Environment::child(env);
                if self.eval_expr(cond, env)?.is_truthy()
                {
                    self.exec_block(then_body, &branch_env)?;
                }
                else
                {
                    self.exec_block(else_body, &branch_env)?;
                }
                Ok(Value::Null)
            }
            StmtKind::While { cond, body } =>
            {
                while self.eval_expr(cond, env)?.is_truthy()
                {
                    // fresh scope every iteration
                    let loop_env = Environment::child(env);
                    match self.exec_block(body, &loop_env)
                    {
                        Ok(_) =>
                        {}
                        Err(Signal::Break(_)) => break,
                        Err(Signal::Continue(_)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::For {
                var,
                iterable,
                body,
            } =>
            {
                let items = self.iterable_items(iterable, env)?;
                for item in items
                {
                    let loop_env = Environment::child(env);
                    loop_env.borrow_mut().define(var.clone(), item);
                    match self.exec_block(body, &loop_env)
                    {
                        Ok(_) =>
                        {}
                        Err(Signal::Break(_)) => break,
                        Err(Signal::Continue(_)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::Break => Err(Signal::Break(line)),
            StmtKind::Continue => Err(Signal::Continue(line)),
            StmtKind::Return(value) =>
            {
                let value = self.eval_expr(value, env)?;
                Err(Signal::Return(value))
            }
            StmtKind::Func { name, params, body } =>
            {
                let func = Value::Function(Rc::new(FunctionData {
                    params: params.clone(),
                    body: body.clone(),
                    env: env.clone(),
                }));
                env.borrow_mut().define(name.clone(), func);
                Ok(Value::Null)
            }
            StmtKind::Call(expr) =>
            {
                self.eval_expr(expr, env)?;
                Ok(Value::Null)
            }
            StmtKind::Get { path, alias } =>
            {
                let module = self.load_module(path, line)?;
                env.borrow_mut().define(alias.clone(), module);
                Ok(Value::Null)
            }
            StmtKind::Class { name, body } =>
            {
                self.define_class(name, body, env);
                Ok(Value::Null)
            }
            StmtKind::Try {
                body,
                catch_var,
                catch_body,
            } =>
            {
                let try_env = Environment::child(env);
                match self.exec_block(body, &try_env)
                {
                    Ok(_) => Ok(Value::Null),
                    // control flow always passes through a try block
                    Err(sig @ Signal::Return(_))
                    | Err(sig @ Signal::Break(_))
                    | Err(sig @ Signal::Continue(_)) => Err(sig),
                    Err(Signal::Throw(_, message)) | Err(Signal::Error(RuntimeError { message, .. })) =>
                    {
                        let catch_env = Environment::child(env);
                        catch_env
                            .borrow_mut()
                            .define(catch_var.clone(), Value::string(message));
                        self.exec_block(catch_body, &catch_env)?;
                        Ok(Value::Null)
                    }
                }
            }
            StmtKind::Throw(value) =>
            {
                let value = self.eval_expr(value, env)?;
                Err(Signal::Throw(line, value.to_string()))
            }
            StmtKind::WriteFile { content, path } =>
            {
                let path = self.eval_expr(path, env)?.to_string();
                let content = self.eval_expr(content, env)?.to_string();
                match std_mod::file::write_file(&path, &content)
                {
                    Ok(()) => Ok(Value::Null),
                    Err(_) => Err(Signal::Throw(line, format!("Can't write to file: {}", path))),
                }
            }
            StmtKind::AppendFile { content, path } =>
            {
                let path = self.eval_expr(path, env)?.to_string();
                let content = self.eval_expr(content, env)?.to_string();
                match std_mod::file::append_file(&path, &content)
                {
                    Ok(()) => Ok(Value::Null),
                    Err(_) =>
                    {
                        Err(Signal::Throw(line, format!("Can't append to file: {}", path)))
                    }
                }
            }
            StmtKind::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    fn iterable_items(
        &mut self,
        iterable: &Expr,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Vec<Value>, Signal>
    {
        let value = self.eval_expr(iterable, env)?;
        Ok(match value
        {
            Value::List(list) => list.borrow().clone(),
            Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
            Value::Dict(dict) => dict
                .borrow()
                .keys()
                .filter(|k| k.as_str() != CLASS_KEY)
                .map(|k| Value::Str(k.clone()))
                .collect(),
            _ => Vec::new(),
        })
    }

    fn define_class(&mut self, name: &Name, body: &[Stmt], env: &Rc<RefCell<Environment>>)
    {
        let mut fields = Vec::new();
        let mut methods = FxHashMap::default();
        for stmt in body
        {
            match &stmt.kind
            {
                StmtKind::Let { name, init } => fields.push((name.clone(), init.clone())),
                StmtKind::Func { name, params, body } =>
                {
                    methods.insert(
                        name.clone(),
                        Rc::new(FunctionData {
                            params: params.clone(),
                            body: body.clone(),
                            env: env.clone(),
                        }),
                    );
                }
                // anything else in a class body is inert
                _ =>
                {}
            }
        }
        let def = Rc::new(ClassDef {
            name: name.clone(),
            fields,
            methods,
            env: env.clone(),
        });
        self.classes.insert(name.clone(), def);
    }

    fn assign_lvalue(
        &mut self,
        target: &Expr,
        value: Value,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<(), Signal>
    {
        match &target.kind
        {
            ExprKind::Var(name) =>
            {
                if !env.borrow_mut().assign(name, value)
                {
                    return Err(fail(
                        target.line,
                        format!(
                            "Can't change '{}' — use 'let {} = ...' to create it first.",
                            name, name
                        ),
                    ));
                }
                Ok(())
            }
            ExprKind::Index {
                target: obj,
                index,
            } =>
            {
                let obj = self.eval_expr(obj, env)?;
                let idx = self.eval_expr(index, env)?;
                match obj
                {
                    Value::List(list) =>
                    {
                        if let Value::Number(n) = idx
                        {
                            let len = list.borrow().len();
                            let i = n as i64;
                            if i < 0 || i as usize >= len
                            {
                                return Err(fail(
                                    target.line,
                                    format!(
                                        "Index {} is out of bounds — the list has {} items.",
                                        i, len
                                    ),
                                ));
                            }
                            list.borrow_mut()[i as usize] = value;
                        }
                        Ok(())
                    }
                    Value::Dict(dict) =>
                    {
                        let key = idx.to_string();
                        // the class marker is written once, at construction
                        if key != CLASS_KEY
                        {
                            dict.borrow_mut().insert(intern(&key), value);
                        }
                        Ok(())
                    }
                    _ => Ok(()),
                }
            }
            ExprKind::Member {
                target: obj,
                field,
            } =>
            {
                let obj = self.eval_expr(obj, env)?;
                if let Value::Dict(dict) = obj
                {
                    if field.as_str() != CLASS_KEY
                    {
                        dict.borrow_mut().insert(field.clone(), value);
                    }
                }
                Ok(())
            }
            // any other shape is silently ignored
            _ => Ok(()),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<RefCell<Environment>>) -> EvalResult
    {
        let line = expr.line;
        match &expr.kind
        {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Str(s) =>
            {
                let expanded = self.interpolate(s, env)?;
                Ok(Value::string(expanded))
            }
            ExprKind::Var(name) => match env.borrow().get(name)
            {
                Some(value) => Ok(value),
                None => Err(fail(
                    line,
                    format!(
                        "I don't know what '{}' is — did you forget 'let {} = ...'?",
                        name, name
                    ),
                )),
            },
            ExprKind::List(elems) =>
            {
                let mut items = Vec::with_capacity(elems.len());
                for elem in elems
                {
                    items.push(self.eval_expr(elem, env)?);
                }
                Ok(Value::list(items))
            }
            ExprKind::Object(pairs) =>
            {
                let mut map = Dict::new();
                for (key, value) in pairs
                {
                    let value = self.eval_expr(value, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::dict(map))
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env, line),
            ExprKind::Unary { op, operand } =>
            {
                let value = self.eval_expr(operand, env)?;
                Ok(match op
                {
                    UnOp::Neg => match value
                    {
                        Value::Number(n) => Value::Number(-n),
                        _ => Value::Null,
                    },
                    UnOp::Not => Value::Bool(!value.is_truthy()),
                })
            }
            ExprKind::Member { target, field } => self.eval_member(target, field, env, line),
            ExprKind::Index { target, index } =>
            {
                let obj = self.eval_expr(target, env)?;
                let idx = self.eval_expr(index, env)?;
                Ok(match obj
                {
                    Value::List(list) => match idx
                    {
                        Value::Number(n) =>
                        {
                            let i = n as i64;
                            let list = list.borrow();
                            if i >= 0 && (i as usize) < list.len()
                            {
                                list[i as usize].clone()
                            }
                            else
                            {
                                Value::Null
                            }
                        }
                        _ => Value::Null,
                    },
                    Value::Dict(dict) =>
                    {
                        let key = intern(&idx.to_string());
                        dict.borrow().get(&key).cloned().unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                })
            }
            ExprKind::Call { callee, args } =>
            {
                let callee = self.eval_expr(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args
                {
                    arg_values.push(self.eval_expr(arg, env)?);
                }
                self.call_value(&callee, arg_values, line)
            }
            ExprKind::LengthOf(target) =>
            {
                let value = self.eval_expr(target, env)?;
                match value
                {
                    Value::List(list) => Ok(Value::Number(list.borrow().len() as f64)),
                    Value::Str(s) => Ok(Value::Number(s.len() as f64)),
                    other => Err(fail(
                        line,
                        format!("'length of' works on lists and text, not {}", other),
                    )),
                }
            }
            ExprKind::ItemOf { index, list } =>
            {
                let idx = self.eval_expr(index, env)?;
                let target = self.eval_expr(list, env)?;
                if let (Value::Number(n), Value::List(list)) = (&idx, &target)
                {
                    let list = list.borrow();
                    // the surface language counts from one
                    let i = *n as i64 - 1;
                    if i < 0 || i as usize >= list.len()
                    {
                        return Err(fail(
                            line,
                            format!(
                                "Item {} is out of bounds — the list has {} items.",
                                *n as i64,
                                list.len()
                            ),
                        ));
                    }
                    return Ok(list[i as usize].clone());
                }
                Ok(Value::Null)
            }
            ExprKind::KeepWhere { list, pred } =>
            {
                let target = self.eval_expr(list, env)?;
                let pred = self.eval_expr(pred, env)?;
                match target
                {
                    Value::List(list) =>
                    {
                        let snapshot = list.borrow().clone();
                        let mut kept = Vec::new();
                        for item in snapshot
                        {
                            if self.call_value(&pred, vec![item.clone()], line)?.is_truthy()
                            {
                                kept.push(item);
                            }
                        }
                        Ok(Value::list(kept))
                    }
                    _ => Err(fail(line, "'keep items in' expects a list")),
                }
            }
            ExprKind::New { class, args } => self.eval_new(class, args, env, line),
            ExprKind::Has { item, collection } =>
            {
                let item = self.eval_expr(item, env)?;
                let collection = self.eval_expr(collection, env)?;
                Ok(Value::Bool(match collection
                {
                    Value::List(list) =>
                    {
                        let needle = item.to_string();
                        list.borrow().iter().any(|v| v.to_string() == needle)
                    }
                    Value::Dict(dict) =>
                    {
                        let key = item.to_string();
                        key != CLASS_KEY && dict.borrow().contains_key(&intern(&key))
                    }
                    Value::Str(s) => s.contains(&item.to_string()),
                    _ => false,
                }))
            }
            ExprKind::KeysOf(target) =>
            {
                let value = self.eval_expr(target, env)?;
                match value
                {
                    Value::Dict(dict) => Ok(Value::list(
                        dict.borrow()
                            .keys()
                            .filter(|k| k.as_str() != CLASS_KEY)
                            .map(|k| Value::Str(k.clone()))
                            .collect(),
                    )),
                    _ => Err(fail(line, "'keys of' expects an object/dictionary")),
                }
            }
            ExprKind::ValuesOf(target) =>
            {
                let value = self.eval_expr(target, env)?;
                match value
                {
                    Value::Dict(dict) => Ok(Value::list(
                        dict.borrow()
                            .iter()
                            .filter(|(k, _)| k.as_str() != CLASS_KEY)
                            .map(|(_, v)| v.clone())
                            .collect(),
                    )),
                    _ => Err(fail(line, "'values of' expects an object/dictionary")),
                }
            }
            ExprKind::ReadFile(path) =>
            {
                let path = self.eval_expr(path, env)?.to_string();
                match std_mod::file::read_file(&path)
                {
                    Ok(content) => Ok(Value::string(content)),
                    Err(_) => Err(Signal::Throw(line, format!("Can't open file: {}", path))),
                }
            }
            ExprKind::FileExists(path) =>
            {
                let path = self.eval_expr(path, env)?.to_string();
                Ok(Value::Bool(std_mod::file::file_exists(&path)))
            }
            ExprKind::LinesOfFile(path) =>
            {
                let path = self.eval_expr(path, env)?.to_string();
                match std_mod::file::read_lines(&path)
                {
                    Ok(lines) =>
                    {
                        Ok(Value::list(lines.into_iter().map(Value::string).collect()))
                    }
                    Err(_) => Err(Signal::Throw(line, format!("Can't open file: {}", path))),
                }
            }
            ExprKind::Lambda { params, body } => Ok(Value::Function(Rc::new(FunctionData {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } =>
            {
                if self.eval_expr(cond, env)?.is_truthy()
                {
                    self.eval_expr(then, env)
                }
                else
                {
                    self.eval_expr(otherwise, env)
                }
            }
            ExprKind::Split { text, sep } =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                let sep = self.eval_expr(sep, env)?.to_string();
                let parts: Vec<Value> = if sep.is_empty()
                {
                    text.chars().map(|c| Value::string(c.to_string())).collect()
                }
                else
                {
                    text.split(sep.as_str()).map(Value::string).collect()
                };
                Ok(Value::list(parts))
            }
            ExprKind::Join { list, sep } =>
            {
                let sep = self.eval_expr(sep, env)?.to_string();
                let target = self.eval_expr(list, env)?;
                match target
                {
                    Value::List(list) =>
                    {
                        let joined = list
                            .borrow()
                            .iter()
                            .map(|v| v.to_string())
                            .collect::<Vec<_>>()
                            .join(&sep);
                        Ok(Value::string(joined))
                    }
                    other => Ok(Value::string(other.to_string())),
                }
            }
            ExprKind::Trim(text) =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                Ok(Value::string(
                    text.trim_matches(&[' ', '\t', '\n', '\r'][..]).to_string(),
                ))
            }
            ExprKind::Replace { text, from, to } =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                let from = self.eval_expr(from, env)?.to_string();
                let to = self.eval_expr(to, env)?.to_string();
                if from.is_empty()
                {
                    return Ok(Value::string(text));
                }
                Ok(Value::string(text.replace(&from, &to)))
            }
            ExprKind::IndexOf { needle, haystack } =>
            {
                let haystack = self.eval_expr(haystack, env)?.to_string();
                let needle = self.eval_expr(needle, env)?.to_string();
                Ok(Value::Number(match haystack.find(&needle)
                {
                    Some(pos) => pos as f64,
                    None => -1.0,
                }))
            }
            ExprKind::Uppercase(text) =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                Ok(Value::string(text.to_uppercase()))
            }
            ExprKind::Lowercase(text) =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                Ok(Value::string(text.to_lowercase()))
            }
            ExprKind::Substr { text, from, to } =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                let from = self
                    .eval_expr(from, env)?
                    .as_number()
                    .ok_or_else(|| fail(line, "'chars' expects numbers"))?;
                let to = self
                    .eval_expr(to, env)?
                    .as_number()
                    .ok_or_else(|| fail(line, "'chars' expects numbers"))?;
                let bytes = text.as_bytes();
                let from = (from as i64).max(0) as usize;
                let to = (to as i64).min(bytes.len() as i64).max(0) as usize;
                if from >= to
                {
                    return Ok(Value::string(""));
                }
                Ok(Value::string(
                    String::from_utf8_lossy(&bytes[from..to]).to_string(),
                ))
            }
            ExprKind::TypeOf(target) =>
            {
                let value = self.eval_expr(target, env)?;
                Ok(Value::string(value.type_name()))
            }
            ExprKind::Sort { list, key } => self.eval_sort(list, key.as_deref(), env, line),
            ExprKind::ParseJson(text) =>
            {
                let text = self.eval_expr(text, env)?.to_string();
                Ok(json::parse_json(&text))
            }
            ExprKind::JsonOf(target) =>
            {
                let value = self.eval_expr(target, env)?;
                Ok(Value::string(json::json_of(&value)))
            }
            ExprKind::Fetch { url, opts } => self.eval_fetch(url, opts.as_deref(), env),
            ExprKind::Run(cmd) =>
            {
                let cmd = self.eval_expr(cmd, env)?.to_string();
                let mut map = Dict::new();
                match std_mod::os::run_command(&cmd)
                {
                    Ok((output, code)) =>
                    {
                        map.insert(intern("output"), Value::string(output));
                        map.insert(intern("code"), Value::Number(code as f64));
                        map.insert(intern("ok"), Value::Bool(code == 0));
                    }
                    Err(message) =>
                    {
                        map.insert(intern("output"), Value::string(message));
                        map.insert(intern("code"), Value::Number(-1.0));
                        map.insert(intern("ok"), Value::Bool(false));
                    }
                }
                Ok(Value::dict(map))
            }
            ExprKind::Ask(prompt) =>
            {
                let prompt = self.eval_expr(prompt, env)?.to_string();
                std_mod::io::print_prompt(&prompt);
                Ok(Value::string(std_mod::io::read_line()))
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &Rc<RefCell<Environment>>,
        line: usize,
    ) -> EvalResult
    {
        // and/or short-circuit and yield the operand that decided them
        if op == BinOp::And
        {
            let left = self.eval_expr(left, env)?;
            return if left.is_truthy()
            {
                self.eval_expr(right, env)
            }
            else
            {
                Ok(left)
            };
        }
        if op == BinOp::Or
        {
            let left = self.eval_expr(left, env)?;
            return if left.is_truthy()
            {
                Ok(left)
            }
            else
            {
                self.eval_expr(right, env)
            };
        }

        let left = self.eval_expr(left, env)?;
        let right = self.eval_expr(right, env)?;

        if op == BinOp::Add
        {
            return Ok(match (left.as_number(), right.as_number())
            {
                (Some(a), Some(b)) => Value::Number(a + b),
                _ => Value::string(format!("{}{}", left, right)),
            });
        }
        if let (Some(a), Some(b)) = (left.as_number(), right.as_number())
        {
            match op
            {
                BinOp::Sub => return Ok(Value::Number(a - b)),
                BinOp::Mul => return Ok(Value::Number(a * b)),
                BinOp::Div =>
                {
                    if b == 0.0
                    {
                        return Err(fail(line, "Can't divide by zero!"));
                    }
                    return Ok(Value::Number(a / b));
                }
                BinOp::Mod => return Ok(Value::Number(a % b)),
                BinOp::Lt => return Ok(Value::Bool(a < b)),
                BinOp::Gt => return Ok(Value::Bool(a > b)),
                BinOp::Leq => return Ok(Value::Bool(a <= b)),
                BinOp::Geq => return Ok(Value::Bool(a >= b)),
                _ =>
                {}
            }
        }
        match op
        {
            // equality is defined over the string renderings
            BinOp::Eq => Ok(Value::Bool(left.to_string() == right.to_string())),
            BinOp::Neq => Ok(Value::Bool(left.to_string() != right.to_string())),
            _ => Ok(Value::Null),
        }
    }

    fn eval_member(
        &mut self,
        target: &Expr,
        field: &Name,
        env: &Rc<RefCell<Environment>>,
        line: usize,
    ) -> EvalResult
    {
        let obj = self.eval_expr(target, env)?;
        match &obj
        {
            Value::List(list) =>
            {
                if field.as_str() == "length"
                {
                    return Ok(Value::Number(list.borrow().len() as f64));
                }
                if field.as_str() == "map"
                {
                    return Ok(Value::ListMap(list.clone()));
                }
                Err(fail(line, format!("Can't access '.{}' on that value.", field)))
            }
            Value::Dict(dict) =>
            {
                // class instances resolve methods first, as bound methods
                if let Some(class) = obj.class_name()
                {
                    if let Some(def) = self.classes.get(&class)
                    {
                        if let Some(method) = def.methods.get(field)
                        {
                            return Ok(Value::BoundMethod(Rc::new(BoundMethod {
                                receiver: obj.clone(),
                                method: method.clone(),
                            })));
                        }
                    }
                }
                if field.as_str() != CLASS_KEY
                {
                    if let Some(value) = dict.borrow().get(field)
                    {
                        return Ok(value.clone());
                    }
                }
                Ok(Value::Null)
            }
            _ => Err(fail(line, format!("Can't access '.{}' on that value.", field))),
        }
    }

    fn eval_new(
        &mut self,
        class: &Name,
        args: &[ExprRef],
        env: &Rc<RefCell<Environment>>,
        line: usize,
    ) -> EvalResult
    {
        let Some(def) = self.classes.get(class).cloned()
        else
        {
            return Err(fail(
                line,
                format!(
                    "Unknown class: {} — did you define it with 'class {}'?",
                    class, class
                ),
            ));
        };

        let mut fields = Dict::new();
        fields.insert(intern(CLASS_KEY), Value::Str(class.clone()));
        let instance = Value::dict(fields);

        // defaults evaluate in the environment the class was defined in
        for (name, default) in &def.fields
        {
            let value = self.eval_expr(default, &def.env)?;
            if let Value::Dict(dict) = &instance
            {
                dict.borrow_mut().insert(name.clone(), value);
            }
        }

        if let Some(init) = def.methods.get(&intern("init"))
        {
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args
            {
                arg_values.push(self.eval_expr(arg, env)?);
            }
            self.call_function(&init.clone(), arg_values, Some(instance.clone()))?;
        }
        Ok(instance)
    }

    fn eval_sort(
        &mut self,
        list: &Expr,
        key: Option<&Expr>,
        env: &Rc<RefCell<Environment>>,
        line: usize,
    ) -> EvalResult
    {
        let target = self.eval_expr(list, env)?;
        let Value::List(list) = &target
        else
        {
            return Ok(target);
        };
        let items = list.borrow().clone();

        // extract a key per element up front, then compare without
        // re-entering user code: numbers numerically, the rest by rendering
        let mut keyed: Vec<((Option<f64>, String), Value)> = Vec::with_capacity(items.len());
        match key
        {
            None =>
            {
                for item in items
                {
                    let k = (item.as_number(), item.to_string());
                    keyed.push((k, item));
                }
            }
            Some(key) =>
            {
                let key_value = self.eval_expr(key, env)?;
                if let Value::Str(field) = &key_value
                {
                    // field shorthand: sort people by age
                    for item in items
                    {
                        let extracted = match &item
                        {
                            Value::Dict(dict) =>
                            {
                                dict.borrow().get(field).cloned().unwrap_or(Value::Null)
                            }
                            _ => Value::Null,
                        };
                        keyed.push(((extracted.as_number(), extracted.to_string()), item));
                    }
                }
                else
                {
                    for item in items
                    {
                        let extracted =
                            self.call_value(&key_value, vec![item.clone()], line)?;
                        keyed.push(((extracted.as_number(), extracted.to_string()), item));
                    }
                }
            }
        }

        keyed.sort_by(|(ka, _), (kb, _)| match (ka.0, kb.0)
        {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            _ => ka.1.cmp(&kb.1),
        });
        Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect()))
    }

    fn eval_fetch(
        &mut self,
        url: &Expr,
        opts: Option<&Expr>,
        env: &Rc<RefCell<Environment>>,
    ) -> EvalResult
    {
        let url = self.eval_expr(url, env)?.to_string();
        let mut method = "GET".to_string();
        let mut body = String::new();
        let mut headers: Vec<(String, String)> = Vec::new();

        if let Some(opts) = opts
        {
            let opts = self.eval_expr(opts, env)?;
            if let Value::Dict(dict) = opts
            {
                let dict = dict.borrow();
                if let Some(m) = dict.get(&intern("method"))
                {
                    let m = m.to_string();
                    if !m.is_empty()
                    {
                        method = m.to_uppercase();
                    }
                }
                if let Some(b) = dict.get(&intern("body"))
                {
                    body = b.to_string();
                }
                if let Some(Value::Dict(extra)) = dict.get(&intern("headers"))
                {
                    for (key, val) in extra.borrow().iter()
                    {
                        headers.push((key.as_str().to_string(), val.to_string()));
                    }
                }
            }
        }

        let mut map = Dict::new();
        match std_mod::http::http_request(&method, &url, &body, &headers)
        {
            Ok((status, text)) =>
            {
                map.insert(intern("body"), Value::string(text));
                map.insert(intern("status"), Value::Number(status as f64));
                map.insert(intern("ok"), Value::Bool((200..300).contains(&status)));
            }
            // transport failures are soft: scripts check .ok
            Err(message) =>
            {
                map.insert(intern("body"), Value::string(message));
                map.insert(intern("status"), Value::Number(0.0));
                map.insert(intern("ok"), Value::Bool(false));
            }
        }
        Ok(Value::dict(map))
    }

    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, line: usize) -> EvalResult
    {
        match callee
        {
            Value::NativeFunction(f) => f(&args).map_err(|message| fail(line, message)),
            Value::Function(data) => self.call_function(data, args, None),
            Value::BoundMethod(bound) =>
            {
                self.call_function(&bound.method, args, Some(bound.receiver.clone()))
            }
            Value::ListMap(list) =>
            {
                let Some(f) = args.first().cloned()
                else
                {
                    return Err(fail(line, "map expects a function"));
                };
                let snapshot = list.borrow().clone();
                let mut mapped = Vec::with_capacity(snapshot.len());
                for item in snapshot
                {
                    mapped.push(self.call_value(&f, vec![item], line)?);
                }
                Ok(Value::list(mapped))
            }
            _ => Err(fail(line, "That's not a function — can't call it.")),
        }
    }

    fn call_function(
        &mut self,
        data: &Rc<FunctionData>,
        args: Vec<Value>,
        self_value: Option<Value>,
    ) -> EvalResult
    {
        let call_env = Environment::child(&data.env);
        {
            let mut env = call_env.borrow_mut();
            if let Some(receiver) = self_value
            {
                env.define(intern("self"), receiver);
            }
            let mut args = args.into_iter();
            // missing arguments are null, extras fall off
            for param in data.params.iter()
            {
                env.define(param.clone(), args.next().unwrap_or(Value::Null));
            }
        }
        match self.exec_block(&data.body, &call_env)
        {
            Ok(_) => Ok(Value::Null),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    // Every string literal passes through here: balanced {…} fragments are
    // lexed and parsed fresh, and a fragment that comes out as exactly one
    // expression statement is evaluated in the current scope and spliced.
    fn interpolate(
        &mut self,
        text: &str,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<String, Signal>
    {
        if !text.contains('{')
        {
            return Ok(text.to_string());
        }
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::new();
        let mut i = 0;
        while i < chars.len()
        {
            if chars[i] != '{'
            {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            let mut j = i + 1;
            let mut depth = 1;
            while j < chars.len() && depth > 0
            {
                match chars[j]
                {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ =>
                    {}
                }
                if depth > 0
                {
                    j += 1;
                }
            }
            let inner: String = chars[i + 1..j.min(chars.len())].iter().collect();
            if let Ok(stmts) = Parser::new(Lexer::new(&inner).tokenize()).parse()
            {
                if stmts.len() == 1
                {
                    if let StmtKind::Expr(expr) = &stmts[0].kind
                    {
                        let value = self.eval_expr(expr, env)?;
                        out.push_str(&value.to_string());
                    }
                }
            }
            i = j + 1;
        }
        Ok(out)
    }

    fn load_module(&mut self, path: &str, line: usize) -> EvalResult
    {
        if path.ends_with(".irw")
        {
            let source = std_mod::file::read_file(path)
                .map_err(|_| fail(line, format!("Can't open module: {}", path)))?;
            let tokens = Lexer::new(&source).tokenize();
            let program = Parser::new(tokens)
                .parse()
                .map_err(|err| fail(line, err.to_string()))?;

            let program: Block = Rc::new(program);
            // pin the tree and the environment for the rest of the run
            self.module_asts.push(program.clone());
            let module_env = Environment::child(&self.globals);
            self.module_envs.push(module_env.clone());

            self.exec_block(&program, &module_env)?;

            let mut exports = Dict::new();
            for (name, value) in module_env.borrow().vars.iter()
            {
                exports.insert(name.clone(), value.clone());
            }
            return Ok(Value::dict(exports));
        }
        if path == "std" || path == "stdlib"
        {
            return Ok(std_mod::build_stdlib_module());
        }
        Ok(Value::dict(Dict::new()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn run_program(source: &str) -> Result<Value, RuntimeError>
    {
        let tokens = Lexer::new(source).tokenize();
        let program = Parser::new(tokens).parse().expect("parse error");
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&program)
    }

    fn eval_str(source: &str) -> String
    {
        run_program(source).expect("runtime error").to_string()
    }

    #[test]
    fn fibonacci()
    {
        let src = "
function fib(n)
  if n < 2 then return n
  return fib(n-1) + fib(n-2)
end
fib(10)
";
        assert_eq!(eval_str(src), "55");
    }

    #[test]
    fn keep_items_and_item_of()
    {
        let src = "
let xs = [3, 1, 4, 1, 5, 9, 2, 6]
let evens = keep items in xs where function(x) return x % 2 == 0 end
length of evens
";
        assert_eq!(eval_str(src), "3");
        let src = "
let xs = [3, 1, 4, 1, 5, 9, 2, 6]
let evens = keep items in xs where function(x) return x % 2 == 0 end
item 1 of evens
";
        assert_eq!(eval_str(src), "4");
    }

    #[test]
    fn class_with_method_dispatch()
    {
        let src = "
class Point
  let x = 0
  let y = 0
  function init(a,b) set self.x = a; set self.y = b end
  function norm() return math.sqrt(self.x*self.x + self.y*self.y) end
end
let p = new Point(3,4)
p.norm()
";
        assert_eq!(eval_str(src), "5");
    }

    #[test]
    fn try_throw_catch()
    {
        let src = "
let msg = \"\"
try
  throw \"boom\"
catch e
  set msg = \"caught: \" + e
end
msg
";
        assert_eq!(eval_str(src), "caught: boom");
    }

    #[test]
    fn json_round_trip_preserves_order()
    {
        let src = "
let v = {name: \"ada\", ages: [1,2,3], ok: true}
json of parse json (json of v)
";
        assert_eq!(eval_str(src), "{\"name\":\"ada\",\"ages\":[1,2,3],\"ok\":true}");
    }

    #[test]
    fn sort_by_field_and_lambda()
    {
        let src = "
let people = [{n:\"a\",age:30},{n:\"b\",age:20}]
(item 1 of sort people by age).n
";
        assert_eq!(eval_str(src), "b");
        let src = "
let people = [{n:\"a\",age:30},{n:\"b\",age:20}]
(item 1 of sort people by function(p) return p.age end).n
";
        assert_eq!(eval_str(src), "b");
    }

    #[test]
    fn sort_is_stable_and_copies()
    {
        let src = "
let xs = [{k:1,tag:\"first\"},{k:0,tag:\"z\"},{k:1,tag:\"second\"}]
let sorted = sort xs by k
(item 2 of sorted).tag + \",\" + (item 3 of sorted).tag
";
        assert_eq!(eval_str(src), "first,second");
        // the input list is untouched
        let src = "
let xs = [3,1,2]
let sorted = sort xs
item 1 of xs
";
        assert_eq!(eval_str(src), "3");
    }

    #[test]
    fn interpolation_basic_and_nested()
    {
        let src = "let x = 5\n\"x is {x + 1}\"";
        assert_eq!(eval_str(src), "x is 6");
        // nested braces re-embed the inner expression: the fragment is the
        // string literal "{x}", which itself interpolates
        let src = "let x = 2\n\"{ \\\"{x}\\\" }\"";
        assert_eq!(eval_str(src), "2");
        // non-expression fragments contribute nothing
        let src = "\"a{let y = 1}b\"";
        assert_eq!(eval_str(src), "ab");
    }

    #[test]
    fn and_or_return_the_determining_operand()
    {
        assert_eq!(eval_str("0 or \"fallback\""), "fallback");
        assert_eq!(eval_str("\"first\" or \"second\""), "first");
        assert_eq!(eval_str("1 and 2"), "2");
        assert_eq!(eval_str("0 and 2"), "0");
    }

    #[test]
    fn equality_compares_renderings()
    {
        assert_eq!(eval_str("1 == \"1\""), "true");
        assert_eq!(eval_str("[1,2] == \"[1,2]\""), "true");
        assert_eq!(eval_str("1 != 2"), "true");
        assert_eq!(eval_str("null == null"), "true");
    }

    #[test]
    fn lists_share_identity_across_bindings()
    {
        let src = "
let a = [1]
let b = a
add 2 to b
length of a
";
        assert_eq!(eval_str(src), "2");
    }

    #[test]
    fn loops_get_a_fresh_scope_per_iteration()
    {
        let src = "
let fns = []
for each i in [1, 2, 3]
  add function() return i end to fns
end
(item 1 of fns)() + (item 3 of fns)()
";
        assert_eq!(eval_str(src), "4");
    }

    #[test]
    fn for_each_visits_in_order_over_lists_strings_dicts()
    {
        let src = "
let out = \"\"
for each x in [1, 2, 3]
  set out = out + x
end
out
";
        assert_eq!(eval_str(src), "123");
        let src = "
let out = \"\"
for each c in \"abc\"
  set out = c + out
end
out
";
        assert_eq!(eval_str(src), "cba");
        let src = "
let d = {b: 1, a: 2}
let out = \"\"
for each k in d
  set out = out + k
end
out
";
        assert_eq!(eval_str(src), "ba");
    }

    #[test]
    fn while_break_continue()
    {
        let src = "
let i = 0
let total = 0
while i < 10
  set i = i + 1
  if i % 2 == 0
    continue
  end
  if i > 7
    break
  end
  set total = total + i
end
total
";
        // 1 + 3 + 5 + 7 then break at 9
        assert_eq!(eval_str(src), "16");
    }

    #[test]
    fn bound_methods_keep_their_receiver()
    {
        let src = "
class Counter
  let n = 5
  function value() return self.n end
end
let c = new Counter()
let m = c.value
m()
";
        assert_eq!(eval_str(src), "5");
    }

    #[test]
    fn list_map_virtual_member()
    {
        let src = "
let xs = [1, 2, 3]
let doubled = xs.map(function(x) return x * 2 end)
join doubled with \"-\"
";
        assert_eq!(eval_str(src), "2-4-6");
        assert_eq!(eval_str("[1,2,3].length"), "3");
    }

    #[test]
    fn class_marker_is_hidden_from_keys_values_has()
    {
        let src = "
class Point
  let x = 1
  let y = 2
end
let p = new Point()
join keys of p with \",\"
";
        assert_eq!(eval_str(src), "x,y");
        let src = "
class Point
  let x = 1
end
let p = new Point()
has \"__class__\" in p
";
        assert_eq!(eval_str(src), "false");
    }

    #[test]
    fn item_of_is_one_based_and_bounds_checked()
    {
        assert_eq!(eval_str("item 1 of [7, 8]"), "7");
        assert_eq!(eval_str("item 2 of [7, 8]"), "8");
        let err = run_program("item 3 of [7, 8]").unwrap_err();
        assert!(err.message.contains("out of bounds"));
        let err = run_program("item 0 of [7, 8]").unwrap_err();
        assert!(err.message.contains("out of bounds"));
    }

    #[test]
    fn index_expr_is_zero_based_and_forgiving()
    {
        assert_eq!(eval_str("let xs = [7, 8]\nxs[0]"), "7");
        assert_eq!(eval_str("let xs = [7, 8]\nxs[5]"), "null");
        assert_eq!(eval_str("let d = {a: 1}\nd[\"a\"]"), "1");
        assert_eq!(eval_str("let d = {a: 1}\nd[\"missing\"]"), "null");
    }

    #[test]
    fn set_targets()
    {
        assert_eq!(eval_str("let x = 1\nset x = 2\nx"), "2");
        assert_eq!(eval_str("let xs = [1, 2]\nset xs[1] = 9\nitem 2 of xs"), "9");
        assert_eq!(eval_str("let d = {a: 1}\nset d.b = 2\nd.b"), "2");
        let err = run_program("set ghost = 1").unwrap_err();
        assert!(err.message.contains("use 'let ghost = ...'"));
        let err = run_program("let xs = [1]\nset xs[5] = 1").unwrap_err();
        assert!(err.message.contains("out of bounds"));
    }

    #[test]
    fn runtime_errors_are_catchable_as_messages()
    {
        let src = "
let msg = \"\"
try
  say nope
catch e
  set msg = e
end
msg
";
        assert_eq!(
            eval_str(src),
            "I don't know what 'nope' is — did you forget 'let nope = ...'?"
        );
        let src = "
let msg = \"\"
try
  let x = 1 / 0
catch e
  set msg = e
end
msg
";
        assert_eq!(eval_str(src), "Can't divide by zero!");
    }

    #[test]
    fn control_flow_is_never_caught_by_catch()
    {
        let src = "
function f()
  try
    return \"early\"
  catch e
    return \"caught\"
  end
  return \"late\"
end
f()
";
        assert_eq!(eval_str(src), "early");
        let src = "
let hits = 0
for each i in [1, 2, 3]
  try
    if i == 2
      break
    end
  catch e
    set hits = 100
  end
  set hits = hits + 1
end
hits
";
        assert_eq!(eval_str(src), "1");
    }

    #[test]
    fn uncaught_throw_terminates_with_the_message()
    {
        let err = run_program("throw \"boom\"").unwrap_err();
        assert_eq!(err.message, "Uncaught error: boom");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn errors_carry_source_lines()
    {
        let err = run_program("let x = 1\nsay nope").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn ternary_and_type_of()
    {
        assert_eq!(eval_str("if 1 < 2 then \"yes\" else \"no\""), "yes");
        assert_eq!(eval_str("type of null"), "null");
        assert_eq!(eval_str("type of true"), "bool");
        assert_eq!(eval_str("type of 1"), "number");
        assert_eq!(eval_str("type of \"s\""), "string");
        assert_eq!(eval_str("type of []"), "list");
        assert_eq!(eval_str("type of {}"), "dict");
        assert_eq!(eval_str("type of function(x) return x end"), "function");
    }

    #[test]
    fn string_operations()
    {
        assert_eq!(eval_str("join split \"a,b,c\" by \",\" with \"|\""), "a|b|c");
        assert_eq!(eval_str("length of split \"abc\" by \"\""), "3");
        assert_eq!(eval_str("trim \"  hi \t\""), "hi");
        assert_eq!(eval_str("replace \"l\" with \"r\" in \"hello\""), "herro");
        assert_eq!(eval_str("index of \"lo\" in \"hello\""), "3");
        assert_eq!(eval_str("index of \"zz\" in \"hello\""), "-1");
        assert_eq!(eval_str("uppercase \"hi\""), "HI");
        assert_eq!(eval_str("lowercase \"HI\""), "hi");
        assert_eq!(eval_str("chars 1 to 3 of \"hello\""), "el");
        assert_eq!(eval_str("chars 0 to 99 of \"hi\""), "hi");
    }

    #[test]
    fn has_in_list_dict_string()
    {
        assert_eq!(eval_str("has 2 in [1, 2, 3]"), "true");
        assert_eq!(eval_str("has 9 in [1, 2, 3]"), "false");
        assert_eq!(eval_str("let d = {a: 1}\nhas \"a\" in d"), "true");
        assert_eq!(eval_str("has \"ell\" in \"hello\""), "true");
    }

    #[test]
    fn arithmetic_and_concatenation()
    {
        assert_eq!(eval_str("1 + 2 * 3"), "7");
        assert_eq!(eval_str("\"n=\" + 4"), "n=4");
        assert_eq!(eval_str("10 % 3"), "1");
        // non-numeric arithmetic degrades to null
        assert_eq!(eval_str("\"a\" * 2"), "null");
        assert_eq!(eval_str("-(3)"), "-3");
        assert_eq!(eval_str("not 0"), "true");
    }

    #[test]
    fn parse_json_on_garbage_is_null()
    {
        assert_eq!(eval_str("parse json \"oops\""), "null");
    }

    #[test]
    fn ask_less_globals_are_available()
    {
        assert_eq!(eval_str("parseInt(\"42px\")"), "42");
        assert_eq!(eval_str("parseFloat(\"2.5\")"), "2.5");
        assert_eq!(eval_str("toString(12)"), "12");
        assert_eq!(eval_str("len(\"abcd\")"), "4");
        assert_eq!(eval_str("math.floor(2.9)"), "2");
        assert_eq!(eval_str("math.pow(2, 8)"), "256");
    }

    #[test]
    fn script_args_become_the_args_global()
    {
        let tokens = Lexer::new("join args with \";\"").tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::new(vec!["a".to_string(), "b".to_string()]);
        let out = interpreter.run(&program).unwrap();
        assert_eq!(out.to_string(), "a;b");
    }

    #[test]
    fn stdlib_module_synthesis()
    {
        let src = "
get \"std\" as std
std.add(2, 3)
";
        assert_eq!(eval_str(src), "5");
        assert_eq!(eval_str("get \"std\" as s\ns.math.sqrt(81)"), "9");
        // unknown non-.irw module names fall through to an empty dict
        assert_eq!(eval_str("get \"mystery\" as m\nlength of keys of m"), "0");
    }

    #[test]
    fn file_modules_load_and_pin()
    {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("ironwood-mod-test-{}.irw", std::process::id()));
        std::fs::write(
            &path,
            "let greeting = \"hello\"\nfunction shout(x)\n  return uppercase x + \"!\"\nend\n",
        )
        .unwrap();

        let src = format!(
            "get \"{}\" as m\nm.shout(m.greeting)",
            path.to_str().unwrap()
        );
        assert_eq!(eval_str(&src), "HELLO!");
        std::fs::remove_file(&path).unwrap();

        let err = run_program("get \"missing-module.irw\" as m").unwrap_err();
        assert!(err.message.contains("Can't open module"));
    }

    #[test]
    fn fetch_transport_failure_is_a_soft_result()
    {
        let src = "
let r = fetch \"not-a-url\"
toString(r.ok) + \",\" + r.status
";
        assert_eq!(eval_str(src), "false,0");
    }

    #[test]
    fn run_returns_merged_output_and_code()
    {
        if cfg!(target_os = "windows")
        {
            return;
        }
        assert_eq!(eval_str("trim (run \"echo hi\").output"), "hi");
        assert_eq!(eval_str("(run \"exit 3\").code"), "3");
        assert_eq!(eval_str("(run \"exit 3\").ok"), "false");
    }

    #[test]
    fn write_and_read_files_through_the_grammar()
    {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("ironwood-io-test-{}.txt", std::process::id()));
        let p = path.to_str().unwrap();

        let src = format!(
            "write \"one\" to file \"{p}\"\nappend \"!two\" to file \"{p}\"\nread file \"{p}\""
        );
        assert_eq!(eval_str(&src), "one!two");
        assert_eq!(eval_str(&format!("file exists \"{p}\"")), "true");
        assert_eq!(
            eval_str(&format!("length of lines of file \"{p}\"")),
            "1"
        );
        std::fs::remove_file(&path).unwrap();

        // a missing file raises a catchable throw with the exact message
        let src = "
let msg = \"\"
try
  let x = read file \"definitely-missing.txt\"
catch e
  set msg = e
end
msg
";
        assert_eq!(eval_str(src), "Can't open file: definitely-missing.txt");
    }

    #[test]
    fn class_field_defaults_use_the_definition_environment()
    {
        let src = "
let base = 10
class Thing
  let size = base + 5
end
let t = new Thing()
t.size
";
        assert_eq!(eval_str(src), "15");
    }

    #[test]
    fn instance_rendering_and_json_omit_the_marker()
    {
        let src = "
class Point
  let x = 3
  let y = 4
end
toString(new Point())
";
        assert_eq!(eval_str(src), "Point{ x: 3, y: 4 }");
        let src = "
class Point
  let x = 3
end
json of new Point()
";
        assert_eq!(eval_str(src), "{\"x\":3}");
    }
}
