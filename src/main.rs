mod ast;
mod eval;
mod intern;
#[path = "std/mod.rs"]
mod ironwood_std;
mod json;
mod lexer;
mod parser;
mod value;

use directories::ProjectDirs;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

fn main() -> rustyline::Result<()>
{
    let args: Vec<String> = env::args().collect();
    let mut dump_ast = false;
    let mut script_path: Option<String> = None;
    let mut script_args: Vec<String> = Vec::new();

    let mut idx = 1;
    while idx < args.len()
    {
        match args[idx].as_str()
        {
            "-h" | "--help" if script_path.is_none() =>
            {
                print_usage(&args[0]);
                return Ok(());
            }
            "--dump-ast" if script_path.is_none() => dump_ast = true,
            arg =>
            {
                // first free argument is the script; the rest belong to it
                if script_path.is_none()
                {
                    script_path = Some(arg.to_string());
                }
                else
                {
                    script_args.push(arg.to_string());
                }
            }
        }
        idx += 1;
    }

    match script_path
    {
        Some(path) =>
        {
            run_file(&path, script_args, dump_ast);
            Ok(())
        }
        None =>
        {
            if dump_ast
            {
                eprintln!("--dump-ast requires a script path.");
                process::exit(1);
            }
            run_repl()
        }
    }
}

fn run_file(path: &str, script_args: Vec<String>, dump_ast: bool)
{
    let source = match fs::read_to_string(path)
    {
        Ok(content) => content,
        Err(_) =>
        {
            eprintln!("Can't open file: {}", path);
            process::exit(1);
        }
    };

    let tokens = lexer::Lexer::new(&source).tokenize();
    let program = match parser::Parser::new(tokens).parse()
    {
        Ok(program) => program,
        Err(err) =>
        {
            eprintln!("Syntax Error: {}", err);
            process::exit(1);
        }
    };

    if dump_ast
    {
        println!("{:#?}", program);
        return;
    }

    let mut interpreter = eval::Interpreter::new(script_args);
    if let Err(err) = interpreter.run(&program)
    {
        eprintln!("{}", format_runtime_error(&err));
        process::exit(1);
    }
}

fn format_runtime_error(err: &eval::RuntimeError) -> String
{
    if err.line > 0
    {
        format!("Error at line {}: {}", err.line, err.message)
    }
    else
    {
        format!("Error: {}", err.message)
    }
}

fn print_usage(bin: &str)
{
    println!(
        "Usage: {bin} [options] [script.irw] [args...]
  -h, --help   Show this help
      --dump-ast  Parse the script and print its AST

With no script, an interactive session starts."
    );
}

fn history_path() -> PathBuf
{
    if let Some(proj_dirs) = ProjectDirs::from("org", "ironwood", "ironwood")
    {
        let data_dir = proj_dirs.data_dir();
        if fs::create_dir_all(data_dir).is_ok()
        {
            return data_dir.join("history.txt");
        }
    }
    PathBuf::from("history.txt")
}

fn run_repl() -> rustyline::Result<()>
{
    println!("Ironwood v3.1");
    println!("Type 'exit' to leave.");

    let mut interpreter = eval::Interpreter::new(Vec::new());
    let mut input_buffer = String::new();
    let mut rl = DefaultEditor::new()?;

    let history_path = history_path();
    if rl.load_history(&history_path).is_err()
    {}

    loop
    {
        let is_continuation = !input_buffer.is_empty();
        let prompt = if is_continuation { ".. " } else { "iw> " };

        match rl.readline(prompt)
        {
            Ok(line) =>
            {
                let trimmed = line.trim();
                if trimmed == "exit"
                {
                    break;
                }
                if !trimmed.is_empty()
                {
                    rl.add_history_entry(line.as_str())?;
                }
                if trimmed.is_empty()
                {
                    if !is_continuation
                    {
                        continue;
                    }
                    input_buffer.push('\n');
                }
                else
                {
                    input_buffer.push_str(&line);
                    input_buffer.push('\n');
                }

                if !is_balanced(&input_buffer)
                {
                    continue;
                }
                let source = std::mem::take(&mut input_buffer);
                let tokens = lexer::Lexer::new(&source).tokenize();
                match parser::Parser::new(tokens).parse()
                {
                    Ok(program) => match interpreter.run(&program)
                    {
                        Ok(result) =>
                        {
                            if !matches!(result, value::Value::Null)
                            {
                                println!("=> {}", result);
                            }
                        }
                        Err(err) => println!("{}", format_runtime_error(&err)),
                    },
                    Err(err) => println!("Syntax Error: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) =>
            {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) =>
            {
                println!("CTRL-D");
                break;
            }
            Err(err) =>
            {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&history_path)
}

// Counts open blocks so the REPL knows when to keep prompting. An 'if'
// resolved by a 'then' on the same line (ternary or one-line form) does
// not wait for an 'end'.
fn is_balanced(input: &str) -> bool
{
    use lexer::TokenKind;

    let tokens = lexer::Lexer::new(input).tokenize();
    let mut stack: Vec<(TokenKind, usize)> = Vec::new();
    for token in &tokens
    {
        match token.kind
        {
            TokenKind::If
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::Try => stack.push((token.kind, token.line)),
            TokenKind::Then =>
            {
                if let Some((TokenKind::If, line)) = stack.last().copied()
                {
                    if line == token.line
                    {
                        stack.pop();
                    }
                }
            }
            TokenKind::End =>
            {
                stack.pop();
            }
            _ =>
            {}
        }
    }
    stack.is_empty()
}
