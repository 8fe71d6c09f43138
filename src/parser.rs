use crate::ast::{BinOp, Block, Expr, ExprKind, ExprRef, Name, Stmt, StmtKind, UnOp};
use crate::intern::intern_owned;
use crate::lexer::{Token, TokenKind};
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct ParseError
{
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

type ExprResult = Result<ExprRef, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

pub struct Parser
{
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser
{
    pub fn new(tokens: Vec<Token>) -> Self
    {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>, ParseError>
    {
        let mut program = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Eof, 0)
        {
            program.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        Ok(program)
    }

    // ---- token plumbing ----

    fn peek(&self, off: usize) -> &Token
    {
        let idx = (self.pos + off).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn check(&self, kind: TokenKind, off: usize) -> bool
    {
        self.peek(off).kind == kind
    }

    fn advance(&mut self) -> Token
    {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1
        {
            self.pos += 1;
        }
        tok
    }

    fn matches(&mut self, kind: TokenKind) -> bool
    {
        if self.check(kind, 0)
        {
            self.advance();
            return true;
        }
        false
    }

    fn error(&self, message: &str) -> ParseError
    {
        let tok = self.peek(0);
        ParseError {
            line: tok.line,
            message: format!("{} (got '{}')", message, tok.text),
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError>
    {
        if !self.check(kind, 0)
        {
            return Err(self.error(message));
        }
        Ok(self.advance())
    }

    // Contextual keywords double as variable, parameter and field names.
    fn is_name(&self) -> bool
    {
        matches!(
            self.peek(0).kind,
            TokenKind::Ident
                | TokenKind::Item
                | TokenKind::Add
                | TokenKind::To
                | TokenKind::Length
                | TokenKind::Of
                | TokenKind::Keep
                | TokenKind::Items
                | TokenKind::Where
                | TokenKind::Each
                | TokenKind::Has
                | TokenKind::Keys
                | TokenKind::Values
                | TokenKind::SelfKw
                | TokenKind::File
                | TokenKind::Read
                | TokenKind::Write
                | TokenKind::Append
                | TokenKind::Split
                | TokenKind::By
                | TokenKind::Join
                | TokenKind::With
                | TokenKind::Trim
                | TokenKind::Replace
                | TokenKind::Index
                | TokenKind::Uppercase
                | TokenKind::Lowercase
                | TokenKind::Chars
                | TokenKind::From
                | TokenKind::Type
                | TokenKind::Then
                | TokenKind::Sort
                | TokenKind::Json
                | TokenKind::Parse
                | TokenKind::Fetch
                | TokenKind::Run
        )
    }

    fn expect_name(&mut self, message: &str) -> Result<Name, ParseError>
    {
        if !self.is_name()
        {
            return Err(self.error(message));
        }
        Ok(intern_owned(self.advance().text))
    }

    fn skip_newlines(&mut self)
    {
        while self.check(TokenKind::Newline, 0)
        {
            self.advance();
        }
    }

    // Statements end at a newline when one is present; a missing newline is
    // tolerated so `end` and EOF terminate them too.
    fn eat_newline(&mut self)
    {
        if self.check(TokenKind::Newline, 0)
        {
            self.advance();
        }
    }

    fn mk(&self, kind: ExprKind, line: usize) -> ExprRef
    {
        Rc::new(Expr { kind, line })
    }

    // ---- expressions, by precedence ----

    fn parse_expr(&mut self) -> ExprResult
    {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ExprResult
    {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or, 0)
        {
            let line = self.advance().line;
            let right = self.parse_and()?;
            left = self.mk(
                ExprKind::Binary {
                    op: BinOp::Or,
                    left,
                    right,
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ExprResult
    {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And, 0)
        {
            let line = self.advance().line;
            let right = self.parse_equality()?;
            left = self.mk(
                ExprKind::Binary {
                    op: BinOp::And,
                    left,
                    right,
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ExprResult
    {
        let mut left = self.parse_comparison()?;
        loop
        {
            let op = match self.peek(0).kind
            {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Neq,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_comparison()?;
            left = self.mk(ExprKind::Binary { op, left, right }, line);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ExprResult
    {
        let mut left = self.parse_add_sub()?;
        loop
        {
            let op = match self.peek(0).kind
            {
                TokenKind::Less => BinOp::Lt,
                TokenKind::Greater => BinOp::Gt,
                TokenKind::LessEq => BinOp::Leq,
                TokenKind::GreaterEq => BinOp::Geq,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_add_sub()?;
            left = self.mk(ExprKind::Binary { op, left, right }, line);
        }
        Ok(left)
    }

    fn parse_add_sub(&mut self) -> ExprResult
    {
        let mut left = self.parse_mul_div()?;
        loop
        {
            let op = match self.peek(0).kind
            {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_mul_div()?;
            left = self.mk(ExprKind::Binary { op, left, right }, line);
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> ExprResult
    {
        let mut left = self.parse_unary()?;
        loop
        {
            let op = match self.peek(0).kind
            {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_unary()?;
            left = self.mk(ExprKind::Binary { op, left, right }, line);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ExprResult
    {
        if self.check(TokenKind::Minus, 0)
        {
            let line = self.advance().line;
            let operand = self.parse_postfix()?;
            return Ok(self.mk(
                ExprKind::Unary {
                    op: UnOp::Neg,
                    operand,
                },
                line,
            ));
        }
        if self.check(TokenKind::Not, 0)
        {
            let line = self.advance().line;
            let operand = self.parse_postfix()?;
            return Ok(self.mk(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand,
                },
                line,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ExprResult
    {
        let mut expr = self.parse_primary()?;
        loop
        {
            if self.check(TokenKind::Dot, 0)
            {
                let line = self.advance().line;
                let field = self.expect_name("Expected field name after '.'")?;
                if self.check(TokenKind::LeftParen, 0)
                {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let callee = self.mk(ExprKind::Member { target: expr, field }, line);
                    expr = self.mk(ExprKind::Call { callee, args }, line);
                }
                else
                {
                    expr = self.mk(ExprKind::Member { target: expr, field }, line);
                }
            }
            else if self.check(TokenKind::LeftBracket, 0)
            {
                let line = self.advance().line;
                let index = self.parse_expr()?;
                self.expect(TokenKind::RightBracket, "Expected ']'")?;
                expr = self.mk(ExprKind::Index { target: expr, index }, line);
            }
            else if self.check(TokenKind::LeftParen, 0)
            {
                let line = self.advance().line;
                let args = self.parse_call_args()?;
                expr = self.mk(ExprKind::Call { callee: expr, args }, line);
            }
            else
            {
                break;
            }
        }
        Ok(expr)
    }

    // after the opening paren
    fn parse_call_args(&mut self) -> Result<Vec<ExprRef>, ParseError>
    {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen, 0)
        {
            args.push(self.parse_expr()?);
            while self.matches(TokenKind::Comma)
            {
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RightParen, "Expected ')'")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ExprResult
    {
        let line = self.peek(0).line;

        // length of <expr> — only with 'of' right behind, else a plain name
        if self.check(TokenKind::Length, 0)
        {
            if self.check(TokenKind::Of, 1)
            {
                self.advance();
                self.advance();
                let arr = self.parse_postfix()?;
                return Ok(self.mk(ExprKind::LengthOf(arr), line));
            }
            let tok = self.advance();
            return Ok(self.mk(ExprKind::Var(intern_owned(tok.text)), line));
        }
        // item N of <list> — needs a simple expression start and then 'of',
        // so `add item to list` still reads 'item' as a variable
        if self.check(TokenKind::Item, 0)
        {
            let next_starts_expr =
                self.check(TokenKind::Number, 1) || self.check(TokenKind::Ident, 1);
            if next_starts_expr && self.check(TokenKind::Of, 2)
            {
                self.advance();
                let index = self.parse_add_sub()?;
                self.expect(TokenKind::Of, "Expected 'of' after item number")?;
                let list = self.parse_postfix()?;
                return Ok(self.mk(ExprKind::ItemOf { index, list }, line));
            }
            let tok = self.advance();
            return Ok(self.mk(ExprKind::Var(intern_owned(tok.text)), line));
        }
        // keep items in <list> where <fn>
        if self.matches(TokenKind::Keep)
        {
            self.expect(TokenKind::Items, "Expected 'items' after 'keep'")?;
            self.expect(TokenKind::In, "Expected 'in' after 'items'")?;
            let list = self.parse_postfix()?;
            self.expect(TokenKind::Where, "Expected 'where'")?;
            let pred = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::KeepWhere { list, pred }, line));
        }
        if self.matches(TokenKind::Keys)
        {
            self.expect(TokenKind::Of, "Expected 'of' after 'keys'")?;
            let dict = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::KeysOf(dict), line));
        }
        if self.matches(TokenKind::Values)
        {
            self.expect(TokenKind::Of, "Expected 'of' after 'values'")?;
            let dict = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::ValuesOf(dict), line));
        }
        if self.matches(TokenKind::Has)
        {
            let item = self.parse_add_sub()?;
            self.expect(TokenKind::In, "Expected 'in' after value  (usage: has x in myList)")?;
            let collection = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Has { item, collection }, line));
        }
        // read file <path>
        if self.check(TokenKind::Read, 0) && self.check(TokenKind::File, 1)
        {
            self.advance();
            self.advance();
            let path = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::ReadFile(path), line));
        }
        // file exists <path>
        if self.check(TokenKind::File, 0) && self.peek(1).text == "exists"
        {
            self.advance();
            self.advance();
            let path = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::FileExists(path), line));
        }
        // lines of file <path>
        if self.check(TokenKind::Ident, 0)
            && self.peek(0).text == "lines"
            && self.check(TokenKind::Of, 1)
            && self.check(TokenKind::File, 2)
        {
            self.advance();
            self.advance();
            self.advance();
            let path = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::LinesOfFile(path), line));
        }
        // lambda: function(params) ... end
        if self.check(TokenKind::Function, 0) && self.check(TokenKind::LeftParen, 1)
        {
            self.advance();
            self.advance();
            let params = self.parse_params()?;
            self.eat_newline();
            let body = self.parse_block_until(&[TokenKind::End])?;
            self.expect(TokenKind::End, "Expected 'end' after function")?;
            return Ok(self.mk(
                ExprKind::Lambda {
                    params: Rc::new(params),
                    body,
                },
                line,
            ));
        }
        // ternary: if cond then a else b
        if self.matches(TokenKind::If)
        {
            let cond = self.parse_or()?;
            self.expect(
                TokenKind::Then,
                "Expected 'then' in ternary  (usage: if cond then a else b)",
            )?;
            let then = self.parse_or()?;
            self.expect(TokenKind::Else, "Expected 'else' in ternary")?;
            let otherwise = self.parse_or()?;
            return Ok(self.mk(
                ExprKind::Ternary {
                    cond,
                    then,
                    otherwise,
                },
                line,
            ));
        }
        // split str by sep
        if self.matches(TokenKind::Split)
        {
            let text = self.parse_add_sub()?;
            self.expect(TokenKind::By, "Expected 'by' after string  (usage: split str by sep)")?;
            let sep = self.parse_add_sub()?;
            return Ok(self.mk(ExprKind::Split { text, sep }, line));
        }
        // join list with sep
        if self.matches(TokenKind::Join)
        {
            let list = self.parse_add_sub()?;
            self.expect(TokenKind::With, "Expected 'with' after list  (usage: join list with sep)")?;
            let sep = self.parse_add_sub()?;
            return Ok(self.mk(ExprKind::Join { list, sep }, line));
        }
        if self.matches(TokenKind::Trim)
        {
            let text = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Trim(text), line));
        }
        // replace x with y in str
        if self.matches(TokenKind::Replace)
        {
            let from = self.parse_add_sub()?;
            self.expect(TokenKind::With, "Expected 'with'  (usage: replace x with y in str)")?;
            let to = self.parse_add_sub()?;
            self.expect(TokenKind::In, "Expected 'in'")?;
            let text = self.parse_add_sub()?;
            return Ok(self.mk(ExprKind::Replace { text, from, to }, line));
        }
        // index of sub in str
        if self.check(TokenKind::Index, 0) && self.check(TokenKind::Of, 1)
        {
            self.advance();
            self.advance();
            let needle = self.parse_add_sub()?;
            self.expect(TokenKind::In, "Expected 'in'  (usage: index of sub in str)")?;
            let haystack = self.parse_add_sub()?;
            return Ok(self.mk(ExprKind::IndexOf { needle, haystack }, line));
        }
        if self.matches(TokenKind::Uppercase)
        {
            let text = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Uppercase(text), line));
        }
        if self.matches(TokenKind::Lowercase)
        {
            let text = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Lowercase(text), line));
        }
        // chars i to j of str
        if self.matches(TokenKind::Chars)
        {
            let from = self.parse_add_sub()?;
            self.expect(TokenKind::To, "Expected 'to'  (usage: chars i to j of str)")?;
            let to = self.parse_add_sub()?;
            self.expect(TokenKind::Of, "Expected 'of'")?;
            let text = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Substr { text, from, to }, line));
        }
        // type of x
        if self.check(TokenKind::Type, 0) && self.check(TokenKind::Of, 1)
        {
            self.advance();
            self.advance();
            let val = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::TypeOf(val), line));
        }
        // sort arr [by field | by fn]
        if self.matches(TokenKind::Sort)
        {
            let list = self.parse_postfix()?;
            if !self.matches(TokenKind::By)
            {
                return Ok(self.mk(ExprKind::Sort { list, key: None }, line));
            }
            // bare name → field shorthand, encoded as a string literal so
            // the evaluator knows it is a key, not a callable
            if self.is_name() && !self.check(TokenKind::Function, 0)
            {
                let field = intern_owned(self.advance().text);
                let key = self.mk(ExprKind::Str(field), line);
                return Ok(self.mk(ExprKind::Sort { list, key: Some(key) }, line));
            }
            let key = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Sort { list, key: Some(key) }, line));
        }
        // parse json str
        if self.check(TokenKind::Parse, 0) && self.check(TokenKind::Json, 1)
        {
            self.advance();
            self.advance();
            let text = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::ParseJson(text), line));
        }
        // json of val
        if self.check(TokenKind::Json, 0) && self.check(TokenKind::Of, 1)
        {
            self.advance();
            self.advance();
            let val = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::JsonOf(val), line));
        }
        // fetch "url" [with opts]
        if self.matches(TokenKind::Fetch)
        {
            let url = self.parse_postfix()?;
            let opts = if self.matches(TokenKind::With)
            {
                Some(self.parse_postfix()?)
            }
            else
            {
                None
            };
            return Ok(self.mk(ExprKind::Fetch { url, opts }, line));
        }
        // run "cmd"
        if self.matches(TokenKind::Run)
        {
            let cmd = self.parse_postfix()?;
            return Ok(self.mk(ExprKind::Run(cmd), line));
        }
        // new ClassName(args)
        if self.matches(TokenKind::New)
        {
            let class = self.expect_name("Expected class name after 'new'")?;
            let args = if self.matches(TokenKind::LeftParen)
            {
                self.parse_call_args()?
            }
            else
            {
                Vec::new()
            };
            return Ok(self.mk(ExprKind::New { class, args }, line));
        }
        if self.check(TokenKind::SelfKw, 0)
        {
            let tok = self.advance();
            return Ok(self.mk(ExprKind::Var(intern_owned(tok.text)), line));
        }
        // ask as an expression
        if self.matches(TokenKind::Ask)
        {
            let prompt = if !self.check(TokenKind::Newline, 0) && !self.check(TokenKind::Eof, 0)
            {
                self.parse_add_sub()?
            }
            else
            {
                self.mk(ExprKind::Str(intern_owned(String::new())), line)
            };
            return Ok(self.mk(ExprKind::Ask(prompt), line));
        }

        match self.peek(0).kind
        {
            TokenKind::Number =>
            {
                let tok = self.advance();
                Ok(self.mk(ExprKind::Number(tok.text.parse().unwrap_or(0.0)), line))
            }
            TokenKind::Str =>
            {
                let tok = self.advance();
                Ok(self.mk(ExprKind::Str(intern_owned(tok.text)), line))
            }
            TokenKind::True =>
            {
                self.advance();
                Ok(self.mk(ExprKind::Bool(true), line))
            }
            TokenKind::False =>
            {
                self.advance();
                Ok(self.mk(ExprKind::Bool(false), line))
            }
            TokenKind::Null =>
            {
                self.advance();
                Ok(self.mk(ExprKind::Null, line))
            }
            TokenKind::Ident =>
            {
                let tok = self.advance();
                Ok(self.mk(ExprKind::Var(intern_owned(tok.text)), line))
            }
            TokenKind::LeftParen =>
            {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightParen, "Expected ')'")?;
                Ok(expr)
            }
            TokenKind::LeftBracket =>
            {
                self.advance();
                let mut elems = Vec::new();
                self.skip_newlines();
                if !self.check(TokenKind::RightBracket, 0)
                {
                    elems.push(self.parse_expr()?);
                    while self.matches(TokenKind::Comma)
                    {
                        self.skip_newlines();
                        elems.push(self.parse_expr()?);
                    }
                }
                self.skip_newlines();
                self.expect(TokenKind::RightBracket, "Expected ']'")?;
                Ok(self.mk(ExprKind::List(elems), line))
            }
            TokenKind::LeftBrace =>
            {
                self.advance();
                let mut pairs = Vec::new();
                self.skip_newlines();
                if !self.check(TokenKind::RightBrace, 0)
                {
                    pairs.push(self.parse_object_pair()?);
                    while self.matches(TokenKind::Comma)
                    {
                        self.skip_newlines();
                        pairs.push(self.parse_object_pair()?);
                    }
                }
                self.skip_newlines();
                self.expect(TokenKind::RightBrace, "Expected '}'")?;
                Ok(self.mk(ExprKind::Object(pairs), line))
            }
            _ => Err(self.error("Unexpected token")),
        }
    }

    fn parse_object_pair(&mut self) -> Result<(Name, ExprRef), ParseError>
    {
        let key = self.expect_name("Expected key")?;
        self.expect(TokenKind::Colon, "Expected ':'")?;
        let value = self.parse_expr()?;
        Ok((key, value))
    }

    fn parse_params(&mut self) -> Result<Vec<Name>, ParseError>
    {
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen, 0)
        {
            params.push(self.expect_name("Expected param")?);
            while self.matches(TokenKind::Comma)
            {
                params.push(self.expect_name("Expected param")?);
            }
        }
        self.expect(TokenKind::RightParen, "Expected ')'")?;
        Ok(params)
    }

    // ---- statements ----

    fn parse_block_until(&mut self, enders: &[TokenKind]) -> Result<Block, ParseError>
    {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !enders.contains(&self.peek(0).kind) && !self.check(TokenKind::Eof, 0)
        {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        Ok(Rc::new(stmts))
    }

    fn stmt(&self, kind: StmtKind, line: usize) -> Stmt
    {
        Stmt { kind, line }
    }

    fn parse_stmt(&mut self) -> StmtResult
    {
        self.skip_newlines();
        let line = self.peek(0).line;
        match self.peek(0).kind
        {
            TokenKind::Let =>
            {
                self.advance();
                let name = self.expect_name("Expected variable name")?;
                let init = if self.matches(TokenKind::Assign)
                {
                    self.parse_expr()?
                }
                else
                {
                    self.mk(ExprKind::Null, line)
                };
                self.eat_newline();
                Ok(self.stmt(StmtKind::Let { name, init }, line))
            }
            TokenKind::Set =>
            {
                self.advance();
                let target = self.parse_postfix()?;
                self.expect(TokenKind::Assign, "Expected '='")?;
                let value = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Set { target, value }, line))
            }
            TokenKind::Add =>
            {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::To, "Expected 'to' after value  (usage: add x to myList)")?;
                let target = self.parse_postfix()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::AddTo { value, target }, line))
            }
            TokenKind::Say =>
            {
                self.advance();
                let expr = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Say(expr), line))
            }
            TokenKind::Ask =>
            {
                self.advance();
                let name = self.expect_name("Expected variable name")?;
                let prompt = if !self.check(TokenKind::Newline, 0) && !self.check(TokenKind::Eof, 0)
                {
                    self.parse_expr()?
                }
                else
                {
                    self.mk(ExprKind::Str(intern_owned(String::new())), line)
                };
                self.eat_newline();
                Ok(self.stmt(StmtKind::Ask { name, prompt }, line))
            }
            TokenKind::Pause =>
            {
                self.advance();
                self.eat_newline();
                Ok(self.stmt(StmtKind::Pause, line))
            }
            TokenKind::If =>
            {
                self.advance();
                let cond = self.parse_expr()?;
                // one-line form: if cond then stmt [else stmt] — no 'end'
                if self.matches(TokenKind::Then)
                {
                    let then_body = Rc::new(vec![self.parse_stmt()?]);
                    let else_body = if self.matches(TokenKind::Else)
                    {
                        Rc::new(vec![self.parse_stmt()?])
                    }
                    else
                    {
                        Rc::new(Vec::new())
                    };
                    return Ok(self.stmt(
                        StmtKind::If {
                            cond,
                            then_body,
                            else_body,
                        },
                        line,
                    ));
                }
                self.eat_newline();
                let then_body = self.parse_block_until(&[TokenKind::Else, TokenKind::End])?;
                let else_body = if self.matches(TokenKind::Else)
                {
                    self.eat_newline();
                    self.parse_block_until(&[TokenKind::End])?
                }
                else
                {
                    Rc::new(Vec::new())
                };
                self.expect(TokenKind::End, "Expected 'end' after if")?;
                self.eat_newline();
                Ok(self.stmt(
                    StmtKind::If {
                        cond,
                        then_body,
                        else_body,
                    },
                    line,
                ))
            }
            TokenKind::While =>
            {
                self.advance();
                let cond = self.parse_expr()?;
                self.eat_newline();
                let body = self.parse_block_until(&[TokenKind::End])?;
                self.expect(TokenKind::End, "Expected 'end' after while")?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::While { cond, body }, line))
            }
            TokenKind::For =>
            {
                self.advance();
                self.matches(TokenKind::Each);
                let var = self.expect_name("Expected variable name")?;
                self.expect(TokenKind::In, "Expected 'in'")?;
                let iterable = self.parse_expr()?;
                self.eat_newline();
                let body = self.parse_block_until(&[TokenKind::End])?;
                self.expect(TokenKind::End, "Expected 'end' after for")?;
                self.eat_newline();
                Ok(self.stmt(
                    StmtKind::For {
                        var,
                        iterable,
                        body,
                    },
                    line,
                ))
            }
            TokenKind::Break =>
            {
                self.advance();
                self.eat_newline();
                Ok(self.stmt(StmtKind::Break, line))
            }
            TokenKind::Continue =>
            {
                self.advance();
                self.eat_newline();
                Ok(self.stmt(StmtKind::Continue, line))
            }
            TokenKind::Return =>
            {
                self.advance();
                let value = if !self.check(TokenKind::Newline, 0) && !self.check(TokenKind::Eof, 0)
                {
                    self.parse_expr()?
                }
                else
                {
                    self.mk(ExprKind::Null, line)
                };
                self.eat_newline();
                Ok(self.stmt(StmtKind::Return(value), line))
            }
            // function NAME(...) is a statement; function( opens a lambda
            // expression and falls through to the expression path below
            TokenKind::Function if !self.check(TokenKind::LeftParen, 1) =>
            {
                self.advance();
                let name = self.expect_name("Expected function name")?;
                self.expect(TokenKind::LeftParen, "Expected '('")?;
                let params = self.parse_params()?;
                self.eat_newline();
                let body = self.parse_block_until(&[TokenKind::End])?;
                self.expect(TokenKind::End, "Expected 'end' after function")?;
                self.eat_newline();
                Ok(self.stmt(
                    StmtKind::Func {
                        name,
                        params: Rc::new(params),
                        body,
                    },
                    line,
                ))
            }
            TokenKind::Call =>
            {
                self.advance();
                let expr = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Call(expr), line))
            }
            TokenKind::Get =>
            {
                self.advance();
                let path = intern_owned(self.expect(TokenKind::Str, "Expected module path")?.text);
                self.expect(TokenKind::As, "Expected 'as'")?;
                let alias = self.expect_name("Expected alias")?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Get { path, alias }, line))
            }
            TokenKind::Class =>
            {
                self.advance();
                let name = self.expect_name("Expected class name")?;
                self.eat_newline();
                let body = self.parse_block_until(&[TokenKind::End])?;
                self.expect(TokenKind::End, "Expected 'end' after class")?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Class { name, body }, line))
            }
            TokenKind::Try =>
            {
                self.advance();
                self.eat_newline();
                let body = self.parse_block_until(&[TokenKind::Catch])?;
                self.expect(TokenKind::Catch, "Expected 'catch' after try block")?;
                let catch_var = self.expect_name("Expected error variable name after 'catch'")?;
                self.eat_newline();
                let catch_body = self.parse_block_until(&[TokenKind::End])?;
                self.expect(TokenKind::End, "Expected 'end' after catch")?;
                self.eat_newline();
                Ok(self.stmt(
                    StmtKind::Try {
                        body,
                        catch_var,
                        catch_body,
                    },
                    line,
                ))
            }
            TokenKind::Throw =>
            {
                self.advance();
                let value = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Throw(value), line))
            }
            // write <content> to file <path>
            TokenKind::Write =>
            {
                self.advance();
                let content = self.parse_expr()?;
                self.expect(
                    TokenKind::To,
                    "Expected 'to' after content  (usage: write \"text\" to file \"name.txt\")",
                )?;
                self.expect(TokenKind::File, "Expected 'file' after 'to'")?;
                let path = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::WriteFile { content, path }, line))
            }
            // append <content> to file <path>
            TokenKind::Append =>
            {
                self.advance();
                let content = self.parse_expr()?;
                self.expect(
                    TokenKind::To,
                    "Expected 'to' after content  (usage: append \"text\" to file \"name.txt\")",
                )?;
                self.expect(TokenKind::File, "Expected 'file' after 'to'")?;
                let path = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::AppendFile { content, path }, line))
            }
            _ =>
            {
                let expr = self.parse_expr()?;
                self.eat_newline();
                Ok(self.stmt(StmtKind::Expr(expr), line))
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Vec<Stmt>
    {
        Parser::new(Lexer::new(source).tokenize())
            .parse()
            .expect("parse failed")
    }

    fn parse_err(source: &str) -> ParseError
    {
        Parser::new(Lexer::new(source).tokenize())
            .parse()
            .expect_err("expected a parse error")
    }

    #[test]
    fn item_is_contextual()
    {
        // operator form
        let stmts = parse("say item 1 of xs");
        match &stmts[0].kind
        {
            StmtKind::Say(e) => assert!(matches!(e.kind, ExprKind::ItemOf { .. })),
            other => panic!("unexpected stmt {:?}", other),
        }
        // name form: add item to list
        let stmts = parse("add item to basket");
        match &stmts[0].kind
        {
            StmtKind::AddTo { value, target } =>
            {
                assert!(matches!(&value.kind, ExprKind::Var(n) if n.as_str() == "item"));
                assert!(matches!(&target.kind, ExprKind::Var(n) if n.as_str() == "basket"));
            }
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn length_is_contextual()
    {
        let stmts = parse("say length of xs\nsay length");
        assert!(matches!(
            &stmts[0].kind,
            StmtKind::Say(e) if matches!(e.kind, ExprKind::LengthOf(_))
        ));
        assert!(matches!(
            &stmts[1].kind,
            StmtKind::Say(e) if matches!(&e.kind, ExprKind::Var(n) if n.as_str() == "length")
        ));
    }

    #[test]
    fn sort_by_field_shorthand_encodes_a_string_key()
    {
        let stmts = parse("say sort people by age");
        let StmtKind::Say(e) = &stmts[0].kind
        else
        {
            panic!()
        };
        let ExprKind::Sort { key: Some(key), .. } = &e.kind
        else
        {
            panic!("expected sort with key")
        };
        assert!(matches!(&key.kind, ExprKind::Str(s) if s.as_str() == "age"));

        let stmts = parse("say sort xs by function(x)\nreturn x\nend");
        let StmtKind::Say(e) = &stmts[0].kind
        else
        {
            panic!()
        };
        let ExprKind::Sort { key: Some(key), .. } = &e.kind
        else
        {
            panic!("expected sort with key")
        };
        assert!(matches!(&key.kind, ExprKind::Lambda { .. }));
    }

    #[test]
    fn lambda_versus_function_statement()
    {
        let stmts = parse("function twice(x)\nreturn x * 2\nend");
        assert!(matches!(&stmts[0].kind, StmtKind::Func { name, .. } if name.as_str() == "twice"));

        let stmts = parse("let f = function(x)\nreturn x\nend");
        let StmtKind::Let { init, .. } = &stmts[0].kind
        else
        {
            panic!()
        };
        assert!(matches!(init.kind, ExprKind::Lambda { .. }));
    }

    #[test]
    fn ternary_in_expression_position()
    {
        let stmts = parse("let x = if n < 2 then n else 0");
        let StmtKind::Let { init, .. } = &stmts[0].kind
        else
        {
            panic!()
        };
        assert!(matches!(init.kind, ExprKind::Ternary { .. }));
    }

    #[test]
    fn one_line_if_statement()
    {
        let stmts = parse("if n < 2 then return n\nsay 1");
        assert_eq!(stmts.len(), 2);
        let StmtKind::If {
            then_body,
            else_body,
            ..
        } = &stmts[0].kind
        else
        {
            panic!("expected if statement")
        };
        assert_eq!(then_body.len(), 1);
        assert!(matches!(then_body[0].kind, StmtKind::Return(_)));
        assert!(else_body.is_empty());
    }

    #[test]
    fn semicolon_separates_statements_in_a_method_body()
    {
        let stmts = parse("function init(a,b) set self.x = a; set self.y = b end");
        let StmtKind::Func { body, .. } = &stmts[0].kind
        else
        {
            panic!()
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].kind, StmtKind::Set { .. }));
        assert!(matches!(body[1].kind, StmtKind::Set { .. }));
    }

    #[test]
    fn file_grammar_shapes()
    {
        let stmts = parse(
            "let a = read file \"x.txt\"\nlet b = file exists \"x.txt\"\nlet c = lines of file \"x.txt\"\nwrite \"hi\" to file \"y.txt\"\nappend \"!\" to file \"y.txt\"",
        );
        let kinds: Vec<&str> = stmts
            .iter()
            .map(|s| match &s.kind
            {
                StmtKind::Let { init, .. } => match init.kind
                {
                    ExprKind::ReadFile(_) => "read",
                    ExprKind::FileExists(_) => "exists",
                    ExprKind::LinesOfFile(_) => "lines",
                    _ => "?",
                },
                StmtKind::WriteFile { .. } => "write",
                StmtKind::AppendFile { .. } => "append",
                _ => "?",
            })
            .collect();
        assert_eq!(kinds, vec!["read", "exists", "lines", "write", "append"]);
    }

    #[test]
    fn contextual_keywords_as_parameter_names()
    {
        let stmts = parse("function f(item, to, by)\nreturn item\nend");
        let StmtKind::Func { params, .. } = &stmts[0].kind
        else
        {
            panic!()
        };
        let names: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["item", "to", "by"]);
    }

    #[test]
    fn object_and_list_literals_allow_embedded_newlines()
    {
        let stmts = parse("let v = {\n  name: \"ada\",\n  ages: [\n    1,\n    2\n  ]\n}");
        let StmtKind::Let { init, .. } = &stmts[0].kind
        else
        {
            panic!()
        };
        let ExprKind::Object(pairs) = &init.kind
        else
        {
            panic!("expected object literal")
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.as_str(), "name");
    }

    #[test]
    fn member_access_admits_keyword_fields()
    {
        let stmts = parse("say xs.length");
        let StmtKind::Say(e) = &stmts[0].kind
        else
        {
            panic!()
        };
        assert!(matches!(&e.kind, ExprKind::Member { field, .. } if field.as_str() == "length"));
    }

    #[test]
    fn errors_carry_the_source_line()
    {
        let err = parse_err("say 1\nlet = 3");
        assert_eq!(err.line, 2);
        assert!(err.message.contains("Expected variable name"));
        assert!(err.message.contains("'='"));
    }

    #[test]
    fn try_catch_block_shape()
    {
        let stmts = parse("try\nthrow \"boom\"\ncatch e\nsay e\nend");
        let StmtKind::Try {
            body,
            catch_var,
            catch_body,
        } = &stmts[0].kind
        else
        {
            panic!()
        };
        assert_eq!(body.len(), 1);
        assert_eq!(catch_var.as_str(), "e");
        assert_eq!(catch_body.len(), 1);
    }
}
