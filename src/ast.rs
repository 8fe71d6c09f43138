use std::rc::Rc;

pub type ExprRef = Rc<Expr>;
// Blocks are shared: function values and class definitions hold handles
// into the parsed tree, so closures never copy statements.
pub type Block = Rc<Vec<Stmt>>;
pub type Name = Rc<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp
{
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp
{
    Neg,
    Not,
}

#[derive(Debug)]
pub struct Expr
{
    pub kind: ExprKind,
    pub line: usize,
}

#[derive(Debug)]
pub enum ExprKind
{
    Number(f64),
    Str(Name),
    Bool(bool),
    Null,
    List(Vec<ExprRef>),
    Object(Vec<(Name, ExprRef)>),
    Var(Name),
    Binary
    {
        op: BinOp,
        left: ExprRef,
        right: ExprRef,
    },
    Unary
    {
        op: UnOp,
        operand: ExprRef,
    },
    Index
    {
        target: ExprRef,
        index: ExprRef,
    },
    Member
    {
        target: ExprRef,
        field: Name,
    },
    Call
    {
        callee: ExprRef,
        args: Vec<ExprRef>,
    },
    // Scratch-style list forms
    LengthOf(ExprRef),
    ItemOf
    {
        index: ExprRef,
        list: ExprRef,
    },
    KeepWhere
    {
        list: ExprRef,
        pred: ExprRef,
    },
    // classes and dicts
    New
    {
        class: Name,
        args: Vec<ExprRef>,
    },
    Has
    {
        item: ExprRef,
        collection: ExprRef,
    },
    KeysOf(ExprRef),
    ValuesOf(ExprRef),
    // file grammar
    ReadFile(ExprRef),
    FileExists(ExprRef),
    LinesOfFile(ExprRef),
    // functions
    Lambda
    {
        params: Rc<Vec<Name>>,
        body: Block,
    },
    Ternary
    {
        cond: ExprRef,
        then: ExprRef,
        otherwise: ExprRef,
    },
    // string forms
    Split
    {
        text: ExprRef,
        sep: ExprRef,
    },
    Join
    {
        list: ExprRef,
        sep: ExprRef,
    },
    Trim(ExprRef),
    Replace
    {
        text: ExprRef,
        from: ExprRef,
        to: ExprRef,
    },
    IndexOf
    {
        needle: ExprRef,
        haystack: ExprRef,
    },
    Uppercase(ExprRef),
    Lowercase(ExprRef),
    Substr
    {
        text: ExprRef,
        from: ExprRef,
        to: ExprRef,
    },
    TypeOf(ExprRef),
    Sort
    {
        list: ExprRef,
        key: Option<ExprRef>,
    },
    ParseJson(ExprRef),
    JsonOf(ExprRef),
    Fetch
    {
        url: ExprRef,
        opts: Option<ExprRef>,
    },
    Run(ExprRef),
    Ask(ExprRef),
}

#[derive(Debug)]
pub struct Stmt
{
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug)]
pub enum StmtKind
{
    Let
    {
        name: Name,
        init: ExprRef,
    },
    Set
    {
        target: ExprRef,
        value: ExprRef,
    },
    AddTo
    {
        value: ExprRef,
        target: ExprRef,
    },
    Say(ExprRef),
    Ask
    {
        name: Name,
        prompt: ExprRef,
    },
    Pause,
    If
    {
        cond: ExprRef,
        then_body: Block,
        else_body: Block,
    },
    While
    {
        cond: ExprRef,
        body: Block,
    },
    For
    {
        var: Name,
        iterable: ExprRef,
        body: Block,
    },
    Break,
    Continue,
    Return(ExprRef),
    Func
    {
        name: Name,
        params: Rc<Vec<Name>>,
        body: Block,
    },
    Call(ExprRef),
    Get
    {
        path: Name,
        alias: Name,
    },
    Class
    {
        name: Name,
        body: Block,
    },
    Try
    {
        body: Block,
        catch_var: Name,
        catch_body: Block,
    },
    Throw(ExprRef),
    WriteFile
    {
        content: ExprRef,
        path: ExprRef,
    },
    AppendFile
    {
        content: ExprRef,
        path: ExprRef,
    },
    Expr(ExprRef),
}
