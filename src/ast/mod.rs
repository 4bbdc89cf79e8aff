//! The schema-free parse tree. A `.sane` program is a sequence of `let`
//! declarations followed by one body expression; both lets and the body are
//! built from the same small set of `Ast` node kinds.
//!
//! This is the "AST" the spec describes as supplied by an external parser;
//! here it is produced by [`crate::lexer`] + [`crate::parser`] in the same
//! crate, but the shape is exactly the contract in spec.md §6: `Literal`,
//! `Access`, `BinaryExpression`, `UnaryExpression`, `Call`, `Cast`,
//! `LetEntry`, `Type`.

use crate::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(String),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    And,
    Or,
    Eq,
    Ne,
    Is,
    IsNot,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// A named or positional argument in a function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncArg {
    pub name: Option<String>,
    pub value: Ast,
}

impl FuncArg {
    pub fn positional(value: Ast) -> Self {
        FuncArg { name: None, value }
    }
    pub fn named(name: impl Into<String>, value: Ast) -> Self {
        FuncArg {
            name: Some(name.into()),
            value,
        }
    }
}

/// A type annotation as written in source, e.g. `decimal(10, 2)` or `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: String,
    pub args: Vec<i64>,
}

/// The signature of a callable `let`: positional/named argument names with
/// optional default-value expressions, re-analysed lazily at each call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Ast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetEntry {
    pub name: String,
    pub signature: Option<Signature>,
    pub body: Box<Ast>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    Literal(Literal),
    /// `a.b` — scoped column access, or `arg.column` for a table-valued
    /// argument.
    Access(Box<Ast>, String),
    /// A bare identifier, e.g. a column name used unqualified, or a `let`
    /// name with no arguments.
    Ident(String),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
    Unary(UnaryOp, Box<Ast>),
    /// Also the desugaring target of pipeline method syntax: the parser
    /// turns `base.name(args)` into `Call("name", [positional(base),
    /// ...args])`, so `region.filter(p)` and a hypothetical free-standing
    /// `filter(region, p)` reach the analyser as the same node.
    Call(String, Vec<FuncArg>),
    Cast(Box<Ast>, TypeName),
    /// A brace-delimited list of (optionally aliased) expressions, e.g.
    /// `{o_orderstatus}` or `{n: count()}`. Used wherever a built-in expects
    /// the `expression-list` argument shape (map/project entries, group-by
    /// keys and aggregates, sort keys). Not its own top-level spec.md AST
    /// kind, but required to represent the shape spec.md §4.1 names.
    Tuple(Vec<FuncArg>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub span: Span,
}

impl Ast {
    pub fn new(kind: AstKind, span: Span) -> Self {
        Ast { kind, span }
    }
}

/// A whole `.sane` program: an ordered sequence of `let`s followed by the
/// body expression whose result becomes the compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub lets: Vec<LetEntry>,
    pub body: Ast,
}
