use std::rc::Rc;

use crate::lexer::Span;
use crate::value::Value;

/// A constant or non-constant right-hand side of a member assignment.
#[derive(Debug, Clone)]
pub enum Expr {
    String { span: Span, value: Rc<str> },
    Bytes { span: Span, value: Rc<[u8]> },
    Int { span: Span, value: i64 },
    Float { span: Span, value: f64 },
    Bool { span: Span, value: bool },
    Null { span: Span },
    /// A reference to some other name — dynamic, not a literal constant.
    Var { span: Span },
    /// A list display — constant but composite, never a literal.
    List { span: Span, items: Vec<Expr> },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::String { span, .. }
            | Expr::Bytes { span, .. }
            | Expr::Int { span, .. }
            | Expr::Float { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::Var { span }
            | Expr::List { span, .. } => span,
        }
    }

    /// Human-readable kind tag, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::String { .. } => "string",
            Expr::Bytes { .. } => "bytes",
            Expr::Int { .. } => "int",
            Expr::Float { .. } => "float",
            Expr::Bool { .. } => "bool",
            Expr::Null { .. } => "null",
            Expr::Var { .. } => "reference",
            Expr::List { .. } => "list",
        }
    }

    /// The constant value of this expression, if it has one.
    /// `Var` is dynamic and yields `None`; lists yield a composite
    /// `Value::Array` which classification will reject.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Expr::String { value, .. } => Some(Value::String(value.clone())),
            Expr::Bytes { value, .. } => Some(Value::Bytes(value.clone())),
            Expr::Int { value, .. } => Some(Value::Int(*value)),
            Expr::Float { value, .. } => Some(Value::Float(*value)),
            Expr::Bool { value, .. } => Some(Value::Bool(*value)),
            Expr::Null { .. } => Some(Value::Null),
            Expr::Var { .. } => None,
            Expr::List { items, .. } => {
                let values: Option<Vec<Value>> = items.iter().map(Expr::to_value).collect();
                values.map(Value::from)
            }
        }
    }
}

/// A `name = expr` statement inside a declaration body.
#[derive(Debug, Clone)]
pub struct MemberStmt {
    pub span: Span,
    pub name: Rc<str>,
    pub value: Expr,
}

/// Keyword-style options attached to a declaration:
/// `(extend, allow_aliases = false, callable)`.
#[derive(Debug, Clone, Default)]
pub struct DeclOptions {
    pub extend: bool,
    pub allow_aliases: Option<bool>,
    pub callable_as_validator: Option<bool>,
}

/// One `domain Name : Parent (options) { ... }` declaration.
#[derive(Debug, Clone)]
pub struct DomainDecl {
    pub span: Span,
    pub module: Rc<str>,
    pub name: Rc<str>,
    /// Parent references by name. More than one is a diagnostic, but the
    /// syntax admits it so the synthesizer can report it.
    pub parents: Vec<(Rc<str>, Span)>,
    pub options: DeclOptions,
    /// The `_ignore_ = ...` directive, unvalidated.
    pub ignore: Option<Expr>,
    pub members: Vec<MemberStmt>,
}

impl DomainDecl {
    /// Stable declaration identity: `module::Name`.
    pub fn ident(&self) -> Rc<str> {
        format!("{}::{}", self.module, self.name).into()
    }

    /// Identity a same-module parent reference would resolve to.
    pub fn parent_ident(&self, parent: &str) -> Rc<str> {
        format!("{}::{}", self.module, parent).into()
    }
}
