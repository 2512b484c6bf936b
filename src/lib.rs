// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod algebra;
mod ast;
mod diagnostic;
mod domain;
mod error;
mod lexer;
mod parser;
mod synth;
mod typing;
mod value;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use domain::{Domain, DomainBuilder};
pub use error::{ClassifyError, DeclarationError, LookupError, ValidationError};
pub use synth::{AnnotationContext, DomainRecord, Synthesizer};
pub use typing::Type;
pub use value::{Literal, LiteralKind, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
