use core::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::value::Literal;

/// The static view of a domain reference: a union of exact value literals.
///
/// `Never` is the bottom type — an empty domain admits no value at all,
/// rather than any value. `Unknown` carries no static information and is
/// what call-site arguments degrade to when they are not compile-time
/// literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Type {
    Unknown,
    Never,
    Literal { value: Literal },
    Union { values: Rc<Vec<Literal>> },
    /// The domain declaration itself, e.g. in base-class position.
    Domain { ident: Rc<str> },
}

impl Type {
    pub fn literal(value: Literal) -> Type {
        Type::Literal { value }
    }

    /// Build a union of exact literal types, deduplicated by identity key
    /// and order-stable. Zero members collapse to `Never`, one to the
    /// literal itself.
    pub fn union_of<I>(values: I) -> Type
    where
        I: IntoIterator<Item = Literal>,
    {
        let mut unique: Vec<Literal> = Vec::new();
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        match unique.len() {
            0 => Type::Never,
            1 => Type::Literal {
                value: unique.remove(0),
            },
            _ => Type::Union {
                values: Rc::new(unique),
            },
        }
    }

    /// The literal this type proves, if it proves exactly one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Type::Literal { value } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("Unknown"),
            Type::Never => f.write_str("Never"),
            Type::Literal { value } => write!(f, "Literal[{value}]"),
            Type::Union { values } => {
                f.write_str("Literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Type::Domain { ident } => write!(f, "domain {ident}"),
        }
    }
}
