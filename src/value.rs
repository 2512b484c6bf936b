use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

/// A raw runtime value, as handed to the domain registry by a declaration.
///
/// Only the scalar variants can become domain members; `Array` and `Object`
/// exist so that classification can name the offending kind when a
/// declaration tries to register a composite.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<Rc<str>, Value>>),
}

impl Value {
    /// Human-readable kind tag, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::Bytes(b) => write_bytes(f, b),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {v}", k.as_ref())?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for &b in bytes {
        match b {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\t' => f.write_str("\\t")?,
            b'\r' => f.write_str("\\r")?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\x{b:02x}")?,
        }
    }
    f.write_str("\"")
}

/// The kind tag of a [`Literal`]. Together with the value it forms the
/// strict identity key that keeps e.g. `true` and `1` distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LiteralKind::Null => "null",
            LiteralKind::Bool => "bool",
            LiteralKind::Int => "int",
            LiteralKind::Float => "float",
            LiteralKind::String => "string",
            LiteralKind::Bytes => "bytes",
        })
    }
}

/// A canonical literal value — the closed set of scalars a domain may hold.
///
/// The tagged representation *is* the strict identity key: two literals of
/// different kinds never compare equal, even when a permissive equality
/// would conflate their payloads (`Bool(true)` vs `Int(1)`).
///
/// Floats are restricted at classification time: NaN and negative zero are
/// rejected, which is what makes the manual `Eq`/`Ord` below total and
/// consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    #[serde(rename = "string")]
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
}

impl Literal {
    /// Classify a raw value into a literal, or reject it.
    ///
    /// NaN and `-0.0` are rejected with distinct diagnostics; composites
    /// are rejected naming their kind.
    pub fn classify(value: &Value) -> Result<Literal, ClassifyError> {
        match value {
            Value::Null => Ok(Literal::Null),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Int(i) => Ok(Literal::Int(*i)),
            Value::Float(x) if x.is_nan() => Err(ClassifyError::NanFloat),
            Value::Float(x) if *x == 0.0 && x.is_sign_negative() => {
                Err(ClassifyError::NegativeZeroFloat)
            }
            Value::Float(x) => Ok(Literal::Float(*x)),
            Value::String(s) => Ok(Literal::Str(s.clone())),
            Value::Bytes(b) => Ok(Literal::Bytes(b.clone())),
            Value::Array(_) | Value::Object(_) => Err(ClassifyError::NotALiteral {
                kind: value.kind_name(),
            }),
        }
    }

    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::Null => LiteralKind::Null,
            Literal::Bool(_) => LiteralKind::Bool,
            Literal::Int(_) => LiteralKind::Int,
            Literal::Float(_) => LiteralKind::Float,
            Literal::Str(_) => LiteralKind::String,
            Literal::Bytes(_) => LiteralKind::Bytes,
        }
    }

    /// The raw value this literal stands for.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(x) => Value::Float(*x),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Literal {}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Literal::Null, Literal::Null) => Ordering::Equal,
            (Literal::Bool(a), Literal::Bool(b)) => a.cmp(b),
            (Literal::Int(a), Literal::Int(b)) => a.cmp(b),
            // total_cmp is a total order; NaN and -0.0 are excluded at
            // classification so bitwise distinctions never surface.
            (Literal::Float(a), Literal::Float(b)) => a.total_cmp(b),
            (Literal::Str(a), Literal::Str(b)) => a.cmp(b),
            (Literal::Bytes(a), Literal::Bytes(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Str(s) => write!(f, "{:?}", s.as_ref()),
            Literal::Bytes(b) => write_bytes(f, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_scalars() {
        assert_eq!(Literal::classify(&Value::Null), Ok(Literal::Null));
        assert_eq!(
            Literal::classify(&Value::from("GET")),
            Ok(Literal::Str("GET".into()))
        );
        assert_eq!(Literal::classify(&Value::from(200)), Ok(Literal::Int(200)));
        assert_eq!(
            Literal::classify(&Value::from(true)),
            Ok(Literal::Bool(true))
        );
        assert_eq!(
            Literal::classify(&Value::from(b"raw".as_slice())),
            Ok(Literal::Bytes(b"raw".as_slice().into()))
        );
        assert_eq!(
            Literal::classify(&Value::from(1.5)),
            Ok(Literal::Float(1.5))
        );
    }

    #[test]
    fn classify_rejects_nan_and_negative_zero_distinctly() {
        assert_eq!(
            Literal::classify(&Value::from(f64::NAN)),
            Err(ClassifyError::NanFloat)
        );
        assert_eq!(
            Literal::classify(&Value::from(-0.0)),
            Err(ClassifyError::NegativeZeroFloat)
        );
        // Positive zero stays a valid literal.
        assert_eq!(Literal::classify(&Value::from(0.0)), Ok(Literal::Float(0.0)));
    }

    #[test]
    fn classify_rejects_composites_naming_kind() {
        let arr = Value::from(vec![Value::from(1)]);
        assert_eq!(
            Literal::classify(&arr),
            Err(ClassifyError::NotALiteral { kind: "array" })
        );
    }

    #[test]
    fn strict_identity_keeps_kinds_apart() {
        assert_ne!(Literal::Bool(true), Literal::Int(1));
        assert_ne!(Literal::Bool(false), Literal::Int(0));
        assert_ne!(Literal::Int(0), Literal::Float(0.0));
        assert_ne!(Literal::Str("1".into()), Literal::Int(1));
        assert_ne!(Literal::Bytes(b"x".as_slice().into()), Literal::Str("x".into()));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Literal::Str("GET".into()).to_string(), "\"GET\"");
        assert_eq!(Literal::Int(404).to_string(), "404");
        assert_eq!(Literal::Null.to_string(), "null");
        assert_eq!(
            Literal::Bytes(b"a\"b".as_slice().into()).to_string(),
            "b\"a\\\"b\""
        );
        assert_eq!(Value::from(vec![Value::from(1), Value::Null]).to_string(), "[1, null]");
    }

    #[test]
    fn literal_serde_round_trip() -> anyhow::Result<()> {
        let lits = vec![
            Literal::Null,
            Literal::Bool(true),
            Literal::Int(-3),
            Literal::Float(2.5),
            Literal::Str("GET".into()),
            Literal::Bytes(b"\x00\xff".as_slice().into()),
        ];
        for lit in lits {
            let json = serde_json::to_string(&lit)?;
            let back: Literal = serde_json::from_str(&json)?;
            assert_eq!(back, lit);
        }
        // The kind tag is explicit in the encoding.
        assert_eq!(
            serde_json::to_string(&Literal::Bool(true))?,
            r#"{"kind":"bool","value":true}"#
        );
        Ok(())
    }
}
