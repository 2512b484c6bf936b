use thiserror::Error;

/// Rejection returned by [`Literal::classify`](crate::Literal::classify).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("float NaN is not a valid literal value")]
    NanFloat,
    #[error("float -0.0 is not a valid literal value")]
    NegativeZeroFloat,
    #[error("{kind} is not a literal")]
    NotALiteral { kind: &'static str },
}

/// Fatal errors reported while building a domain from its declaration.
///
/// A declaration either builds a complete frozen [`Domain`](crate::Domain)
/// or fails with one of these; no partially built domain is ever visible.
/// Value payloads are carried in display form so the errors stay
/// `Send + Sync` and convert into `anyhow::Error` cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("member '{domain}.{member}': {source}")]
    InvalidMember {
        domain: String,
        member: String,
        source: ClassifyError,
    },

    #[error(
        "'{child}' inherits from populated domain '{parent}'; \
         opt in with extend=true to inherit and extend its members"
    )]
    ExtendRequired { child: String, parent: String },

    #[error("'{child}' may not inherit from multiple domains ({parents})")]
    MultipleParents { child: String, parents: String },

    #[error(
        "duplicate value {value} in '{domain}': '{member}' conflicts with \
         canonical member '{canonical}' (allow_aliases=false)"
    )]
    AliasCollision {
        domain: String,
        member: String,
        value: String,
        canonical: String,
    },

    #[error("member name '{child}.{member}' conflicts with inherited member '{parent}.{member}'")]
    InheritedNameCollision {
        child: String,
        member: String,
        parent: String,
    },

    #[error("member name '{domain}.{member}' is declared more than once")]
    DuplicateName { domain: String, member: String },

    #[error("ignore directive must be a string or a list of names, got {kind}")]
    MalformedIgnore { kind: &'static str },
}

/// Recoverable errors raised when validating a value against a frozen domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{value} is not a valid {domain}; valid values: {expected}")]
    NotAMember {
        domain: String,
        value: String,
        expected: String,
    },

    #[error("{value} is not a valid {domain}: {source}")]
    NotALiteral {
        domain: String,
        value: String,
        source: ClassifyError,
    },

    #[error("'{domain}' is not callable; use validate() or a membership test")]
    NotCallable { domain: String },
}

/// Recoverable errors raised by name/value lookups on a frozen domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{name}' is not a member of {domain}")]
    UnknownName { domain: String, name: String },

    #[error("{value} is not a member of {domain}")]
    UnknownValue { domain: String, value: String },
}
