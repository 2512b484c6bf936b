//! Static synthesizer: rebuilds the domain model from declaration syntax
//! alone, without executing anything, and serves type queries against it.
//!
//! The synthesizer mirrors the runtime registry's semantics — flag
//! inheritance, the extend opt-in, strict alias mode, name collisions —
//! but reports violations as [`Diagnostic`]s attached to the offending
//! statement instead of aborting: a static pass must keep going so that
//! later declarations still get analyzed.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ast::{DomainDecl, Expr};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::domain::Domain;
use crate::error::DeclarationError;
use crate::lexer::Span;
use crate::typing::Type;
use crate::value::Literal;

/// The syntax-derived model of one domain declaration, persisted against
/// the declaration's stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub name: Rc<str>,
    /// Every declared (name, value) pair, aliases included, in order.
    pub members: Vec<(Rc<str>, Literal)>,
    pub allow_aliases: bool,
    pub callable_as_validator: bool,
}

impl DomainRecord {
    /// Unique values in first-seen order, aliases collapsed.
    pub fn canonical_values(&self) -> Vec<Literal> {
        let mut unique: Vec<Literal> = Vec::new();
        for (_, value) in &self.members {
            if !unique.contains(value) {
                unique.push(value.clone());
            }
        }
        unique
    }

    pub fn member(&self, name: &str) -> Option<&Literal> {
        self.members
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, value: &Literal) -> bool {
        self.members.iter().any(|(_, v)| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Replay this record through the runtime registry. The two engines
    /// agree on every constant declaration; this is how hosts hand a
    /// statically derived domain to runtime consumers.
    pub fn to_domain(&self) -> Result<Domain, DeclarationError> {
        let mut builder = Domain::builder(self.name.clone())
            .allow_aliases(self.allow_aliases)
            .callable_as_validator(self.callable_as_validator);
        for (name, value) in &self.members {
            builder = builder.member(name.clone(), value.to_value());
        }
        builder.build()
    }

    fn expected_list(&self) -> String {
        self.canonical_values()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where a domain reference appears, which decides how it is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationContext {
    /// Ordinary annotation position: expand to the exact literal union.
    Type,
    /// Base-class position of another declaration: keep the domain type
    /// itself so extension declarations still type-check.
    BaseClass,
}

/// One synthesizer per analysis session. Owns the declaration-identity
/// keyed cache (written once per declaration, read-only afterwards) and
/// the accumulated diagnostics.
#[derive(Default)]
pub struct Synthesizer {
    records: BTreeMap<Rc<str>, Rc<DomainRecord>>,
    diagnostics: Vec<Diagnostic>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one declaration: derive its record from syntax and persist
    /// it. A declaration identity already in the cache is returned as-is —
    /// incremental re-analysis never re-scans an unchanged declaration.
    pub fn process(&mut self, decl: &DomainDecl) -> Rc<DomainRecord> {
        let ident = decl.ident();
        if let Some(record) = self.records.get(&ident) {
            return record.clone();
        }
        let record = Rc::new(self.derive(decl));
        self.records.insert(ident, record.clone());
        record
    }

    fn derive(&mut self, decl: &DomainDecl) -> DomainRecord {
        if decl.parents.len() > 1 {
            let names = decl
                .parents
                .iter()
                .map(|(n, _)| n.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            self.diagnostics.push(Diagnostic::error(
                &decl.span,
                DiagnosticKind::MultipleParents,
                format!("'{}' may not inherit from multiple domains ({names})", decl.name),
            ));
        }

        let parent: Option<Rc<DomainRecord>> = match decl.parents.first() {
            Some((pname, pspan)) => {
                let pid = decl.parent_ident(pname);
                match self.records.get(&pid) {
                    Some(record) => Some(record.clone()),
                    None => {
                        self.diagnostics.push(Diagnostic::error(
                            pspan,
                            DiagnosticKind::UnresolvedParent,
                            format!("unknown parent domain '{pname}'"),
                        ));
                        None
                    }
                }
            }
            None => None,
        };

        // Explicit option wins, else inherit from the parent record, else default.
        let allow_aliases = decl
            .options
            .allow_aliases
            .or(parent.as_ref().map(|p| p.allow_aliases))
            .unwrap_or(true);
        let callable_as_validator = decl
            .options
            .callable_as_validator
            .or(parent.as_ref().map(|p| p.callable_as_validator))
            .unwrap_or(false);

        if let Some(p) = &parent {
            if !p.is_empty() && !decl.options.extend {
                self.diagnostics.push(Diagnostic::error(
                    &decl.span,
                    DiagnosticKind::ExtendRequired,
                    format!(
                        "cannot subclass '{}' without extend; it already has members",
                        p.name
                    ),
                ));
            }
        }

        let ignore = self.parse_ignore(decl);

        let mut members: Vec<(Rc<str>, Literal)> = match &parent {
            Some(p) if decl.options.extend => p.members.clone(),
            _ => Vec::new(),
        };
        let inherited_len = members.len();
        let parent_name = parent.as_ref().map(|p| p.name.clone());

        // Collect own members from literal assignment statements only.
        // Dynamic expressions are not literals and are skipped; constant
        // expressions that fail classification are diagnosed, matching the
        // runtime engine's rejection policy. A repeated own name keeps the
        // last assignment (namespace semantics).
        let mut own: Vec<(Rc<str>, Literal, Span)> = Vec::new();
        for stmt in &decl.members {
            if ignore.contains(stmt.name.as_ref()) {
                continue;
            }
            let raw = match stmt.value.to_value() {
                Some(raw) => raw,
                None => continue,
            };
            let lit = match Literal::classify(&raw) {
                Ok(lit) => lit,
                Err(e) => {
                    self.diagnostics.push(Diagnostic::error(
                        &stmt.span,
                        DiagnosticKind::InvalidMemberValue,
                        format!("member '{}.{}': {e}", decl.name, stmt.name),
                    ));
                    continue;
                }
            };

            if members[..inherited_len].iter().any(|(n, _)| *n == stmt.name) {
                self.diagnostics.push(Diagnostic::error(
                    &stmt.span,
                    DiagnosticKind::InheritedNameCollision,
                    format!(
                        "member name '{}.{}' conflicts with inherited member '{}.{}'",
                        decl.name,
                        stmt.name,
                        parent_name.as_deref().unwrap_or("?"),
                        stmt.name
                    ),
                ));
                continue;
            }

            match own.iter_mut().find(|(n, _, _)| *n == stmt.name) {
                Some(slot) => {
                    slot.1 = lit;
                    slot.2 = stmt.span.clone();
                }
                None => own.push((stmt.name.clone(), lit, stmt.span.clone())),
            }
        }

        if !allow_aliases {
            let mut seen: BTreeMap<Literal, Rc<str>> = BTreeMap::new();
            for (name, value) in &members {
                seen.entry(value.clone()).or_insert_with(|| name.clone());
            }
            for (name, value, span) in &own {
                match seen.get(value) {
                    Some(canonical) => {
                        self.diagnostics.push(Diagnostic::error(
                            span,
                            DiagnosticKind::AliasCollision,
                            format!(
                                "duplicate value {value}: '{name}' is an alias for \
                                 '{canonical}' (allow_aliases=false)"
                            ),
                        ));
                    }
                    None => {
                        seen.insert(value.clone(), name.clone());
                    }
                }
            }
        }

        members.extend(own.into_iter().map(|(name, value, _)| (name, value)));

        DomainRecord {
            name: decl.name.clone(),
            members,
            allow_aliases,
            callable_as_validator,
        }
    }

    fn parse_ignore(&mut self, decl: &DomainDecl) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let Some(expr) = &decl.ignore else {
            return out;
        };
        match expr {
            Expr::String { value, .. } => {
                for name in value.replace(',', " ").split_whitespace() {
                    out.insert(name.to_string());
                }
            }
            Expr::List { items, .. } => {
                for item in items {
                    match item {
                        Expr::String { value, .. } => {
                            out.insert(value.to_string());
                        }
                        Expr::Var { span } => {
                            out.insert(span.text().to_string());
                        }
                        other => {
                            self.diagnostics.push(Diagnostic::error(
                                other.span(),
                                DiagnosticKind::MalformedIgnore,
                                format!(
                                    "_ignore_ entries must be names, got {}",
                                    other.kind_name()
                                ),
                            ));
                        }
                    }
                }
            }
            Expr::Null { .. } => {}
            other => {
                self.diagnostics.push(Diagnostic::error(
                    other.span(),
                    DiagnosticKind::MalformedIgnore,
                    format!(
                        "_ignore_ must be a string or a list of names, got {}",
                        other.kind_name()
                    ),
                ));
            }
        }
        out
    }

    /// The persisted record for a declaration identity, if processed.
    pub fn record(&self, ident: &str) -> Option<Rc<DomainRecord>> {
        self.records.get(ident).cloned()
    }

    /// Rewrite a domain reference in annotation position into an exact
    /// union of literal types. An empty domain maps to the bottom type.
    pub fn resolve_annotation(&self, ident: &str, ctx: AnnotationContext) -> Option<Type> {
        let record = self.records.get(ident)?;
        Some(match ctx {
            AnnotationContext::BaseClass => Type::Domain {
                ident: ident.into(),
            },
            AnnotationContext::Type => Type::union_of(record.canonical_values()),
        })
    }

    /// The inferred type of one declared member: the exact literal of its
    /// value, not the general scalar type.
    pub fn member_type(&self, ident: &str, name: &str) -> Option<Type> {
        let record = self.records.get(ident)?;
        record.member(name).cloned().map(Type::literal)
    }

    /// Refine the result type of a validating call against a domain.
    ///
    /// Reports misuse (domain not callable, literal argument not a member)
    /// as diagnostics at `span` and degrades the result type accordingly.
    pub fn narrow_call_result(&mut self, ident: &str, arg: &Type, span: &Span) -> Type {
        let Some(record) = self.records.get(ident).cloned() else {
            return Type::Unknown;
        };

        if !record.callable_as_validator {
            self.diagnostics.push(Diagnostic::error(
                span,
                DiagnosticKind::NotCallable,
                format!(
                    "'{}' is not callable; use {}.validate(x) or pass callable=true",
                    record.name, record.name
                ),
            ));
            return Type::Domain {
                ident: ident.into(),
            };
        }

        match arg {
            Type::Literal { value } => {
                if record.contains(value) {
                    Type::literal(value.clone())
                } else {
                    self.diagnostics.push(Diagnostic::error(
                        span,
                        DiagnosticKind::NotAMember,
                        format!(
                            "value {value} is not a member of {}; expected one of: {}",
                            record.name,
                            record.expected_list()
                        ),
                    ));
                    Type::union_of(record.canonical_values())
                }
            }
            // Argument not known at analysis time: the full literal union.
            _ => Type::union_of(record.canonical_values()),
        }
    }

    /// Flag an isinstance/issubclass-style check against a domain.
    pub fn check_type_test(&mut self, ident: &str, func: &str, span: &Span) {
        if let Some(record) = self.records.get(ident) {
            self.diagnostics.push(Diagnostic::error(
                span,
                DiagnosticKind::UnsupportedTypeTest,
                format!(
                    "{func}() is not supported for domain '{}'; domain membership \
                     is a value-level predicate, not a runtime type relationship",
                    record.name
                ),
            ));
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Persist the analysis cache. The format is opaque and internal.
    pub fn save_cache<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.records)?;
        Ok(())
    }

    /// Merge a previously saved cache. Existing entries win: the cache is
    /// written once per declaration identity and never overwritten.
    pub fn load_cache<R: std::io::Read>(&mut self, reader: R) -> Result<()> {
        let records: BTreeMap<Rc<str>, Rc<DomainRecord>> = serde_json::from_reader(reader)?;
        for (ident, record) in records {
            self.records.entry(ident).or_insert(record);
        }
        Ok(())
    }
}
