use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::{DeclarationError, LookupError, ValidationError};
use crate::value::{Literal, Value};

/// A finite, named, immutable set of literal values with associated names.
///
/// A domain is constructed exactly once, atomically, by [`DomainBuilder`]:
/// either every declared member classifies and registers cleanly and a
/// frozen `Domain` is returned, or the build fails and nothing is visible.
/// Frozen domains are pure value objects — cloning shares the underlying
/// `Rc` payloads and nothing ever mutates them.
#[derive(Debug, Clone)]
pub struct Domain {
    name: Rc<str>,
    /// Every declared (name, value) pair, aliases included, declaration order.
    declared: Vec<(Rc<str>, Literal)>,
    by_name: BTreeMap<Rc<str>, Literal>,
    /// Unique values in first-seen order.
    canonical: Vec<Literal>,
    /// Value -> declared names for that value, canonical name first.
    names: BTreeMap<Literal, Vec<Rc<str>>>,
    allow_aliases: bool,
    callable_as_validator: bool,
}

impl Domain {
    pub fn builder(name: impl Into<Rc<str>>) -> DomainBuilder {
        DomainBuilder {
            name: name.into(),
            parents: Vec::new(),
            extend: false,
            allow_aliases: None,
            callable_as_validator: None,
            ignore: BTreeSet::new(),
            pairs: Vec::new(),
        }
    }

    /// Freeze pre-classified pairs with default policy (aliases permitted).
    /// Used by the set algebra, where both operands are already frozen and
    /// member names are unique by construction.
    pub(crate) fn from_literal_pairs(name: Rc<str>, pairs: Vec<(Rc<str>, Literal)>) -> Domain {
        let mut by_name = BTreeMap::new();
        let mut canonical = Vec::new();
        let mut names: BTreeMap<Literal, Vec<Rc<str>>> = BTreeMap::new();
        for (member, lit) in &pairs {
            match names.get_mut(lit) {
                Some(list) => list.push(member.clone()),
                None => {
                    canonical.push(lit.clone());
                    names.insert(lit.clone(), vec![member.clone()]);
                }
            }
            by_name.insert(member.clone(), lit.clone());
        }
        Domain {
            name,
            declared: pairs,
            by_name,
            canonical,
            names,
            allow_aliases: true,
            callable_as_validator: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allow_aliases(&self) -> bool {
        self.allow_aliases
    }

    pub fn callable_as_validator(&self) -> bool {
        self.callable_as_validator
    }

    /// Number of unique member values (aliases are not counted).
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// An empty domain is valid, if degenerate.
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Canonical member names in definition order (aliases excluded).
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.canonical.iter().map(|v| self.names[v][0].clone()).collect()
    }

    /// Unique member values in definition order (aliases excluded).
    pub fn values(&self) -> &[Literal] {
        &self.canonical
    }

    /// `(canonical_name, value)` pairs in definition order (aliases excluded).
    pub fn items(&self) -> Vec<(Rc<str>, Literal)> {
        self.canonical
            .iter()
            .map(|v| (self.names[v][0].clone(), v.clone()))
            .collect()
    }

    /// Every declared `(name, value)` pair, aliases included.
    pub fn mapping(&self) -> &[(Rc<str>, Literal)] {
        &self.declared
    }

    /// Iterate over unique member values in first-seen order.
    pub fn iter(&self) -> core::slice::Iter<'_, Literal> {
        self.canonical.iter()
    }

    /// Look up a member value by declared name (aliases included).
    pub fn get(&self, name: &str) -> Result<Literal, LookupError> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::UnknownName {
                domain: self.name.to_string(),
                name: name.to_string(),
            })
    }

    /// All declared names for a value, canonical first.
    pub fn names_of(&self, value: &Literal) -> Result<&[Rc<str>], LookupError> {
        self.names
            .get(value)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::UnknownValue {
                domain: self.name.to_string(),
                value: value.to_string(),
            })
    }

    /// The first-declared name for a value.
    pub fn canonical_name_of(&self, value: &Literal) -> Result<Rc<str>, LookupError> {
        Ok(self.names_of(value)?[0].clone())
    }

    /// Strict membership test on a raw value. Non-literal values are simply
    /// not members; no error is raised here.
    pub fn contains(&self, value: &Value) -> bool {
        match Literal::classify(value) {
            Ok(lit) => self.contains_literal(&lit),
            Err(_) => false,
        }
    }

    pub fn contains_literal(&self, value: &Literal) -> bool {
        self.names.contains_key(value)
    }

    /// Alias for [`contains`](Self::contains), matching the validator surface.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.contains(value)
    }

    /// Validate a raw value, returning its canonical literal on success.
    pub fn validate(&self, value: Value) -> Result<Literal, ValidationError> {
        let lit = Literal::classify(&value).map_err(|source| ValidationError::NotALiteral {
            domain: self.name.to_string(),
            value: value.to_string(),
            source,
        })?;
        if self.contains_literal(&lit) {
            Ok(lit)
        } else {
            Err(ValidationError::NotAMember {
                domain: self.name.to_string(),
                value: lit.to_string(),
                expected: self.expected_list(),
            })
        }
    }

    /// Call-style validation, gated on the `callable_as_validator` policy.
    pub fn call(&self, value: Value) -> Result<Literal, ValidationError> {
        if !self.callable_as_validator {
            return Err(ValidationError::NotCallable {
                domain: self.name.to_string(),
            });
        }
        self.validate(value)
    }

    /// Render the canonical value set for error messages: `"GET", "POST"`.
    pub(crate) fn expected_list(&self) -> String {
        self.canonical
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a Domain {
    type Item = &'a Literal;
    type IntoIter = core::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.declared.is_empty() {
            return write!(f, "<Domain '{}'>", self.name);
        }
        let members = self
            .declared
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "<Domain '{}' [{members}]>", self.name)
    }
}

/// Builds a [`Domain`] from declared pairs, applying alias policy, the
/// extension rule, and the ignore directive.
pub struct DomainBuilder {
    name: Rc<str>,
    parents: Vec<Domain>,
    extend: bool,
    allow_aliases: Option<bool>,
    callable_as_validator: Option<bool>,
    ignore: BTreeSet<Rc<str>>,
    pairs: Vec<(Rc<str>, Value)>,
}

impl DomainBuilder {
    pub fn member(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    pub fn members<I, N, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<Rc<str>>,
        V: Into<Value>,
    {
        for (name, value) in pairs {
            self.pairs.push((name.into(), value.into()));
        }
        self
    }

    /// Declare a parent domain. Declaring more than one fails at build time.
    pub fn inherit(mut self, parent: &Domain) -> Self {
        self.parents.push(parent.clone());
        self
    }

    /// Opt in to inheriting a populated parent's members.
    pub fn extend(mut self, extend: bool) -> Self {
        self.extend = extend;
        self
    }

    /// Explicit setting wins over the parent's; the root default is `true`.
    pub fn allow_aliases(mut self, allow: bool) -> Self {
        self.allow_aliases = Some(allow);
        self
    }

    /// Explicit setting wins over the parent's; the root default is `false`.
    pub fn callable_as_validator(mut self, callable: bool) -> Self {
        self.callable_as_validator = Some(callable);
        self
    }

    /// Ignore directive as comma/space-separated text: `"a, b c"`.
    pub fn ignore_text(mut self, text: &str) -> Self {
        for name in text.replace(',', " ").split_whitespace() {
            self.ignore.insert(name.into());
        }
        self
    }

    /// Ignore directive as an explicit name sequence.
    pub fn ignore_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Rc<str>>,
    {
        for name in names {
            self.ignore.insert(name.into());
        }
        self
    }

    /// Run the build algorithm and freeze the domain.
    pub fn build(self) -> Result<Domain, DeclarationError> {
        let name = self.name;

        if self.parents.len() > 1 {
            let parents = self
                .parents
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(DeclarationError::MultipleParents {
                child: name.to_string(),
                parents,
            });
        }
        let parent = self.parents.first();

        // Explicit option wins, else inherit from the parent, else default.
        let allow_aliases = self
            .allow_aliases
            .or(parent.map(|p| p.allow_aliases))
            .unwrap_or(true);
        let callable_as_validator = self
            .callable_as_validator
            .or(parent.map(|p| p.callable_as_validator))
            .unwrap_or(false);

        if let Some(p) = parent {
            if !p.is_empty() && !self.extend {
                return Err(DeclarationError::ExtendRequired {
                    child: name.to_string(),
                    parent: p.name.to_string(),
                });
            }
        }

        // Seed from the parent when extending. Cloning the name-list map
        // copies each Vec, so alias appends below never reach the parent.
        let (mut declared, mut by_name, mut canonical, mut names, parent_name) =
            match (parent, self.extend) {
                (Some(p), true) => (
                    p.declared.clone(),
                    p.by_name.clone(),
                    p.canonical.clone(),
                    p.names.clone(),
                    Some(p.name.clone()),
                ),
                _ => (
                    Vec::new(),
                    BTreeMap::new(),
                    Vec::new(),
                    BTreeMap::new(),
                    None,
                ),
            };

        let inherited: BTreeSet<Rc<str>> = by_name.keys().cloned().collect();

        for (member, raw) in &self.pairs {
            // Non-public names and ignored names are never members.
            if member.starts_with('_') || self.ignore.contains(member) {
                continue;
            }

            let lit = Literal::classify(raw).map_err(|source| DeclarationError::InvalidMember {
                domain: name.to_string(),
                member: member.to_string(),
                source,
            })?;

            if by_name.contains_key(member) {
                return Err(if inherited.contains(member) {
                    DeclarationError::InheritedNameCollision {
                        child: name.to_string(),
                        member: member.to_string(),
                        parent: parent_name.as_deref().unwrap_or_else(|| name.as_ref()).to_string(),
                    }
                } else {
                    DeclarationError::DuplicateName {
                        domain: name.to_string(),
                        member: member.to_string(),
                    }
                });
            }

            match names.get_mut(&lit) {
                Some(list) => {
                    if !allow_aliases {
                        return Err(DeclarationError::AliasCollision {
                            domain: name.to_string(),
                            member: member.to_string(),
                            value: lit.to_string(),
                            canonical: list[0].to_string(),
                        });
                    }
                    list.push(member.clone());
                }
                None => {
                    canonical.push(lit.clone());
                    names.insert(lit.clone(), vec![member.clone()]);
                }
            }
            declared.push((member.clone(), lit.clone()));
            by_name.insert(member.clone(), lit);
        }

        Ok(Domain {
            name,
            declared,
            by_name,
            canonical,
            names,
            allow_aliases,
            callable_as_validator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifyError;

    fn as_strs(names: &[Rc<str>]) -> Vec<&str> {
        names.iter().map(|n| n.as_ref()).collect()
    }

    fn http() -> Domain {
        Domain::builder("HttpMethod")
            .member("GET", "GET")
            .member("POST", "POST")
            .member("DELETE", "DELETE")
            .build()
            .unwrap()
    }

    #[test]
    fn membership_and_order() {
        let d = http();
        assert_eq!(d.len(), 3);
        assert!(d.contains(&Value::from("GET")));
        assert!(!d.contains(&Value::from("PATCH")));
        let values: Vec<_> = d.iter().map(|v| v.to_string()).collect();
        assert_eq!(values, ["\"GET\"", "\"POST\"", "\"DELETE\""]);
        let keys = d.keys();
        assert_eq!(as_strs(&keys), ["GET", "POST", "DELETE"]);
    }

    #[test]
    fn aliases_collapse_to_one_slot() {
        let d = Domain::builder("Method")
            .member("GET", "GET")
            .member("get", "GET")
            .build()
            .unwrap();
        assert_eq!(d.len(), 1);
        let v = Literal::Str("GET".into());
        assert_eq!(as_strs(d.names_of(&v).unwrap()), ["GET", "get"]);
        assert_eq!(d.canonical_name_of(&v).unwrap().as_ref(), "GET");
        // mapping exposes both names; keys/values only the canonical slot.
        assert_eq!(d.mapping().len(), 2);
        assert_eq!(d.values().len(), 1);
    }

    #[test]
    fn strict_mode_rejects_aliases_naming_canonical() {
        let err = Domain::builder("Strict")
            .allow_aliases(false)
            .member("A", "x")
            .member("B", "x")
            .build()
            .unwrap_err();
        match err {
            DeclarationError::AliasCollision {
                member, canonical, ..
            } => {
                assert_eq!(member, "B");
                assert_eq!(canonical, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bool_and_int_members_stay_distinct() {
        let d = Domain::builder("Mixed")
            .member("TRUE", true)
            .member("ONE", 1)
            .build()
            .unwrap();
        assert_eq!(d.len(), 2);
        assert!(d.contains(&Value::from(true)));
        assert!(d.contains(&Value::from(1)));
    }

    #[test]
    fn extension_requires_opt_in_and_never_mutates_parent() {
        let base = http();
        let before = base.mapping().to_vec();

        let err = Domain::builder("Extended")
            .inherit(&base)
            .member("PATCH", "PATCH")
            .build()
            .unwrap_err();
        assert!(matches!(err, DeclarationError::ExtendRequired { .. }));

        let ext = Domain::builder("Extended")
            .inherit(&base)
            .extend(true)
            .member("PATCH", "PATCH")
            .member("PUT", "PUT")
            .build()
            .unwrap();
        let keys = ext.keys();
        assert_eq!(as_strs(&keys), ["GET", "POST", "DELETE", "PATCH", "PUT"]);
        assert_eq!(base.mapping(), before.as_slice());
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn extension_rejects_inherited_name_collision() {
        let base = http();
        let err = Domain::builder("Extended")
            .inherit(&base)
            .extend(true)
            .member("GET", "get-again")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InheritedNameCollision { .. }
        ));
    }

    #[test]
    fn child_alias_of_parent_value_does_not_touch_parent() {
        let base = http();
        let ext = Domain::builder("Extended")
            .inherit(&base)
            .extend(true)
            .member("get", "GET")
            .build()
            .unwrap();
        let v = Literal::Str("GET".into());
        assert_eq!(ext.names_of(&v).unwrap().len(), 2);
        assert_eq!(base.names_of(&v).unwrap().len(), 1);
    }

    #[test]
    fn multiple_parents_rejected() {
        let a = http();
        let b = Domain::builder("Other").member("X", "x").build().unwrap();
        let err = Domain::builder("Both")
            .inherit(&a)
            .inherit(&b)
            .build()
            .unwrap_err();
        assert!(matches!(err, DeclarationError::MultipleParents { .. }));
    }

    #[test]
    fn flags_inherit_unless_overridden() {
        let base = Domain::builder("Base")
            .allow_aliases(false)
            .callable_as_validator(true)
            .member("A", "a")
            .build()
            .unwrap();
        let child = Domain::builder("Child")
            .inherit(&base)
            .extend(true)
            .member("B", "b")
            .build()
            .unwrap();
        assert!(!child.allow_aliases());
        assert!(child.callable_as_validator());

        let overridden = Domain::builder("Child2")
            .inherit(&base)
            .extend(true)
            .allow_aliases(true)
            .callable_as_validator(false)
            .member("B", "b")
            .build()
            .unwrap();
        assert!(overridden.allow_aliases());
        assert!(!overridden.callable_as_validator());
    }

    #[test]
    fn non_literal_member_fails_with_kind() {
        let err = Domain::builder("Bad")
            .member("A", Value::from(vec![Value::from(1)]))
            .build()
            .unwrap_err();
        match err {
            DeclarationError::InvalidMember { member, source, .. } => {
                assert_eq!(member, "A");
                assert_eq!(source, ClassifyError::NotALiteral { kind: "array" });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ignore_and_underscore_names_are_skipped() {
        let d = Domain::builder("Partial")
            .ignore_text("DRAFT, internal")
            .member("GET", "GET")
            .member("DRAFT", "DRAFT")
            .member("internal", "internal")
            .member("_hidden", "hidden")
            .build()
            .unwrap();
        assert_eq!(d.len(), 1);
        assert!(d.get("DRAFT").is_err());
        assert!(d.get("_hidden").is_err());
    }

    #[test]
    fn empty_domain_is_valid() {
        let d = Domain::builder("Empty").build().unwrap();
        assert!(d.is_empty());
        assert_eq!(d.to_string(), "<Domain 'Empty'>");
        assert!(!d.contains(&Value::Null));
    }

    #[test]
    fn validate_and_call() {
        let d = Domain::builder("Method")
            .callable_as_validator(true)
            .member("GET", "GET")
            .build()
            .unwrap();
        assert_eq!(
            d.validate(Value::from("GET")).unwrap(),
            Literal::Str("GET".into())
        );
        assert!(matches!(
            d.validate(Value::from("git")),
            Err(ValidationError::NotAMember { .. })
        ));
        assert!(d.call(Value::from("GET")).is_ok());

        let plain = http();
        assert!(matches!(
            plain.call(Value::from("GET")),
            Err(ValidationError::NotCallable { .. })
        ));
    }

    #[test]
    fn display_lists_members() {
        let d = http();
        assert_eq!(
            d.to_string(),
            "<Domain 'HttpMethod' [GET=\"GET\", POST=\"POST\", DELETE=\"DELETE\"]>"
        );
    }
}
