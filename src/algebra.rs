//! Set algebra over frozen domains.
//!
//! Both operations are pure: they rebuild a fresh domain from the operands'
//! declared pairs and never touch either input. The combined name exists
//! for diagnostics only.

use std::rc::Rc;

use crate::domain::Domain;
use crate::value::Literal;

impl Domain {
    /// All of `self`'s then `other`'s declared pairs, aliasing permitted.
    ///
    /// Values present in both operands become aliases of whichever name
    /// appeared first. A name declared on both sides keeps `self`'s
    /// position but takes `other`'s value (last declaration wins).
    pub fn union(&self, other: &Domain) -> Domain {
        let mut pairs: Vec<(Rc<str>, Literal)> = self.mapping().to_vec();
        for (name, value) in other.mapping() {
            match pairs.iter_mut().find(|(n, _)| n.as_ref() == name.as_ref()) {
                Some(slot) => slot.1 = value.clone(),
                None => pairs.push((name.clone(), value.clone())),
            }
        }
        let combined = format!("{}|{}", self.name(), other.name());
        Domain::from_literal_pairs(combined.into(), pairs)
    }

    /// `self`'s declared pairs whose value also appears in `other`,
    /// preserving `self`'s names and order.
    pub fn intersection(&self, other: &Domain) -> Domain {
        let pairs = self
            .mapping()
            .iter()
            .filter(|(_, value)| other.contains_literal(value))
            .cloned()
            .collect();
        let combined = format!("{}&{}", self.name(), other.name());
        Domain::from_literal_pairs(combined.into(), pairs)
    }
}
