//! Access expression algebra
//!
//! The algebraic representation of "what is permitted" for one policy
//! layer, closed under intersection. Layers combine with [`AccessExpr::intersect`],
//! which is associative and commutative, has `Universal` as its identity
//! and `Empty` as its absorbing element, so a principal's role, teams and
//! override can be folded in any order with the same result.
//!
//! Expressions are derived, ephemeral values. They are never persisted and
//! carry no identity; editing policy produces a freshly computed
//! replacement.

use std::collections::BTreeSet;

/// Resolved permission for one (layer, service, capability-kind) triple.
///
/// `Deny(s)` is interpreted relative to the service's known capability
/// universe: everything except the names in `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessExpr {
    /// Everything is permitted
    Universal,
    /// Nothing is permitted
    Empty,
    /// Exactly the listed names
    Allow(BTreeSet<String>),
    /// Everything except the listed names
    Deny(BTreeSet<String>),
}

impl AccessExpr {
    /// Allow-expression, normalized: an empty allow set is `Empty`.
    pub fn allow(names: BTreeSet<String>) -> Self {
        if names.is_empty() {
            AccessExpr::Empty
        } else {
            AccessExpr::Allow(names)
        }
    }

    /// Deny-expression, normalized: denying nothing is `Universal`.
    pub fn deny(names: BTreeSet<String>) -> Self {
        if names.is_empty() {
            AccessExpr::Universal
        } else {
            AccessExpr::Deny(names)
        }
    }

    /// Intersection of two expressions.
    ///
    /// Results are kept in normalized form (no `Allow(∅)`, no `Deny(∅)`),
    /// which makes the algebraic laws hold structurally under `==`.
    pub fn intersect(&self, other: &AccessExpr) -> AccessExpr {
        use AccessExpr::*;

        match (self, other) {
            (Universal, x) | (x, Universal) => x.clone(),
            (Empty, _) | (_, Empty) => Empty,
            (Allow(a), Allow(b)) => Self::allow(a.intersection(b).cloned().collect()),
            (Allow(a), Deny(b)) | (Deny(b), Allow(a)) => {
                Self::allow(a.difference(b).cloned().collect())
            }
            // Complement of a union is the intersection of complements.
            (Deny(a), Deny(b)) => Self::deny(a.union(b).cloned().collect()),
        }
    }

    /// Fold any number of expressions together.
    pub fn intersect_all<'a, I>(exprs: I) -> AccessExpr
    where
        I: IntoIterator<Item = &'a AccessExpr>,
    {
        exprs
            .into_iter()
            .fold(AccessExpr::Universal, |acc, e| acc.intersect(e))
    }

    /// Membership test for a capability name.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            AccessExpr::Universal => true,
            AccessExpr::Empty => false,
            AccessExpr::Allow(names) => names.contains(name),
            AccessExpr::Deny(names) => !names.contains(name),
        }
    }

    /// Project the expression onto a concrete universe of names.
    pub fn materialize(&self, universe: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            AccessExpr::Universal => universe.clone(),
            AccessExpr::Empty => BTreeSet::new(),
            AccessExpr::Allow(names) => universe.intersection(names).cloned().collect(),
            AccessExpr::Deny(names) => universe.difference(names).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AccessExpr::Empty)
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, AccessExpr::Universal)
    }
}
