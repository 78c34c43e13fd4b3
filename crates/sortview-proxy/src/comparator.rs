//! Ordering relations over cell values.
//!
//! The proxy never asks "is a less than b" directly during a sort. It asks a
//! [`SortComparator`] for an [`Ordering`] and reverses that for descending
//! order, so the sort always sees a strict weak ordering.

use std::cmp::Ordering;

use sortview_model::{Model, ModelIndex, Role, Variant};

/// A pluggable ordering relation over cell values.
///
/// Implementations must be a total preorder: reflexive equality, transitive,
/// and antisymmetric in the `Less`/`Greater` sense. Closures of the shape
/// `Fn(&Variant, &Variant) -> Ordering` implement this trait.
pub trait SortComparator {
    /// Compare two values.
    fn compare(&self, a: &Variant, b: &Variant) -> Ordering;

    /// Strict "less than" derived from [`compare`](Self::compare).
    fn less_than(&self, a: &Variant, b: &Variant) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

impl<F> SortComparator for F
where
    F: Fn(&Variant, &Variant) -> Ordering,
{
    fn compare(&self, a: &Variant, b: &Variant) -> Ordering {
        self(a, b)
    }
}

/// Text compares case-insensitively; everything else by
/// [`Variant::total_cmp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseInsensitive;

impl SortComparator for CaseInsensitive {
    fn compare(&self, a: &Variant, b: &Variant) -> Ordering {
        match (a, b) {
            (Variant::Text(a), Variant::Text(b)) => compare_text_case_insensitive(a, b),
            _ => a.total_cmp(b),
        }
    }
}

/// Plain [`Variant::total_cmp`]; text compares case-sensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl SortComparator for Natural {
    fn compare(&self, a: &Variant, b: &Variant) -> Ordering {
        a.total_cmp(b)
    }
}

/// Lexicographic comparison of the lowercased strings, without allocating.
///
/// Lowercasing is per-`char` and locale-independent.
#[must_use]
pub fn compare_text_case_insensitive(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Value of `index` for `role`; an index with no model behind it is empty.
#[must_use]
pub fn cell_value(source: &dyn Model, index: &ModelIndex, role: Role) -> Variant {
    if index.is_valid() {
        source.data(index, role)
    } else {
        Variant::Empty
    }
}

/// Whether the cell at `a` orders before the cell at `b`.
#[must_use]
pub fn less_than(
    source: &dyn Model,
    comparator: &dyn SortComparator,
    a: &ModelIndex,
    b: &ModelIndex,
    role: Role,
) -> bool {
    comparator.less_than(&cell_value(source, a, role), &cell_value(source, b, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_ignores_case() {
        let c = CaseInsensitive;
        assert!(c.less_than(&Variant::from("apple"), &Variant::from("Banana")));
        assert!(!c.less_than(&Variant::from("Banana"), &Variant::from("apple")));
        assert_eq!(
            c.compare(&Variant::from("HELLO"), &Variant::from("hello")),
            Ordering::Equal
        );
    }

    #[test]
    fn natural_is_case_sensitive() {
        assert!(Natural.less_than(&Variant::from("Banana"), &Variant::from("apple")));
    }

    #[test]
    fn non_text_falls_back_to_total_order() {
        let c = CaseInsensitive;
        assert!(c.less_than(&Variant::Int(2), &Variant::Int(10)));
        assert!(c.less_than(&Variant::Int(10), &Variant::from("2")));
        assert!(c.less_than(&Variant::Empty, &Variant::Bool(false)));
    }

    #[test]
    fn irreflexive() {
        let c = CaseInsensitive;
        for v in [Variant::Empty, Variant::from("Mixed"), Variant::Float(0.5)] {
            assert!(!c.less_than(&v, &v));
        }
    }

    #[test]
    fn unicode_lowercasing() {
        assert_eq!(compare_text_case_insensitive("ÄBC", "äbc"), Ordering::Equal);
        assert_eq!(compare_text_case_insensitive("Zeta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn closures_are_comparators() {
        let by_len = |a: &Variant, b: &Variant| a.to_string().len().cmp(&b.to_string().len());
        assert!(by_len.less_than(&Variant::from("zz"), &Variant::from("aaa")));
    }

    #[test]
    fn invalid_index_reads_empty() {
        let model = sortview_model::TreeModel::new(["x"]);
        assert_eq!(
            cell_value(&model, &ModelIndex::invalid(), Role::Sort),
            Variant::Empty
        );
    }
}
