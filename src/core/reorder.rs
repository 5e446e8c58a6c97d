//! Reconcile an order observed by the presentation layer (drag and drop)
//! with the authoritative order.
//!
//! Observed ids that are not tracked, or repeated, are dropped. Tracked ids
//! the observation left out are appended in their previous relative order,
//! so an incomplete signal never loses a file.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation<T> {
    /// Observed order matches the current one
    Unchanged,
    /// New authoritative order
    Changed(Vec<T>),
}

impl<T> Reconciliation<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Reconciliation::Changed(_))
    }
}

pub fn reconcile<T>(current: &[T], observed: &[T]) -> Reconciliation<T>
where
    T: Clone + Eq + Hash,
{
    let known: HashSet<&T> = current.iter().collect();
    let mut placed: HashSet<&T> = HashSet::with_capacity(current.len());
    let mut next: Vec<T> = Vec::with_capacity(current.len());

    for id in observed {
        if known.contains(id) && placed.insert(id) {
            next.push(id.clone());
        }
    }

    for id in current {
        if placed.insert(id) {
            next.push(id.clone());
        }
    }

    if next.as_slice() == current {
        Reconciliation::Unchanged
    } else {
        Reconciliation::Changed(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(s: &[&str]) -> Vec<String> {
        s.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_identical_order_is_unchanged() {
        let cur = ids(&["a", "b", "c"]);
        assert_eq!(reconcile(&cur, &cur), Reconciliation::Unchanged);
    }

    #[test]
    fn test_permutation_is_adopted() {
        let cur = ids(&["a", "b", "c"]);
        let obs = ids(&["c", "a", "b"]);
        assert_eq!(reconcile(&cur, &obs), Reconciliation::Changed(obs));
    }

    #[test]
    fn test_missing_id_goes_last() {
        let cur = ids(&["a", "b", "c", "d"]);
        let obs = ids(&["d", "c", "a"]);
        assert_eq!(
            reconcile(&cur, &obs),
            Reconciliation::Changed(ids(&["d", "c", "a", "b"]))
        );
    }

    #[test]
    fn test_unknown_and_repeated_ids_dropped() {
        let cur = ids(&["a", "b"]);
        let obs = ids(&["ghost", "b", "b", "a"]);
        assert_eq!(reconcile(&cur, &obs), Reconciliation::Changed(ids(&["b", "a"])));
    }

    #[test]
    fn test_truncated_signal_matching_prefix_is_unchanged() {
        let cur = ids(&["a", "b", "c"]);
        assert_eq!(reconcile(&cur, &ids(&["a", "b"])), Reconciliation::Unchanged);
        assert_eq!(reconcile(&cur, &[]), Reconciliation::Unchanged);
    }

    #[test]
    fn test_empty_collection() {
        let cur: Vec<String> = Vec::new();
        assert_eq!(reconcile(&cur, &ids(&["x"])), Reconciliation::Unchanged);
    }
}
