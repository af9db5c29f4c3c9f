use std::collections::BTreeSet;

use sacl_schemas::Entry;

/// Entries to remove from and add to the observed set to reach the desired set.
///
/// Both lists are sorted and disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryDelta {
    pub to_remove: Vec<Entry>,
    pub to_add: Vec<Entry>,
}

impl EntryDelta {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Symmetric difference by full value: `to_remove = old - new`, `to_add = new - old`.
pub fn diff_entries(old: &BTreeSet<Entry>, new: &BTreeSet<Entry>) -> EntryDelta {
    EntryDelta {
        to_remove: old.difference(new).cloned().collect(),
        to_add: new.difference(old).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[(&str, &str)]) -> BTreeSet<Entry> {
        items.iter().map(|(c, m)| Entry::new(*c, *m)).collect()
    }

    #[test]
    fn empty_inputs_yield_empty_delta() {
        let d = diff_entries(&BTreeSet::new(), &BTreeSet::new());
        assert!(d.is_empty());
    }

    #[test]
    fn pure_addition() {
        let old = set(&[("1.2.3.4/32", "a")]);
        let new = set(&[("1.2.3.4/32", "a"), ("5.6.7.8/32", "b")]);
        let d = diff_entries(&old, &new);
        assert!(d.to_remove.is_empty());
        assert_eq!(d.to_add, vec![Entry::new("5.6.7.8/32", "b")]);
    }

    #[test]
    fn comment_change_is_remove_plus_add() {
        let old = set(&[("1.2.3.4/32", "a")]);
        let new = set(&[("1.2.3.4/32", "b")]);
        let d = diff_entries(&old, &new);
        assert_eq!(d.to_remove, vec![Entry::new("1.2.3.4/32", "a")]);
        assert_eq!(d.to_add, vec![Entry::new("1.2.3.4/32", "b")]);
    }

    #[test]
    fn delta_laws_hold_over_mixed_sets() {
        let cases = [
            (set(&[]), set(&[("a", "1")])),
            (set(&[("a", "1"), ("b", "2")]), set(&[])),
            (
                set(&[("a", "1"), ("b", "2"), ("c", "3")]),
                set(&[("b", "2"), ("c", "x"), ("d", "4")]),
            ),
            (set(&[("a", "1")]), set(&[("a", "1")])),
        ];

        for (a, b) in cases {
            let d = diff_entries(&a, &b);
            let rm: BTreeSet<Entry> = d.to_remove.iter().cloned().collect();
            let add: BTreeSet<Entry> = d.to_add.iter().cloned().collect();

            assert_eq!(rm, a.difference(&b).cloned().collect());
            assert_eq!(add, b.difference(&a).cloned().collect());
            assert!(rm.is_disjoint(&add));

            let mut applied: BTreeSet<Entry> = a.difference(&rm).cloned().collect();
            applied.extend(add);
            assert_eq!(applied, b);
        }
    }
}
