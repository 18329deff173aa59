// comparison of two concept-location maps of the same project
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::types::ConceptTerm;
use crate::mapping::location::ConceptLocationMap;

/// Files found for a common concept by only one of the two methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationDiff {
    pub only_in_first: BTreeSet<String>,
    pub only_in_second: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub common: BTreeSet<ConceptTerm>,
    pub unique_to_first: BTreeSet<ConceptTerm>,
    pub unique_to_second: BTreeSet<ConceptTerm>,
    /// Only common concepts whose normalized location sets differ appear here.
    pub differences: BTreeMap<ConceptTerm, LocationDiff>,
}

impl Reconciliation {
    pub fn is_identical(&self) -> bool {
        self.unique_to_first.is_empty() && self.unique_to_second.is_empty() && self.differences.is_empty()
    }

    /// Every concept seen by either method.
    pub fn all_concepts(&self) -> BTreeSet<&ConceptTerm> {
        self.common
            .iter()
            .chain(&self.unique_to_first)
            .chain(&self.unique_to_second)
            .collect()
    }

    pub fn in_first(&self, concept: &str) -> bool {
        self.common.contains(concept) || self.unique_to_first.contains(concept)
    }

    pub fn in_second(&self, concept: &str) -> bool {
        self.common.contains(concept) || self.unique_to_second.contains(concept)
    }
}

/// Compare two maps concept by concept, on normalized location sets.
pub fn reconcile(first: &ConceptLocationMap, second: &ConceptLocationMap, project_root: &str) -> Reconciliation {
    let keys_first = first.concept_set();
    let keys_second = second.concept_set();

    let common: BTreeSet<ConceptTerm> = keys_first.intersection(&keys_second).cloned().collect();
    let unique_to_first = keys_first.difference(&keys_second).cloned().collect();
    let unique_to_second = keys_second.difference(&keys_first).cloned().collect();

    let differences = common
        .iter()
        .filter_map(|concept| {
            let a = first.normalized_files(concept, project_root);
            let b = second.normalized_files(concept, project_root);
            if a == b {
                return None;
            }
            let diff = LocationDiff {
                only_in_first: a.difference(&b).cloned().collect(),
                only_in_second: b.difference(&a).cloned().collect(),
            };
            Some((concept.clone(), diff))
        })
        .collect();

    Reconciliation {
        common,
        unique_to_first,
        unique_to_second,
        differences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::location::Location;

    fn mk_map(entries: &[(&str, &str)]) -> ConceptLocationMap {
        entries
            .iter()
            .map(|(c, f)| (c.to_string(), Location::new(*f)))
            .collect()
    }

    #[test]
    fn map_compared_with_itself_has_no_differences() {
        let m = mk_map(&[("cart", "cart/a.js"), ("cart", "cart/b.js"), ("user", "user/a.js")]);
        let r = reconcile(&m, &m, "shop");

        assert!(r.is_identical());
        assert!(r.differences.is_empty());
        assert!(r.unique_to_first.is_empty());
        assert!(r.unique_to_second.is_empty());
        assert_eq!(r.common.len(), 2);
    }

    #[test]
    fn splits_keys_and_diffs_locations() {
        let heuristics = mk_map(&[
            ("cart", "cart/a.js"),
            ("cart", "cart/db.js"),
            ("order", "orders/repo.js"),
        ]);
        let text = mk_map(&[("cart", "cart/a.js"), ("cart", "web/cart.vue"), ("user", "user/a.js")]);

        let r = reconcile(&heuristics, &text, "shop");
        assert_eq!(r.common.iter().collect::<Vec<_>>(), vec!["cart"]);
        assert_eq!(r.unique_to_first.iter().collect::<Vec<_>>(), vec!["order"]);
        assert_eq!(r.unique_to_second.iter().collect::<Vec<_>>(), vec!["user"]);

        let d = &r.differences["cart"];
        assert_eq!(d.only_in_first.iter().collect::<Vec<_>>(), vec!["cart/db.js"]);
        assert_eq!(d.only_in_second.iter().collect::<Vec<_>>(), vec!["web/cart.vue"]);

        assert!(r.in_first("order") && !r.in_second("order"));
        assert_eq!(r.all_concepts().len(), 3);
    }

    #[test]
    fn equal_after_normalization_is_not_a_difference() {
        let a = mk_map(&[("cart", r"D:\src\shop\cart\a.js#L4")]);
        let b = mk_map(&[("cart", "/home/me/shop/cart/a.js")]);
        let r = reconcile(&a, &b, "shop");
        assert!(r.differences.is_empty());
    }
}
