// formal context: objects x attributes incidence plus the two derivation operators
use std::collections::HashMap;

use thiserror::Error;

use crate::core::bitset::BitSet;
use crate::core::types::{AttributeId, ObjectId, PartitionPair};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("duplicate object label `{0}`")]
    DuplicateObject(String),
    #[error("duplicate attribute label `{0}`")]
    DuplicateAttribute(String),
    #[error("object index {0} is out of range")]
    ObjectOutOfRange(ObjectId),
    #[error("attribute index {0} is out of range")]
    AttributeOutOfRange(AttributeId),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),
    #[error("partition attribute `{0}` is not an attribute of the context")]
    MissingPartitionAttribute(String),
    #[error("object `{object}` carries {found} partition attributes, expected exactly one")]
    PartitionViolation { object: String, found: usize },
}

/// A finite relation between objects (files) and attributes (concept terms).
///
/// The incidence is stored twice, once per object row and once per attribute column,
/// so both derivation operators are a fold of bitset intersections. A context is
/// never mutated once built; restriction produces a new context.
#[derive(Debug, Clone)]
pub struct FormalContext {
    objects: Vec<String>,
    attributes: Vec<String>,
    object_index: HashMap<String, ObjectId>,
    attribute_index: HashMap<String, AttributeId>,
    rows: Vec<BitSet>,
    columns: Vec<BitSet>,
    partition: Option<(AttributeId, AttributeId)>,
}

impl FormalContext {
    pub fn new(
        objects: Vec<String>,
        attributes: Vec<String>,
        incidence: impl IntoIterator<Item = (ObjectId, AttributeId)>,
    ) -> Result<Self, ContextError> {
        let mut object_index = HashMap::with_capacity(objects.len());
        for (i, o) in objects.iter().enumerate() {
            if object_index.insert(o.clone(), i).is_some() {
                return Err(ContextError::DuplicateObject(o.clone()));
            }
        }
        let mut attribute_index = HashMap::with_capacity(attributes.len());
        for (i, a) in attributes.iter().enumerate() {
            if attribute_index.insert(a.clone(), i).is_some() {
                return Err(ContextError::DuplicateAttribute(a.clone()));
            }
        }

        let mut rows = vec![BitSet::empty(attributes.len()); objects.len()];
        let mut columns = vec![BitSet::empty(objects.len()); attributes.len()];
        for (o, a) in incidence {
            if o >= objects.len() {
                return Err(ContextError::ObjectOutOfRange(o));
            }
            if a >= attributes.len() {
                return Err(ContextError::AttributeOutOfRange(a));
            }
            rows[o].insert(a);
            columns[a].insert(o);
        }

        Ok(Self {
            objects,
            attributes,
            object_index,
            attribute_index,
            rows,
            columns,
            partition: None,
        })
    }

    /// Build a context from labels, convenient for small hand-written relations.
    pub fn from_labeled(
        objects: &[&str],
        attributes: &[&str],
        pairs: &[(&str, &str)],
    ) -> Result<Self, ContextError> {
        let objects: Vec<String> = objects.iter().map(|s| s.to_string()).collect();
        let attributes: Vec<String> = attributes.iter().map(|s| s.to_string()).collect();

        let mut incidence = Vec::with_capacity(pairs.len());
        for (o, a) in pairs {
            let oi = objects
                .iter()
                .position(|x| x == o)
                .ok_or_else(|| ContextError::UnknownObject(o.to_string()))?;
            let ai = attributes
                .iter()
                .position(|x| x == a)
                .ok_or_else(|| ContextError::UnknownAttribute(a.to_string()))?;
            incidence.push((oi, ai));
        }
        Self::new(objects, attributes, incidence)
    }

    /// Declare the partition pair and check that every object has exactly one side.
    pub fn with_partition(mut self, pair: &PartitionPair) -> Result<Self, ContextError> {
        let pos = self
            .attribute_id(&pair.positive)
            .ok_or_else(|| ContextError::MissingPartitionAttribute(pair.positive.clone()))?;
        let neg = self
            .attribute_id(&pair.negative)
            .ok_or_else(|| ContextError::MissingPartitionAttribute(pair.negative.clone()))?;

        for (o, row) in self.rows.iter().enumerate() {
            let found = usize::from(row.contains(pos)) + usize::from(row.contains(neg));
            if found != 1 {
                return Err(ContextError::PartitionViolation {
                    object: self.objects[o].clone(),
                    found,
                });
            }
        }
        self.partition = Some((pos, neg));
        Ok(self)
    }

    pub fn partition(&self) -> Option<(AttributeId, AttributeId)> {
        self.partition
    }

    /// The partition attributes as an intent-shaped set (empty when no partition).
    pub fn coloring_attributes(&self) -> BitSet {
        let mut set = BitSet::empty(self.attributes.len());
        if let Some((pos, neg)) = self.partition {
            set.insert(pos);
            set.insert(neg);
        }
        set
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn object_id(&self, label: &str) -> Option<ObjectId> {
        self.object_index.get(label).copied()
    }

    pub fn attribute_id(&self, label: &str) -> Option<AttributeId> {
        self.attribute_index.get(label).copied()
    }

    pub fn incident(&self, o: ObjectId, a: AttributeId) -> bool {
        self.rows.get(o).is_some_and(|row| row.contains(a))
    }

    pub fn row(&self, o: ObjectId) -> Option<&BitSet> {
        self.rows.get(o)
    }

    pub fn all_objects(&self) -> BitSet {
        BitSet::full(self.objects.len())
    }

    pub fn all_attributes(&self) -> BitSet {
        BitSet::full(self.attributes.len())
    }

    pub fn attribute_set(&self, labels: &[&str]) -> Result<BitSet, ContextError> {
        let mut set = BitSet::empty(self.attributes.len());
        for l in labels {
            let a = self
                .attribute_id(l)
                .ok_or_else(|| ContextError::UnknownAttribute(l.to_string()))?;
            set.insert(a);
        }
        Ok(set)
    }

    pub fn object_set(&self, labels: &[&str]) -> Result<BitSet, ContextError> {
        let mut set = BitSet::empty(self.objects.len());
        for l in labels {
            let o = self
                .object_id(l)
                .ok_or_else(|| ContextError::UnknownObject(l.to_string()))?;
            set.insert(o);
        }
        Ok(set)
    }

    pub fn object_labels(&self, set: &BitSet) -> Vec<&str> {
        set.iter().map(|o| self.objects[o].as_str()).collect()
    }

    pub fn attribute_labels(&self, set: &BitSet) -> Vec<&str> {
        set.iter().map(|a| self.attributes[a].as_str()).collect()
    }

    /// F' : the objects having every attribute of `attrs`. The empty set derives to all objects.
    pub fn derive_objects(&self, attrs: &BitSet) -> BitSet {
        attrs.iter().fold(self.all_objects(), |mut acc, a| {
            acc.intersect_with(&self.columns[a]);
            acc
        })
    }

    /// E' : the attributes shared by every object of `objs`. The empty set derives to all attributes.
    pub fn derive_attributes(&self, objs: &BitSet) -> BitSet {
        objs.iter().fold(self.all_attributes(), |mut acc, o| {
            acc.intersect_with(&self.rows[o]);
            acc
        })
    }

    /// F'' : closure of an attribute set.
    pub fn closure(&self, attrs: &BitSet) -> BitSet {
        self.derive_attributes(&self.derive_objects(attrs))
    }

    /// E'' : closure of an object set.
    pub fn object_closure(&self, objs: &BitSet) -> BitSet {
        self.derive_objects(&self.derive_attributes(objs))
    }

    /// Sub-context over the selected objects and attributes, preserving relative order.
    ///
    /// The partition is carried over only when both partition attributes survive.
    pub fn restrict(&self, objects: &BitSet, attributes: &BitSet) -> FormalContext {
        let kept_objects: Vec<ObjectId> = objects.iter().filter(|&o| o < self.objects.len()).collect();
        let kept_attributes: Vec<AttributeId> = attributes
            .iter()
            .filter(|&a| a < self.attributes.len())
            .collect();

        let attr_remap: HashMap<AttributeId, AttributeId> = kept_attributes
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();

        let mut rows = Vec::with_capacity(kept_objects.len());
        let mut columns = vec![BitSet::empty(kept_objects.len()); kept_attributes.len()];
        for (new_o, &old_o) in kept_objects.iter().enumerate() {
            let mut row = BitSet::empty(kept_attributes.len());
            for old_a in self.rows[old_o].iter() {
                if let Some(&new_a) = attr_remap.get(&old_a) {
                    row.insert(new_a);
                    columns[new_a].insert(new_o);
                }
            }
            rows.push(row);
        }

        let objects: Vec<String> = kept_objects.iter().map(|&o| self.objects[o].clone()).collect();
        let attributes: Vec<String> = kept_attributes
            .iter()
            .map(|&a| self.attributes[a].clone())
            .collect();
        let partition = self.partition.and_then(|(pos, neg)| {
            Some((*attr_remap.get(&pos)?, *attr_remap.get(&neg)?))
        });

        FormalContext {
            object_index: objects.iter().cloned().enumerate().map(|(i, o)| (o, i)).collect(),
            attribute_index: attributes
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, a)| (a, i))
                .collect(),
            objects,
            attributes,
            rows,
            columns,
            partition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategy::{all_subsets, gen_context};
    use proptest::prelude::*;

    // 4 objects x 3 attributes:
    //   o1: a b
    //   o2: a
    //   o3: b c
    //   o4: a b c
    fn mk_context() -> FormalContext {
        FormalContext::from_labeled(
            &["o1", "o2", "o3", "o4"],
            &["a", "b", "c"],
            &[
                ("o1", "a"),
                ("o1", "b"),
                ("o2", "a"),
                ("o3", "b"),
                ("o3", "c"),
                ("o4", "a"),
                ("o4", "b"),
                ("o4", "c"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn derivation_of_empty_sets_is_the_whole_universe() {
        let k = mk_context();
        assert_eq!(k.derive_objects(&BitSet::empty(3)), k.all_objects());
        assert_eq!(k.derive_attributes(&BitSet::empty(4)), k.all_attributes());
    }

    #[test]
    fn derive_objects_and_attributes_follow_the_relation() {
        let k = mk_context();
        let ab = k.attribute_set(&["a", "b"]).unwrap();
        assert_eq!(k.object_labels(&k.derive_objects(&ab)), vec!["o1", "o4"]);

        let o1o3 = k.object_set(&["o1", "o3"]).unwrap();
        assert_eq!(k.attribute_labels(&k.derive_attributes(&o1o3)), vec!["b"]);
    }

    #[test]
    fn closure_is_idempotent_and_monotone() {
        let k = mk_context();
        let subsets = all_subsets(3);

        for f in &subsets {
            let c = k.closure(f);
            assert!(f.is_subset(&c), "closure must be extensive");
            assert_eq!(k.closure(&c), c, "closure must be idempotent");
        }

        for f1 in &subsets {
            for f2 in &subsets {
                if f1.is_subset(f2) {
                    assert!(k.closure(f1).is_subset(&k.closure(f2)));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn closure_laws_hold_on_random_contexts(k in gen_context(6, 5)) {
            let subsets = all_subsets(k.attribute_count());
            for f in &subsets {
                let c = k.closure(f);
                prop_assert!(f.is_subset(&c));
                prop_assert_eq!(&k.closure(&c), &c);
                prop_assert_eq!(k.derive_objects(&c), k.derive_objects(f));
            }
            for f1 in &subsets {
                for f2 in subsets.iter().filter(|f2| f1.is_subset(f2)) {
                    prop_assert!(k.closure(f1).is_subset(&k.closure(f2)));
                }
            }
        }
    }

    #[test]
    fn rejects_duplicate_labels_and_out_of_range_pairs() {
        let err = FormalContext::new(vec!["x".into(), "x".into()], vec![], Vec::new()).unwrap_err();
        assert_eq!(err, ContextError::DuplicateObject("x".into()));

        let err = FormalContext::new(vec!["x".into()], vec!["a".into()], [(0, 3)]).unwrap_err();
        assert_eq!(err, ContextError::AttributeOutOfRange(3));

        let err = FormalContext::from_labeled(&["x"], &["a"], &[("y", "a")]).unwrap_err();
        assert_eq!(err, ContextError::UnknownObject("y".into()));
    }

    #[test]
    fn partition_requires_exactly_one_side_per_object() {
        let pair = PartitionPair::default();
        let ok = FormalContext::from_labeled(
            &["f1", "f2"],
            &["is_db_file", "is_not_db_file", "cart"],
            &[("f1", "is_db_file"), ("f1", "cart"), ("f2", "is_not_db_file")],
        )
        .unwrap()
        .with_partition(&pair)
        .unwrap();
        assert_eq!(ok.partition(), Some((0, 1)));
        assert_eq!(ok.coloring_attributes().len(), 2);

        let both = FormalContext::from_labeled(
            &["f1"],
            &["is_db_file", "is_not_db_file"],
            &[("f1", "is_db_file"), ("f1", "is_not_db_file")],
        )
        .unwrap()
        .with_partition(&pair)
        .unwrap_err();
        assert!(matches!(both, ContextError::PartitionViolation { found: 2, .. }));

        let neither = FormalContext::from_labeled(&["f1"], &["is_db_file", "is_not_db_file"], &[])
            .unwrap()
            .with_partition(&pair)
            .unwrap_err();
        assert!(matches!(neither, ContextError::PartitionViolation { found: 0, .. }));

        let missing = FormalContext::from_labeled(&["f1"], &["is_db_file"], &[("f1", "is_db_file")])
            .unwrap()
            .with_partition(&pair)
            .unwrap_err();
        assert_eq!(missing, ContextError::MissingPartitionAttribute("is_not_db_file".into()));
    }

    #[test]
    fn restrict_keeps_incidence_of_selected_rows_and_columns() {
        let k = mk_context();
        let objs = k.object_set(&["o3", "o4"]).unwrap();
        let attrs = k.attribute_set(&["b", "c"]).unwrap();
        let sub = k.restrict(&objs, &attrs);

        assert_eq!(sub.objects(), &["o3".to_string(), "o4".to_string()]);
        assert_eq!(sub.attributes(), &["b".to_string(), "c".to_string()]);
        assert!(sub.incident(0, 0) && sub.incident(0, 1));
        assert_eq!(sub.derive_attributes(&sub.all_objects()), sub.all_attributes());
        assert_eq!(sub.object_id("o4"), Some(1));
    }
}
