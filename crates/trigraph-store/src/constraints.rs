//! Cardinality and class checks over the PSO index and type tags.
//!
//! Every check reads the stored object list for `(predicate, subject)`, so
//! duplicates count toward cardinality. Lookups honour the PSO index's
//! configured [`crate::ProbeLimit`]; with a bounded limit a displaced key
//! reads as "no values", which can turn `has_property`/`min_count` false and
//! `max_count` true.

use crate::db::TripleDB;
use crate::TermId;

impl TripleDB {
    /// At least one object is recorded for `(predicate, subject)`.
    pub fn has_property(&self, subject: TermId, predicate: TermId) -> bool {
        !self.objects_of(predicate, subject).is_empty()
    }

    /// At least `n` objects are recorded. `n == 0` always holds.
    pub fn min_count(&self, subject: TermId, predicate: TermId, n: usize) -> bool {
        self.objects_of(predicate, subject).len() >= n
    }

    /// At most `n` objects are recorded. An absent property has zero values,
    /// so it satisfies every cap including `n == 0`.
    pub fn max_count(&self, subject: TermId, predicate: TermId, n: usize) -> bool {
        self.objects_of(predicate, subject).len() <= n
    }

    /// `subject` is tagged with `class`. Untagged ids match no class.
    pub fn has_class(&self, subject: TermId, class: TermId) -> bool {
        self.class_of(subject) == Some(class)
    }

    /// Combined check, cheapest first, stopping at the first failure:
    /// class, then presence of every required property, then `min_count`
    /// per property (skipped when `min_count == 0`), then `max_count` per
    /// property (skipped when `max_count == 0`).
    pub fn validate(
        &self,
        subject: TermId,
        class: TermId,
        required_properties: &[TermId],
        min_count: usize,
        max_count: usize,
    ) -> bool {
        if !self.has_class(subject, class) {
            return false;
        }
        if !required_properties
            .iter()
            .all(|&p| self.has_property(subject, p))
        {
            return false;
        }
        if min_count > 0
            && !required_properties
                .iter()
                .all(|&p| self.min_count(subject, p, min_count))
        {
            return false;
        }
        if max_count > 0
            && !required_properties
                .iter()
                .all(|&p| self.max_count(subject, p, max_count))
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{TermId, TripleDB};

    fn id(raw: u32) -> TermId {
        TermId::new(raw)
    }

    fn person_db() -> TripleDB {
        let mut db = TripleDB::new();
        let (alice, person) = (id(1), id(50));
        let (name, email) = (id(10), id(11));
        db.set_class(alice, person);
        db.add_triple(alice, name, id(100)).unwrap();
        db.add_triple(alice, email, id(101)).unwrap();
        db.add_triple(alice, email, id(102)).unwrap();
        db
    }

    #[test]
    fn validate_checks_class_first() {
        let db = person_db();
        assert!(db.validate(id(1), id(50), &[id(10)], 0, 0));
        assert!(!db.validate(id(1), id(51), &[id(10)], 0, 0));
        // Untagged subject fails even with no required properties.
        assert!(!db.validate(id(2), id(50), &[], 0, 0));
    }

    #[test]
    fn validate_requires_every_property() {
        let db = person_db();
        assert!(db.validate(id(1), id(50), &[id(10), id(11)], 0, 0));
        assert!(!db.validate(id(1), id(50), &[id(10), id(12)], 0, 0));
    }

    #[test]
    fn validate_applies_counts_only_when_positive() {
        let db = person_db();
        let props = [id(10), id(11)];

        // name has 1 value, email has 2.
        assert!(db.validate(id(1), id(50), &props, 1, 2));
        assert!(!db.validate(id(1), id(50), &props, 2, 0));
        assert!(!db.validate(id(1), id(50), &props, 0, 1));
        // A zero max means "no cap" here, not "no values".
        assert!(db.validate(id(1), id(50), &props, 0, 0));
    }

    #[test]
    fn max_count_zero_on_absent_property() {
        let db = person_db();
        assert!(db.max_count(id(1), id(99), 0));
        assert!(!db.max_count(id(1), id(10), 0));
    }
}
