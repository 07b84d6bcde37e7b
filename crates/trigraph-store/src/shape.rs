//! SHACL-style shapes over the constraint primitives.
//!
//! [`TripleDB::validate`] answers yes/no and stops at the first failure.
//! Shapes are for callers that need to know *what* failed: every violation
//! for every focus node is collected into a [`ValidationReport`].
//!
//! A [`NodeShape`] selects its focus nodes by class (or, with no target
//! class, every subject that has at least one triple) and lists
//! [`PropertyShape`]s, each an optional `minCount`, `maxCount` and value
//! class for one predicate.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::TripleDB;
use crate::TermId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyShape {
    pub predicate: TermId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
    /// Every value must carry this class tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_class: Option<TermId>,
}

impl PropertyShape {
    pub fn new(predicate: TermId) -> Self {
        Self {
            predicate,
            min_count: None,
            max_count: None,
            value_class: None,
        }
    }

    pub fn min_count(mut self, n: usize) -> Self {
        self.min_count = Some(n);
        self
    }

    pub fn max_count(mut self, n: usize) -> Self {
        self.max_count = Some(n);
        self
    }

    pub fn value_class(mut self, class: TermId) -> Self {
        self.value_class = Some(class);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<TermId>,
    #[serde(default)]
    pub properties: Vec<PropertyShape>,
}

impl NodeShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_class(mut self, class: TermId) -> Self {
        self.target_class = Some(class);
        self
    }

    pub fn property(mut self, property: PropertyShape) -> Self {
        self.properties.push(property);
        self
    }
}

/// One failed constraint on one focus node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    ClassMismatch {
        focus: TermId,
        expected: TermId,
        actual: Option<TermId>,
    },
    MinCount {
        focus: TermId,
        predicate: TermId,
        required: usize,
        actual: usize,
    },
    MaxCount {
        focus: TermId,
        predicate: TermId,
        allowed: usize,
        actual: usize,
    },
    ValueClass {
        focus: TermId,
        predicate: TermId,
        value: TermId,
        expected: TermId,
    },
}

impl Violation {
    pub fn focus(&self) -> TermId {
        match self {
            Violation::ClassMismatch { focus, .. }
            | Violation::MinCount { focus, .. }
            | Violation::MaxCount { focus, .. }
            | Violation::ValueClass { focus, .. } => *focus,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of focus nodes checked.
    pub focus_nodes: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn conforms(&self) -> bool {
        self.violations.is_empty()
    }
}

impl TripleDB {
    fn shape_violations(&self, focus: TermId, shape: &NodeShape) -> Vec<Violation> {
        let mut out = Vec::new();

        if let Some(expected) = shape.target_class {
            if !self.has_class(focus, expected) {
                out.push(Violation::ClassMismatch {
                    focus,
                    expected,
                    actual: self.class_of(focus),
                });
            }
        }

        for prop in &shape.properties {
            let values = self.objects_of(prop.predicate, focus);

            if let Some(required) = prop.min_count {
                if values.len() < required {
                    out.push(Violation::MinCount {
                        focus,
                        predicate: prop.predicate,
                        required,
                        actual: values.len(),
                    });
                }
            }
            if let Some(allowed) = prop.max_count {
                if values.len() > allowed {
                    out.push(Violation::MaxCount {
                        focus,
                        predicate: prop.predicate,
                        allowed,
                        actual: values.len(),
                    });
                }
            }
            if let Some(expected) = prop.value_class {
                for &value in values {
                    if !self.has_class(value, expected) {
                        out.push(Violation::ValueClass {
                            focus,
                            predicate: prop.predicate,
                            value,
                            expected,
                        });
                    }
                }
            }
        }

        out
    }

    /// Check one focus node against `shape`, collecting every violation.
    pub fn validate_shape(&self, focus: TermId, shape: &NodeShape) -> ValidationReport {
        ValidationReport {
            focus_nodes: 1,
            violations: self.shape_violations(focus, shape),
        }
    }

    /// Focus nodes selected by `shape`, in ascending id order.
    pub fn shape_targets(&self, shape: &NodeShape) -> Vec<TermId> {
        match shape.target_class {
            Some(class) => (0..self.class_tag_len() as u32)
                .map(TermId::new)
                .filter(|&id| self.has_class(id, class))
                .collect(),
            None => match self.max_subject() {
                Some(max) => (0..=max.raw())
                    .map(TermId::new)
                    .filter(|&id| self.property_count(id) > 0)
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// Check every focus node of `shape`. Nodes are checked in parallel;
    /// violations come back ordered by focus node.
    pub fn validate_targets(&self, shape: &NodeShape) -> ValidationReport {
        let targets = self.shape_targets(shape);
        let per_node: Vec<Vec<Violation>> = targets
            .par_iter()
            .map(|&focus| self.shape_violations(focus, shape))
            .collect();

        let report = ValidationReport {
            focus_nodes: targets.len(),
            violations: per_node.into_iter().flatten().collect(),
        };
        tracing::debug!(
            focus_nodes = report.focus_nodes,
            violations = report.violations.len(),
            "shape validation finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> TermId {
        TermId::new(raw)
    }

    #[test]
    fn report_lists_every_violation() {
        let mut db = TripleDB::new();
        let (focus, person, company) = (id(1), id(50), id(60));
        let (name, works_at) = (id(10), id(11));

        db.set_class(focus, person);
        db.add_triple(focus, works_at, id(200)).unwrap();
        db.add_triple(focus, works_at, id(201)).unwrap();
        db.set_class(id(200), company);

        let shape = NodeShape::new()
            .target_class(person)
            .property(PropertyShape::new(name).min_count(1))
            .property(
                PropertyShape::new(works_at)
                    .max_count(1)
                    .value_class(company),
            );

        let report = db.validate_shape(focus, &shape);
        assert!(!report.conforms());
        assert_eq!(
            report.violations,
            vec![
                Violation::MinCount {
                    focus,
                    predicate: name,
                    required: 1,
                    actual: 0,
                },
                Violation::MaxCount {
                    focus,
                    predicate: works_at,
                    allowed: 1,
                    actual: 2,
                },
                Violation::ValueClass {
                    focus,
                    predicate: works_at,
                    value: id(201),
                    expected: company,
                },
            ]
        );
    }

    #[test]
    fn class_mismatch_reports_actual_tag() {
        let mut db = TripleDB::new();
        db.set_class(id(3), id(70));
        let shape = NodeShape::new().target_class(id(71));

        let report = db.validate_shape(id(3), &shape);
        assert_eq!(
            report.violations,
            vec![Violation::ClassMismatch {
                focus: id(3),
                expected: id(71),
                actual: Some(id(70)),
            }]
        );
    }

    #[test]
    fn untargeted_shape_selects_subjects_with_triples() {
        let mut db = TripleDB::new();
        db.add_triple(id(2), id(10), id(3)).unwrap();
        db.add_triple(id(5), id(10), id(3)).unwrap();
        db.set_class(id(7), id(50));

        let shape = NodeShape::new().property(PropertyShape::new(id(10)).max_count(0));
        assert_eq!(db.shape_targets(&shape), vec![id(2), id(5)]);

        let report = db.validate_targets(&shape);
        assert_eq!(report.focus_nodes, 2);
        let foci: Vec<TermId> = report.violations.iter().map(Violation::focus).collect();
        assert_eq!(foci, vec![id(2), id(5)]);
    }

    #[test]
    fn shape_json_round_trip() {
        let shape = NodeShape::new()
            .target_class(id(50))
            .property(PropertyShape::new(id(10)).min_count(1).max_count(3));
        let json = serde_json::to_string(&shape).unwrap();
        let back: NodeShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);

        let parsed: NodeShape =
            serde_json::from_str(r#"{ "properties": [ { "predicate": 4, "min_count": 2 } ] }"#)
                .unwrap();
        assert_eq!(parsed.target_class, None);
        assert_eq!(parsed.properties[0].min_count, Some(2));
        assert_eq!(parsed.properties[0].max_count, None);
    }
}
