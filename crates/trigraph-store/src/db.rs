//! The store: engine state, triple ingestion and pattern queries.

use serde::{Deserialize, Serialize};

use crate::bitset::BitSet;
use crate::config::DbConfig;
use crate::error::Result;
use crate::interner::StringTable;
use crate::pso::{ProbeLimit, PsoIndex};
use crate::{TermId, Triple};

/// Append-only triple index.
///
/// Owns every bit set, PSO entry and interned string. Structures refer to one
/// another only by [`TermId`], so growth never invalidates anything a caller
/// holds by id.
#[derive(Debug)]
pub struct TripleDB {
    config: DbConfig,
    strings: StringTable,
    pso: PsoIndex,
    /// predicate -> subjects with at least one triple using that predicate.
    by_predicate: Vec<Option<BitSet>>,
    /// object -> subjects with at least one triple using that object value.
    by_object: Vec<Option<BitSet>>,
    /// subject -> number of triples added with that subject.
    property_counts: Vec<u64>,
    /// term -> class tag (last write wins).
    class_tags: Vec<Option<TermId>>,
    max_subject: Option<TermId>,
    max_predicate: Option<TermId>,
    max_object: Option<TermId>,
    triple_count: u64,
    type_predicate: Option<TermId>,
}

/// Counters describing a store, for diagnostics and embedders' status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbStats {
    pub triples: u64,
    pub interned_strings: usize,
    pub predicates: usize,
    pub objects: usize,
    pub pso_keys: usize,
    pub pso_capacity: usize,
    pub pso_load_factor: f64,
    pub max_subject: Option<TermId>,
    pub max_predicate: Option<TermId>,
    pub max_object: Option<TermId>,
}

/// Grow a per-id column by doubling until `id` is addressable. New slots
/// hold `fill`.
fn grow_to_cover<T: Clone>(column: &mut Vec<T>, id: TermId, fill: T, name: &'static str) {
    let needed = id.index() + 1;
    if needed <= column.len() {
        return;
    }
    let grown = (column.len() * 2).max(needed);
    tracing::debug!(column = name, from = column.len(), to = grown, "growing per-id column");
    column.resize(grown, fill);
}

fn raise_max(slot: &mut Option<TermId>, id: TermId) {
    match *slot {
        Some(m) if m >= id => {}
        _ => *slot = Some(id),
    }
}

impl TripleDB {
    /// A store with the default configuration.
    pub fn new() -> Self {
        Self::build(DbConfig::default())
    }

    pub fn with_config(config: DbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DbConfig) -> Self {
        let mut strings = StringTable::with_buckets(config.intern_buckets);
        let type_predicate = config.type_predicate.as_deref().map(|p| strings.intern(p));
        let n = config.initial_id_capacity;

        tracing::info!(
            pso_capacity = config.pso_capacity,
            intern_buckets = config.intern_buckets,
            probe_limit = ?config.probe_limit,
            type_predicate = ?config.type_predicate,
            "creating triple store"
        );

        Self {
            pso: PsoIndex::new(config.pso_capacity, config.probe_limit),
            strings,
            by_predicate: vec![None; n],
            by_object: vec![None; n],
            property_counts: vec![0; n],
            class_tags: vec![None; n],
            max_subject: None,
            max_predicate: None,
            max_object: None,
            triple_count: 0,
            type_predicate,
            config,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    // ========================================================================
    // Strings
    // ========================================================================

    pub fn intern(&mut self, text: &str) -> TermId {
        self.strings.intern(text)
    }

    pub fn resolve(&self, id: TermId) -> Option<&str> {
        self.strings.resolve(id)
    }

    /// Id of already-interned text, without inserting.
    pub fn id_of(&self, text: &str) -> Option<TermId> {
        self.strings.id_of(text)
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Id of the configured type predicate, if any.
    pub fn type_predicate(&self) -> Option<TermId> {
        self.type_predicate
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Record one triple. Nothing is deduplicated: adding the same triple
    /// twice counts twice.
    ///
    /// The PSO slot is claimed first, so on `PsoTableFull` the store is left
    /// exactly as it was.
    pub fn add_triple(&mut self, subject: TermId, predicate: TermId, object: TermId) -> Result<()> {
        self.pso
            .find_or_create(predicate, subject)?
            .append_object(object);

        raise_max(&mut self.max_subject, subject);
        raise_max(&mut self.max_predicate, predicate);
        raise_max(&mut self.max_object, object);

        grow_to_cover(&mut self.by_predicate, predicate, None, "by_predicate");
        grow_to_cover(&mut self.by_object, object, None, "by_object");
        grow_to_cover(&mut self.property_counts, subject, 0, "property_counts");
        grow_to_cover(&mut self.class_tags, subject.max(object), None, "class_tags");

        self.by_predicate[predicate.index()]
            .get_or_insert_with(BitSet::new)
            .set(subject.raw());
        // Subjects per object value, not object existence.
        self.by_object[object.index()]
            .get_or_insert_with(BitSet::new)
            .set(subject.raw());

        self.property_counts[subject.index()] += 1;
        self.triple_count += 1;

        if self.type_predicate == Some(predicate) {
            self.class_tags[subject.index()] = Some(object);
        }
        Ok(())
    }

    /// Intern the three terms and record the triple.
    pub fn add_triple_str(&mut self, subject: &str, predicate: &str, object: &str) -> Result<Triple> {
        let triple = Triple::new(
            self.intern(subject),
            self.intern(predicate),
            self.intern(object),
        );
        self.add_triple(triple.subject, triple.predicate, triple.object)?;
        Ok(triple)
    }

    /// Tag `id` with `class`, replacing any earlier tag.
    pub fn set_class(&mut self, id: TermId, class: TermId) {
        grow_to_cover(&mut self.class_tags, id, None, "class_tags");
        self.class_tags[id.index()] = Some(class);
    }

    // ========================================================================
    // Pattern queries
    // ========================================================================

    /// Subjects with at least one triple using `predicate`.
    pub fn subjects_with_predicate(&self, predicate: TermId) -> Option<&BitSet> {
        self.by_predicate.get(predicate.index())?.as_ref()
    }

    /// Subjects with at least one triple whose object is `object`.
    pub fn subjects_with_object(&self, object: TermId) -> Option<&BitSet> {
        self.by_object.get(object.index())?.as_ref()
    }

    /// "Subjects using `predicate`" AND "subjects using `object`".
    ///
    /// A superset of the `(?s, predicate, object)` matches: a subject with
    /// `(s, predicate, x)` and `(s, y, object)` is included even without the
    /// exact triple. Unknown ids yield an empty set.
    pub fn subjects_with_candidates(&self, predicate: TermId, object: TermId) -> BitSet {
        match (
            self.subjects_with_predicate(predicate),
            self.subjects_with_object(object),
        ) {
            (Some(p), Some(o)) => p & o,
            _ => BitSet::new(),
        }
    }

    /// Subjects matching `(?s, predicate, object)` exactly.
    ///
    /// The bit set intersection narrows the candidates; each survivor is then
    /// confirmed against the PSO index with an unbounded probe, so the result
    /// never misses a stored triple whatever the configured probe limit.
    pub fn subjects_with(&self, predicate: TermId, object: TermId) -> BitSet {
        let candidates = self.subjects_with_candidates(predicate, object);
        if candidates.is_empty() {
            return candidates;
        }
        candidates
            .iter()
            .filter(|&s| {
                self.pso
                    .lookup_with(predicate, TermId::new(s), ProbeLimit::Unbounded)
                    .contains(&object)
            })
            .collect()
    }

    /// Subjects matching every `(predicate, object)` pattern. An empty
    /// pattern list matches nothing.
    pub fn subjects_matching(&self, patterns: &[(TermId, TermId)]) -> BitSet {
        let Some((&(p, o), rest)) = patterns.split_first() else {
            return BitSet::new();
        };
        let mut acc = self.subjects_with(p, o);
        for &(p, o) in rest {
            if acc.is_empty() {
                break;
            }
            acc = &acc & &self.subjects_with(p, o);
        }
        acc
    }

    /// Objects recorded for `(predicate, subject)`, in insertion order.
    pub fn objects_of(&self, predicate: TermId, subject: TermId) -> &[TermId] {
        self.pso.lookup(predicate, subject)
    }

    pub fn contains_triple(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        self.objects_of(predicate, subject).contains(&object)
    }

    /// Number of triples added with `subject` in subject position.
    pub fn property_count(&self, subject: TermId) -> u64 {
        self.property_counts
            .get(subject.index())
            .copied()
            .unwrap_or(0)
    }

    pub fn class_of(&self, id: TermId) -> Option<TermId> {
        self.class_tags.get(id.index()).copied().flatten()
    }

    /// Every stored triple, rebuilt from the PSO index. Order follows the
    /// table layout, not insertion.
    pub fn triples(&self) -> impl Iterator<Item = Triple> + '_ {
        self.pso.iter().flat_map(|entry| {
            entry
                .objects()
                .iter()
                .map(move |&object| Triple::new(entry.subject(), entry.predicate(), object))
        })
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn triple_count(&self) -> u64 {
        self.triple_count
    }

    pub fn max_subject(&self) -> Option<TermId> {
        self.max_subject
    }

    pub fn max_predicate(&self) -> Option<TermId> {
        self.max_predicate
    }

    pub fn max_object(&self) -> Option<TermId> {
        self.max_object
    }

    pub fn pso(&self) -> &PsoIndex {
        &self.pso
    }

    /// Upper bound (exclusive) on ids that carry a class tag.
    pub(crate) fn class_tag_len(&self) -> usize {
        self.class_tags.len()
    }

    pub fn stats(&self) -> DbStats {
        DbStats {
            triples: self.triple_count,
            interned_strings: self.strings.len(),
            predicates: self.by_predicate.iter().flatten().count(),
            objects: self.by_object.iter().flatten().count(),
            pso_keys: self.pso.len(),
            pso_capacity: self.pso.capacity(),
            pso_load_factor: self.pso.load_factor(),
            max_subject: self.max_subject,
            max_predicate: self.max_predicate,
            max_object: self.max_object,
        }
    }
}

impl Default for TripleDB {
    fn default() -> Self {
        Self::new()
    }
}
