//! Entity aggregation
//!
//! An entity class is listed once for its identity fields and then once per
//! "aspect" (monitor counters, mirrored counters, latency detail, size
//! detail, space). Each aspect is merged into the seeded record carrying the
//! same name. Only the seed listing is allowed to fail the aggregation; any
//! other listing that fails is skipped and recorded.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{CollectResult, DataSource, EntityClass, Query, Record};
use crate::error::{CollectorError, ScrapeError};

/// How records are keyed inside a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey {
    /// Keyed by the value of a text field, usually `name`
    Field(&'static str),
    /// Every listing describes the same single entity (the array itself)
    Singleton,
}

/// What a subset listing does with its records
#[derive(Debug, Clone, PartialEq)]
pub enum MergeMode {
    /// Merge into existing entries; records with unknown keys are dropped
    Merge,
    /// Add the records as new entries, filling the given placeholder fields.
    /// Used for entities that have no telemetry of their own.
    Insert {
        placeholders: &'static [(&'static str, f64)],
    },
}

/// One listing after the seed
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetRequest {
    pub query: Query,
    pub mode: MergeMode,
}

impl SubsetRequest {
    pub fn merge(query: Query) -> Self {
        Self {
            query,
            mode: MergeMode::Merge,
        }
    }

    pub fn insert(query: Query, placeholders: &'static [(&'static str, f64)]) -> Self {
        Self {
            query,
            mode: MergeMode::Insert { placeholders },
        }
    }
}

/// The ordered listings that make up one entity class
#[derive(Debug, Clone)]
pub struct AggregationPlan {
    pub class: EntityClass,
    pub key: EntityKey,
    pub seed: Query,
    pub subsets: Vec<SubsetRequest>,
    /// Applied to every seeded or inserted record
    pub derive: Option<fn(&mut Record)>,
}

impl AggregationPlan {
    /// Name-keyed plan with an identity seed and no subsets yet
    pub fn new(class: EntityClass) -> Self {
        Self {
            class,
            key: EntityKey::Field("name"),
            seed: Query::new(),
            subsets: Vec::new(),
            derive: None,
        }
    }

    pub fn singleton(class: EntityClass) -> Self {
        Self {
            key: EntityKey::Singleton,
            ..Self::new(class)
        }
    }

    pub fn seed(mut self, query: Query) -> Self {
        self.seed = query;
        self
    }

    pub fn then(mut self, query: Query) -> Self {
        self.subsets.push(SubsetRequest::merge(query));
        self
    }

    pub fn then_insert(mut self, query: Query, placeholders: &'static [(&'static str, f64)]) -> Self {
        self.subsets.push(SubsetRequest::insert(query, placeholders));
        self
    }

    pub fn derive(mut self, f: fn(&mut Record)) -> Self {
        self.derive = Some(f);
        self
    }

    /// The six monitor variants every block-storage entity class shares
    pub fn with_monitor_subsets(self) -> Self {
        self.then(Query::monitor())
            .then(Query::monitor().mirrored())
            .then(Query::monitor().latency())
            .then(Query::monitor().latency().mirrored())
            .then(Query::monitor().size())
            .then(Query::monitor().size().mirrored())
    }
}

/// A subset listing that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSubset {
    pub query: Query,
    pub unsupported: bool,
    pub reason: String,
}

/// Merged records of one entity class, in first-seen order
#[derive(Debug, Clone)]
pub struct EntityCollection {
    class: EntityClass,
    records: Vec<Record>,
    index: HashMap<String, usize>,
    skipped: Vec<SkippedSubset>,
}

impl EntityCollection {
    pub fn new(class: EntityClass) -> Self {
        Self {
            class,
            records: Vec::new(),
            index: HashMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Collection built directly from one listing, keyed by `name`
    pub fn from_records(class: EntityClass, records: Vec<Record>) -> Self {
        let mut collection = Self::new(class);
        for record in records {
            let key = record.name().unwrap_or_default().to_string();
            collection.upsert(key, record);
        }
        collection
    }

    pub fn class(&self) -> EntityClass {
        self.class
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// The single record of a singleton collection
    pub fn single(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn skipped(&self) -> &[SkippedSubset] {
        &self.skipped
    }

    /// Insert a new entry or merge into the existing one
    pub fn upsert(&mut self, key: String, record: Record) {
        match self.index.get(&key) {
            Some(&i) => self.records[i].merge(record),
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Merge into an existing entry only; returns false when the key is
    /// unknown.
    pub fn merge_existing(&mut self, key: &str, record: Record) -> bool {
        match self.index.get(key) {
            Some(&i) => {
                self.records[i].merge(record);
                true
            }
            None => false,
        }
    }

    fn record_skip(&mut self, query: &Query, err: &CollectorError) {
        self.skipped.push(SkippedSubset {
            query: query.clone(),
            unsupported: err.is_unsupported(),
            reason: err.to_string(),
        });
    }
}

fn key_of(key: EntityKey, record: &Record) -> Option<String> {
    match key {
        EntityKey::Singleton => Some(String::new()),
        EntityKey::Field(field) => record.get(field).as_text().map(str::to_string),
    }
}

/// Merge one listing result into the collection
fn apply(
    collection: &mut EntityCollection,
    plan: &AggregationPlan,
    mode: &MergeMode,
    records: Vec<Record>,
) {
    for mut record in records {
        let Some(key) = key_of(plan.key, &record) else {
            debug!(class = %plan.class, "Dropping record without a key field");
            continue;
        };
        match mode {
            MergeMode::Merge => {
                if !collection.merge_existing(&key, record) {
                    debug!(class = %plan.class, entity = %key, "Subset entity not in seed listing");
                }
            }
            MergeMode::Insert { placeholders } => {
                for (field, value) in placeholders.iter() {
                    record.insert(field, *value);
                }
                if let Some(derive) = plan.derive {
                    derive(&mut record);
                }
                collection.upsert(key, record);
            }
        }
    }
}

/// Run an aggregation plan against a data source
///
/// The seed listing's failure is returned as
/// [`ScrapeError::UpstreamUnavailable`]. Subset failures are logged, recorded
/// on the collection and otherwise ignored.
pub async fn aggregate(
    source: &dyn DataSource,
    plan: &AggregationPlan,
) -> Result<EntityCollection, ScrapeError> {
    let seed = source
        .list(plan.class, &plan.seed)
        .await
        .map_err(|e| ScrapeError::upstream(plan.class, e))?;

    let mut collection = EntityCollection::new(plan.class);
    for mut record in seed {
        let Some(key) = key_of(plan.key, &record) else {
            debug!(class = %plan.class, "Dropping seed record without a key field");
            continue;
        };
        if let Some(derive) = plan.derive {
            derive(&mut record);
        }
        collection.upsert(key, record);
    }

    for subset in &plan.subsets {
        let result: CollectResult<Vec<Record>> = source.list(plan.class, &subset.query).await;
        match result {
            Ok(records) => apply(&mut collection, plan, &subset.mode, records),
            Err(e) if e.is_unsupported() => {
                debug!(class = %plan.class, query = %subset.query, error = %e, "Subset not supported, skipping");
                collection.record_skip(&subset.query, &e);
            }
            Err(e) => {
                warn!(class = %plan.class, query = %subset.query, error = %e, "Subset listing failed, skipping");
                collection.record_skip(&subset.query, &e);
            }
        }
    }

    debug!(
        class = %plan.class,
        entities = collection.len(),
        skipped = collection.skipped().len(),
        "Aggregation complete"
    );

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MemorySource;

    fn volume_source() -> MemorySource {
        MemorySource::new()
            .with_listing(
                EntityClass::Volume,
                Query::new(),
                vec![
                    Record::new().with("name", "v1").with("serial", "abc"),
                    Record::new().with("name", "v2").with("serial", "def"),
                ],
            )
            .with_listing(
                EntityClass::Volume,
                Query::monitor(),
                vec![Record::new()
                    .with("name", "v1")
                    .with("reads_per_sec", 120.0)
                    .with("writes_per_sec", 40.0)],
            )
            .with_listing(
                EntityClass::Volume,
                Query::space(),
                vec![
                    Record::new()
                        .with("name", "v1")
                        .with("data_reduction", 2.5)
                        .with("size", 1000.0),
                    Record::new().with("name", "ghost").with("size", 1.0),
                ],
            )
    }

    fn volume_plan() -> AggregationPlan {
        AggregationPlan::new(EntityClass::Volume)
            .then(Query::monitor())
            .then(Query::space())
    }

    #[tokio::test]
    async fn test_subsets_merge_into_seed() {
        let source = volume_source();
        let volumes = aggregate(&source, &volume_plan()).await.unwrap();

        assert_eq!(volumes.len(), 2);
        let v1 = volumes.get("v1").unwrap();
        assert_eq!(v1.len(), 5);
        assert_eq!(v1.number("reads_per_sec"), Some(120.0));
        assert_eq!(v1.number("size"), Some(1000.0));

        // v2 never appeared in a subset and keeps only its identity fields
        let v2 = volumes.get("v2").unwrap();
        assert!(v2.get("reads_per_sec").is_absent());

        // entities unknown to the seed are not invented
        assert!(volumes.get("ghost").is_none());
    }

    #[tokio::test]
    async fn test_seed_order_is_preserved() {
        let source = volume_source();
        let volumes = aggregate(&source, &volume_plan()).await.unwrap();
        let names: Vec<_> = volumes.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_merging_same_subset_twice_is_idempotent() {
        let source = volume_source();
        let once = aggregate(&source, &volume_plan()).await.unwrap();
        let twice = aggregate(&source, &volume_plan().then(Query::monitor()))
            .await
            .unwrap();

        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn test_failed_subset_is_skipped() {
        let source = volume_source().with_failure(
            EntityClass::Volume,
            Query::monitor().mirrored(),
            CollectorError::HttpStatus(400),
        );
        let plan = volume_plan().then(Query::monitor().mirrored());

        let volumes = aggregate(&source, &plan).await.unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes.get("v1").unwrap().number("size"), Some(1000.0));
        assert_eq!(volumes.skipped().len(), 1);
        assert!(volumes.skipped()[0].unsupported);
    }

    #[tokio::test]
    async fn test_transient_subset_failure_is_also_skipped() {
        let source = volume_source().with_failure(
            EntityClass::Volume,
            Query::monitor().latency(),
            CollectorError::Timeout(Some(60000)),
        );
        let plan = volume_plan().then(Query::monitor().latency());

        let volumes = aggregate(&source, &plan).await.unwrap();
        assert_eq!(volumes.len(), 2);
        assert!(!volumes.skipped()[0].unsupported);
    }

    #[tokio::test]
    async fn test_seed_failure_propagates() {
        let source = MemorySource::new().with_failure(
            EntityClass::Host,
            Query::new(),
            CollectorError::HttpStatus(503),
        );
        let err = aggregate(&source, &AggregationPlan::new(EntityClass::Host))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::UpstreamUnavailable {
                class: EntityClass::Host,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_insert_mode_adds_placeholders() {
        const PLACEHOLDERS: &[(&str, f64)] = &[("size", 0.0), ("total", 0.0)];
        let pe = Query::new().flag("protocol_endpoint");
        let source = volume_source().with_listing(
            EntityClass::Volume,
            pe.clone(),
            vec![Record::new().with("name", "pe1").with("serial", "fff")],
        );
        let plan = AggregationPlan::new(EntityClass::Volume)
            .then_insert(pe, PLACEHOLDERS)
            .then(Query::monitor())
            .derive(|r| {
                let serial = r.label("serial");
                r.insert("naaid", format!("naa.{}", serial));
            });

        let volumes = aggregate(&source, &plan).await.unwrap();
        assert_eq!(volumes.len(), 3);
        let pe1 = volumes.get("pe1").unwrap();
        assert_eq!(pe1.number("size"), Some(0.0));
        assert_eq!(pe1.label("naaid"), "naa.fff");
        assert_eq!(volumes.get("v1").unwrap().label("naaid"), "naa.abc");
    }

    #[tokio::test]
    async fn test_singleton_plan_merges_everything() {
        let source = MemorySource::new()
            .with_listing(
                EntityClass::Array,
                Query::new(),
                vec![Record::new().with("array_name", "fa1")],
            )
            .with_listing(
                EntityClass::Array,
                Query::monitor(),
                vec![Record::new().with("reads_per_sec", 10.0)],
            );
        let plan = AggregationPlan::singleton(EntityClass::Array).then(Query::monitor());

        let array = aggregate(&source, &plan).await.unwrap();
        assert_eq!(array.len(), 1);
        let record = array.single().unwrap();
        assert_eq!(record.label("array_name"), "fa1");
        assert_eq!(record.number("reads_per_sec"), Some(10.0));
    }
}
