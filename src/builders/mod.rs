//! Metric builders
//!
//! Each builder walks aggregated records and produces one or more
//! [`MetricFamily`] values. Builders are pure functions of their input: no
//! state survives between two calls.
//!
//! Most per-entity families share one shape, a field mapping table turned
//! into a `dimension` label. [`build_mapped`] covers that shape for every
//! entity class; the entity-specific leading labels come from a closure.

pub mod alerts;
pub mod hardware;
pub mod info;
pub mod performance;
pub mod pods;
pub mod replication;
pub mod space;
pub mod topology;
pub mod usage;

use crate::collector::{Field, Record};
use crate::exposition::MetricFamily;
use crate::mapping::FieldMapping;

/// Label key carrying the mapped dimension
pub const DIMENSION: &str = "dimension";

/// What to do with a mapped field that is null or missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Null and absent both read as zero
    ZeroFill,
    /// Null reads as zero; absent fields emit nothing
    ZeroIfNull,
    /// Null and absent fields emit nothing
    Skip,
}

impl NullPolicy {
    /// Numeric value of a field under this policy
    ///
    /// Text values are parsed when they hold a number and skipped otherwise.
    pub fn resolve(self, field: Field<'_>) -> Option<f64> {
        match field {
            Field::Number(n) => Some(n),
            Field::Text(s) => s.trim().parse().ok(),
            Field::Null => match self {
                NullPolicy::ZeroFill | NullPolicy::ZeroIfNull => Some(0.0),
                NullPolicy::Skip => None,
            },
            Field::Absent => match self {
                NullPolicy::ZeroFill => Some(0.0),
                NullPolicy::ZeroIfNull | NullPolicy::Skip => None,
            },
        }
    }
}

/// Static description of one mapped family
#[derive(Debug, Clone, Copy)]
pub struct MappedSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub mapping: FieldMapping,
    pub policy: NullPolicy,
}

impl MappedSpec {
    pub const fn new(name: &'static str, help: &'static str, mapping: FieldMapping) -> Self {
        Self {
            name,
            help,
            mapping,
            policy: NullPolicy::ZeroIfNull,
        }
    }

    pub const fn with_policy(mut self, policy: NullPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Tables whose single entry maps to `""` produce families without a
    /// dimension label.
    fn has_dimension(&self) -> bool {
        self.mapping.iter().any(|(_, d)| !d.is_empty())
    }
}

/// Build one mapped family
///
/// `entity_keys` are the leading label keys and `labels` yields their values
/// for a record. Records for which `labels` returns `None` are skipped.
pub fn build_mapped<'a, I, F>(
    spec: &MappedSpec,
    entity_keys: &[&'static str],
    records: I,
    labels: F,
) -> MetricFamily
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> Option<Vec<String>>,
{
    let with_dimension = spec.has_dimension();
    let mut keys = entity_keys.to_vec();
    if with_dimension {
        keys.push(DIMENSION);
    }

    let mut family = MetricFamily::gauge(spec.name, spec.help, &keys);
    for record in records {
        let Some(entity) = labels(record) else {
            continue;
        };
        for (field, dimension) in spec.mapping.iter() {
            let Some(value) = spec.policy.resolve(record.get(field)) else {
                continue;
            };
            let mut sample_labels = entity.clone();
            if with_dimension {
                sample_labels.push(dimension.to_string());
            }
            family.push(sample_labels, value);
        }
    }
    family
}

/// Build several mapped families over the same records and labels
pub fn build_mapped_all<F>(
    specs: &[MappedSpec],
    entity_keys: &[&'static str],
    records: &[Record],
    labels: F,
) -> Vec<MetricFamily>
where
    F: Fn(&Record) -> Option<Vec<String>>,
{
    specs
        .iter()
        .map(|spec| build_mapped(spec, entity_keys, records, &labels))
        .collect()
}

/// Leading labels made of the named fields, rendered as label text
pub fn labels_from(record: &Record, fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| record.label(f)).collect()
}

/// Leading label `name`; records without a name are skipped
pub fn by_name(record: &Record) -> Option<Vec<String>> {
    record.name().map(|n| vec![n.to_string()])
}

/// Array-wide records carry no leading labels
pub fn no_labels(_: &Record) -> Option<Vec<String>> {
    Some(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FieldValue;
    use crate::mapping::{ALLOCATED_SPACE, DATA_REDUCTION, IOPS};

    #[test]
    fn test_null_policy() {
        assert_eq!(NullPolicy::ZeroFill.resolve(Field::Absent), Some(0.0));
        assert_eq!(NullPolicy::ZeroFill.resolve(Field::Null), Some(0.0));
        assert_eq!(NullPolicy::ZeroIfNull.resolve(Field::Absent), None);
        assert_eq!(NullPolicy::ZeroIfNull.resolve(Field::Null), Some(0.0));
        assert_eq!(NullPolicy::Skip.resolve(Field::Null), None);
        assert_eq!(NullPolicy::Skip.resolve(Field::Number(3.0)), Some(3.0));
        assert_eq!(NullPolicy::Skip.resolve(Field::Text("12")), Some(12.0));
        assert_eq!(NullPolicy::ZeroFill.resolve(Field::Text("n/a")), None);
    }

    #[test]
    fn test_mapped_family_with_dimension() {
        let spec = MappedSpec::new("purefa_host_performance_iops", "FlashArray host IOPS", IOPS);
        let records = vec![Record::new()
            .with("name", "esx1")
            .with("reads_per_sec", 10.0)
            .with("writes_per_sec", 5.0)];

        let family = build_mapped(&spec, &["host"], &records, by_name);

        assert_eq!(family.label_keys(), &["host", "dimension"]);
        assert_eq!(family.len(), 2);
        assert_eq!(family.value(&["esx1", "read"]), Some(10.0));
        assert_eq!(family.value(&["esx1", "write"]), Some(5.0));
        assert_eq!(family.value(&["esx1", "mirrored_write"]), None);
    }

    #[test]
    fn test_mapped_family_without_dimension() {
        let spec = MappedSpec::new("purefa_pod_space_datareduction_ratio", "FlashArray pod data reduction ratio", DATA_REDUCTION);
        let records = vec![Record::new().with("name", "pod1").with("data_reduction", FieldValue::Null)];

        let family = build_mapped(&spec, &["pod"], &records, by_name);

        assert_eq!(family.label_keys(), &["pod"]);
        assert_eq!(family.value(&["pod1"]), Some(0.0));
    }

    #[test]
    fn test_records_without_labels_are_skipped() {
        let spec = MappedSpec::new("purefa_volume_space_bytes", "FlashArray allocated space", ALLOCATED_SPACE)
            .with_policy(NullPolicy::ZeroFill);
        let records = vec![Record::new().with("volumes", 10.0)];

        let family = build_mapped(&spec, &["volume"], &records, by_name);
        assert!(family.is_empty());
    }
}
