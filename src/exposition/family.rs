//! Metric family model

/// Prometheus metric type of a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    /// Constant `1` carrying descriptive labels; rendered as a gauge
    Info,
    Counter,
    Histogram,
}

impl MetricKind {
    /// Type name written on the `# TYPE` line
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge | MetricKind::Info => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// One labeled value of a family
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Appended to the family name (`_bucket`, `_sum`, `_count`)
    pub suffix: &'static str,
    /// Label values, aligned with the family's label keys
    pub labels: Vec<String>,
    /// Extra trailing label, used for histogram `le`
    pub extra: Option<(&'static str, String)>,
    pub value: f64,
}

/// A named group of same-shaped samples
///
/// The label keys are fixed when the family is created and are rendered in
/// the order given, which is part of the exported contract.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    name: String,
    help: String,
    kind: MetricKind,
    label_keys: Vec<&'static str>,
    samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        label_keys: &[&'static str],
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            label_keys: label_keys.to_vec(),
            samples: Vec::new(),
        }
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>, label_keys: &[&'static str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, label_keys)
    }

    pub fn info(name: impl Into<String>, help: impl Into<String>, label_keys: &[&'static str]) -> Self {
        Self::new(name, help, MetricKind::Info, label_keys)
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>, label_keys: &[&'static str]) -> Self {
        Self::new(name, help, MetricKind::Counter, label_keys)
    }

    pub fn histogram(name: impl Into<String>, help: impl Into<String>, label_keys: &[&'static str]) -> Self {
        Self::new(name, help, MetricKind::Histogram, label_keys)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_keys(&self) -> &[&'static str] {
        &self.label_keys
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Add a sample; `labels` must line up with the label keys
    pub fn push<I, S>(&mut self, labels: I, value: f64)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            labels.len(),
            self.label_keys.len(),
            "label arity mismatch for {}",
            self.name
        );
        self.samples.push(Sample {
            suffix: "",
            labels,
            extra: None,
            value,
        });
    }

    /// Add the single sample of a label-less family
    pub fn set(&mut self, value: f64) {
        self.push(Vec::<String>::new(), value);
    }

    /// Add one observation series of a histogram
    ///
    /// `buckets` holds `(upper_bound, cumulative_count)` pairs in ascending
    /// order; the `+Inf` bucket is added from `count`.
    pub fn push_histogram(&mut self, labels: &[String], buckets: &[(f64, u64)], sum: f64, count: u64) {
        for (bound, cumulative) in buckets {
            self.samples.push(Sample {
                suffix: "_bucket",
                labels: labels.to_vec(),
                extra: Some(("le", bound.to_string())),
                value: *cumulative as f64,
            });
        }
        self.samples.push(Sample {
            suffix: "_bucket",
            labels: labels.to_vec(),
            extra: Some(("le", "+Inf".to_string())),
            value: count as f64,
        });
        self.samples.push(Sample {
            suffix: "_sum",
            labels: labels.to_vec(),
            extra: None,
            value: sum,
        });
        self.samples.push(Sample {
            suffix: "_count",
            labels: labels.to_vec(),
            extra: None,
            value: count as f64,
        });
    }

    /// Value of the plain sample with exactly these label values
    pub fn value(&self, labels: &[&str]) -> Option<f64> {
        self.samples
            .iter()
            .filter(|s| s.suffix.is_empty())
            .find(|s| s.labels.iter().map(String::as_str).eq(labels.iter().copied()))
            .map(|s| s.value)
    }

    /// Whether any sample carries `value` under label `key`
    pub fn has_label_value(&self, key: &str, value: &str) -> bool {
        let Some(i) = self.label_keys.iter().position(|k| *k == key) else {
            return false;
        };
        self.samples.iter().any(|s| s.labels[i] == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lookup() {
        let mut family = MetricFamily::gauge("purefa_volume_performance_iops", "IOPS", &["volume", "dimension"]);
        family.push(["v1", "read"], 120.0);
        family.push(["v1".to_string(), "write".to_string()], 40.0);

        assert_eq!(family.len(), 2);
        assert_eq!(family.value(&["v1", "read"]), Some(120.0));
        assert_eq!(family.value(&["v1", "write"]), Some(40.0));
        assert_eq!(family.value(&["v2", "read"]), None);
        assert!(family.has_label_value("dimension", "write"));
        assert!(!family.has_label_value("pod", "write"));
    }

    #[test]
    fn test_unlabeled_family() {
        let mut family = MetricFamily::gauge("purefa_array_performance_qdepth", "Queue depth", &[]);
        family.set(3.0);
        assert_eq!(family.value(&[]), Some(3.0));
    }

    #[test]
    fn test_info_renders_as_gauge() {
        assert_eq!(MetricKind::Info.as_str(), "gauge");
        assert_eq!(MetricKind::Histogram.as_str(), "histogram");
    }

    #[test]
    fn test_histogram_samples() {
        let mut family = MetricFamily::histogram("scrape_seconds", "Scrape time", &["endpoint"]);
        family.push_histogram(&["fa1".to_string()], &[(0.5, 1), (1.0, 3)], 2.2, 4);

        let suffixes: Vec<_> = family.samples().iter().map(|s| s.suffix).collect();
        assert_eq!(suffixes, vec!["_bucket", "_bucket", "_bucket", "_sum", "_count"]);
        assert_eq!(family.samples()[2].extra, Some(("le", "+Inf".to_string())));
        assert_eq!(family.samples()[2].value, 4.0);
        // plain lookups ignore histogram parts
        assert_eq!(family.value(&["fa1"]), None);
    }
}
