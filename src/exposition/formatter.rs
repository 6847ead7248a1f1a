//! Prometheus Exposition Format output
//!
//! Renders metric families in the text exposition format (version 0.0.4).
//!
//! # Format Specification
//!
//! ```text
//! # HELP <metric_name> <help_text>
//! # TYPE <metric_name> <type>
//! <metric_name>{<label1>="<value1>",<label2>="<value2>"} <value>
//! ```

use std::collections::HashMap;

use super::family::{MetricFamily, Sample};

/// Prometheus exposition format formatter
///
/// # Example
///
/// ```ignore
/// use pure_exporter::exposition::{MetricFamily, PrometheusFormatter};
///
/// let mut family = MetricFamily::gauge("purefa_array_space_capacity_bytes", "Capacity", &[]);
/// family.set(1.2e14);
///
/// let output = PrometheusFormatter::new().format(&[family]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrometheusFormatter {
    /// Emit HELP/TYPE for families without samples
    include_empty: bool,
}

impl PrometheusFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_empty_families(mut self, include: bool) -> Self {
        self.include_empty = include;
        self
    }

    /// Format families into Prometheus exposition format
    ///
    /// # Notes
    ///
    /// - HELP and TYPE lines are emitted once per family name
    /// - Label keys keep the order the family declares
    /// - Families sharing a name are rendered together, at the position of
    ///   the first one
    pub fn format(&self, families: &[MetricFamily]) -> String {
        if families.is_empty() {
            return String::new();
        }

        let capacity: usize = families.iter().map(|f| f.len() * 80 + 120).sum();
        let mut output = String::with_capacity(capacity);

        for (name, group) in Self::group_by_name(families) {
            if !self.include_empty && group.iter().all(|f| f.is_empty()) {
                continue;
            }
            let first = group[0];

            if !first.help().is_empty() {
                output.push_str(&format!("# HELP {} {}\n", name, Self::escape_help(first.help())));
            }
            output.push_str(&format!("# TYPE {} {}\n", name, first.kind().as_str()));

            for family in group {
                for sample in family.samples() {
                    Self::write_sample(&mut output, &name, family.label_keys(), sample);
                    output.push('\n');
                }
            }
        }

        output
    }

    /// Group families by name, preserving order of first occurrence
    fn group_by_name(families: &[MetricFamily]) -> Vec<(String, Vec<&MetricFamily>)> {
        let mut groups: HashMap<&str, Vec<&MetricFamily>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for family in families {
            if !groups.contains_key(family.name()) {
                order.push(family.name());
            }
            groups.entry(family.name()).or_default().push(family);
        }

        order
            .into_iter()
            .filter_map(|name| groups.remove(name).map(|g| (name.to_string(), g)))
            .collect()
    }

    fn write_sample(out: &mut String, name: &str, keys: &[&'static str], sample: &Sample) {
        out.push_str(name);
        out.push_str(sample.suffix);

        let pairs = keys
            .iter()
            .zip(sample.labels.iter())
            .map(|(k, v)| (*k, v.as_str()))
            .chain(sample.extra.as_ref().map(|(k, v)| (*k, v.as_str())));

        let mut first = true;
        for (key, value) in pairs {
            out.push(if first { '{' } else { ',' });
            first = false;
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&Self::escape_label_value(value));
            out.push('"');
        }
        if !first {
            out.push('}');
        }

        out.push(' ');
        out.push_str(&Self::format_value(sample.value));
    }

    /// Format a numeric value for Prometheus
    ///
    /// - NaN → "NaN"
    /// - +Inf → "+Inf"
    /// - -Inf → "-Inf"
    /// - Integers are formatted without decimal point
    /// - Large/small floats use scientific notation
    pub fn format_value(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "+Inf".to_string()
            } else {
                "-Inf".to_string()
            }
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else if value.abs() >= 1e15 || (value.abs() < 1e-3 && value != 0.0) {
            format!("{:e}", value)
        } else {
            format!("{}", value)
        }
    }

    /// Escapes backslash and newline characters.
    fn escape_help(help: &str) -> String {
        help.replace('\\', "\\\\").replace('\n', "\\n")
    }

    /// Escapes backslash, double-quote, and newline characters.
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_simple_family() {
        let mut family = MetricFamily::gauge("purefa_array_space_capacity_bytes", "FlashArray total capacity in bytes", &[]);
        family.set(42.0);

        let output = PrometheusFormatter::new().format(&[family]);

        assert!(output.contains("# HELP purefa_array_space_capacity_bytes FlashArray total capacity in bytes"));
        assert!(output.contains("# TYPE purefa_array_space_capacity_bytes gauge"));
        assert!(output.contains("purefa_array_space_capacity_bytes 42\n"));
        assert!(!output.contains('{'));
    }

    #[test]
    fn test_label_keys_keep_declared_order() {
        let mut family = MetricFamily::gauge(
            "purefa_volume_space_bytes",
            "Volume space",
            &["volume", "naaid", "dimension"],
        );
        family.push(["v1", "naa.624a9370abc", "volumes"], 100.0);

        let output = PrometheusFormatter::new().format(&[family]);
        assert!(output.contains(
            "purefa_volume_space_bytes{volume=\"v1\",naaid=\"naa.624a9370abc\",dimension=\"volumes\"} 100"
        ));
    }

    #[test]
    fn test_info_family_is_typed_gauge() {
        let mut family = MetricFamily::info("purefa_info", "FlashArray system information", &["array_name"]);
        family.push(["fa1"], 1.0);

        let output = PrometheusFormatter::new().format(&[family]);
        assert!(output.contains("# TYPE purefa_info gauge"));
        assert!(output.contains("purefa_info{array_name=\"fa1\"} 1"));
    }

    #[test]
    fn test_same_name_families_are_grouped() {
        let mut nfs = MetricFamily::gauge("purefb_array_performance_iops", "IOPS", &["protocol", "dimension"]);
        nfs.push(["nfs", "read"], 10.0);
        let other = MetricFamily::gauge("purefb_array_space_bytes", "Space", &["dimension"]);
        let mut s3 = MetricFamily::gauge("purefb_array_performance_iops", "IOPS", &["protocol", "dimension"]);
        s3.push(["s3", "read"], 20.0);

        let output = PrometheusFormatter::new().format(&[nfs, other, s3]);

        assert_eq!(output.matches("# TYPE purefb_array_performance_iops").count(), 1);
        let nfs_pos = output.find("protocol=\"nfs\"").unwrap();
        let s3_pos = output.find("protocol=\"s3\"").unwrap();
        assert!(nfs_pos < s3_pos);
    }

    #[test]
    fn test_empty_families_are_skipped_by_default() {
        let family = MetricFamily::gauge("purefa_alerts_total", "Open alerts", &["severity"]);
        assert!(PrometheusFormatter::new().format(&[family.clone()]).is_empty());

        let output = PrometheusFormatter::new()
            .with_empty_families(true)
            .format(&[family]);
        assert!(output.contains("# TYPE purefa_alerts_total gauge"));
    }

    #[test]
    fn test_histogram_rendering() {
        let mut family = MetricFamily::histogram("scrape_duration_seconds", "Scrape time", &["endpoint"]);
        family.push_histogram(&["fa1".to_string()], &[(0.5, 1)], 0.25, 1);

        let output = PrometheusFormatter::new().format(&[family]);
        assert!(output.contains("# TYPE scrape_duration_seconds histogram"));
        assert!(output.contains("scrape_duration_seconds_bucket{endpoint=\"fa1\",le=\"0.5\"} 1"));
        assert!(output.contains("scrape_duration_seconds_bucket{endpoint=\"fa1\",le=\"+Inf\"} 1"));
        assert!(output.contains("scrape_duration_seconds_sum{endpoint=\"fa1\"} 0.25"));
        assert!(output.contains("scrape_duration_seconds_count{endpoint=\"fa1\"} 1"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(PrometheusFormatter::format_value(f64::NAN), "NaN");
        assert_eq!(PrometheusFormatter::format_value(f64::INFINITY), "+Inf");
        assert_eq!(PrometheusFormatter::format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(PrometheusFormatter::format_value(42.0), "42");
        assert_eq!(PrometheusFormatter::format_value(-100.0), "-100");
        assert_eq!(PrometheusFormatter::format_value(2.5), "2.5");
        assert!(PrometheusFormatter::format_value(1.23e-6).contains('e'));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(PrometheusFormatter::escape_label_value("simple"), "simple");
        assert_eq!(
            PrometheusFormatter::escape_label_value("with\"quote"),
            "with\\\"quote"
        );
        assert_eq!(
            PrometheusFormatter::escape_label_value("all\"\\\n"),
            "all\\\"\\\\\\n"
        );
    }

    #[test]
    fn test_escape_help() {
        assert_eq!(
            PrometheusFormatter::escape_help("line1\nline2"),
            "line1\\nline2"
        );
    }

    #[test]
    fn test_format_empty_input() {
        assert!(PrometheusFormatter::new().format(&[]).is_empty());
    }
}
