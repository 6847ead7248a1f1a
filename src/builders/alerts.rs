//! Open alert counters

use crate::collector::Record;
use crate::exposition::MetricFamily;

/// Severities counted; anything else is ignored
pub const SEVERITIES: [&str; 3] = ["critical", "warning", "info"];

/// Count open alerts by severity
///
/// Always emits the three severities, zero when none are open.
pub fn count_by_severity(
    name: &'static str,
    help: &'static str,
    alerts: &[Record],
    severity_field: &str,
) -> MetricFamily {
    let mut counts = [0u64; SEVERITIES.len()];
    for alert in alerts {
        let Some(severity) = alert.get(severity_field).as_text() else {
            continue;
        };
        if let Some(i) = SEVERITIES.iter().position(|s| *s == severity) {
            counts[i] += 1;
        }
    }

    let mut family = MetricFamily::gauge(name, help, &["severity"]);
    for (severity, count) in SEVERITIES.iter().zip(counts) {
        family.push([*severity], count as f64);
    }
    family
}

/// `purefa_alerts_total{severity}`
pub fn flasharray_alerts(alerts: &[Record]) -> MetricFamily {
    count_by_severity("purefa_alerts_total", "Number of alert events", alerts, "current_severity")
}

/// `purefb_open_events_total{severity}`
pub fn flashblade_alerts(alerts: &[Record]) -> MetricFamily {
    count_by_severity(
        "purefb_open_events_total",
        "FlashBlade number of open events",
        alerts,
        "severity",
    )
}
