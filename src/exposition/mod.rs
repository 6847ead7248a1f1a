//! Metric exposition
//!
//! Builders produce [`MetricFamily`] values; the HTTP layer renders them with
//! [`PrometheusFormatter`].

mod family;
mod formatter;

pub use family::{MetricFamily, MetricKind, Sample};
pub use formatter::PrometheusFormatter;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
