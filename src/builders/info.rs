//! System information families

use crate::collector::Record;
use crate::exposition::MetricFamily;

use super::labels_from;

/// `purefa_info{array_name,system_id,version,hostname}`
pub fn flasharray_info(array: &Record) -> MetricFamily {
    let mut family = MetricFamily::info(
        "purefa_info",
        "FlashArray system information",
        &["array_name", "system_id", "version", "hostname"],
    );
    family.push(labels_from(array, &["array_name", "id", "version", "hostname"]), 1.0);
    family
}

/// `purefb_info{array_name,system_id,os,version}`
pub fn flashblade_info(array: &Record) -> MetricFamily {
    let mut family = MetricFamily::info(
        "purefb_info",
        "FlashBlade system information",
        &["array_name", "system_id", "os", "version"],
    );
    family.push(labels_from(array, &["name", "id", "os", "version"]), 1.0);
    family
}
