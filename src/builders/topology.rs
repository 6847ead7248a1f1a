//! Volume placement and host connections

use std::collections::HashSet;

use crate::collector::{EntityCollection, Record};
use crate::exposition::MetricFamily;
use crate::identifier::parse_volume_name;

/// `purefa_volume_info{volume,naaid,pod,vgroup}`
///
/// Pod and volume group come from the volume's composite name.
pub fn volume_info(volumes: &[Record]) -> MetricFamily {
    let mut family = MetricFamily::info(
        "purefa_volume_info",
        "FlashArray volume placement",
        &["volume", "naaid", "pod", "vgroup"],
    );
    for volume in volumes {
        let Some(name) = volume.name() else {
            continue;
        };
        let parsed = parse_volume_name(name);
        family.push([name.to_string(), volume.label("naaid"), parsed.pod, parsed.vgroup], 1.0);
    }
    family
}

/// `purefa_host_volumes_info{host,naaid}`
///
/// Connection records name the host in `name` and the volume in `vol`; the
/// volume's NAA id is looked up in the volume collection. Connections to
/// volumes that are not listed are dropped.
pub fn host_volumes(connections: &[Record], volumes: &EntityCollection) -> MetricFamily {
    let mut family = MetricFamily::gauge(
        "purefa_host_volumes_info",
        "FlashArray host volumes connections",
        &["host", "naaid"],
    );
    let mut seen = HashSet::new();

    for connection in connections {
        let (Some(host), Some(vol)) = (connection.name(), connection.get("vol").as_text()) else {
            continue;
        };
        let Some(naaid) = volumes.get(vol).and_then(|v| v.get("naaid").as_text()) else {
            continue;
        };
        if seen.insert((host.to_string(), naaid.to_string())) {
            family.push([host, naaid], 1.0);
        }
    }
    family
}
