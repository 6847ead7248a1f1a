//! Performance families
//!
//! Block entities (array, volume, host, pod) share the latency, bandwidth
//! and IOPS vocabulary; FlashBlade families are split by protocol.

use crate::collector::Record;
use crate::exposition::MetricFamily;
use crate::identifier::split_client_name;
use crate::mapping::{
    self, BANDWIDTH, BLOCK_SIZE, FB_BUCKET_LATENCY, FB_BUCKET_THROUGHPUT, FB_IOPS, FB_LATENCY,
    FB_OPS_SIZE, FB_THROUGHPUT, IOPS, LATENCY, NETWORK_INTERFACE, QUEUE_DEPTH,
};

use super::{build_mapped, build_mapped_all, by_name, no_labels, MappedSpec, NullPolicy};

const FA_ARRAY: [MappedSpec; 5] = [
    MappedSpec::new("purefa_array_performance_latency_usec", "FlashArray latency", LATENCY),
    MappedSpec::new("purefa_array_performance_bandwidth_bytes", "FlashArray bandwidth", BANDWIDTH),
    MappedSpec::new("purefa_array_performance_iops", "FlashArray IOPS", IOPS),
    MappedSpec::new(
        "purefa_array_performance_avg_block_bytes",
        "FlashArray avg block size",
        BLOCK_SIZE,
    ),
    MappedSpec::new("purefa_array_performance_qdepth", "FlashArray queue depth", QUEUE_DEPTH)
        .with_policy(NullPolicy::ZeroFill),
];

const FA_VOLUME: [MappedSpec; 3] = [
    MappedSpec::new(
        "purefa_volume_performance_latency_usec",
        "FlashArray volume latency",
        LATENCY,
    ),
    MappedSpec::new(
        "purefa_volume_performance_throughput_bytes",
        "FlashArray volume throughput",
        BANDWIDTH,
    ),
    MappedSpec::new("purefa_volume_performance_iops", "FlashArray volume IOPS", IOPS),
];

const FA_HOST: [MappedSpec; 3] = [
    MappedSpec::new("purefa_host_performance_latency_usec", "FlashArray host latency", LATENCY),
    MappedSpec::new(
        "purefa_host_performance_bandwidth_bytes",
        "FlashArray host bandwidth",
        BANDWIDTH,
    ),
    MappedSpec::new("purefa_host_performance_iops", "FlashArray host IOPS", IOPS),
];

const FA_POD: [MappedSpec; 3] = [
    MappedSpec::new("purefa_pod_performance_latency_usec", "FlashArray pod latency", LATENCY),
    MappedSpec::new(
        "purefa_pod_performance_bandwidth_bytes",
        "FlashArray pod bandwidth",
        BANDWIDTH,
    ),
    MappedSpec::new("purefa_pod_performance_iops", "FlashArray pod IOPS", IOPS),
];

/// Array-wide performance: latency, bandwidth, IOPS, block size, queue depth
pub fn flasharray_array_performance(array: &Record) -> Vec<MetricFamily> {
    build_mapped_all(&FA_ARRAY, &[], std::slice::from_ref(array), no_labels)
}

pub fn volume_performance(volumes: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&FA_VOLUME, &["volume", "naaid"], volumes, |r| {
        r.name().map(|n| vec![n.to_string(), r.label("naaid")])
    })
}

pub fn host_performance(hosts: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&FA_HOST, &["host"], hosts, by_name)
}

pub fn pod_performance(pods: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&FA_POD, &["pod"], pods, by_name)
}

/// `purefa_network_interface_performance{interface,dimension}`
pub fn network_interface_performance(interfaces: &[Record]) -> MetricFamily {
    let spec = MappedSpec::new(
        "purefa_network_interface_performance",
        "FlashArray network interface performance",
        NETWORK_INTERFACE,
    );
    build_mapped(&spec, &["interface"], interfaces, by_name)
}

/// Latency, IOPS, op size and throughput families sharing a name prefix
fn protocol_specs(prefix: &str) -> [(String, &'static str, mapping::FieldMapping); 4] {
    [
        (format!("{}_latency_usec", prefix), "latency", FB_LATENCY),
        (format!("{}_iops", prefix), "IOPS", FB_IOPS),
        (format!("{}_opns_bytes", prefix), "average bytes per operations", FB_OPS_SIZE),
        (format!("{}_throughput_bytes", prefix), "throughput", FB_THROUGHPUT),
    ]
}

/// Build the four protocol families for `records`, with a custom label set
fn protocol_families<'a, I, F>(
    prefix: &str,
    subject: &str,
    keys: &[&'static str],
    records: I,
    labels: F,
) -> Vec<MetricFamily>
where
    I: IntoIterator<Item = &'a Record> + Clone,
    F: Fn(&Record) -> Option<Vec<String>>,
{
    protocol_specs(prefix)
        .into_iter()
        .map(|(name, what, table)| {
            let mut with_dimension = keys.to_vec();
            with_dimension.push(super::DIMENSION);
            let mut family =
                MetricFamily::gauge(name, format!("FlashBlade {} {}", subject, what), &with_dimension);
            for record in records.clone() {
                let Some(entity) = labels(record) else {
                    continue;
                };
                for (field, dimension) in table.iter() {
                    if let Some(value) = NullPolicy::ZeroIfNull.resolve(record.get(field)) {
                        let mut sample = entity.clone();
                        sample.push(dimension.to_string());
                        family.push(sample, value);
                    }
                }
            }
            family
        })
        .collect()
}

/// Field holding the protocol a performance record was listed for
pub const PROTOCOL_FIELD: &str = "protocol";

/// Per-protocol array performance, labeled `{protocol,dimension}`
///
/// One record per protocol, each carrying [`PROTOCOL_FIELD`].
pub fn flashblade_array_performance(records: &[Record]) -> Vec<MetricFamily> {
    protocol_families(
        "purefb_array_performance",
        "array",
        &["protocol"],
        records.iter(),
        |r| r.get(PROTOCOL_FIELD).as_text().map(|p| vec![p.to_string()]),
    )
}

/// Protocol-specific array latency and IOPS, labeled `{protocol,dimension}`
///
/// Records carry [`PROTOCOL_FIELD`]; protocols without specific tables are
/// ignored.
pub fn flashblade_specific_performance(records: &[Record]) -> Vec<MetricFamily> {
    let mut latency = MetricFamily::gauge(
        "purefb_array_specific_performance_latency_usec",
        "FlashBlade array specific latency",
        &["protocol", "dimension"],
    );
    let mut iops = MetricFamily::gauge(
        "purefb_array_specific_performance_iops",
        "FlashBlade array specific IOPS",
        &["protocol", "dimension"],
    );

    for record in records {
        let Some(protocol) = record.get(PROTOCOL_FIELD).as_text() else {
            continue;
        };
        let Some((latency_table, iops_table)) = mapping::specific_performance(protocol) else {
            continue;
        };
        for (family, table) in [(&mut latency, latency_table), (&mut iops, iops_table)] {
            for (field, dimension) in table.iter() {
                if let Some(value) = NullPolicy::ZeroIfNull.resolve(record.get(field)) {
                    family.push([protocol, *dimension], value);
                }
            }
        }
    }

    vec![latency, iops]
}

/// NFS file system performance, labeled `{protocol,name,dimension}`
pub fn filesystem_performance(records: &[Record]) -> Vec<MetricFamily> {
    protocol_families(
        "purefb_filesystem_performance",
        "filesystem",
        &["protocol", "name"],
        records.iter(),
        |r| r.name().map(|n| vec!["nfs".to_string(), n.to_string()]),
    )
}

/// Bucket S3 latency and throughput, labeled `{name,dimension}`
pub fn bucket_performance(records: &[Record]) -> Vec<MetricFamily> {
    let specs = [
        MappedSpec::new(
            "purefb_bucket_performance_latency_usec",
            "FlashBlade bucket latency",
            FB_BUCKET_LATENCY,
        ),
        MappedSpec::new(
            "purefb_bucket_performance_throughput_bytes",
            "FlashBlade bucket throughput",
            FB_BUCKET_THROUGHPUT,
        ),
    ];
    build_mapped_all(&specs, &["name"], records, by_name)
}

/// Client performance, labeled `{name,port,dimension}`
///
/// Client names are `address:port`, split at the last colon.
pub fn client_performance(records: &[Record]) -> Vec<MetricFamily> {
    protocol_families(
        "purefb_client_performance",
        "client",
        &["name", "port"],
        records.iter(),
        |r| {
            r.name().map(|n| {
                let (client, port) = split_client_name(n);
                vec![client.to_string(), port.to_string()]
            })
        },
    )
}
