//! Space and capacity families
//!
//! Capacity-like numbers read a null as zero: a feature that is switched off
//! reports as using nothing. Array-wide FlashArray space also treats a
//! missing field as zero, since the space listing is the only source.

use crate::collector::Record;
use crate::exposition::MetricFamily;
use crate::mapping::{
    ALLOCATED_SPACE, CAPACITY, DATA_REDUCTION, FB_ARRAY_SPACE, FB_BUCKET_SPACE,
    FB_FILESYSTEM_SPACE, PROVISIONED, SIZE, USED_SPACE,
};

use super::{build_mapped_all, by_name, no_labels, MappedSpec, NullPolicy};

const FA_ARRAY_SPACE: [MappedSpec; 4] = [
    MappedSpec::new(
        "purefa_array_space_datareduction_ratio",
        "FlashArray overall data reduction",
        DATA_REDUCTION,
    )
    .with_policy(NullPolicy::ZeroFill),
    MappedSpec::new(
        "purefa_array_space_capacity_bytes",
        "FlashArray overall space capacity",
        CAPACITY,
    )
    .with_policy(NullPolicy::ZeroFill),
    MappedSpec::new(
        "purefa_array_space_provisioned_bytes",
        "FlashArray overall provisioned space",
        PROVISIONED,
    )
    .with_policy(NullPolicy::ZeroFill),
    MappedSpec::new(
        "purefa_array_space_used_bytes",
        "FlashArray overall used space",
        USED_SPACE,
    )
    .with_policy(NullPolicy::ZeroFill),
];

/// FlashArray array-wide space families
pub fn flasharray_array_space(array: &Record) -> Vec<MetricFamily> {
    build_mapped_all(&FA_ARRAY_SPACE, &[], std::slice::from_ref(array), no_labels)
}

/// Volume space families, labeled `{volume,naaid}`
pub fn volume_space(volumes: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&VOLUME_SPACE, &["volume", "naaid"], volumes, |r| {
        r.name().map(|n| vec![n.to_string(), r.label("naaid")])
    })
}

/// Host space families, labeled `{host}`
pub fn host_space(hosts: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&HOST_SPACE, &["host"], hosts, by_name)
}

/// Pod space families, labeled `{pod}`
pub fn pod_space(pods: &[Record]) -> Vec<MetricFamily> {
    build_mapped_all(&POD_SPACE, &["pod"], pods, by_name)
}

const VOLUME_SPACE: [MappedSpec; 3] = [
    MappedSpec::new(
        "purefa_volume_space_datareduction_ratio",
        "FlashArray volumes data reduction ratio",
        DATA_REDUCTION,
    ),
    MappedSpec::new("purefa_volume_space_size_bytes", "FlashArray volumes size", SIZE),
    MappedSpec::new("purefa_volume_space_bytes", "FlashArray allocated space", ALLOCATED_SPACE),
];

const HOST_SPACE: [MappedSpec; 3] = [
    MappedSpec::new(
        "purefa_host_space_datareduction_ratio",
        "FlashArray host volumes data reduction ratio",
        DATA_REDUCTION,
    ),
    MappedSpec::new("purefa_host_space_size_bytes", "FlashArray host volumes size", SIZE),
    MappedSpec::new(
        "purefa_host_space_bytes",
        "FlashArray host volumes allocated space",
        ALLOCATED_SPACE,
    ),
];

const POD_SPACE: [MappedSpec; 3] = [
    MappedSpec::new(
        "purefa_pod_space_datareduction_ratio",
        "FlashArray pod data reduction ratio",
        DATA_REDUCTION,
    ),
    MappedSpec::new("purefa_pod_space_size_bytes", "FlashArray pod size", SIZE),
    MappedSpec::new("purefa_pod_space_bytes", "FlashArray pod allocated space", ALLOCATED_SPACE),
];

/// FlashBlade array capacity, used space and data reduction
///
/// All three come from the array space listing.
pub fn flashblade_array_space(space: &Record) -> Vec<MetricFamily> {
    let specs = [
        MappedSpec::new(
            "purefb_array_capacity_bytes",
            "FlashBlade total capacity in bytes",
            CAPACITY,
        ),
        MappedSpec::new("purefb_array_space_bytes", "FlashBlade used space in bytes", FB_ARRAY_SPACE),
        MappedSpec::new(
            "purefb_array_space_data_reduction",
            "FlashBlade overall data reduction",
            &[("space.data_reduction", "")],
        ),
    ];
    build_mapped_all(&specs, &[], std::slice::from_ref(space), no_labels)
}

/// `purefb_filesystems_data_reduction{name}` and
/// `purefb_filesystems_space_bytes{name,dimension}`
pub fn filesystem_space(filesystems: &[Record]) -> Vec<MetricFamily> {
    let specs = [
        MappedSpec::new(
            "purefb_filesystems_data_reduction",
            "FlashBlade filesystems data reduction",
            &[("space.data_reduction", "")],
        ),
        MappedSpec::new("purefb_filesystems_space_bytes", "FlashBlade filesystems space", FB_FILESYSTEM_SPACE),
    ];
    build_mapped_all(&specs, &["name"], filesystems, by_name)
}

/// Bucket data reduction, object count and space, labeled `{account,name}`
pub fn bucket_space(buckets: &[Record]) -> Vec<MetricFamily> {
    let specs = [
        MappedSpec::new(
            "purefb_buckets_data_reduction",
            "FlashBlade buckets data reduction",
            &[("space.data_reduction", "")],
        ),
        MappedSpec::new(
            "purefb_buckets_object_count",
            "FlashBlade buckets objects counter",
            &[("object_count", "")],
        ),
        MappedSpec::new("purefb_buckets_space_bytes", "FlashBlade buckets space", FB_BUCKET_SPACE),
    ];
    build_mapped_all(&specs, &["account", "name"], buckets, |r| {
        r.name().map(|n| vec![r.label("account.name"), n.to_string()])
    })
}
