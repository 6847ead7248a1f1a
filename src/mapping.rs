//! Field mapping tables
//!
//! Static, ordered maps from upstream field keys to the `dimension` label
//! value they are exported under. Block-storage entity classes (array,
//! volume, host, pod) share one vocabulary so the same counter carries the
//! same dimension whatever the entity.
//!
//! The table contents are part of the exported contract; dashboards key on
//! these label values, including historical spellings.

/// Ordered `(upstream_field, dimension)` pairs
pub type FieldMapping = &'static [(&'static str, &'static str)];

// ---------------------------------------------------------------------------
// FlashArray, shared by array, volume, host and pod
// ---------------------------------------------------------------------------

pub const LATENCY: FieldMapping = &[
    ("usec_per_read_op", "read"),
    ("usec_per_write_op", "write"),
    ("usec_per_mirrored_write_op", "mirrored_write"),
    ("local_queue_usec_per_op", "local_queue"),
    ("san_usec_per_read_op", "san_read"),
    ("san_usec_per_write_op", "san_write"),
    ("san_usec_per_mirrored_write_op", "san_mirrored_write"),
    ("queue_usec_per_read_op", "queue_read"),
    ("queue_usec_per_write_op", "queue_write"),
    ("queue_usec_per_mirrored_write_op", "queue_mirrored_write"),
    ("qos_rate_limit_usec_per_read_op", "qos_read"),
    ("qos_rate_limit_usec_per_write_op", "qos_write"),
    ("qos_rate_limit_usec_per_mirrored_write_op", "qos_mirrored"),
];

pub const BANDWIDTH: FieldMapping = &[
    ("output_per_sec", "read"),
    ("input_per_sec", "write"),
    ("mirrored_input_per_sec", "mirrored_write"),
];

pub const IOPS: FieldMapping = &[
    ("reads_per_sec", "read"),
    ("writes_per_sec", "write"),
    ("mirrored_writes_per_sec", "mirrored_write"),
];

pub const BLOCK_SIZE: FieldMapping = &[
    ("bytes_per_read", "read"),
    ("bytes_per_write", "write"),
    ("bytes_per_mirrored_write", "mirrored_write"),
];

pub const QUEUE_DEPTH: FieldMapping = &[("queue_depth", "")];

pub const DATA_REDUCTION: FieldMapping = &[("data_reduction", "")];

pub const CAPACITY: FieldMapping = &[("capacity", "")];

pub const PROVISIONED: FieldMapping = &[("provisioned", "")];

pub const SIZE: FieldMapping = &[("size", "")];

/// Array-wide used space by consumer
pub const USED_SPACE: FieldMapping = &[
    ("shared_space", "shared"),
    ("system", "system"),
    ("volumes", "volumes"),
    ("snapshots", "snapshots"),
    ("replication", "replication"),
];

/// Space allocated to a volume, host or pod
pub const ALLOCATED_SPACE: FieldMapping = &[
    ("volumes", "volumes"),
    ("snapshots", "snapshots"),
    ("total", "total"),
];

/// Network interface counters
pub const NETWORK_INTERFACE: FieldMapping = &[
    ("received_bytes_per_sec", "rx_bytes"),
    ("transmitted_bytes_per_sec", "tx_bytes"),
    ("received_packets_per_sec", "rx_packets"),
    ("transmitted_packets_per_sec", "tx_packets"),
    ("received_crc_errors_per_sec", "rx_crc_errors"),
    ("received_frame_errors_per_sec", "rx_frame_errors"),
    ("transmitted_carrier_errors_per_sec", "tx_carrier_errors"),
    ("transmitted_dropped_errors_per_sec", "tx_dropped_errors"),
    ("total_errors_per_sec", "total_errors"),
];

// ---------------------------------------------------------------------------
// FlashBlade
// ---------------------------------------------------------------------------

pub const FB_LATENCY: FieldMapping = &[
    ("usec_per_read_op", "read"),
    ("usec_per_write_op", "write"),
    ("usec_per_other_op", "other"),
];

pub const FB_IOPS: FieldMapping = &[
    ("reads_per_sec", "read"),
    ("writes_per_sec", "write"),
    ("others_per_sec", "other"),
];

pub const FB_OPS_SIZE: FieldMapping = &[
    ("bytes_per_op", "per_op"),
    ("bytes_per_read", "read"),
    ("bytes_per_write", "write"),
];

pub const FB_THROUGHPUT: FieldMapping = &[
    ("read_bytes_per_sec", "read"),
    ("write_bytes_per_sec", "write"),
];

/// Array-wide space; keys are flattened from the `space` object
pub const FB_ARRAY_SPACE: FieldMapping = &[
    ("space.unique", "unique"),
    ("space.virtual", "virtual"),
    ("space.total_physical", "total_physical"),
    ("space.snapshots", "snapshots"),
];

pub const FB_FILESYSTEM_SPACE: FieldMapping = &[
    ("provisioned", "provisioned"),
    ("space.snapshots", "snapshots"),
    ("space.total_physical", "total_physical"),
    ("space.virtual", "virtual"),
    ("space.unique", "unique"),
];

pub const FB_BUCKET_SPACE: FieldMapping = &[
    ("space.snapshots", "snapshots"),
    ("space.total_physical", "total_physical"),
    ("space.virtual", "virtual"),
    ("space.unique", "unique"),
];

pub const FB_BUCKET_LATENCY: FieldMapping = &[
    ("usec_per_read_bucket_op", "read_buckets"),
    ("usec_per_read_object_op", "read_objects"),
    ("usec_per_write_bucket_op", "write_buckets"),
    ("usec_per_write_object_op", "write_objects"),
    ("usec_per_other_op", "other"),
];

/// Exported as bucket throughput, fed from the per-second op rates
pub const FB_BUCKET_THROUGHPUT: FieldMapping = &[
    ("read_buckets_per_sec", "read_buckets"),
    ("read_objects_per_sec", "read_objects"),
    ("write_buckets_per_sec", "write_buckets"),
    ("write_objects_per_sec", "write_objects"),
    ("others_per_sec", "other"),
];

/// User and group usage; quota is read before usage
pub const FB_USAGE: FieldMapping = &[("quota", "quota"), ("usage", "usage")];

pub const NFS_SPECIFIC_LATENCY: FieldMapping = &[
    ("aggregate_usec_per_file_metadata_create_op", "file_metadata_create"),
    ("aggregate_usec_per_file_metadata_modify_op", "file_metadata_modify"),
    ("aggregate_usec_per_file_metadata_read_op", "file_metadata_read"),
    ("aggregate_usec_per_share_metadata_read_op", "share_metadata_read"),
    ("usec_per_access_op", "acces"),
    ("usec_per_create_op", "create"),
    ("usec_per_fsinfo_op", "fsinfo"),
    ("usec_per_fsstat_op", "fsstat"),
    ("usec_per_getattr_op", "getattr"),
    ("usec_per_link_op", "link"),
    ("usec_per_lookup_op", "lookup"),
    ("usec_per_mkdir_op", "mkdir"),
    ("usec_per_pathconf_op", "pathconf"),
    ("usec_per_read_op", "read"),
    ("usec_per_readdir_op", "readdir"),
    ("usec_per_readdirplus_op", "readdirplus"),
    ("usec_per_readlink_op", "readlink"),
    ("usec_per_remove_op", "remove"),
    ("usec_per_rename_op", "rename"),
    ("usec_per_rmdir_op", "rmdir"),
    ("usec_per_setattr_op", "setattr"),
    ("usec_per_symlink_op", "symlink"),
    ("usec_per_write_op", "write"),
];

pub const HTTP_SPECIFIC_LATENCY: FieldMapping = &[
    ("usec_per_read_dir_op", "read_dir"),
    ("usec_per_write_dir_op", "write_dir"),
    ("usec_per_read_file_op", "read_file"),
    ("usec_per_write_file_op", "write_file"),
    ("usec_per_other_op", "other"),
];

pub const S3_SPECIFIC_LATENCY: FieldMapping = &[
    ("usec_per_other_op", "other"),
    ("usec_per_read_bucket_op", "read_bucket"),
    ("usec_per_read_object_op", "read_object"),
    ("usec_per_write_bucket_op", "write_bucket"),
    ("usec_per_write_object_op", "write_object"),
];

pub const NFS_SPECIFIC_IOPS: FieldMapping = &[
    ("aggregate_file_metadata_creates_per_sec", "file_metadata_creates"),
    ("aggregate_file_metadata_modifies_per_sec", "file_metadata_modifies"),
    ("aggregate_file_metadata_reads_per_sec", "file_metadata_reads"),
    ("aggregate_share_metadata_reads_per_sec", "share_metadata_reads"),
    ("accesses_per_sec", "accesses"),
    ("creates_per_sec", "creates"),
    ("fsinfos_per_sec", "fsinfos"),
    ("fsstats_per_sec", "fsstats"),
    ("getattrs_per_sec", "getattrs"),
    ("links_per_sec", "links"),
    ("lookups_per_sec", "lookups"),
    ("mkdirs_per_sec", "mkdirs"),
    ("pathconfs_per_sec", "pathconfs"),
    ("readdirpluses_per_sec", "readdirpluses"),
    ("readdirs_per_sec", "readdirs"),
    ("readlinks_per_sec", "readlinks"),
    ("reads_per_sec", "reads"),
    ("removes_per_sec", "removes"),
    ("renames_per_sec", "renames"),
    ("rmdirs_per_sec", "rmdirs"),
    ("setattrs_per_sec", "setattrs"),
    ("symlinks_per_sec", "symlinks"),
    ("writes_per_sec", "writes"),
];

pub const HTTP_SPECIFIC_IOPS: FieldMapping = &[
    ("others_per_sec", "others"),
    ("read_dirs_per_sec", "read_dirs"),
    ("read_files_per_sec", "read_files"),
    ("write_dirs_per_sec", "write_dirs"),
    ("write_files_per_sec", "write_files"),
];

pub const S3_SPECIFIC_IOPS: FieldMapping = &[
    ("others_per_sec", "others"),
    ("read_buckets_per_sec", "read_buckets"),
    ("read_objects_per_sec", "read_objects"),
    ("write_buckets_per_sec", "write_buckets"),
    ("write_objects_per_sec", "write_objects"),
];

/// Latency and IOPS tables of a protocol-specific performance resource
pub fn specific_performance(protocol: &str) -> Option<(FieldMapping, FieldMapping)> {
    match protocol {
        "nfs" => Some((NFS_SPECIFIC_LATENCY, NFS_SPECIFIC_IOPS)),
        "http" => Some((HTTP_SPECIFIC_LATENCY, HTTP_SPECIFIC_IOPS)),
        "s3" => Some((S3_SPECIFIC_LATENCY, S3_SPECIFIC_IOPS)),
        _ => None,
    }
}
