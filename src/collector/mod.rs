//! Upstream data collection
//!
//! Talks to the FlashArray and FlashBlade management REST APIs and turns
//! their listings into flat [`Record`]s. Everything above this module sees
//! the arrays only through the [`DataSource`] trait.
//!
//! # Example
//!
//! ```ignore
//! use pure_exporter::collector::{DataSource, EntityClass, FlashArrayClient, Query};
//!
//! let client = FlashArrayClient::connect(&settings, "fa1.example.com", token).await?;
//! let volumes = client.list(EntityClass::Volume, &Query::monitor()).await?;
//! ```

mod aggregator;
mod flasharray;
mod flashblade;
mod memory;
mod query;
mod record;
mod rest;

use std::fmt;

use async_trait::async_trait;

pub use aggregator::{
    aggregate, AggregationPlan, EntityCollection, EntityKey, MergeMode, SkippedSubset,
    SubsetRequest,
};
pub use flasharray::{FlashArrayClient, PURE_NAA};
pub use flashblade::FlashBladeClient;
pub use memory::MemorySource;
pub use query::Query;
pub use record::{parse_records, records_from_value, CollectResult, Field, FieldValue, Record};
pub use rest::UpstreamSettings;

/// Kinds of entities the arrays expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Array,
    Volume,
    Host,
    Pod,
    Hardware,
    Alert,
    NetworkInterface,
    /// Host to volume connections
    HostConnection,
    ArraySpace,
    /// Array-wide performance, per protocol
    ArrayPerformance,
    /// Protocol-specific array performance (`nfs`, `http`, `s3`)
    ArraySpecificPerformance,
    FileSystem,
    FileSystemPerformance,
    Bucket,
    BucketPerformance,
    BucketReplicaLink,
    FileSystemReplicaLink,
    UserUsage,
    GroupUsage,
    ClientPerformance,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Array => "array",
            EntityClass::Volume => "volume",
            EntityClass::Host => "host",
            EntityClass::Pod => "pod",
            EntityClass::Hardware => "hardware",
            EntityClass::Alert => "alert",
            EntityClass::NetworkInterface => "network_interface",
            EntityClass::HostConnection => "host_connection",
            EntityClass::ArraySpace => "array_space",
            EntityClass::ArrayPerformance => "array_performance",
            EntityClass::ArraySpecificPerformance => "array_specific_performance",
            EntityClass::FileSystem => "file_system",
            EntityClass::FileSystemPerformance => "file_system_performance",
            EntityClass::Bucket => "bucket",
            EntityClass::BucketPerformance => "bucket_performance",
            EntityClass::BucketReplicaLink => "bucket_replica_link",
            EntityClass::FileSystemReplicaLink => "file_system_replica_link",
            EntityClass::UserUsage => "user_usage",
            EntityClass::GroupUsage => "group_usage",
            EntityClass::ClientPerformance => "client_performance",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source of entity listings
///
/// Each call returns every entity of `class` carrying the field subset
/// selected by `query`, or fails. Implementations own their session.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list(&self, class: EntityClass, query: &Query) -> CollectResult<Vec<Record>>;

    /// End the upstream session. Failures are logged, never surfaced.
    async fn close(&self) {}
}
