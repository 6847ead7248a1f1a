use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;

use super::{aggregated, empty_listing, list_optional, listed};
use crate::builders::performance::PROTOCOL_FIELD;
use crate::collector::{AggregationPlan, DataSource, EntityClass, EntityCollection, Query, Record};
use crate::error::ScrapeError;

/// Protocols with array-wide performance counters
pub const PERFORMANCE_PROTOCOLS: [&str; 4] = ["http", "nfs", "s3", "smb"];

/// Protocols with a protocol-specific performance resource
pub const SPECIFIC_PROTOCOLS: [&str; 3] = ["nfs", "http", "s3"];

fn filesystem_plan() -> AggregationPlan {
    AggregationPlan::new(EntityClass::FileSystem)
}

fn bucket_plan() -> AggregationPlan {
    AggregationPlan::new(EntityClass::Bucket)
}

/// Lazily listed FlashBlade entities for one scrape
///
/// Per-protocol performance, per-file-system performance, bucket
/// performance and usage are best effort: a failing listing contributes
/// nothing and is counted as skipped.
pub struct FlashBladeInventory<'a> {
    source: &'a dyn DataSource,
    array: OnceCell<Vec<Record>>,
    array_space: OnceCell<Vec<Record>>,
    hardware: OnceCell<Vec<Record>>,
    alerts: OnceCell<Vec<Record>>,
    array_performance: OnceCell<Vec<Record>>,
    specific_performance: OnceCell<Vec<Record>>,
    filesystems: OnceCell<EntityCollection>,
    buckets: OnceCell<EntityCollection>,
    filesystem_performance: OnceCell<Vec<Record>>,
    bucket_performance: OnceCell<Vec<Record>>,
    bucket_replica_links: OnceCell<Vec<Record>>,
    filesystem_replica_links: OnceCell<Vec<Record>>,
    user_usage: OnceCell<Vec<Record>>,
    group_usage: OnceCell<Vec<Record>>,
    clients: OnceCell<Vec<Record>>,
    skipped: AtomicUsize,
}

impl<'a> FlashBladeInventory<'a> {
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self {
            source,
            array: OnceCell::new(),
            array_space: OnceCell::new(),
            hardware: OnceCell::new(),
            alerts: OnceCell::new(),
            array_performance: OnceCell::new(),
            specific_performance: OnceCell::new(),
            filesystems: OnceCell::new(),
            buckets: OnceCell::new(),
            filesystem_performance: OnceCell::new(),
            bucket_performance: OnceCell::new(),
            bucket_replica_links: OnceCell::new(),
            filesystem_replica_links: OnceCell::new(),
            user_usage: OnceCell::new(),
            group_usage: OnceCell::new(),
            clients: OnceCell::new(),
            skipped: AtomicUsize::new(0),
        }
    }

    pub async fn array(&self) -> Result<&Record, ScrapeError> {
        listed(self.source, &self.array, EntityClass::Array, Query::new())
            .await?
            .first()
            .ok_or_else(|| empty_listing(EntityClass::Array))
    }

    pub async fn array_space(&self) -> Result<&Record, ScrapeError> {
        listed(self.source, &self.array_space, EntityClass::ArraySpace, Query::new())
            .await?
            .first()
            .ok_or_else(|| empty_listing(EntityClass::ArraySpace))
    }

    pub async fn hardware(&self) -> Result<&[Record], ScrapeError> {
        listed(self.source, &self.hardware, EntityClass::Hardware, Query::new()).await
    }

    pub async fn alerts(&self) -> Result<&[Record], ScrapeError> {
        let open = Query::new().param("filter", "state='open'");
        listed(self.source, &self.alerts, EntityClass::Alert, open).await
    }

    /// One array performance record per protocol, tagged with the protocol
    pub async fn array_performance(&self) -> &[Record] {
        self.per_protocol(
            &self.array_performance,
            EntityClass::ArrayPerformance,
            &PERFORMANCE_PROTOCOLS,
        )
        .await
    }

    /// One protocol-specific performance record per protocol
    pub async fn specific_performance(&self) -> &[Record] {
        self.per_protocol(
            &self.specific_performance,
            EntityClass::ArraySpecificPerformance,
            &SPECIFIC_PROTOCOLS,
        )
        .await
    }

    async fn per_protocol<'c>(
        &self,
        cell: &'c OnceCell<Vec<Record>>,
        class: EntityClass,
        protocols: &[&'static str],
    ) -> &'c [Record] {
        let source = self.source;
        let skipped = &self.skipped;
        cell.get_or_init(|| async move {
            let mut records = Vec::new();
            for protocol in protocols {
                let query = Query::new().protocol(protocol);
                if let Some(mut record) = list_optional(source, class, &query, skipped)
                    .await
                    .into_iter()
                    .next()
                {
                    record.insert(PROTOCOL_FIELD, *protocol);
                    records.push(record);
                }
            }
            records
        })
        .await
        .as_slice()
    }

    pub async fn filesystems(&self) -> Result<&EntityCollection, ScrapeError> {
        aggregated(self.source, &self.filesystems, filesystem_plan).await
    }

    pub async fn buckets(&self) -> Result<&EntityCollection, ScrapeError> {
        aggregated(self.source, &self.buckets, bucket_plan).await
    }

    async fn filesystem_names(&self) -> Result<Vec<String>, ScrapeError> {
        Ok(self
            .filesystems()
            .await?
            .iter()
            .filter_map(|fs| fs.name().map(str::to_string))
            .collect())
    }

    /// Listing per file system, concatenated
    async fn per_filesystem<'c>(
        &self,
        cell: &'c OnceCell<Vec<Record>>,
        class: EntityClass,
        query: fn(&str) -> Query,
    ) -> Result<&'c [Record], ScrapeError> {
        let names = self.filesystem_names().await?;
        let source = self.source;
        let skipped = &self.skipped;
        let records = cell
            .get_or_init(|| async move {
                let mut records = Vec::new();
                for name in &names {
                    records.extend(list_optional(source, class, &query(name), skipped).await);
                }
                records
            })
            .await;
        Ok(records.as_slice())
    }

    /// NFS performance of every file system
    pub async fn filesystem_performance(&self) -> Result<&[Record], ScrapeError> {
        self.per_filesystem(
            &self.filesystem_performance,
            EntityClass::FileSystemPerformance,
            |name| Query::new().protocol("nfs").names(name),
        )
        .await
    }

    pub async fn user_usage(&self) -> Result<&[Record], ScrapeError> {
        self.per_filesystem(&self.user_usage, EntityClass::UserUsage, |name| {
            Query::new().param("file_system_names", name)
        })
        .await
    }

    pub async fn group_usage(&self) -> Result<&[Record], ScrapeError> {
        self.per_filesystem(&self.group_usage, EntityClass::GroupUsage, |name| {
            Query::new().param("file_system_names", name)
        })
        .await
    }

    pub async fn bucket_performance(&self) -> &[Record] {
        let source = self.source;
        let skipped = &self.skipped;
        self.bucket_performance
            .get_or_init(|| async move {
                list_optional(source, EntityClass::BucketPerformance, &Query::new(), skipped).await
            })
            .await
            .as_slice()
    }

    pub async fn bucket_replica_links(&self) -> Result<&[Record], ScrapeError> {
        listed(
            self.source,
            &self.bucket_replica_links,
            EntityClass::BucketReplicaLink,
            Query::new(),
        )
        .await
    }

    pub async fn filesystem_replica_links(&self) -> Result<&[Record], ScrapeError> {
        listed(
            self.source,
            &self.filesystem_replica_links,
            EntityClass::FileSystemReplicaLink,
            Query::new(),
        )
        .await
    }

    pub async fn clients(&self) -> Result<&[Record], ScrapeError> {
        listed(
            self.source,
            &self.clients,
            EntityClass::ClientPerformance,
            Query::new(),
        )
        .await
    }

    /// Listings skipped so far in this scrape
    pub fn skipped_subsets(&self) -> usize {
        let aggregated: usize = [&self.filesystems, &self.buckets]
            .iter()
            .filter_map(|cell| cell.get())
            .map(|c| c.skipped().len())
            .sum();
        aggregated + self.skipped.load(Ordering::Relaxed)
    }
}
