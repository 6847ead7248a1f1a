use tokio::sync::OnceCell;

use super::{aggregated, empty_listing, listed};
use crate::collector::{
    AggregationPlan, DataSource, EntityClass, EntityCollection, Query, Record, PURE_NAA,
};
use crate::error::ScrapeError;

/// Protocol endpoints have no space or volume counters of their own
const PROTOCOL_ENDPOINT_PLACEHOLDERS: &[(&str, f64)] = &[
    ("size", 0.0),
    ("volumes", 0.0),
    ("snapshots", 0.0),
    ("total", 0.0),
    ("data_reduction", 0.0),
];

/// `naaid` = Pure NAA prefix + serial
pub fn derive_naaid(volume: &mut Record) {
    if let Some(serial) = volume.get("serial").as_text() {
        let naaid = format!("{}{}", PURE_NAA, serial);
        volume.insert("naaid", naaid);
    }
}

pub fn array_plan() -> AggregationPlan {
    AggregationPlan::singleton(EntityClass::Array)
        .with_monitor_subsets()
        .then(Query::space())
}

pub fn volume_plan() -> AggregationPlan {
    AggregationPlan::new(EntityClass::Volume)
        .derive(derive_naaid)
        .then_insert(
            Query::new().flag("protocol_endpoint"),
            PROTOCOL_ENDPOINT_PLACEHOLDERS,
        )
        .with_monitor_subsets()
        .then(Query::space())
}

pub fn host_plan() -> AggregationPlan {
    AggregationPlan::new(EntityClass::Host)
        .with_monitor_subsets()
        .then(Query::space())
}

pub fn pod_plan() -> AggregationPlan {
    AggregationPlan::new(EntityClass::Pod)
        .with_monitor_subsets()
        .then(Query::space())
}

/// Lazily aggregated FlashArray entities for one scrape
pub struct FlashArrayInventory<'a> {
    source: &'a dyn DataSource,
    array: OnceCell<EntityCollection>,
    volumes: OnceCell<EntityCollection>,
    hosts: OnceCell<EntityCollection>,
    pods: OnceCell<EntityCollection>,
    hardware: OnceCell<Vec<Record>>,
    alerts: OnceCell<Vec<Record>>,
    network_interfaces: OnceCell<Vec<Record>>,
    host_connections: OnceCell<Vec<Record>>,
}

impl<'a> FlashArrayInventory<'a> {
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self {
            source,
            array: OnceCell::new(),
            volumes: OnceCell::new(),
            hosts: OnceCell::new(),
            pods: OnceCell::new(),
            hardware: OnceCell::new(),
            alerts: OnceCell::new(),
            network_interfaces: OnceCell::new(),
            host_connections: OnceCell::new(),
        }
    }

    /// The array record with monitor and space counters merged in
    pub async fn array(&self) -> Result<&Record, ScrapeError> {
        aggregated(self.source, &self.array, array_plan)
            .await?
            .single()
            .ok_or_else(|| empty_listing(EntityClass::Array))
    }

    pub async fn volumes(&self) -> Result<&EntityCollection, ScrapeError> {
        aggregated(self.source, &self.volumes, volume_plan).await
    }

    pub async fn hosts(&self) -> Result<&EntityCollection, ScrapeError> {
        aggregated(self.source, &self.hosts, host_plan).await
    }

    pub async fn pods(&self) -> Result<&EntityCollection, ScrapeError> {
        aggregated(self.source, &self.pods, pod_plan).await
    }

    pub async fn hardware(&self) -> Result<&[Record], ScrapeError> {
        listed(self.source, &self.hardware, EntityClass::Hardware, Query::new()).await
    }

    /// Open alerts only
    pub async fn alerts(&self) -> Result<&[Record], ScrapeError> {
        listed(self.source, &self.alerts, EntityClass::Alert, Query::new().flag("open")).await
    }

    pub async fn network_interfaces(&self) -> Result<&[Record], ScrapeError> {
        listed(
            self.source,
            &self.network_interfaces,
            EntityClass::NetworkInterface,
            Query::monitor(),
        )
        .await
    }

    /// One record per host/volume connection
    pub async fn host_connections(&self) -> Result<&[Record], ScrapeError> {
        listed(
            self.source,
            &self.host_connections,
            EntityClass::HostConnection,
            Query::new().flag("all"),
        )
        .await
    }

    /// Subset listings skipped so far in this scrape
    pub fn skipped_subsets(&self) -> usize {
        [&self.array, &self.volumes, &self.hosts, &self.pods]
            .iter()
            .filter_map(|cell| cell.get())
            .map(|c| c.skipped().len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{FieldValue, MemorySource};
    use crate::error::CollectorError;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_listing(
                EntityClass::Volume,
                Query::new(),
                vec![Record::new().with("name", "v1").with("serial", "ABC123")],
            )
            .with_listing(
                EntityClass::Volume,
                Query::new().flag("protocol_endpoint"),
                vec![Record::new().with("name", "pe1").with("serial", "FFF000")],
            )
            .with_listing(
                EntityClass::Volume,
                Query::monitor(),
                vec![
                    Record::new().with("name", "v1").with("reads_per_sec", 5.0),
                    Record::new().with("name", "pe1").with("reads_per_sec", 0.0),
                ],
            )
    }

    #[tokio::test]
    async fn test_volumes_are_cached_per_inventory() {
        let source = source();
        let inventory = FlashArrayInventory::new(&source);

        let first = inventory.volumes().await.unwrap().len();
        let calls = source.calls(EntityClass::Volume);
        let second = inventory.volumes().await.unwrap().len();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        assert_eq!(source.calls(EntityClass::Volume), calls);
    }

    #[tokio::test]
    async fn test_naaid_and_protocol_endpoint_placeholders() {
        let source = source();
        let inventory = FlashArrayInventory::new(&source);
        let volumes = inventory.volumes().await.unwrap();

        let v1 = volumes.get("v1").unwrap();
        assert_eq!(v1.get("naaid").as_text(), Some("naa.624a9370ABC123"));
        assert_eq!(v1.number("reads_per_sec"), Some(5.0));
        assert!(v1.get("size").is_absent());

        let pe = volumes.get("pe1").unwrap();
        assert_eq!(pe.get("naaid").as_text(), Some("naa.624a9370FFF000"));
        assert_eq!(pe.number("size"), Some(0.0));
        assert_eq!(pe.number("data_reduction"), Some(0.0));

        // mirrored, latency, size and space variants were never registered
        assert_eq!(inventory.skipped_subsets(), 6);
    }

    #[tokio::test]
    async fn test_array_singleton_merges_subsets() {
        let source = MemorySource::new()
            .with_listing(
                EntityClass::Array,
                Query::new(),
                vec![Record::new().with("array_name", "fa1")],
            )
            .with_listing(
                EntityClass::Array,
                Query::space(),
                vec![Record::new().with("capacity", 100.0).with("provisioned", FieldValue::Null)],
            );
        let inventory = FlashArrayInventory::new(&source);
        let array = inventory.array().await.unwrap();

        assert_eq!(array.get("array_name").as_text(), Some("fa1"));
        assert_eq!(array.number("capacity"), Some(100.0));
    }

    #[tokio::test]
    async fn test_required_listing_failure() {
        let source = MemorySource::new().with_failure(
            EntityClass::Hardware,
            Query::new(),
            CollectorError::Timeout(Some(1000)),
        );
        let inventory = FlashArrayInventory::new(&source);

        assert!(matches!(
            inventory.hardware().await,
            Err(ScrapeError::UpstreamUnavailable {
                class: EntityClass::Hardware,
                ..
            })
        ));
    }
}
