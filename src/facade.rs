//! Collection façade
//!
//! Runs the builders a scrape scope asks for against one data source and
//! concatenates their families in a fixed order. Each call builds its own
//! inventory, so listings are cached for the duration of one scrape only.
//!
//! FlashArray order: info, hardware, alerts, array space, array
//! performance, network, volumes, hosts, pods, host connections.
//!
//! FlashBlade order: info, hardware, events, array performance,
//! protocol-specific performance, array space, file systems, buckets,
//! replication, usage, clients.

use std::fmt;

use tracing::{debug, instrument};

use crate::builders::{
    alerts, hardware, info, performance, pods, replication, space, topology, usage,
};
use crate::collector::DataSource;
use crate::error::ScrapeError;
use crate::exposition::MetricFamily;
use crate::inventory::{FlashArrayInventory, FlashBladeInventory};

/// Which part of an array a scrape covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Array,
    Volumes,
    Hosts,
    Pods,
    Clients,
    Usage,
}

impl Scope {
    /// Parse a path segment; anything unknown means `All`
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "array" => Scope::Array,
            "volumes" => Scope::Volumes,
            "hosts" => Scope::Hosts,
            "pods" => Scope::Pods,
            "clients" => Scope::Clients,
            "usage" => Scope::Usage,
            _ => Scope::All,
        }
    }

    /// Restrict to the scopes a FlashArray serves
    pub fn for_flasharray(self) -> Self {
        match self {
            Scope::Clients | Scope::Usage => Scope::All,
            other => other,
        }
    }

    /// Restrict to the scopes a FlashBlade serves
    pub fn for_flashblade(self) -> Self {
        match self {
            Scope::Volumes | Scope::Hosts | Scope::Pods => Scope::All,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Array => "array",
            Scope::Volumes => "volumes",
            Scope::Hosts => "hosts",
            Scope::Pods => "pods",
            Scope::Clients => "clients",
            Scope::Usage => "usage",
        }
    }

    fn includes(self, section: Scope) -> bool {
        self == Scope::All || self == section
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Families produced by one scrape
#[derive(Debug, Default)]
pub struct Collection {
    pub families: Vec<MetricFamily>,
    /// Subset and best-effort listings that were skipped
    pub skipped_subsets: usize,
}

/// Collect FlashArray families for `scope`
///
/// # Errors
/// `UpstreamUnavailable` when a listing a section depends on fails.
#[instrument(skip_all, fields(scope = %scope))]
pub async fn collect_flasharray(
    source: &dyn DataSource,
    scope: Scope,
) -> Result<Collection, ScrapeError> {
    let scope = scope.for_flasharray();
    let inventory = FlashArrayInventory::new(source);
    let mut families = Vec::new();

    if scope.includes(Scope::Array) {
        let array = inventory.array().await?;
        families.push(info::flasharray_info(array));
        families.extend(hardware::flasharray_hardware(inventory.hardware().await?));
        families.push(alerts::flasharray_alerts(inventory.alerts().await?));
        families.extend(space::flasharray_array_space(array));
        families.extend(performance::flasharray_array_performance(array));
        families.push(performance::network_interface_performance(
            inventory.network_interfaces().await?,
        ));
    }

    if scope.includes(Scope::Volumes) {
        let volumes = inventory.volumes().await?.records();
        families.push(topology::volume_info(volumes));
        families.extend(space::volume_space(volumes));
        families.extend(performance::volume_performance(volumes));
    }

    if scope.includes(Scope::Hosts) {
        let hosts = inventory.hosts().await?.records();
        families.extend(space::host_space(hosts));
        families.extend(performance::host_performance(hosts));
    }

    if scope.includes(Scope::Pods) {
        let pods = inventory.pods().await?.records();
        families.extend(pods::pod_status(pods));
        families.extend(space::pod_space(pods));
        families.extend(performance::pod_performance(pods));
    }

    if scope == Scope::All {
        let connections = inventory.host_connections().await?;
        families.push(topology::host_volumes(connections, inventory.volumes().await?));
    }

    let skipped_subsets = inventory.skipped_subsets();
    debug!(families = families.len(), skipped_subsets, "FlashArray collection complete");

    Ok(Collection {
        families,
        skipped_subsets,
    })
}

/// Collect FlashBlade families for `scope`
///
/// # Errors
/// `UpstreamUnavailable` when a listing a section depends on fails.
/// Best-effort listings never fail the scrape.
#[instrument(skip_all, fields(scope = %scope))]
pub async fn collect_flashblade(
    source: &dyn DataSource,
    scope: Scope,
) -> Result<Collection, ScrapeError> {
    let scope = scope.for_flashblade();
    let inventory = FlashBladeInventory::new(source);
    let mut families = Vec::new();

    if scope.includes(Scope::Array) {
        families.push(info::flashblade_info(inventory.array().await?));
        families.push(hardware::flashblade_hardware(inventory.hardware().await?));
        families.push(alerts::flashblade_alerts(inventory.alerts().await?));
        families.extend(performance::flashblade_array_performance(
            inventory.array_performance().await,
        ));
        families.extend(performance::flashblade_specific_performance(
            inventory.specific_performance().await,
        ));
        families.extend(space::flashblade_array_space(inventory.array_space().await?));
        families.extend(space::filesystem_space(inventory.filesystems().await?.records()));
        families.extend(space::bucket_space(inventory.buckets().await?.records()));
        families.extend(performance::filesystem_performance(
            inventory.filesystem_performance().await?,
        ));
        families.extend(performance::bucket_performance(
            inventory.bucket_performance().await,
        ));
        families.push(replication::bucket_replica_links(
            inventory.bucket_replica_links().await?,
        ));
        families.push(replication::filesystem_replica_links(
            inventory.filesystem_replica_links().await?,
        ));
    }

    if scope.includes(Scope::Usage) {
        families.push(usage::user_usage(inventory.user_usage().await?));
        families.push(usage::group_usage(inventory.group_usage().await?));
    }

    if scope.includes(Scope::Clients) {
        families.extend(performance::client_performance(inventory.clients().await?));
    }

    let skipped_subsets = inventory.skipped_subsets();
    debug!(families = families.len(), skipped_subsets, "FlashBlade collection complete");

    Ok(Collection {
        families,
        skipped_subsets,
    })
}
