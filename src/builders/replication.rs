//! Replica link lag
//!
//! One sample per link with the lag as reported. Links that report no lag
//! yet (null) have nothing to show and are left out.

use crate::collector::Record;
use crate::exposition::MetricFamily;

use super::{labels_from, NullPolicy};

fn lag_family(
    name: &'static str,
    help: &'static str,
    keys: &[&'static str],
    fields: &[&str],
    links: &[Record],
) -> MetricFamily {
    let mut family = MetricFamily::gauge(name, help, keys);
    for link in links {
        if let Some(lag) = NullPolicy::Skip.resolve(link.get("lag")) {
            family.push(labels_from(link, fields), lag);
        }
    }
    family
}

/// `purefb_bucket_replica_links_lag_msec`
pub fn bucket_replica_links(links: &[Record]) -> MetricFamily {
    lag_family(
        "purefb_bucket_replica_links_lag_msec",
        "FlashBlade bucket replica links lag",
        &["name", "direction", "remote_name", "remote_bucket_name", "remote_account", "status"],
        &[
            "local_bucket.name",
            "direction",
            "remote.name",
            "remote_bucket.name",
            "remote_credentials.name",
            "status",
        ],
        links,
    )
}

/// `purefb_bucket_filesystems_links_lag_msec`
pub fn filesystem_replica_links(links: &[Record]) -> MetricFamily {
    lag_family(
        "purefb_bucket_filesystems_links_lag_msec",
        "FlashBlade filesystem links lag",
        &["name", "direction", "remote_name", "remote_filesystem_name", "status"],
        &[
            "local_file_system.name",
            "direction",
            "remote.name",
            "remote_file_system.name",
            "status",
        ],
        links,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FieldValue;

    #[test]
    fn test_bucket_link_labels() {
        let links = vec![Record::new()
            .with("local_bucket.name", "logs")
            .with("direction", "outbound")
            .with("remote.name", "fb-dr")
            .with("remote_bucket.name", "logs-dr")
            .with("remote_credentials.name", "acct/key")
            .with("status", "replicating")
            .with("lag", 3500.0)];
        let family = bucket_replica_links(&links);

        assert_eq!(
            family.value(&["logs", "outbound", "fb-dr", "logs-dr", "acct/key", "replicating"]),
            Some(3500.0)
        );
    }

    #[test]
    fn test_links_without_lag_are_skipped() {
        let links = vec![
            Record::new().with("local_file_system.name", "fs1").with("lag", FieldValue::Null),
            Record::new().with("local_file_system.name", "fs2").with("lag", 10.0),
        ];
        let family = filesystem_replica_links(&links);

        assert_eq!(family.len(), 1);
        assert_eq!(family.value(&["fs2", "", "", "", ""]), Some(10.0));
    }
}
