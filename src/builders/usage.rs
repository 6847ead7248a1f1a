//! Per-user and per-group file system usage
//!
//! Each usage record yields a `quota` and a `usage` sample. No quota
//! configured reads as zero.

use crate::collector::Record;
use crate::exposition::MetricFamily;
use crate::mapping::FB_USAGE;

use super::NullPolicy;

/// A missing quota means none is set; a null usage reads as zero
fn policy(field: &str) -> NullPolicy {
    if field == "quota" {
        NullPolicy::ZeroFill
    } else {
        NullPolicy::ZeroIfNull
    }
}

fn usage_family(
    name: &'static str,
    help: &'static str,
    keys: &[&'static str],
    subject: &str,
    records: &[Record],
) -> MetricFamily {
    let mut family = MetricFamily::gauge(name, help, keys);
    let name_field = format!("{}.name", subject);
    let id_field = format!("{}.id", subject);

    for record in records {
        let entity = [
            record.label("file_system.name"),
            record.label(&name_field),
            record.label(&id_field),
        ];
        for (field, dimension) in FB_USAGE.iter() {
            if let Some(value) = policy(field).resolve(record.get(field)) {
                let mut labels = entity.to_vec();
                labels.push(dimension.to_string());
                family.push(labels, value);
            }
        }
    }
    family
}

/// `purefb_filesystem_user_usage_bytes{name,user_name,uid,dimension}`
pub fn user_usage(records: &[Record]) -> MetricFamily {
    usage_family(
        "purefb_filesystem_user_usage_bytes",
        "FlashBlade filesystem users usage",
        &["name", "user_name", "uid", "dimension"],
        "user",
        records,
    )
}

/// `purefb_filesystem_group_usage_bytes{name,group_name,gid,dimension}`
pub fn group_usage(records: &[Record]) -> MetricFamily {
    usage_family(
        "purefb_filesystem_group_usage_bytes",
        "FlashBlade filesystem groups usage",
        &["name", "group_name", "gid", "dimension"],
        "group",
        records,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FieldValue;

    #[test]
    fn test_user_usage_with_missing_quota() {
        let records = vec![Record::new()
            .with("file_system.name", "home")
            .with("user.name", "alice")
            .with("user.id", 1001.0)
            .with("quota", FieldValue::Null)
            .with("usage", 52428800.0)];
        let family = user_usage(&records);

        assert_eq!(family.value(&["home", "alice", "1001", "quota"]), Some(0.0));
        assert_eq!(family.value(&["home", "alice", "1001", "usage"]), Some(52428800.0));
    }

    #[test]
    fn test_group_usage_labels() {
        let records = vec![Record::new()
            .with("file_system.name", "proj")
            .with("group.name", "eng")
            .with("group.id", 500.0)
            .with("quota", 1e9)
            .with("usage", 2e8)];
        let family = group_usage(&records);

        assert_eq!(family.label_keys(), &["name", "group_name", "gid", "dimension"]);
        assert_eq!(family.value(&["proj", "eng", "500", "quota"]), Some(1e9));
    }

    #[test]
    fn test_absent_quota_and_usage() {
        let records = vec![Record::new()
            .with("file_system.name", "scratch")
            .with("user.name", "bob")
            .with("user.id", 1002.0)];
        let family = user_usage(&records);

        // no quota is zero, an unreported usage is no sample
        assert_eq!(family.len(), 1);
        assert_eq!(family.value(&["scratch", "bob", "1002", "quota"]), Some(0.0));
    }
}
