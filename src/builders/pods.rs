//! Pod replication status
//!
//! A pod lists the arrays it is stretched across under `arrays`; after
//! flattening each member reads as `arrays.<i>.<field>`.

use crate::collector::{Field, Record};
use crate::exposition::MetricFamily;

/// Reported while a member has no resync progress to show
const PROGRESS_UNKNOWN: f64 = 101.0;

const ONLINE: &str = "online";

fn online(record: &Record, key: &str) -> f64 {
    if record.get(key).as_text() == Some(ONLINE) {
        1.0
    } else {
        0.0
    }
}

/// Pod status, mediator status and resync progress, labeled
/// `{pod,array_id,array_name}`
pub fn pod_status(pods: &[Record]) -> Vec<MetricFamily> {
    let keys = ["pod", "array_id", "array_name"];
    let mut status = MetricFamily::gauge("purefa_pod_status", "FlashArray pod status", &keys);
    let mut mediator = MetricFamily::gauge(
        "purefa_pod_mediator_status",
        "FlashArray pod mediator status",
        &keys,
    );
    let mut progress = MetricFamily::gauge(
        "purefa_pod_progress_percent",
        "FlashArray pod synchronization status percentage",
        &keys,
    );

    for pod in pods {
        let Some(pod_name) = pod.name() else {
            continue;
        };

        for i in 0.. {
            let prefix = format!("arrays.{}", i);
            let id_key = format!("{}.array_id", prefix);
            let name_key = format!("{}.name", prefix);
            if pod.get(&id_key).is_absent() && pod.get(&name_key).is_absent() {
                break;
            }

            let labels = [pod_name.to_string(), pod.label(&id_key), pod.label(&name_key)];
            status.push(labels.clone(), online(pod, &format!("{}.status", prefix)));
            mediator.push(labels.clone(), online(pod, &format!("{}.mediator_status", prefix)));

            match pod.get(&format!("{}.progress", prefix)) {
                Field::Absent => {}
                Field::Number(p) => progress.push(labels, p),
                Field::Null | Field::Text(_) => progress.push(labels, PROGRESS_UNKNOWN),
            }
        }
    }

    vec![status, mediator, progress]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stretched_pod() {
        let pod = Record::from_json(&json!({
            "name": "pod1",
            "arrays": [
                {"array_id": "a-1", "name": "fa1", "status": "online", "mediator_status": "online", "progress": null},
                {"array_id": "a-2", "name": "fa2", "status": "resyncing", "mediator_status": "unreachable", "progress": 42}
            ]
        }))
        .unwrap();
        let families = pod_status(&[pod]);
        let (status, mediator, progress) = (&families[0], &families[1], &families[2]);

        assert_eq!(status.value(&["pod1", "a-1", "fa1"]), Some(1.0));
        assert_eq!(status.value(&["pod1", "a-2", "fa2"]), Some(0.0));
        assert_eq!(mediator.value(&["pod1", "a-2", "fa2"]), Some(0.0));
        assert_eq!(progress.value(&["pod1", "a-1", "fa1"]), Some(101.0));
        assert_eq!(progress.value(&["pod1", "a-2", "fa2"]), Some(42.0));
    }

    #[test]
    fn test_progress_only_when_reported() {
        let pod = Record::from_json(&json!({
            "name": "local",
            "arrays": [{"array_id": "a-1", "name": "fa1", "status": "online", "mediator_status": "online"}]
        }))
        .unwrap();
        let families = pod_status(&[pod]);

        assert_eq!(families[0].len(), 1);
        assert!(families[2].is_empty());
    }
}
