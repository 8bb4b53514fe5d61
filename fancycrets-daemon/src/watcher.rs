//! Polling event source.
//!
//! Each namespace is listed on a fixed interval and compared with the previous
//! listing: new names become `Create`, a changed `resourceVersion` becomes
//! `Update` with a field-level diff, and vanished names become `Delete`.
//! The first listing therefore emits `Create` for every existing secret, which
//! reconciles annotated secrets once at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc};

use fancycrets_core::{ApiError, DiffOp, DiffRecord, MemorySecretApi, Secret};
use fancycrets_reconcile::Event;

use crate::error::DaemonError;

/// Listing capability the watcher needs on top of [`fancycrets_core::SecretApi`].
pub trait SecretLister: Send + Sync {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ApiError>;
}

impl SecretLister for MemorySecretApi {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ApiError> {
        Ok(self.list(namespace))
    }
}

/// Objects (`namespace`, `name`) whose last reconcile failed and must be re-emitted.
pub type RequeueSet = Arc<Mutex<BTreeSet<(String, String)>>>;

/// Last observed state of one namespace, keyed by secret name.
pub type Snapshot = BTreeMap<String, Secret>;

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Field-level changes between two versions of a secret.
///
/// One record per changed section (`metadata.annotations`, `metadata.labels`,
/// `data`); each side holds only the keys that were removed/changed or
/// added/changed, so untouched annotations never appear.
pub fn diff_secrets(old: &Secret, new: &Secret) -> Vec<DiffRecord> {
    let sections: [(&[&str], &BTreeMap<String, String>, &BTreeMap<String, String>); 3] = [
        (
            &["metadata", "annotations"],
            &old.metadata.annotations,
            &new.metadata.annotations,
        ),
        (&["metadata", "labels"], &old.metadata.labels, &new.metadata.labels),
        (&["data"], &old.data, &new.data),
    ];
    sections
        .into_iter()
        .filter_map(|(path, before, after)| map_diff(path, before, after))
        .collect()
}

fn map_diff(
    path: &[&str],
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
) -> Option<DiffRecord> {
    let mut removed = Map::new();
    let mut added = Map::new();
    for (key, value) in before {
        if after.get(key) != Some(value) {
            removed.insert(key.clone(), Value::String(value.clone()));
        }
    }
    for (key, value) in after {
        if before.get(key) != Some(value) {
            added.insert(key.clone(), Value::String(value.clone()));
        }
    }
    if removed.is_empty() && added.is_empty() {
        return None;
    }
    let op = if before.is_empty() {
        DiffOp::Add
    } else if after.is_empty() {
        DiffOp::Remove
    } else {
        DiffOp::Change
    };
    Some(DiffRecord::new(
        op,
        path,
        Some(Value::Object(removed)),
        Some(Value::Object(added)),
    ))
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Fold a fresh listing into `snapshot`, returning the implied events.
pub fn observe(snapshot: &mut Snapshot, listed: Vec<Secret>) -> Vec<Event> {
    let mut events = Vec::new();
    let mut seen = BTreeSet::new();

    for secret in listed {
        let name = secret.name().to_owned();
        seen.insert(name.clone());
        match snapshot.get(&name) {
            None => events.push(Event::Create {
                spec: Value::Null,
                name: name.clone(),
                namespace: secret.namespace().to_owned(),
                body: secret.clone(),
            }),
            Some(previous) if is_modified(previous, &secret) => events.push(Event::Update {
                spec: Value::Null,
                old: previous.clone(),
                new: secret.clone(),
                diff: diff_secrets(previous, &secret),
                body: secret.clone(),
            }),
            Some(_) => {}
        }
        snapshot.insert(name, secret);
    }

    let gone: Vec<String> = snapshot
        .keys()
        .filter(|name| !seen.contains(*name))
        .cloned()
        .collect();
    for name in gone {
        if let Some(body) = snapshot.remove(&name) {
            events.push(Event::Delete {
                spec: Value::Null,
                body,
            });
        }
    }
    events
}

fn is_modified(previous: &Secret, current: &Secret) -> bool {
    match (
        &previous.metadata.resource_version,
        &current.metadata.resource_version,
    ) {
        (Some(a), Some(b)) => a != b,
        _ => previous != current,
    }
}

/// Drop requeued objects of `namespace` from `snapshot` so the next listing
/// re-emits them as `Create`.
pub fn apply_requeues(snapshot: &mut Snapshot, namespace: &str, requeue: &RequeueSet) {
    let Ok(mut pending) = requeue.lock() else {
        return;
    };
    pending.retain(|(ns, name)| {
        if ns != namespace {
            return true;
        }
        tracing::debug!(namespace = %ns, secret = %name, "requeueing after failure");
        snapshot.remove(name);
        false
    });
}

// ---------------------------------------------------------------------------
// Poll task
// ---------------------------------------------------------------------------

pub(crate) async fn poll_namespace(
    lister: Arc<dyn SecretLister>,
    namespace: String,
    interval: Duration,
    requeue: RequeueSet,
    events_tx: mpsc::Sender<Event>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut snapshot = Snapshot::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                apply_requeues(&mut snapshot, &namespace, &requeue);

                let listed = {
                    let lister = lister.clone();
                    let namespace = namespace.clone();
                    tokio::task::spawn_blocking(move || lister.list_secrets(&namespace)).await?
                };
                let listed = match listed {
                    Ok(listed) => listed,
                    Err(err) => {
                        tracing::warn!(namespace = %namespace, error = %err, "listing secrets failed");
                        continue;
                    }
                };

                for event in observe(&mut snapshot, listed) {
                    events_tx
                        .send(event)
                        .await
                        .map_err(|_| DaemonError::ChannelClosed("events"))?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fancycrets_core::SecretData;
    use serde_json::json;

    fn secret(name: &str, rv: &str) -> Secret {
        let mut s = Secret::new(name, "default", SecretData::new());
        s.metadata.resource_version = Some(rv.to_string());
        s
    }

    #[test]
    fn unchanged_sections_produce_no_records() {
        let a = secret("app", "1").with_annotation("x", "y");
        assert!(diff_secrets(&a, &a).is_empty());
    }

    #[test]
    fn annotation_diff_lists_only_changed_keys() {
        let old = secret("app", "1")
            .with_annotation("fancycrets.secretSource.a", "db")
            .with_annotation("owner", "team-a");
        let new = secret("app", "2")
            .with_annotation("fancycrets.secretSource.a", "db")
            .with_annotation("owner", "team-b");
        let diff = diff_secrets(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].op, DiffOp::Change);
        assert_eq!(diff[0].path, vec!["metadata", "annotations"]);
        assert_eq!(diff[0].removed, Some(json!({ "owner": "team-a" })));
        assert_eq!(diff[0].added, Some(json!({ "owner": "team-b" })));
    }

    #[test]
    fn first_annotation_is_an_add() {
        let old = secret("app", "1");
        let new = secret("app", "2").with_annotation("fancycrets.secretSource.a", "db");
        let diff = diff_secrets(&old, &new);
        assert_eq!(diff[0].op, DiffOp::Add);
    }

    #[test]
    fn data_changes_are_reported_under_data() {
        let old = secret("app", "1");
        let mut new = secret("app", "2");
        new.data.insert("conn".into(), "eA==".into());
        let diff = diff_secrets(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, vec!["data"]);
    }

    #[test]
    fn observe_emits_create_update_delete() {
        let mut snapshot = Snapshot::new();

        let events = observe(&mut snapshot, vec![secret("a", "1"), secret("b", "1")]);
        assert_eq!(
            events.iter().map(Event::kind).collect::<Vec<_>>(),
            ["create", "create"]
        );

        let events = observe(&mut snapshot, vec![secret("a", "1"), secret("b", "2")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "update");

        let events = observe(&mut snapshot, vec![secret("b", "2")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "delete");
        assert_eq!(events[0].object_ref(), "default/a");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn requeued_object_is_recreated() {
        let mut snapshot = Snapshot::new();
        observe(&mut snapshot, vec![secret("a", "1")]);

        let requeue: RequeueSet = Arc::default();
        requeue
            .lock()
            .expect("lock")
            .insert(("default".to_string(), "a".to_string()));
        requeue
            .lock()
            .expect("lock")
            .insert(("other".to_string(), "a".to_string()));
        apply_requeues(&mut snapshot, "default", &requeue);

        let events = observe(&mut snapshot, vec![secret("a", "1")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "create");
        assert_eq!(requeue.lock().expect("lock").len(), 1, "other namespace untouched");
    }
}
