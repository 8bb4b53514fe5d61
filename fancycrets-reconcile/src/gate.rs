//! Update-event gate.
//!
//! Composition patches only ever touch `data`, never `metadata.annotations`.
//! Triggering solely on `fancycrets*` annotation changes therefore means the
//! update event produced by our own patch is always skipped, and a secret
//! cannot reconcile itself in a loop.
//!
//! Annotation keys touched by a record depend on how deep its path reaches:
//!
//! | path                                   | touched keys                               |
//! |----------------------------------------|--------------------------------------------|
//! | `["metadata"]`                         | keys of `removed.annotations`, `added.annotations` |
//! | `["metadata", "annotations"]`          | keys of `removed`, `added`                 |
//! | `["metadata", "annotations", k, ...]`  | `k`                                        |
//! | anything else                          | none                                       |

use serde_json::Value;

use fancycrets_core::annotations::GATE_PREFIX;
use fancycrets_core::DiffRecord;

/// Whether an update event should run composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Trigger,
    Skip,
}

impl GateDecision {
    pub fn is_trigger(self) -> bool {
        self == GateDecision::Trigger
    }
}

/// Evaluate an update diff.
pub fn evaluate(diff: &[DiffRecord]) -> GateDecision {
    for record in diff {
        let touched = touched_annotations(record);
        if let Some(key) = touched.iter().find(|k| k.starts_with(GATE_PREFIX)) {
            tracing::debug!(annotation = %key, op = ?record.op, "fancycrets annotation changed");
            return GateDecision::Trigger;
        }
        tracing::trace!(path = ?record.path, "diff record does not touch fancycrets annotations");
    }
    GateDecision::Skip
}

/// Annotation keys a single diff record adds, removes or changes.
pub fn touched_annotations(record: &DiffRecord) -> Vec<String> {
    let mut path = record.path.iter().map(String::as_str);
    if path.next() != Some("metadata") {
        return Vec::new();
    }
    match path.next() {
        None => [&record.removed, &record.added]
            .into_iter()
            .flat_map(|side| map_keys(side.as_ref().and_then(|v| v.get("annotations"))))
            .collect(),
        Some("annotations") => match path.next() {
            Some(key) => vec![key.to_owned()],
            None => [&record.removed, &record.added]
                .into_iter()
                .flat_map(|side| map_keys(side.as_ref()))
                .collect(),
        },
        Some(_) => Vec::new(),
    }
}

fn map_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fancycrets_core::DiffOp;
    use serde_json::json;

    fn record(path: &[&str], removed: Option<Value>, added: Option<Value>) -> DiffRecord {
        DiffRecord::new(DiffOp::Change, path, removed, added)
    }

    #[test]
    fn empty_diff_skips() {
        assert_eq!(evaluate(&[]), GateDecision::Skip);
    }

    #[test]
    fn metadata_level_record_reads_nested_annotations() {
        let rec = record(
            &["metadata"],
            Some(json!({})),
            Some(json!({ "annotations": { "fancycrets.secretFormat.conn": "{a}" } })),
        );
        assert_eq!(touched_annotations(&rec), vec!["fancycrets.secretFormat.conn"]);
    }

    #[test]
    fn removed_side_counts_too() {
        let rec = record(
            &["metadata", "annotations"],
            Some(json!({ "fancycrets.secretSource.a": "db" })),
            None,
        );
        assert!(evaluate(&[rec]).is_trigger());
    }

    #[test]
    fn non_object_sides_are_ignored() {
        let rec = record(&["metadata", "annotations"], Some(json!("text")), Some(json!(3)));
        assert!(touched_annotations(&rec).is_empty());
    }

    #[test]
    fn any_triggering_record_wins() {
        let diff = vec![
            record(&["data"], Some(json!({ "a": "b" })), Some(json!({ "a": "c" }))),
            record(&["metadata", "annotations", "fancycrets.secretSource.x"], None, Some(json!("db"))),
        ];
        assert!(evaluate(&diff).is_trigger());
    }
}
