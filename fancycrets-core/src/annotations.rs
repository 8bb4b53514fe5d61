//! Annotation parsing: the `fancycrets.*` wire contract on watched secrets.
//!
//! | Annotation key                        | Value            |
//! |---------------------------------------|------------------|
//! | `fancycrets.secretSource.<id>`        | source secret    |
//! | `fancycrets.secretFormat.<targetKey>` | template string  |
//!
//! Annotations are scanned in lexicographic order of the full key, so with
//! several sources `fancycrets.secretSource.a` is fetched before
//! `fancycrets.secretSource.b` and `b` wins on colliding keys.

use std::collections::BTreeMap;

use crate::types::{CompositionSpec, SourceRef};

/// Prefix the update gate matches on; no trailing dot, so any `fancycrets*` key counts.
pub const GATE_PREFIX: &str = "fancycrets";
pub const DIRECTIVE_PREFIX: &str = "fancycrets.";
pub const SOURCE_PREFIX: &str = "fancycrets.secretSource.";
pub const FORMAT_PREFIX: &str = "fancycrets.secretFormat.";

/// Build a [`CompositionSpec`] from an annotation map.
///
/// Unknown `fancycrets.` suffixes and unrelated keys are ignored; this never fails.
pub fn parse(annotations: &BTreeMap<String, String>) -> CompositionSpec {
    let mut spec = CompositionSpec::default();
    for (key, value) in annotations {
        if !key.starts_with(DIRECTIVE_PREFIX) {
            continue;
        }
        if key.starts_with(SOURCE_PREFIX) {
            tracing::debug!(annotation = %key, source = %value, "found secretSource");
            spec.sources.push(SourceRef::from(value.as_str()));
        } else if let Some(target) = key.strip_prefix(FORMAT_PREFIX) {
            tracing::debug!(annotation = %key, target = %target, "found secretFormat");
            spec.formats.insert(target.to_owned(), value.clone());
        }
    }
    spec
}

/// Whether any annotation is a `fancycrets.` directive.
pub fn has_directives(annotations: &BTreeMap<String, String>) -> bool {
    annotations.keys().any(|k| k.starts_with(DIRECTIVE_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn empty_annotations_give_empty_spec() {
        let spec = parse(&BTreeMap::new());
        assert!(spec.is_empty());
    }

    #[test]
    fn sources_follow_lexicographic_key_order() {
        let spec = parse(&annotations(&[
            ("fancycrets.secretSource.b", "second"),
            ("fancycrets.secretSource.a", "first"),
            ("fancycrets.secretSource.c", "third"),
        ]));
        let names: Vec<_> = spec.sources.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn format_target_is_the_key_suffix() {
        let spec = parse(&annotations(&[(
            "fancycrets.secretFormat.DATABASE_URL",
            "postgres://{user}:{pass}@db",
        )]));
        assert_eq!(
            spec.formats.get("DATABASE_URL").map(String::as_str),
            Some("postgres://{user}:{pass}@db")
        );
    }

    #[test]
    fn unknown_directives_and_foreign_keys_are_ignored() {
        let spec = parse(&annotations(&[
            ("fancycrets.somethingElse", "x"),
            ("fancycretsX.secretSource.a", "nope"),
            ("kubectl.kubernetes.io/last-applied-configuration", "{}"),
        ]));
        assert!(spec.is_empty());
    }

    #[test]
    fn duplicate_source_names_are_kept() {
        let spec = parse(&annotations(&[
            ("fancycrets.secretSource.1", "db"),
            ("fancycrets.secretSource.2", "db"),
        ]));
        assert_eq!(spec.sources.len(), 2);
    }

    #[test]
    fn has_directives_requires_dotted_prefix() {
        assert!(has_directives(&annotations(&[("fancycrets.secretSource.a", "db")])));
        assert!(!has_directives(&annotations(&[("fancycretsish", "db")])));
        assert!(!has_directives(&BTreeMap::new()));
    }
}
