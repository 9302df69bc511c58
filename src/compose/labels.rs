//! `KEY=value` list normalization shared by labels and environment

use crate::ordered_map::OrderedMap;

/// Parse labels from array format
///
/// `["key1=value1", "key2=value2"]` becomes `{key1: "value1", key2: "value2"}`.
/// Only the first `=` separates key and value; an entry without one maps to
/// an empty value. Later duplicates overwrite earlier ones.
pub fn parse_labels_array<S: AsRef<str>>(entries: &[S]) -> OrderedMap {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry.to_string(), String::new()),
            }
        })
        .collect()
}

/// Parse environment variables from array format
pub fn parse_env_array<S: AsRef<str>>(entries: &[S]) -> OrderedMap {
    parse_labels_array(entries)
}
