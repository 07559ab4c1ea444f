//! Merging, deduplication and severity mapping of errors from all sources.

use super::ignore::IgnoreFilter;
use crate::path::JsonPath;
use crate::validate::{Severity, ValidationError};
use log::debug;
use std::collections::HashMap;

/// Removes errors with the same message and path.
///
/// The first occurrence keeps its place in the list. A later duplicate that
/// carries an explicit severity replaces an earlier one without; otherwise
/// the first occurrence wins.
pub fn deduplicate(errors: Vec<ValidationError>) -> Vec<ValidationError> {
    let mut seen: HashMap<(String, JsonPath), usize> = HashMap::new();
    let mut kept: Vec<ValidationError> = Vec::with_capacity(errors.len());

    for error in errors {
        let key = (error.message.clone(), error.path.clone());
        match seen.get(&key) {
            Some(&index) => {
                if kept[index].severity.is_none() && error.severity.is_some() {
                    kept[index] = error;
                }
            }
            None => {
                seen.insert(key, kept.len());
                kept.push(error);
            }
        }
    }
    kept
}

/// Gives every error without a severity the `Error` severity.
pub fn map_severities(errors: Vec<ValidationError>) -> Vec<ValidationError> {
    errors
        .into_iter()
        .map(|mut error| {
            error.severity.get_or_insert(Severity::Error);
            error
        })
        .collect()
}

/// Deduplicates, maps severities and drops ignored errors.
pub fn filter_and_deduplicate(
    errors: Vec<ValidationError>,
    ignore: &IgnoreFilter,
) -> Vec<ValidationError> {
    let total = errors.len();
    let unique = map_severities(deduplicate(errors));
    let unique_count = unique.len();
    let kept = ignore.apply(unique);
    debug!(
        "Aggregated {} errors: {} unique, {} after ignore patterns",
        total,
        unique_count,
        kept.len()
    );
    kept
}
