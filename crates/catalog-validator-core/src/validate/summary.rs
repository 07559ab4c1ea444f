//! Error summaries with suggested ignore patterns.
//!
//! Groups errors whose messages differ only in quoted literals or numbers,
//! and proposes an ignore pattern for each group. This is tooling for
//! people maintaining ignore lists; validation does not depend on it.

use super::ignore::IgnorePatternSpec;
use crate::validate::{ErrorCode, Severity, ValidationError};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Number of example paths kept per group.
const MAX_EXAMPLES: usize = 3;

static LITERALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|'[^']*'|\d+"#).expect("literal regex is valid"));

static INDICES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("index regex is valid"));

/// Replaces quoted literals and digit runs with `*`, keeping the quotes.
pub fn normalize_message(message: &str) -> String {
    LITERALS
        .replace_all(message, |caps: &regex::Captures<'_>| {
            let matched = &caps[0];
            match matched.chars().next() {
                Some(quote @ ('"' | '\'')) => format!("{quote}*{quote}"),
                _ => "*".to_string(),
            }
        })
        .into_owned()
}

/// Replaces every array index in a rendered path with `[*]`.
pub fn normalize_path(path: &str) -> String {
    INDICES.replace_all(path, "[*]").into_owned()
}

fn message_regex(pattern: &str) -> String {
    format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"))
}

fn path_regex(pattern: &str) -> String {
    format!("^{}$", regex::escape(pattern).replace(r"\[\*\]", r"\[\d+\]"))
}

/// Errors sharing one normalized message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorGroup {
    /// The normalized message.
    pub pattern: String,
    /// Code of the first error in the group.
    pub code: ErrorCode,
    /// Highest severity in the group.
    pub severity: Severity,
    /// Number of errors in the group.
    pub count: usize,
    /// The first few rendered paths.
    pub example_paths: Vec<String>,
    /// An ignore pattern that would suppress the whole group.
    pub suggested_ignore: IgnorePatternSpec,
}

/// A grouped view over a list of errors.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    /// Total number of errors summarized.
    pub total: usize,
    /// Groups, largest first.
    pub groups: Vec<ErrorGroup>,
}

struct Accumulator {
    first_seen: usize,
    code: ErrorCode,
    severity: Severity,
    count: usize,
    paths: Vec<String>,
}

/// Groups errors by normalized message and suggests an ignore pattern for
/// each group.
///
/// The suggested message regex is the escaped normalized message, anchored,
/// with every `*` widened to `.*`. A path regex is added only when every path
/// in the group is the same once array indices are generalized.
pub fn generate_error_summary(errors: &[ValidationError]) -> ErrorSummary {
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for (position, error) in errors.iter().enumerate() {
        let pattern = normalize_message(&error.message);
        let severity = error.effective_severity();
        let group = groups.entry(pattern).or_insert_with(|| Accumulator {
            first_seen: position,
            code: error.code.clone(),
            severity,
            count: 0,
            paths: Vec::new(),
        });
        group.count += 1;
        group.severity = group.severity.max(severity);
        group.paths.push(error.path.to_string());
    }

    let mut ordered: Vec<(String, Accumulator)> = groups.into_iter().collect();
    ordered.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));

    let groups = ordered
        .into_iter()
        .map(|(pattern, group)| {
            let mut normalized = group.paths.iter().map(|p| normalize_path(p));
            let first = normalized.next();
            let path_pattern = match first {
                Some(first) if normalized.all(|p| p == first) => Some(path_regex(&first)),
                _ => None,
            };

            let suggested_ignore = IgnorePatternSpec {
                message_pattern: message_regex(&pattern),
                path_pattern,
                description: format!("{} ({} occurrences)", group.code, group.count),
            };

            ErrorGroup {
                pattern,
                code: group.code,
                severity: group.severity,
                count: group.count,
                example_paths: group.paths.into_iter().take(MAX_EXAMPLES).collect(),
                suggested_ignore,
            }
        })
        .collect();

    ErrorSummary {
        total: errors.len(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ignore::{IgnoreFilter, IgnorePattern};

    fn error(message: &str, path: &str) -> ValidationError {
        ValidationError::new(ErrorCode::new("TEST"), message, path.parse().unwrap())
    }

    #[test]
    fn normalization() {
        assert_eq!(
            normalize_message(r#"Duplicate configuration key "a" at index 0; also used at index 12"#),
            r#"Duplicate configuration key "*" at index *; also used at index *"#
        );
        assert_eq!(
            normalize_message("must have required property 'install_type'"),
            "must have required property '*'"
        );
        assert_eq!(normalize_path("$.products[0].flavors[12].name"), "$.products[*].flavors[*].name");
    }

    #[test]
    fn groups_by_normalized_message() {
        let errors = vec![
            error("must have required property 'name'", "$.products[0].flavors[0].name"),
            error("unrelated", "$"),
            error("must have required property 'name'", "$.products[1].flavors[3].name"),
        ];
        let summary = generate_error_summary(&errors);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.groups.len(), 2);
        let group = &summary.groups[0];
        assert_eq!(group.count, 2);
        assert_eq!(group.pattern, "must have required property '*'");
        assert_eq!(group.severity, Severity::Error);
        assert_eq!(group.suggested_ignore.message_pattern, "^must have required property '.*'$");
        assert_eq!(
            group.suggested_ignore.path_pattern.as_deref(),
            Some(r"^\$\.products\[\d+\]\.flavors\[\d+\]\.name$")
        );
        assert_eq!(summary.groups[1].pattern, "unrelated");
    }

    #[test]
    fn mixed_paths_get_no_path_pattern() {
        let errors = vec![error("bad 1", "$.a[0]"), error("bad 2", "$.b[0]")];
        let summary = generate_error_summary(&errors);
        assert_eq!(summary.groups.len(), 1);
        assert!(summary.groups[0].suggested_ignore.path_pattern.is_none());
        assert_eq!(summary.groups[0].suggested_ignore.message_pattern, "^bad .*$");
    }

    #[test]
    fn suggested_pattern_suppresses_its_group() {
        let errors = vec![
            error(r#"Duplicate configuration key "a" at index 0; also used at index 1"#, "$.products[0].flavors[0].configuration[0].key"),
            error(r#"Duplicate configuration key "a" at index 1; also used at index 0"#, "$.products[0].flavors[0].configuration[1].key"),
            error("something else", "$"),
        ];
        let summary = generate_error_summary(&errors);
        let spec = &summary.groups[0].suggested_ignore;

        let filter = IgnoreFilter::from_specs(std::slice::from_ref(spec)).unwrap();
        let kept = filter.apply(errors);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].message, "something else");
        assert!(IgnorePattern::from_spec(spec).is_ok());
    }

    #[test]
    fn tracks_highest_severity() {
        let errors = vec![
            error("x 1", "$").with_severity(Severity::Hint),
            error("x 2", "$").with_severity(Severity::Warning),
        ];
        let summary = generate_error_summary(&errors);
        assert_eq!(summary.groups[0].severity, Severity::Warning);
    }

    #[test]
    fn empty_input() {
        let summary = generate_error_summary(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.groups.is_empty());
    }
}
