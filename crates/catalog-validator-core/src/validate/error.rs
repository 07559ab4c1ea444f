//! Error types for catalog validation.
//!
//! Every diagnostic, whatever produced it, has the same shape: a stable
//! code, a message, the logical path it concerns, an optional source range
//! and an optional severity.

use crate::path::JsonPath;
use crate::position::{Position, Range};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// The severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A suggestion.
    Hint,
    /// Informational, e.g. reduced validation coverage.
    Information,
    /// Something that works but should be changed.
    Warning,
    /// A problem that makes the document invalid.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hint => "hint",
            Severity::Information => "information",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// The broad class an error code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The text is not valid JSON.
    Syntax,
    /// The value does not satisfy the schema.
    SchemaViolation,
    /// Duplicate keys and similar structural problems.
    StructuralViolation,
    /// Deprecated or discouraged field combinations.
    BusinessRuleViolation,
    /// A rule implementation failed.
    RuleExecutionFault,
    /// No usable schema was available.
    SchemaUnavailable,
}

/// A stable, machine-readable error code such as `DUPLICATE_OBJECT_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(Cow<'static, str>);

impl ErrorCode {
    /// The document is not valid JSON.
    pub const SYNTAX_ERROR: ErrorCode = ErrorCode(Cow::Borrowed("SYNTAX_ERROR"));
    /// An object has the same key more than once.
    pub const DUPLICATE_OBJECT_KEY: ErrorCode = ErrorCode(Cow::Borrowed("DUPLICATE_OBJECT_KEY"));
    /// Two configuration entries of one flavor share a key.
    pub const DUPLICATE_CONFIG_KEY: ErrorCode = ErrorCode(Cow::Borrowed("DUPLICATE_CONFIG_KEY"));
    /// Two input mappings of one dependency share a target.
    pub const DUPLICATE_INPUT_MAPPING: ErrorCode =
        ErrorCode(Cow::Borrowed("DUPLICATE_INPUT_MAPPING"));
    /// A flavor uses `dependency_version_2` with an extension install type.
    pub const DEPRECATED_DEPENDENCY_VERSION_2: ErrorCode =
        ErrorCode(Cow::Borrowed("DEPRECATED_DEPENDENCY_VERSION_2"));
    /// A rule failed while running.
    pub const RULE_EXECUTION_FAULT: ErrorCode = ErrorCode(Cow::Borrowed("RULE_EXECUTION_FAULT"));
    /// Schema validation was skipped.
    pub const SCHEMA_UNAVAILABLE: ErrorCode = ErrorCode(Cow::Borrowed("SCHEMA_UNAVAILABLE"));

    /// Creates a code from arbitrary text.
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    /// Creates the code for a schema keyword, e.g. `minItems` becomes
    /// `SCHEMA_MIN_ITEMS`.
    pub fn schema(keyword: &str) -> Self {
        let mut code = String::from("SCHEMA_");
        let mut previous_lower = false;
        for ch in keyword.chars() {
            if ch.is_uppercase() && previous_lower {
                code.push('_');
            }
            if ch.is_alphanumeric() {
                code.extend(ch.to_uppercase());
            } else if !code.ends_with('_') {
                code.push('_');
            }
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
        Self(Cow::Owned(code))
    }

    /// Returns the code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the category of this code.
    pub fn category(&self) -> ErrorCategory {
        match self.as_str() {
            "SYNTAX_ERROR" => ErrorCategory::Syntax,
            "SCHEMA_UNAVAILABLE" => ErrorCategory::SchemaUnavailable,
            "RULE_EXECUTION_FAULT" => ErrorCategory::RuleExecutionFault,
            code if code.starts_with("SCHEMA_") => ErrorCategory::SchemaViolation,
            code if code.starts_with("DEPRECATED_") => ErrorCategory::BusinessRuleViolation,
            _ => ErrorCategory::StructuralViolation,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|code| Self(Cow::Owned(code)))
    }
}

/// Returns the English ordinal of `n`: 1st, 2nd, 3rd, 4th, 11th, 21st...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn join_indices(indices: &[usize]) -> String {
    let list: Vec<String> = indices.iter().map(usize::to_string).collect();
    match indices.len() {
        1 => format!("index {}", list.join(", ")),
        _ => format!("indices {}", list.join(", ")),
    }
}

/// A validation error found in a catalog document.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human readable description.
    pub message: String,
    /// The logical path the error concerns.
    pub path: JsonPath,
    /// Source range, when one could be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    /// Severity, when the producer set one. Unset means error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl ValidationError {
    /// Creates an error without range or severity.
    pub fn new(code: ErrorCode, message: impl Into<String>, path: JsonPath) -> Self {
        Self {
            code,
            message: message.into(),
            path,
            range: None,
            severity: None,
        }
    }

    /// Sets the source range.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Creates a syntax error for text that does not parse.
    pub fn syntax_error(description: impl fmt::Display, range: Range) -> Self {
        Self::new(
            ErrorCode::SYNTAX_ERROR,
            format!("Invalid JSON: {}", description),
            JsonPath::root(),
        )
        .with_range(range)
        .with_severity(Severity::Error)
    }

    /// Creates a duplicate object key error for one occurrence.
    ///
    /// `occurrence` is 1-based; `others` lists the other occurrences as
    /// `(occurrence, position of the key)`.
    pub fn duplicate_object_key(
        path: JsonPath,
        key: &str,
        occurrence: usize,
        others: &[(usize, Position)],
        range: Range,
    ) -> Self {
        let others: Vec<String> = others
            .iter()
            .map(|(n, position)| format!("{} at {}", ordinal(*n), position))
            .collect();
        let message = format!(
            "Duplicate object key \"{}\" ({} occurrence); other occurrences: {}",
            key,
            ordinal(occurrence),
            others.join(", ")
        );
        Self::new(ErrorCode::DUPLICATE_OBJECT_KEY, message, path)
            .with_range(range)
            .with_severity(Severity::Error)
    }

    /// Creates a duplicate configuration key error for the item at `index`.
    pub fn duplicate_config_key(
        path: JsonPath,
        value: &str,
        index: usize,
        others: &[usize],
        range: Range,
    ) -> Self {
        let message = format!(
            "Duplicate configuration key \"{}\" at index {}; also used at {}",
            value,
            index,
            join_indices(others)
        );
        Self::new(ErrorCode::DUPLICATE_CONFIG_KEY, message, path)
            .with_range(range)
            .with_severity(Severity::Error)
    }

    /// Creates a duplicate input mapping error for the item at `index`.
    pub fn duplicate_input_mapping(
        path: JsonPath,
        field: &str,
        value: &str,
        index: usize,
        others: &[usize],
        range: Range,
    ) -> Self {
        let message = format!(
            "Duplicate input mapping {} \"{}\" at index {}; also mapped at {}",
            field,
            value,
            index,
            join_indices(others)
        );
        Self::new(ErrorCode::DUPLICATE_INPUT_MAPPING, message, path)
            .with_range(range)
            .with_severity(Severity::Error)
    }

    /// Creates the deprecation warning for `dependency_version_2` on an
    /// extension flavor.
    pub fn deprecated_dependency_version_2(path: JsonPath, range: Range) -> Self {
        Self::new(
            ErrorCode::DEPRECATED_DEPENDENCY_VERSION_2,
            "\"dependency_version_2\" is deprecated for flavors with install_type \"extension\"",
            path,
        )
        .with_range(range)
        .with_severity(Severity::Warning)
    }

    /// Creates an error describing a rule that failed to run.
    pub fn rule_execution_fault(rule_id: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::RULE_EXECUTION_FAULT,
            format!("Rule '{}' failed: {}", rule_id, reason),
            JsonPath::root(),
        )
        .with_severity(Severity::Error)
    }

    /// Creates a schema violation error.
    pub fn schema_violation(
        keyword: &str,
        message: impl Into<String>,
        path: JsonPath,
        range: Range,
    ) -> Self {
        Self::new(ErrorCode::schema(keyword), message, path).with_range(range)
    }

    /// Creates the advisory emitted when schema validation is skipped.
    pub fn schema_unavailable(reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SCHEMA_UNAVAILABLE,
            format!(
                "Schema validation skipped ({}); only structural rules were applied",
                reason
            ),
            JsonPath::root(),
        )
        .with_severity(Severity::Information)
    }

    /// Returns the severity, treating an unset severity as an error.
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Error)
    }

    /// Returns the category of this error's code.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the 1-based line where this error starts, if positioned.
    pub fn line(&self) -> Option<usize> {
        self.range.map(|range| range.start.line + 1)
    }
}

/// The result of validating a catalog document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// All validation errors found.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Creates a new empty validation result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validation result with the given errors.
    pub fn with_errors(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Returns true if validation reported nothing at all.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any issue has `Error` severity.
    pub fn has_errors(&self) -> bool {
        self.errors_only().next().is_some()
    }

    /// Returns only errors (not warnings or advisories).
    pub fn errors_only(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.effective_severity() == Severity::Error)
    }

    /// Returns only warnings.
    pub fn warnings_only(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.effective_severity() == Severity::Warning)
    }

    /// Returns the highest severity present, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.errors.iter().map(ValidationError::effective_severity).max()
    }

    /// Returns true if any error has the given code.
    pub fn contains_code(&self, code: &ErrorCode) -> bool {
        self.errors.iter().any(|e| &e.code == code)
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Merges another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::with_errors(errors)
    }
}
