//! Developer-maintained ignore patterns.
//!
//! An ignore pattern drops an error when its message regex matches the
//! error message and, if it has one, its path regex matches the rendered
//! path. Any matching pattern is enough to drop an error.

use crate::validate::ValidationError;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building ignore patterns.
#[derive(Debug, Error)]
pub enum IgnorePatternError {
    /// A pattern is not a valid regular expression.
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        /// The pattern text.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The pattern list is not valid JSON.
    #[error("invalid ignore pattern list: {0}")]
    Json(#[from] serde_json::Error),
}

/// The serialized form of an ignore pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnorePatternSpec {
    /// Regex matched against the error message.
    pub message_pattern: String,
    /// Optional regex matched against the rendered error path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    /// Why this pattern exists.
    #[serde(default)]
    pub description: String,
}

fn compile(pattern: &str) -> Result<Regex, IgnorePatternError> {
    Regex::new(pattern).map_err(|source| IgnorePatternError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// A compiled ignore pattern.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    message: Regex,
    path: Option<Regex>,
    description: String,
}

impl IgnorePattern {
    /// Compiles an ignore pattern.
    pub fn new(
        message_pattern: &str,
        path_pattern: Option<&str>,
        description: impl Into<String>,
    ) -> Result<Self, IgnorePatternError> {
        Ok(Self {
            message: compile(message_pattern)?,
            path: path_pattern.map(compile).transpose()?,
            description: description.into(),
        })
    }

    /// Compiles an ignore pattern from its serialized form.
    pub fn from_spec(spec: &IgnorePatternSpec) -> Result<Self, IgnorePatternError> {
        Self::new(
            &spec.message_pattern,
            spec.path_pattern.as_deref(),
            spec.description.clone(),
        )
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns true if this pattern matches the error.
    pub fn matches(&self, error: &ValidationError) -> bool {
        if !self.message.is_match(&error.message) {
            return false;
        }
        match &self.path {
            Some(path) => path.is_match(&error.path.to_string()),
            None => true,
        }
    }
}

/// An ordered set of ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a filter from serialized patterns.
    pub fn from_specs(specs: &[IgnorePatternSpec]) -> Result<Self, IgnorePatternError> {
        let patterns = specs
            .iter()
            .map(IgnorePattern::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Compiles a filter from a JSON array of pattern specs.
    pub fn from_json(json: &str) -> Result<Self, IgnorePatternError> {
        let specs: Vec<IgnorePatternSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    /// Appends a pattern.
    pub fn add(&mut self, pattern: IgnorePattern) {
        self.patterns.push(pattern);
    }

    /// Returns the number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the first pattern that matches the error.
    pub fn first_match(&self, error: &ValidationError) -> Option<&IgnorePattern> {
        self.patterns.iter().find(|pattern| pattern.matches(error))
    }

    /// Returns true if any pattern matches the error.
    pub fn is_ignored(&self, error: &ValidationError) -> bool {
        self.first_match(error).is_some()
    }

    /// Removes every error matched by a pattern.
    pub fn apply(&self, errors: Vec<ValidationError>) -> Vec<ValidationError> {
        errors
            .into_iter()
            .filter(|error| match self.first_match(error) {
                Some(pattern) => {
                    debug!(
                        "Ignoring '{}' at {} ({})",
                        error.message,
                        error.path,
                        pattern.description()
                    );
                    false
                }
                None => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::JsonPath;
    use crate::validate::ErrorCode;

    fn error(message: &str, path: &str) -> ValidationError {
        ValidationError::new(ErrorCode::schema("required"), message, path.parse().unwrap())
    }

    #[test]
    fn message_and_path_must_both_match() {
        let pattern = IgnorePattern::new("install_type", Some(r"flavors\[\d+\]"), "legacy").unwrap();
        let message = "must have required property 'install_type'";

        assert!(pattern.matches(&error(message, ".products[0].flavors[0]")));
        assert!(!pattern.matches(&error(message, ".products[0]")));
        assert!(!pattern.matches(&error("something else", ".products[0].flavors[0]")));
    }

    #[test]
    fn pattern_without_path_matches_any_path() {
        let pattern = IgnorePattern::new("^Duplicate", None, "").unwrap();
        assert!(pattern.matches(&error("Duplicate thing", "$")));
        assert!(pattern.matches(&error("Duplicate thing", "$.a[3].b")));
    }

    #[test]
    fn filter_uses_or_across_patterns() {
        let filter = IgnoreFilter::from_specs(&[
            IgnorePatternSpec {
                message_pattern: "alpha".to_string(),
                path_pattern: Some("never".to_string()),
                description: "first".to_string(),
            },
            IgnorePatternSpec {
                message_pattern: "beta".to_string(),
                path_pattern: None,
                description: "second".to_string(),
            },
        ])
        .unwrap();

        let errors = vec![error("alpha", "$"), error("beta", "$"), error("gamma", "$")];
        let kept: Vec<String> = filter.apply(errors).into_iter().map(|e| e.message).collect();
        assert_eq!(kept, vec!["alpha", "gamma"]);
    }

    #[test]
    fn first_match_is_in_registration_order() {
        let mut filter = IgnoreFilter::new();
        filter.add(IgnorePattern::new("a", None, "one").unwrap());
        filter.add(IgnorePattern::new("ab", None, "two").unwrap());
        let matched = filter.first_match(&error("ab", "$")).unwrap();
        assert_eq!(matched.description(), "one");
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn from_json_camel_case() {
        let filter = IgnoreFilter::from_json(
            r#"[{"messagePattern": "x", "pathPattern": "^\\$\\.a", "description": "d"},
                {"messagePattern": "y"}]"#,
        )
        .unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.is_ignored(&error("x", "$.a")));
        assert!(!filter.is_ignored(&error("x", "$.b")));
        assert!(filter.is_ignored(&error("y", "$.b")));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = IgnorePattern::new("(unclosed", None, "").unwrap_err();
        assert!(matches!(err, IgnorePatternError::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
        assert!(IgnoreFilter::from_json("{}").is_err());
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = IgnoreFilter::new();
        assert!(filter.is_empty());
        let errors = vec![error("a", "$"), error("b", JsonPath::root().key("x").to_string().as_str())];
        assert_eq!(filter.apply(errors).len(), 2);
    }
}
