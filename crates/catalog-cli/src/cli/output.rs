//! Output formatting for the CLI.
//!
//! This module provides human-readable and JSON output formatters for validation results.

use catalog_validator_core::validate::{
    ErrorSummary, Severity, ValidationError, ValidationResult, generate_error_summary,
};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

/// JSON output format.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    /// The validated file.
    pub file: String,
    /// Number of issues with error severity.
    pub errors: usize,
    /// Number of issues with warning severity.
    pub warnings: usize,
    /// All reported issues.
    pub issues: Vec<JsonIssue>,
    /// Grouped issues with suggested ignore patterns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ErrorSummary>,
}

impl JsonOutput {
    /// Writes the JSON output to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

/// A single issue in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonIssue {
    /// Stable error code.
    pub code: String,
    /// 1-based line number, when the issue has a position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column number, when the issue has a position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Logical path of the offending element.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Severity of the issue.
    pub severity: Severity,
}

impl From<&ValidationError> for JsonIssue {
    fn from(error: &ValidationError) -> Self {
        let start = error.range.map(|range| range.start);
        Self {
            code: error.code.to_string(),
            line: start.map(|position| position.line + 1),
            column: start.map(|position| position.character + 1),
            path: error.path.to_string(),
            message: error.message.clone(),
            severity: error.effective_severity(),
        }
    }
}

/// Output formatter for human-readable console output.
pub struct HumanOutput<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> HumanOutput<W> {
    /// Creates a new human output formatter.
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    /// Writes a header for the validated file.
    pub fn write_header(&mut self, file: &str) -> std::io::Result<()> {
        let header = format!("==> {}", file);
        if self.use_colors {
            writeln!(self.writer, "\n{}", header.cyan().bold())?;
        } else {
            writeln!(self.writer, "\n{}", header)?;
        }
        Ok(())
    }

    /// Writes a single issue.
    pub fn write_issue(&mut self, file: &str, error: &ValidationError) -> std::io::Result<()> {
        let severity = error.effective_severity();
        let label = match severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Information => "INFO",
            Severity::Hint => "HINT",
        };
        let location = match error.range {
            Some(range) => format!("{}:{}", file, range.start),
            None => file.to_string(),
        };

        if self.use_colors {
            let colored_label = match severity {
                Severity::Error => format!("[{}]", label).red().bold(),
                Severity::Warning => format!("[{}]", label).yellow().bold(),
                Severity::Information => format!("[{}]", label).blue().bold(),
                Severity::Hint => format!("[{}]", label).dimmed(),
            };
            writeln!(
                self.writer,
                "  {} {} {} {}",
                colored_label,
                location,
                error.message,
                format!("({} at {})", error.code, error.path).dimmed()
            )?;
        } else {
            writeln!(
                self.writer,
                "  [{}] {} {} ({} at {})",
                label, location, error.message, error.code, error.path
            )?;
        }

        Ok(())
    }

    /// Writes grouped issues and a suggested ignore pattern for each group.
    pub fn write_error_summary(&mut self, summary: &ErrorSummary) -> std::io::Result<()> {
        if summary.groups.is_empty() {
            return Ok(());
        }

        let title = "Issue summary";
        if self.use_colors {
            writeln!(self.writer, "\n{}", title.cyan().bold())?;
        } else {
            writeln!(self.writer, "\n{}", title)?;
        }

        for group in &summary.groups {
            writeln!(self.writer, "  {:>4} x {} [{}]", group.count, group.pattern, group.code)?;
            let ignore = serde_json::to_string(&group.suggested_ignore)
                .map_err(std::io::Error::other)?;
            writeln!(self.writer, "         ignore: {}", ignore)?;
        }

        Ok(())
    }

    /// Writes a summary of all validation results.
    pub fn write_summary(&mut self, total_errors: usize, total_warnings: usize) -> std::io::Result<()> {
        writeln!(self.writer)?;

        if total_errors == 0 && total_warnings == 0 {
            let message = "✓ Catalog manifest is valid";
            if self.use_colors {
                writeln!(self.writer, "{}", message.green().bold())?;
            } else {
                writeln!(self.writer, "{}", message)?;
            }
        } else {
            let message = format!(
                "✗ Found {} error(s) and {} warning(s)",
                total_errors, total_warnings
            );
            if self.use_colors {
                writeln!(self.writer, "{}", message.red().bold())?;
            } else {
                writeln!(self.writer, "{}", message)?;
            }
        }

        Ok(())
    }

    /// Writes a startup error.
    pub fn write_error(&mut self, message: &str) -> std::io::Result<()> {
        if self.use_colors {
            writeln!(self.writer, "{} {}", "Error:".red().bold(), message)?;
        } else {
            writeln!(self.writer, "Error: {}", message)?;
        }
        Ok(())
    }
}

/// The outcome of validating one file, ready for output.
#[derive(Debug)]
pub struct ValidationReport {
    file: String,
    result: ValidationResult,
    summary: Option<ErrorSummary>,
}

impl ValidationReport {
    /// Creates a report, optionally with an error summary.
    pub fn new(file: impl Into<String>, result: ValidationResult, with_summary: bool) -> Self {
        let summary = with_summary.then(|| generate_error_summary(&result.errors));
        Self {
            file: file.into(),
            result,
            summary,
        }
    }

    /// Returns the total number of errors.
    pub fn total_errors(&self) -> usize {
        self.result.errors_only().count()
    }

    /// Returns the total number of warnings.
    pub fn total_warnings(&self) -> usize {
        self.result.warnings_only().count()
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors() > 0
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.total_warnings() > 0
    }

    /// Writes results in human-readable format.
    pub fn write_human<W: Write>(&self, writer: &mut W, use_colors: bool) -> std::io::Result<()> {
        let mut output = HumanOutput::new(writer, use_colors);

        if !self.result.errors.is_empty() {
            output.write_header(&self.file)?;
            for error in &self.result.errors {
                output.write_issue(&self.file, error)?;
            }
        }
        if let Some(summary) = &self.summary {
            output.write_error_summary(summary)?;
        }

        output.write_summary(self.total_errors(), self.total_warnings())
    }

    /// Writes results in JSON format.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let output = JsonOutput {
            file: self.file.clone(),
            errors: self.total_errors(),
            warnings: self.total_warnings(),
            issues: self.result.errors.iter().map(JsonIssue::from).collect(),
            summary: self.summary.clone(),
        };
        output.write(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_validator_core::path::JsonPath;
    use catalog_validator_core::position::{Position, Range};

    fn test_range() -> Range {
        Range::new(Position::new(2, 4), Position::new(2, 9))
    }

    fn config_path() -> JsonPath {
        "$.products[0].flavors[0].configuration[1].key".parse().unwrap()
    }

    fn warning() -> ValidationError {
        ValidationError::deprecated_dependency_version_2(
            "$.products[0].flavors[0].dependency_version_2".parse().unwrap(),
            test_range(),
        )
    }

    fn error() -> ValidationError {
        ValidationError::duplicate_config_key(config_path(), "region", 1, &[0], test_range())
    }

    fn sample_result() -> ValidationResult {
        ValidationResult::with_errors(vec![
            error(),
            warning(),
            ValidationError::schema_unavailable("no schema configured"),
        ])
    }

    #[test]
    fn test_json_issue_from_error() {
        let issue = JsonIssue::from(&error());

        assert_eq!(issue.code, "DUPLICATE_CONFIG_KEY");
        assert_eq!(issue.line, Some(3));
        assert_eq!(issue.column, Some(5));
        assert_eq!(issue.path, "$.products[0].flavors[0].configuration[1].key");
        assert_eq!(issue.severity, Severity::Error);
    }

    #[test]
    fn test_json_issue_without_range() {
        let issue = JsonIssue::from(&ValidationError::schema_unavailable("none"));
        assert_eq!(issue.line, None);
        assert_eq!(issue.column, None);
        assert_eq!(issue.severity, Severity::Information);
    }

    #[test]
    fn test_json_output_serialize() {
        let report = ValidationReport::new("catalog.json", sample_result(), false);
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["file"], "catalog.json");
        assert_eq!(json["errors"], 1);
        assert_eq!(json["warnings"], 1);
        assert_eq!(json["issues"].as_array().unwrap().len(), 3);
        assert!(json["issues"][2].get("line").is_none());
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn test_json_output_with_summary() {
        let report = ValidationReport::new("catalog.json", sample_result(), true);
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["summary"]["groups"].as_array().unwrap().len(), 3);
        assert!(json["summary"]["groups"][0]["suggestedIgnore"]["messagePattern"].is_string());
    }

    #[test]
    fn test_human_output_no_colors() {
        let mut buf = Vec::new();
        let mut output = HumanOutput::new(&mut buf, false);
        output.write_issue("catalog.json", &warning()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[WARN]"));
        assert!(text.contains("catalog.json:3:5"));
        assert!(text.contains("DEPRECATED_DEPENDENCY_VERSION_2"));
    }

    #[test]
    fn test_human_output_issue_without_range() {
        let mut buf = Vec::new();
        let mut output = HumanOutput::new(&mut buf, false);
        output
            .write_issue("catalog.json", &ValidationError::schema_unavailable("none"))
            .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[INFO] catalog.json Schema validation skipped"));
    }

    #[test]
    fn test_report_totals() {
        let report = ValidationReport::new("catalog.json", sample_result(), false);
        assert_eq!(report.total_errors(), 1);
        assert_eq!(report.total_warnings(), 1);
        assert!(report.has_errors());
        assert!(report.has_warnings());

        let advisory_only = ValidationResult::with_errors(vec![ValidationError::schema_unavailable("none")]);
        let report = ValidationReport::new("catalog.json", advisory_only, false);
        assert!(!report.has_errors());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_human_report_with_summary() {
        let report = ValidationReport::new("catalog.json", sample_result(), true);
        let mut buf = Vec::new();
        report.write_human(&mut buf, false).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("==> catalog.json"));
        assert!(text.contains("Issue summary"));
        assert!(text.contains("messagePattern"));
        assert!(text.contains("1 error(s) and 1 warning(s)"));
    }

    #[test]
    fn test_human_output_summary_valid() {
        let mut buf = Vec::new();
        let mut output = HumanOutput::new(&mut buf, false);
        output.write_summary(0, 0).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("valid"));
    }

    #[test]
    fn test_human_output_summary_with_issues() {
        let mut buf = Vec::new();
        let mut output = HumanOutput::new(&mut buf, false);
        output.write_summary(2, 3).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("2 error(s)"));
        assert!(text.contains("3 warning(s)"));
    }
}
