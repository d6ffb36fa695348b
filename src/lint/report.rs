//! Results of an audit run and their text/JSON rendering.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use super::{Diagnostic, Severity};

/// Results for one cask file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Absent when the file did not parse.
    pub token: Option<String>,
    pub parse_error: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn parsed(path: PathBuf, token: String, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            path,
            token: Some(token),
            parse_error: None,
            diagnostics,
        }
    }

    pub fn unparsable(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            token: None,
            parse_error: Some(error.to_string()),
            diagnostics: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
            + usize::from(self.parse_error.is_some())
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn is_publishable(&self) -> bool {
        self.error_count() == 0
    }
}

/// Results for a whole run, in the order files were checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    publishable: bool,
    errors: usize,
    warnings: usize,
    files: &'a [FileReport],
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.files.iter().map(FileReport::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(FileReport::warning_count).sum()
    }

    /// True when every file parsed and none has an error diagnostic.
    pub fn is_publishable(&self) -> bool {
        self.files.iter().all(FileReport::is_publishable)
    }

    /// One line per finding, `path:line: severity[rule]: message`, then a summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for file in &self.files {
            let path = file.path.display();
            if let Some(error) = &file.parse_error {
                let _ = writeln!(out, "{}: error[parse]: {}", path, error);
                continue;
            }
            if file.diagnostics.is_empty() {
                let _ = writeln!(
                    out,
                    "{}: {} ok",
                    path,
                    file.token.as_deref().unwrap_or_default()
                );
                continue;
            }
            for d in &file.diagnostics {
                let location = match d.line {
                    Some(line) => format!("{}:{}", path, line),
                    None => path.to_string(),
                };
                let _ = writeln!(
                    out,
                    "{}: {}[{}]: {}",
                    location, d.severity, d.rule, d.message
                );
            }
        }

        let _ = writeln!(
            out,
            "\n{} {} checked: {} {}, {} {}{}",
            self.files.len(),
            plural(self.files.len(), "file", "files"),
            self.error_count(),
            plural(self.error_count(), "error", "errors"),
            self.warning_count(),
            plural(self.warning_count(), "warning", "warnings"),
            if self.is_publishable() {
                ""
            } else {
                " (not publishable)"
            }
        );
        out
    }

    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            publishable: self.is_publishable(),
            errors: self.error_count(),
            warnings: self.warning_count(),
            files: &self.files,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
