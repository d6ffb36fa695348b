//! Cask version strings.
//!
//! The package manager treats a version as an opaque string with a few
//! derived forms (`version.major`, `version.no_dots`, ...) that URL
//! templates may interpolate.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
    )
    .expect("semver pattern is valid")
});

/// A version string as written in the `version` stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(raw: impl Into<String>) -> Self {
        Version(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `version :latest`
    pub fn is_latest(&self) -> bool {
        self.0 == "latest"
    }

    /// Check for `MAJOR.MINOR.PATCH` with optional pre-release and build metadata.
    pub fn is_semver(&self) -> bool {
        SEMVER.is_match(&self.0)
    }

    fn part(&self, index: usize) -> &str {
        self.core().split('.').nth(index).unwrap_or("")
    }

    /// The dotted numeric core, without pre-release or build suffixes.
    fn core(&self) -> &str {
        self.0
            .split(['-', '+', ','])
            .next()
            .unwrap_or(&self.0)
    }

    pub fn major(&self) -> &str {
        self.part(0)
    }

    pub fn minor(&self) -> &str {
        self.part(1)
    }

    pub fn patch(&self) -> &str {
        self.part(2)
    }

    pub fn major_minor(&self) -> String {
        self.join_parts(2)
    }

    pub fn major_minor_patch(&self) -> String {
        self.join_parts(3)
    }

    fn join_parts(&self, count: usize) -> String {
        self.core()
            .split('.')
            .take(count)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn no_dots(&self) -> String {
        self.0.replace('.', "")
    }

    pub fn dots_to_underscores(&self) -> String {
        self.0.replace('.', "_")
    }

    pub fn dots_to_hyphens(&self) -> String {
        self.0.replace('.', "-")
    }

    /// Evaluate a `version.<method>` call as used inside `#{...}`.
    ///
    /// Returns `None` for methods the package manager would need a Ruby
    /// runtime to evaluate.
    pub fn call(&self, method: &str) -> Option<String> {
        let value = match method {
            "major" => self.major().to_string(),
            "minor" => self.minor().to_string(),
            "patch" => self.patch().to_string(),
            "major_minor" => self.major_minor(),
            "major_minor_patch" => self.major_minor_patch(),
            "no_dots" => self.no_dots(),
            "dots_to_underscores" => self.dots_to_underscores(),
            "dots_to_hyphens" => self.dots_to_hyphens(),
            "to_s" => self.0.clone(),
            _ => return None,
        };
        Some(value)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Version::new(s)
    }
}
