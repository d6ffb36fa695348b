//! Lint rules for cask records
//!
//! A [`Linter`] checks one [`Manifest`] at a time and returns
//! [`Diagnostic`]s. Checks that need several records (variants of the same
//! token) live in [`consistency`], and [`report`] collects the results for
//! a whole run.

pub mod consistency;
pub mod report;
mod rules;

use serde::Serialize;

use crate::cask::Manifest;

pub use consistency::check_variants;
pub use report::{FileReport, Report};
pub use rules::{
    LIVECHECK_STRATEGIES, is_live_url, is_placeholder_host, looks_like_placeholder, resolved_url,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Identifies which check produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    MissingStanza,
    TokenFormat,
    NameMismatch,
    VersionFormat,
    Sha256Format,
    Sha256Placeholder,
    Sha256NoCheck,
    UrlTemplate,
    UrlFormat,
    UrlPlaceholder,
    UrlInsecure,
    HomepageFormat,
    LivecheckUrl,
    LivecheckStrategy,
    LivecheckGithubMismatch,
    DescFormat,
    ZapPath,
    UnknownStanza,
    VariantNameMismatch,
    VariantLivecheckDivergence,
    VariantChecksumDivergence,
    UrlUnreachable,
    HomepageUnreachable,
}

impl Rule {
    pub fn id(&self) -> &'static str {
        match self {
            Rule::MissingStanza => "missing-stanza",
            Rule::TokenFormat => "token-format",
            Rule::NameMismatch => "name-mismatch",
            Rule::VersionFormat => "version-format",
            Rule::Sha256Format => "sha256-format",
            Rule::Sha256Placeholder => "sha256-placeholder",
            Rule::Sha256NoCheck => "sha256-no-check",
            Rule::UrlTemplate => "url-template",
            Rule::UrlFormat => "url-format",
            Rule::UrlPlaceholder => "url-placeholder",
            Rule::UrlInsecure => "url-insecure",
            Rule::HomepageFormat => "homepage-format",
            Rule::LivecheckUrl => "livecheck-url",
            Rule::LivecheckStrategy => "livecheck-strategy",
            Rule::LivecheckGithubMismatch => "livecheck-github-mismatch",
            Rule::DescFormat => "desc-format",
            Rule::ZapPath => "zap-path",
            Rule::UnknownStanza => "unknown-stanza",
            Rule::VariantNameMismatch => "variant-name-mismatch",
            Rule::VariantLivecheckDivergence => "variant-livecheck-divergence",
            Rule::VariantChecksumDivergence => "variant-checksum-divergence",
            Rule::UrlUnreachable => "url-unreachable",
            Rule::HomepageUnreachable => "homepage-unreachable",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: Rule,
    pub severity: Severity,
    pub message: String,
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn error(rule: Rule, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            rule,
            severity: Severity::Error,
            message: message.into(),
            line,
        }
    }

    pub fn warning(rule: Rule, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            rule,
            severity: Severity::Warning,
            message: message.into(),
            line,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Hosts that only ever appear in unfinished drafts.
pub const DEFAULT_PLACEHOLDER_HOSTS: &[&str] = &[
    "your-server.com",
    "your-domain.com",
    "your-site.com",
    "example.com",
    "example.org",
    "example.net",
    "localhost",
    "127.0.0.1",
];

/// Knobs that change how strictly records are judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintPolicy {
    /// Treat `sha256 :no_check` as an error instead of a warning.
    pub strict: bool,
    pub placeholder_hosts: Vec<String>,
}

impl Default for LintPolicy {
    fn default() -> Self {
        Self {
            strict: false,
            placeholder_hosts: DEFAULT_PLACEHOLDER_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl LintPolicy {
    /// Add hosts to the placeholder list, ignoring blanks and duplicates.
    pub fn with_placeholder_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for host in hosts {
            let host = host.as_ref().trim().to_ascii_lowercase();
            if !host.is_empty() && !self.placeholder_hosts.contains(&host) {
                self.placeholder_hosts.push(host);
            }
        }
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Runs every single-record rule against a manifest.
#[derive(Debug, Clone, Default)]
pub struct Linter {
    policy: LintPolicy,
}

impl Linter {
    pub fn new(policy: LintPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LintPolicy {
        &self.policy
    }

    /// Check one record. Diagnostics come back sorted by line.
    pub fn lint(&self, manifest: &Manifest) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        rules::check_required(manifest, &mut diagnostics);
        rules::check_token(manifest, &mut diagnostics);
        rules::check_names(manifest, &mut diagnostics);
        rules::check_version(manifest, &mut diagnostics);
        rules::check_sha256(manifest, &self.policy, &mut diagnostics);
        rules::check_url(manifest, &self.policy, &mut diagnostics);
        rules::check_homepage(manifest, &self.policy, &mut diagnostics);
        rules::check_livecheck(manifest, &self.policy, &mut diagnostics);
        rules::check_desc(manifest, &mut diagnostics);
        rules::check_cleanup_paths(manifest, &mut diagnostics);
        rules::check_unknown_stanzas(manifest, &mut diagnostics);

        // stable: keeps rule order for diagnostics on the same line
        diagnostics.sort_by_key(|d| d.line.unwrap_or(0));
        diagnostics
    }
}

/// Whether a set of diagnostics allows publishing the record.
pub fn is_publishable(diagnostics: &[Diagnostic]) -> bool {
    !diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cask::parse;

    const PUBLISHED: &str = r#"cask "claudecode-cola" do
  version "1.0.0"
  sha256 "3e80a32fbce4b9ce3969f6cd3a946b71fd673cbd90a04c5fb4b2547d1ea8d345"

  url "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v#{version}/ClaudeCode-Cola-#{version}.dmg"
  name "ClaudeCode-Cola"
  desc "Monitor Claude Code sessions and TodoWrite tasks"
  homepage "https://github.com/HayaKus/ClaudeCode-Cola"

  livecheck do
    url :url
    strategy :github_latest
  end

  app "ClaudeCode-Cola.app"

  zap trash: [
    "~/.claudecode-cola",
  ]
end
"#;

    const DRAFT: &str = r#"cask "claudecode-cola" do
  version "1.0.0"
  sha256 "YOUR_SHA256_HERE"

  url "https://your-server.com/ClaudeCode-Cola-#{version}.dmg"
  name "ClaudeCode-Cola"
  desc "Monitor Claude Code sessions and TodoWrite tasks"
  homepage "https://code.alibaba-inc.com/haya.lhw/ClaudeCode-Cola"

  livecheck do
    url :homepage
    strategy :github_latest
  end

  app "ClaudeCode-Cola.app"

  zap trash: [
    "~/.claudecode-cola",
  ]
end
"#;

    fn rules_of(diagnostics: &[Diagnostic]) -> Vec<Rule> {
        diagnostics.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn test_published_record_is_clean() {
        let manifest = parse(PUBLISHED).unwrap();
        let diagnostics = Linter::default().lint(&manifest);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert!(is_publishable(&diagnostics));
    }

    #[test]
    fn test_draft_record_is_not_publishable() {
        let manifest = parse(DRAFT).unwrap();
        let diagnostics = Linter::default().lint(&manifest);

        assert!(!is_publishable(&diagnostics));
        assert_eq!(
            rules_of(&diagnostics),
            vec![
                Rule::Sha256Placeholder,
                Rule::UrlPlaceholder,
                Rule::LivecheckGithubMismatch,
            ]
        );
        assert_eq!(diagnostics[0].line, Some(3));
        assert_eq!(diagnostics[1].line, Some(5));
        assert!(diagnostics[1].message.contains("your-server.com"));
        assert_eq!(diagnostics[2].severity, Severity::Warning);
    }

    #[test]
    fn test_no_check_is_warning_by_default() {
        let manifest = parse(&PUBLISHED.replace(
            "sha256 \"3e80a32fbce4b9ce3969f6cd3a946b71fd673cbd90a04c5fb4b2547d1ea8d345\"",
            "sha256 :no_check",
        ))
        .unwrap();

        let diagnostics = Linter::default().lint(&manifest);
        assert_eq!(rules_of(&diagnostics), vec![Rule::Sha256NoCheck]);
        assert!(is_publishable(&diagnostics));

        let strict = Linter::new(LintPolicy::default().strict(true)).lint(&manifest);
        assert_eq!(strict[0].severity, Severity::Error);
        assert!(!is_publishable(&strict));
    }

    #[test]
    fn test_custom_placeholder_host() {
        let manifest = parse(PUBLISHED).unwrap();
        let policy = LintPolicy::default().with_placeholder_hosts(["GitHub.com", " "]);
        let diagnostics = Linter::new(policy).lint(&manifest);

        assert!(rules_of(&diagnostics).contains(&Rule::UrlPlaceholder));
        assert!(rules_of(&diagnostics).contains(&Rule::HomepageFormat));
    }

    #[test]
    fn test_with_placeholder_hosts_deduplicates() {
        let policy = LintPolicy::default().with_placeholder_hosts(["example.com", "draft.test"]);
        assert_eq!(
            policy.placeholder_hosts.len(),
            DEFAULT_PLACEHOLDER_HOSTS.len() + 1
        );
    }

    #[test]
    fn test_rule_ids_are_kebab_case() {
        assert_eq!(Rule::Sha256NoCheck.id(), "sha256-no-check");
        assert_eq!(
            serde_json::to_string(&Rule::LivecheckGithubMismatch).unwrap(),
            "\"livecheck-github-mismatch\""
        );
        assert_eq!(format!("{}", Rule::UrlPlaceholder), "url-placeholder");
    }
}
