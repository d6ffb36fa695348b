//! Single-record checks.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::{Diagnostic, LintPolicy, Rule};
use crate::cask::{Checksum, LivecheckUrl, Manifest};

/// Strategy names the package manager's livecheck understands.
pub const LIVECHECK_STRATEGIES: &[&str] = &[
    "apache",
    "bitbucket",
    "cpan",
    "crate",
    "electron_builder",
    "extract_plist",
    "git",
    "github_latest",
    "github_releases",
    "gnome",
    "gnu",
    "hackage",
    "header_match",
    "json",
    "launchpad",
    "npm",
    "page_match",
    "pypi",
    "sourceforge",
    "sparkle",
    "xml",
    "xorg",
    "yaml",
];

const GITHUB_STRATEGIES: &[&str] = &["github_latest", "github_releases"];

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9\-+.@]*$").expect("token pattern is valid"));

static SHA256: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("sha256 pattern is valid"));

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)your[_-]|\btodo\b|\bfixme\b|\bchangeme\b|<[^>]*>|xxxx|\.\.\.")
        .expect("placeholder pattern is valid")
});

/// Placeholder markers that count anywhere in a URL.
static URL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"YOUR_[A-Z0-9_]+|<[^>]*>").expect("url marker pattern is valid")
});

/// Placeholder words that only count as a whole path segment, so
/// `/acme/todo-app/` is a real project and `/TODO/` is not.
static URL_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:todo|fixme|changeme|tbd|x{3,}|\.{3})$")
        .expect("url segment pattern is valid")
});

/// Whether free text still carries an authoring placeholder such as
/// `YOUR_SHA256_HERE`, `<version>` or `TODO`.
pub fn looks_like_placeholder(value: &str) -> bool {
    PLACEHOLDER.is_match(value)
}

/// Whether a host is one of the policy's placeholder hosts or a subdomain of one.
pub fn is_placeholder_host(host: &str, policy: &LintPolicy) -> bool {
    let host = host.to_ascii_lowercase();
    host.starts_with("your-")
        || policy
            .placeholder_hosts
            .iter()
            .any(|p| host == *p || host.ends_with(&format!(".{}", p)))
}

fn cask_line(manifest: &Manifest) -> Option<usize> {
    manifest.line_of("cask")
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

pub(super) fn check_required(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let mut missing = |stanza: &str, absent: bool| {
        if absent {
            out.push(Diagnostic::error(
                Rule::MissingStanza,
                format!("'{}' stanza is missing or empty", stanza),
                manifest.line_of(stanza).or(cask_line(manifest)),
            ));
        }
    };

    missing("version", manifest.version.is_none());
    missing("sha256", manifest.sha256.is_none());
    missing("url", manifest.url.is_none());
    missing(
        "name",
        manifest.names.iter().all(|n| n.trim().is_empty()),
    );
    missing("desc", is_blank(manifest.desc.as_ref()));
    missing("homepage", is_blank(manifest.homepage.as_ref()));

    if manifest.artifacts.is_empty() {
        out.push(Diagnostic::error(
            Rule::MissingStanza,
            "no install action ('app', 'binary' or 'pkg')",
            cask_line(manifest),
        ));
    }
}

pub(super) fn check_token(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    if !TOKEN.is_match(&manifest.token) {
        out.push(Diagnostic::error(
            Rule::TokenFormat,
            format!(
                "token '{}' must be non-empty lower-case letters, digits and '-'",
                manifest.token
            ),
            cask_line(manifest),
        ));
    }
}

/// Lower-case, with spaces and underscores turned into hyphens.
fn normalise_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub(super) fn check_names(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let names: Vec<&String> = manifest.names.iter().filter(|n| !n.trim().is_empty()).collect();
    if names.is_empty() || manifest.token.is_empty() {
        return;
    }

    // `foo@beta` is a variant of `foo`
    let token = manifest.token.split('@').next().unwrap_or(&manifest.token);
    if !names.iter().any(|n| normalise_name(n) == token) {
        out.push(Diagnostic::warning(
            Rule::NameMismatch,
            format!(
                "no display name matches token '{}' (names: {})",
                manifest.token,
                names
                    .iter()
                    .map(|n| format!("\"{}\"", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            manifest.line_of("name"),
        ));
    }
}

pub(super) fn check_version(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let Some(version) = &manifest.version else {
        return;
    };
    if version.is_semver() {
        return;
    }

    let message = if version.is_latest() {
        "version :latest does not identify an immutable artifact".to_string()
    } else {
        format!("version \"{}\" is not a semantic version", version)
    };
    out.push(Diagnostic::error(
        Rule::VersionFormat,
        message,
        manifest.line_of("version"),
    ));
}

pub(super) fn check_sha256(manifest: &Manifest, policy: &LintPolicy, out: &mut Vec<Diagnostic>) {
    let line = manifest.line_of("sha256");
    match &manifest.sha256 {
        None => {}
        Some(Checksum::NoCheck) => {
            let message = "sha256 :no_check disables download verification";
            out.push(if policy.strict {
                Diagnostic::error(Rule::Sha256NoCheck, message, line)
            } else {
                Diagnostic::warning(Rule::Sha256NoCheck, message, line)
            });
        }
        Some(Checksum::Sha256(hash)) => {
            let repeated = hash
                .chars()
                .next()
                .is_some_and(|first| hash.chars().all(|c| c == first));
            if looks_like_placeholder(hash) || repeated {
                out.push(Diagnostic::error(
                    Rule::Sha256Placeholder,
                    format!("sha256 \"{}\" is a placeholder", hash),
                    line,
                ));
            } else if !SHA256.is_match(hash) {
                out.push(Diagnostic::error(
                    Rule::Sha256Format,
                    format!(
                        "sha256 \"{}\" is not 64 lower-case hexadecimal characters",
                        hash
                    ),
                    line,
                ));
            }
        }
    }
}

/// Outcome of validating something that should be an `http(s)` URL.
enum UrlCheck {
    Valid(Url),
    Malformed(String),
    Placeholder(String),
}

fn classify_url(raw: &str, policy: &LintPolicy) -> UrlCheck {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => return UrlCheck::Malformed(e.to_string()),
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return UrlCheck::Malformed(format!("unsupported scheme '{}'", url.scheme()));
    }
    let Some(host) = url.host_str() else {
        return UrlCheck::Malformed("no host".to_string());
    };
    if is_placeholder_host(host, policy) {
        return UrlCheck::Placeholder(format!("placeholder host '{}'", host));
    }
    let segment = url
        .path_segments()
        .is_some_and(|mut segments| segments.any(|s| URL_SEGMENT.is_match(s)));
    if segment || URL_MARKER.is_match(raw) {
        return UrlCheck::Placeholder("placeholder segment".to_string());
    }
    UrlCheck::Valid(url)
}

/// The source location with the version substituted, when both are present.
pub fn resolved_url(manifest: &Manifest) -> Option<String> {
    let template = manifest.url.as_ref()?;
    let version = manifest.version.as_ref()?;
    template.resolve(version).ok()
}

/// Whether `raw` is a well-formed `http(s)` URL with no placeholder parts.
pub fn is_live_url(raw: &str, policy: &LintPolicy) -> bool {
    matches!(classify_url(raw, policy), UrlCheck::Valid(_))
}

pub(super) fn check_url(manifest: &Manifest, policy: &LintPolicy, out: &mut Vec<Diagnostic>) {
    let Some(template) = &manifest.url else {
        return;
    };
    let line = manifest.line_of("url");

    let resolved = match &manifest.version {
        Some(version) => match template.resolve(version) {
            Ok(resolved) => resolved,
            Err(e) => {
                out.push(Diagnostic::error(Rule::UrlTemplate, format!("url: {}", e), line));
                return;
            }
        },
        // still check literal urls; templated ones need a version
        None if !template.is_templated() => template.as_str().to_string(),
        None => return,
    };

    match classify_url(&resolved, policy) {
        UrlCheck::Valid(url) => {
            if url.scheme() == "http" {
                out.push(Diagnostic::warning(
                    Rule::UrlInsecure,
                    format!("url {} is not served over https", resolved),
                    line,
                ));
            }
        }
        UrlCheck::Malformed(reason) => out.push(Diagnostic::error(
            Rule::UrlFormat,
            format!("url {} is not a well-formed URL: {}", resolved, reason),
            line,
        )),
        UrlCheck::Placeholder(reason) => out.push(Diagnostic::error(
            Rule::UrlPlaceholder,
            format!("url {} has a {}", resolved, reason),
            line,
        )),
    }
}

pub(super) fn check_homepage(manifest: &Manifest, policy: &LintPolicy, out: &mut Vec<Diagnostic>) {
    let Some(homepage) = manifest.homepage.as_ref().filter(|h| !h.trim().is_empty()) else {
        return;
    };

    let problem = match classify_url(homepage, policy) {
        UrlCheck::Valid(_) => return,
        UrlCheck::Malformed(reason) => format!("is not a well-formed URL: {}", reason),
        UrlCheck::Placeholder(reason) => format!("has a {}", reason),
    };
    out.push(Diagnostic::error(
        Rule::HomepageFormat,
        format!("homepage {} {}", homepage, problem),
        manifest.line_of("homepage"),
    ));
}

pub(super) fn check_livecheck(manifest: &Manifest, policy: &LintPolicy, out: &mut Vec<Diagnostic>) {
    let Some(livecheck) = &manifest.livecheck else {
        return;
    };
    let line = manifest.line_of("livecheck");

    // What the strategy will actually look at.
    let reference = match &livecheck.url {
        None => None,
        Some(LivecheckUrl::Url) => {
            if manifest.url.is_none() {
                out.push(Diagnostic::error(
                    Rule::LivecheckUrl,
                    "livecheck url :url refers to a missing 'url' stanza",
                    line,
                ));
            }
            resolved_url(manifest)
        }
        Some(LivecheckUrl::Homepage) => {
            if is_blank(manifest.homepage.as_ref()) {
                out.push(Diagnostic::error(
                    Rule::LivecheckUrl,
                    "livecheck url :homepage refers to a missing 'homepage' stanza",
                    line,
                ));
            }
            manifest.homepage.clone()
        }
        Some(LivecheckUrl::Literal(raw)) => match classify_url(raw, policy) {
            UrlCheck::Valid(_) => Some(raw.clone()),
            UrlCheck::Malformed(reason) => {
                out.push(Diagnostic::error(
                    Rule::LivecheckUrl,
                    format!("livecheck url {} is not a well-formed URL: {}", raw, reason),
                    line,
                ));
                None
            }
            UrlCheck::Placeholder(reason) => {
                out.push(Diagnostic::error(
                    Rule::LivecheckUrl,
                    format!("livecheck url {} has a {}", raw, reason),
                    line,
                ));
                None
            }
        },
    };

    let Some(strategy) = &livecheck.strategy else {
        return;
    };
    if !LIVECHECK_STRATEGIES.contains(&strategy.as_str()) {
        out.push(Diagnostic::error(
            Rule::LivecheckStrategy,
            format!("unknown livecheck strategy :{}", strategy),
            line,
        ));
        return;
    }

    if GITHUB_STRATEGIES.contains(&strategy.as_str())
        && let Some(reference) = reference
    {
        let on_github = Url::parse(&reference)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case("github.com")))
            .unwrap_or(false);
        if !on_github {
            out.push(Diagnostic::warning(
                Rule::LivecheckGithubMismatch,
                format!(
                    "strategy :{} needs a github.com reference, but livecheck url {} points to {}",
                    strategy,
                    livecheck
                        .url
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    reference
                ),
                line,
            ));
        }
    }
}

pub(super) fn check_desc(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let Some(desc) = manifest.desc.as_ref().filter(|d| !d.trim().is_empty()) else {
        return;
    };
    let line = manifest.line_of("desc");
    let lower = desc.to_lowercase();

    if ["a ", "an ", "the "].iter().any(|article| lower.starts_with(article)) {
        out.push(Diagnostic::warning(
            Rule::DescFormat,
            "desc should not start with an article",
            line,
        ));
    }
    if manifest
        .names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .any(|n| lower.starts_with(&n.to_lowercase()))
    {
        out.push(Diagnostic::warning(
            Rule::DescFormat,
            "desc should not start with the display name",
            line,
        ));
    }
    if desc.trim_end().ends_with('.') {
        out.push(Diagnostic::warning(
            Rule::DescFormat,
            "desc should not end with a period",
            line,
        ));
    }
}

pub(super) fn check_cleanup_paths(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    for directive in manifest.cleanup_paths() {
        for path in &directive.paths {
            let trimmed = path.trim_end_matches('/');
            let problem = if trimmed.is_empty() || trimmed == "~" {
                Some("would remove an entire root or home directory")
            } else if !(path.starts_with('/') || path.starts_with("~/")) {
                Some("must be absolute or start with '~/'")
            } else {
                None
            };

            if let Some(problem) = problem {
                out.push(Diagnostic::warning(
                    Rule::ZapPath,
                    format!("{} path \"{}\" {}", directive.kind.as_str(), path, problem),
                    Some(directive.line),
                ));
            }
        }
    }
}

pub(super) fn check_unknown_stanzas(manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    for stanza in &manifest.unknown_stanzas {
        out.push(Diagnostic::warning(
            Rule::UnknownStanza,
            format!("unknown stanza '{}'", stanza.name),
            Some(stanza.line),
        ));
    }
}
