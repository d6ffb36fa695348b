use serde::Serialize;
use std::collections::BTreeMap;

use super::template::UrlTemplate;
use super::version::Version;

/// A parsed cask record.
///
/// Every field the package manager requires is optional here so that
/// incomplete drafts still parse; the linter reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    pub token: String,
    pub version: Option<Version>,
    pub sha256: Option<Checksum>,
    pub url: Option<UrlTemplate>,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub homepage: Option<String>,
    pub livecheck: Option<Livecheck>,
    pub artifacts: Vec<Artifact>,
    pub uninstall: Vec<CleanupDirective>,
    pub zap: Vec<CleanupDirective>,
    /// Stanzas the parser does not model, in source order.
    pub unknown_stanzas: Vec<UnknownStanza>,
    /// First source line of each stanza, keyed by stanza name.
    #[serde(skip)]
    pub lines: BTreeMap<String, usize>,
}

impl Manifest {
    /// Line of the first occurrence of a stanza, if it was present.
    pub fn line_of(&self, stanza: &str) -> Option<usize> {
        self.lines.get(stanza).copied()
    }

    /// Every cleanup path declared by `zap` and `uninstall`, in source order.
    pub fn cleanup_paths(&self) -> impl Iterator<Item = &CleanupDirective> {
        self.uninstall.iter().chain(self.zap.iter())
    }
}

/// The integrity value of the distributable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checksum {
    Sha256(String),
    /// `sha256 :no_check`: verification disabled.
    NoCheck,
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Checksum::Sha256(hash) => write!(f, "{}", hash),
            Checksum::NoCheck => write!(f, ":no_check"),
        }
    }
}

/// Update-check policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Livecheck {
    pub url: Option<LivecheckUrl>,
    pub strategy: Option<String>,
}

/// The reference a livecheck block points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LivecheckUrl {
    /// `url :url`: reuse the cask's source location.
    Url,
    /// `url :homepage`: reuse the cask's homepage.
    Homepage,
    Literal(String),
}

impl std::fmt::Display for LivecheckUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LivecheckUrl::Url => write!(f, ":url"),
            LivecheckUrl::Homepage => write!(f, ":homepage"),
            LivecheckUrl::Literal(url) => write!(f, "{}", url),
        }
    }
}

/// An install action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    /// An application bundle moved into the applications directory.
    App { source: String, target: Option<String> },
    /// A command-line binary linked into the prefix.
    Binary { source: String, target: Option<String> },
    /// An installer package.
    Pkg { source: String },
}

impl Artifact {
    pub fn source(&self) -> &str {
        match self {
            Artifact::App { source, .. }
            | Artifact::Binary { source, .. }
            | Artifact::Pkg { source } => source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::App { .. } => "app",
            Artifact::Binary { .. } => "binary",
            Artifact::Pkg { .. } => "pkg",
        }
    }
}

/// How a cleanup path is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupKind {
    Trash,
    Delete,
    Rmdir,
}

impl CleanupKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "trash" => Some(CleanupKind::Trash),
            "delete" => Some(CleanupKind::Delete),
            "rmdir" => Some(CleanupKind::Rmdir),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupKind::Trash => "trash",
            CleanupKind::Delete => "delete",
            CleanupKind::Rmdir => "rmdir",
        }
    }
}

/// One `trash:`/`delete:`/`rmdir:` entry of a `zap` or `uninstall` stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupDirective {
    pub kind: CleanupKind,
    pub paths: Vec<String>,
    #[serde(skip)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownStanza {
    pub name: String,
    pub line: usize,
}
