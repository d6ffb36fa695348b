//! Cask manifest parsing
//!
//! This module reads the declarative cask DSL into a [`Manifest`],
//! and provides the version and URL-template helpers the linter needs
//! to reason about a record without a Ruby runtime.

mod lexer;
mod model;
mod parser;
mod template;
mod version;

pub use lexer::{Token, TokenKind, tokenize};
pub use model::{
    Artifact, Checksum, CleanupDirective, CleanupKind, Livecheck, LivecheckUrl, Manifest,
    UnknownStanza,
};
pub use parser::parse;
pub use template::{TemplateError, UrlTemplate};
pub use version::Version;

/// Errors raised while reading cask source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnterminatedString {
        line: usize,
    },
    /// A `<<~ID` / `<<-ID` heredoc whose terminator line never appears.
    UnterminatedHeredoc {
        terminator: String,
        line: usize,
    },
    UnexpectedChar {
        ch: char,
        line: usize,
    },
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: usize,
    },
    UnexpectedEof {
        expected: &'static str,
    },
    DuplicateStanza {
        name: String,
        line: usize,
        first: usize,
    },
    InvalidArgument {
        stanza: String,
        reason: String,
        line: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnterminatedString { line }
            | ParseError::UnterminatedHeredoc { line, .. }
            | ParseError::UnexpectedChar { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::DuplicateStanza { line, .. }
            | ParseError::InvalidArgument { line, .. } => Some(*line),
            ParseError::UnexpectedEof { .. } => None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnterminatedString { line } => {
                write!(f, "line {}: unterminated string literal", line)
            }
            ParseError::UnterminatedHeredoc { terminator, line } => write!(
                f,
                "line {}: heredoc is never closed by a '{}' line",
                line, terminator
            ),
            ParseError::UnexpectedChar { ch, line } => {
                write!(f, "line {}: unexpected character '{}'", line, ch)
            }
            ParseError::UnexpectedToken {
                expected,
                found,
                line,
            } => write!(f, "line {}: expected {}, found {}", line, expected, found),
            ParseError::UnexpectedEof { expected } => {
                write!(f, "unexpected end of file, expected {}", expected)
            }
            ParseError::DuplicateStanza { name, line, first } => write!(
                f,
                "line {}: '{}' stanza repeated (first defined on line {})",
                line, name, first
            ),
            ParseError::InvalidArgument {
                stanza,
                reason,
                line,
            } => write!(f, "line {}: invalid '{}' stanza: {}", line, stanza, reason),
        }
    }
}

impl std::error::Error for ParseError {}
