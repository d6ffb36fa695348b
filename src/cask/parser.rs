//! Parser for the cask DSL subset.
//!
//! Grammar, informally:
//!
//! ```text
//! cask   := "cask" STRING "do" NL body "end"
//! body   := { stanza NL }
//! stanza := IDENT [ arg { "," arg } ] [ "do" block "end" ]
//! arg    := STRING | SYMBOL | KEY arg | "[" [ arg { "," arg } [","] ] "]" | OTHER
//! ```

use super::lexer::{Token, TokenKind, tokenize};
use super::model::{
    Artifact, Checksum, CleanupDirective, CleanupKind, Livecheck, LivecheckUrl, Manifest,
    UnknownStanza,
};
use super::template::UrlTemplate;
use super::version::Version;
use super::ParseError;

/// Stanzas the package manager understands that carry nothing the linter checks.
const PASSTHROUGH_STANZAS: &[&str] = &[
    "artifact",
    "auto_updates",
    "caveats",
    "colorpicker",
    "conflicts_with",
    "container",
    "depends_on",
    "dictionary",
    "font",
    "input_method",
    "installer",
    "internet_plugin",
    "manpage",
    "mdimporter",
    "postflight",
    "preflight",
    "prefpane",
    "qlplugin",
    "screen_saver",
    "service",
    "stage_only",
    "suite",
    "uninstall_postflight",
    "uninstall_preflight",
    "vst_plugin",
    "vst3_plugin",
    "bash_completion",
    "fish_completion",
    "zsh_completion",
];

/// Stanzas inside `livecheck do ... end` that are accepted but not modelled.
const LIVECHECK_PASSTHROUGH: &[&str] = &["regex", "skip", "throttle"];

/// Block openers that close with `end` but have no `do`.
const RUBY_BLOCK_KEYWORDS: &[&str] = &["if", "unless", "case", "begin", "def", "while", "until"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Str(String),
    Symbol(String),
    Array(Vec<Arg>),
    Pair(String, Box<Arg>),
    Other(String),
}

impl Arg {
    fn describe(&self) -> String {
        match self {
            Arg::Str(s) => format!("string \"{}\"", s),
            Arg::Symbol(s) => format!("symbol :{}", s),
            Arg::Array(_) => "array".to_string(),
            Arg::Pair(k, _) => format!("key {}:", k),
            Arg::Other(s) => format!("'{}'", s),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parse cask source into a [`Manifest`].
///
/// Missing stanzas are not an error here; only malformed syntax, repeated
/// single-valued stanzas and arguments of the wrong shape are.
pub fn parse(source: &str) -> Result<Manifest, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };

    parser.skip_newlines();
    let line = parser.expect_ident("cask")?;
    let token = parser.expect_string("cask token")?;
    parser.expect(TokenKind::Do, "'do'")?;

    let mut manifest = Manifest {
        token,
        ..Default::default()
    };
    manifest.lines.insert("cask".to_string(), line);

    parser.body(&mut manifest)?;

    parser.skip_newlines();
    if let Some(extra) = parser.next() {
        return Err(ParseError::UnexpectedToken {
            expected: "end of file",
            found: extra.kind.to_string(),
            line: extra.line,
        });
    }

    Ok(manifest)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&TokenKind::Newline) {}
    }

    fn unexpected(&self, expected: &'static str, token: Option<Token>) -> ParseError {
        match token {
            Some(t) => ParseError::UnexpectedToken {
                expected,
                found: t.kind.to_string(),
                line: t.line,
            },
            None => ParseError::UnexpectedEof { expected },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<usize, ParseError> {
        match self.next() {
            Some(t) if t.kind == kind => Ok(t.line),
            other => Err(self.unexpected(expected, other)),
        }
    }

    fn expect_ident(&mut self, name: &'static str) -> Result<usize, ParseError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(ident),
                line,
            }) if ident == name => Ok(line),
            other => Err(self.unexpected("'cask'", other)),
        }
    }

    fn expect_string(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Str(s),
                ..
            }) => Ok(s),
            other => Err(self.unexpected(expected, other)),
        }
    }

    fn body(&mut self, manifest: &mut Manifest) -> Result<(), ParseError> {
        loop {
            self.skip_newlines();
            match self.next() {
                None => return Err(ParseError::UnexpectedEof { expected: "'end'" }),
                Some(Token {
                    kind: TokenKind::End,
                    ..
                }) => return Ok(()),
                Some(Token {
                    kind: TokenKind::Ident(name),
                    line,
                }) => {
                    let args = self.args()?;
                    if self.eat(&TokenKind::Do) {
                        if name == "livecheck" {
                            let livecheck = self.livecheck(manifest)?;
                            claim(manifest, "livecheck", line)?;
                            manifest.livecheck = Some(livecheck);
                        } else {
                            self.skip_block()?;
                            note_other(manifest, &name, line);
                        }
                    } else {
                        apply(manifest, &name, args, line)?;
                    }
                }
                other => return Err(self.unexpected("stanza name", other)),
            }
        }
    }

    fn args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Newline | TokenKind::Do | TokenKind::End => break,
                TokenKind::Comma => {
                    self.pos += 1;
                    // trailing comma continues the argument list on the next line
                    self.skip_newlines();
                }
                _ => args.push(self.value()?),
            }
        }
        Ok(args)
    }

    fn value(&mut self) -> Result<Arg, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::UnexpectedEof {
                expected: "argument",
            });
        };
        let line = token.line;
        match token.kind {
            TokenKind::Str(s) => Ok(Arg::Str(s)),
            TokenKind::Symbol(s) => Ok(Arg::Symbol(s)),
            TokenKind::Key(key) => {
                self.skip_newlines();
                Ok(Arg::Pair(key, Box::new(self.value()?)))
            }
            TokenKind::LBracket => self.array(),
            TokenKind::Ident(s) | TokenKind::Other(s) => Ok(Arg::Other(s)),
            other => Err(ParseError::UnexpectedToken {
                expected: "argument",
                found: other.to_string(),
                line,
            }),
        }
    }

    fn array(&mut self) -> Result<Arg, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().map(|t| &t.kind) {
                None => return Err(ParseError::UnexpectedEof { expected: "']'" }),
                Some(TokenKind::RBracket) => {
                    self.pos += 1;
                    return Ok(Arg::Array(items));
                }
                Some(TokenKind::Comma) => self.pos += 1,
                Some(_) => items.push(self.value()?),
            }
        }
    }

    /// Consume tokens up to and including the `end` closing the current block.
    fn skip_block(&mut self) -> Result<(), ParseError> {
        let mut depth = 1;
        let mut line_start = false;
        while let Some(token) = self.next() {
            match &token.kind {
                TokenKind::Do => depth += 1,
                TokenKind::Ident(kw)
                    if line_start && RUBY_BLOCK_KEYWORDS.contains(&kw.as_str()) =>
                {
                    depth += 1
                }
                TokenKind::End => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
            line_start = token.kind == TokenKind::Newline;
        }
        Err(ParseError::UnexpectedEof { expected: "'end'" })
    }

    fn livecheck(&mut self, manifest: &mut Manifest) -> Result<Livecheck, ParseError> {
        let mut livecheck = Livecheck::default();
        let mut url_line = None;
        let mut strategy_line = None;

        loop {
            self.skip_newlines();
            let (name, line) = match self.next() {
                None => return Err(ParseError::UnexpectedEof { expected: "'end'" }),
                Some(Token {
                    kind: TokenKind::End,
                    ..
                }) => return Ok(livecheck),
                Some(Token {
                    kind: TokenKind::Ident(name),
                    line,
                }) => (name, line),
                other => return Err(self.unexpected("livecheck stanza", other)),
            };

            let args = self.args()?;
            if self.eat(&TokenKind::Do) {
                // strategy blocks post-process the fetched content; nothing to lint
                self.skip_block()?;
            }

            match name.as_str() {
                "url" => {
                    once(&mut url_line, "livecheck.url", line)?;
                    livecheck.url = Some(match args.into_iter().next() {
                        Some(Arg::Symbol(s)) if s == "url" => LivecheckUrl::Url,
                        Some(Arg::Symbol(s)) if s == "homepage" => LivecheckUrl::Homepage,
                        Some(Arg::Str(s)) => LivecheckUrl::Literal(s),
                        other => {
                            return Err(invalid(
                                "livecheck.url",
                                line,
                                expected_found(":url, :homepage or a string", other.as_ref()),
                            ));
                        }
                    });
                }
                "strategy" => {
                    once(&mut strategy_line, "livecheck.strategy", line)?;
                    livecheck.strategy = Some(match args.into_iter().next() {
                        Some(Arg::Symbol(s)) => s,
                        other => {
                            return Err(invalid(
                                "livecheck.strategy",
                                line,
                                expected_found("a symbol", other.as_ref()),
                            ));
                        }
                    });
                }
                n if LIVECHECK_PASSTHROUGH.contains(&n) => {}
                _ => manifest.unknown_stanzas.push(UnknownStanza {
                    name: format!("livecheck.{}", name),
                    line,
                }),
            }
        }
    }
}

fn invalid(stanza: &str, line: usize, reason: String) -> ParseError {
    ParseError::InvalidArgument {
        stanza: stanza.to_string(),
        reason,
        line,
    }
}

fn expected_found(expected: &str, found: Option<&Arg>) -> String {
    match found {
        Some(arg) => format!("expected {}, found {}", expected, arg.describe()),
        None => format!("expected {}, found nothing", expected),
    }
}

fn once(seen: &mut Option<usize>, name: &str, line: usize) -> Result<(), ParseError> {
    if let Some(first) = *seen {
        return Err(ParseError::DuplicateStanza {
            name: name.to_string(),
            line,
            first,
        });
    }
    *seen = Some(line);
    Ok(())
}

/// Record a single-valued stanza, failing if it was already defined.
fn claim(manifest: &mut Manifest, name: &str, line: usize) -> Result<(), ParseError> {
    let mut seen = manifest.line_of(name);
    once(&mut seen, name, line)?;
    manifest.lines.insert(name.to_string(), line);
    Ok(())
}

fn note_line(manifest: &mut Manifest, name: &str, line: usize) {
    manifest.lines.entry(name.to_string()).or_insert(line);
}

fn note_other(manifest: &mut Manifest, name: &str, line: usize) {
    if PASSTHROUGH_STANZAS.contains(&name) || name.starts_with("on_") {
        note_line(manifest, name, line);
    } else {
        manifest.unknown_stanzas.push(UnknownStanza {
            name: name.to_string(),
            line,
        });
    }
}

fn string_arg(stanza: &str, args: &[Arg], line: usize) -> Result<String, ParseError> {
    match args.first() {
        Some(Arg::Str(s)) => Ok(s.clone()),
        other => Err(invalid(stanza, line, expected_found("a string", other))),
    }
}

fn target_option(args: &[Arg]) -> Option<String> {
    args.iter().find_map(|arg| match arg {
        Arg::Pair(key, value) if key == "target" => match value.as_ref() {
            Arg::Str(s) => Some(s.clone()),
            _ => None,
        },
        _ => None,
    })
}

fn cleanup_directives(
    stanza: &str,
    args: Vec<Arg>,
    line: usize,
) -> Result<Vec<CleanupDirective>, ParseError> {
    let mut directives = Vec::new();
    for arg in args {
        let (key, value) = match arg {
            Arg::Pair(key, value) => (key, value),
            other => {
                return Err(invalid(
                    stanza,
                    line,
                    expected_found("keyword arguments", Some(&other)),
                ));
            }
        };
        // quit:, launchctl:, pkgutil:, signal: ... name processes, not paths
        let Some(kind) = CleanupKind::from_key(&key) else {
            continue;
        };
        let paths = match *value {
            Arg::Str(s) => vec![s],
            Arg::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Arg::Str(s) => Ok(s),
                    other => Err(invalid(
                        stanza,
                        line,
                        expected_found("path strings", Some(&other)),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(invalid(
                    stanza,
                    line,
                    expected_found("a path or list of paths", Some(&other)),
                ));
            }
        };
        directives.push(CleanupDirective { kind, paths, line });
    }
    Ok(directives)
}

fn apply(
    manifest: &mut Manifest,
    name: &str,
    args: Vec<Arg>,
    line: usize,
) -> Result<(), ParseError> {
    match name {
        "version" => {
            claim(manifest, name, line)?;
            let raw = match args.first() {
                Some(Arg::Str(s)) => s.clone(),
                Some(Arg::Symbol(s)) if s == "latest" => s.clone(),
                other => {
                    return Err(invalid(
                        name,
                        line,
                        expected_found("a string or :latest", other),
                    ));
                }
            };
            manifest.version = Some(Version::new(raw));
        }
        "sha256" => {
            claim(manifest, name, line)?;
            manifest.sha256 = Some(match args.first() {
                Some(Arg::Str(s)) => Checksum::Sha256(s.clone()),
                Some(Arg::Symbol(s)) if s == "no_check" => Checksum::NoCheck,
                other => {
                    return Err(invalid(
                        name,
                        line,
                        expected_found("a string or :no_check", other),
                    ));
                }
            });
        }
        "url" => {
            claim(manifest, name, line)?;
            manifest.url = Some(UrlTemplate::new(string_arg(name, &args, line)?));
        }
        "desc" => {
            claim(manifest, name, line)?;
            manifest.desc = Some(string_arg(name, &args, line)?);
        }
        "homepage" => {
            claim(manifest, name, line)?;
            manifest.homepage = Some(string_arg(name, &args, line)?);
        }
        "name" => {
            note_line(manifest, name, line);
            manifest.names.push(string_arg(name, &args, line)?);
        }
        "app" | "binary" => {
            note_line(manifest, name, line);
            let source = string_arg(name, &args, line)?;
            let target = target_option(&args);
            manifest.artifacts.push(if name == "app" {
                Artifact::App { source, target }
            } else {
                Artifact::Binary { source, target }
            });
        }
        "pkg" => {
            note_line(manifest, name, line);
            let source = string_arg(name, &args, line)?;
            manifest.artifacts.push(Artifact::Pkg { source });
        }
        "zap" => {
            note_line(manifest, name, line);
            let directives = cleanup_directives(name, args, line)?;
            manifest.zap.extend(directives);
        }
        "uninstall" => {
            note_line(manifest, name, line);
            let directives = cleanup_directives(name, args, line)?;
            manifest.uninstall.extend(directives);
        }
        "livecheck" => {
            return Err(invalid(name, line, "expected a 'do ... end' block".to_string()));
        }
        _ => note_other(manifest, name, line),
    }
    Ok(())
}
