//! Tokenizer for the cask DSL.
//!
//! Casks are Ruby source, but the subset used by declarative records is
//! small: bare identifiers, string literals, symbols, hash keys, arrays and
//! `do ... end` blocks. Anything outside that subset that may still appear
//! as a stanza argument (numbers, operators) is passed through as
//! [`TokenKind::Other`] so the parser can skip it.
//!
//! `<<~ID` and `<<-ID` heredocs (as used by `caveats`) become a single
//! [`TokenKind::Str`] holding the raw body.

use super::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// String literal contents with escapes processed; `#{...}` kept verbatim.
    Str(String),
    /// `:name`
    Symbol(String),
    /// `name:` as used in keyword arguments.
    Key(String),
    LBracket,
    RBracket,
    Comma,
    Newline,
    Do,
    End,
    Other(String),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Str(s) => write!(f, "string \"{}\"", s),
            TokenKind::Symbol(s) => write!(f, "symbol :{}", s),
            TokenKind::Key(s) => write!(f, "key {}:", s),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Do => write!(f, "'do'"),
            TokenKind::End => write!(f, "'end'"),
            TokenKind::Other(s) => write!(f, "'{}'", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
    /// Heredocs opened on the current line; bodies start after its line break.
    pending: Vec<Heredoc>,
}

struct Heredoc {
    /// Index of the placeholder `Str` token to fill in.
    token: usize,
    terminator: String,
    /// `<<~`: strip the common indentation of the body.
    squiggly: bool,
    line: usize,
}

/// Split cask source into tokens.
///
/// Consecutive line breaks collapse into one [`TokenKind::Newline`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        tokens: Vec::new(),
        pending: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Lexer<'_> {
    fn push(&mut self, kind: TokenKind, line: usize) {
        if kind == TokenKind::Newline
            && matches!(self.tokens.last(), None | Some(Token { kind: TokenKind::Newline, .. }))
        {
            return;
        }
        self.tokens.push(Token { kind, line });
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.chars.next() {
            let line = self.line;
            match c {
                '\n' => {
                    self.push(TokenKind::Newline, line);
                    self.line += 1;
                    self.heredoc_bodies()?;
                }
                ' ' | '\t' | '\r' => {}
                '#' => self.skip_comment(),
                '"' => {
                    let s = self.string('"', line)?;
                    self.push(TokenKind::Str(s), line);
                }
                '\'' => {
                    let s = self.string('\'', line)?;
                    self.push(TokenKind::Str(s), line);
                }
                '[' => self.push(TokenKind::LBracket, line),
                ']' => self.push(TokenKind::RBracket, line),
                ',' => self.push(TokenKind::Comma, line),
                '\\' if self.chars.peek() == Some(&'\n') => {
                    // explicit line continuation
                    self.chars.next();
                    self.line += 1;
                }
                ':' => self.colon(line),
                c if is_ident_start(c) => self.ident(c, line),
                c if c.is_ascii_digit() => {
                    let mut s = String::from(c);
                    while let Some(&n) = self.chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '.' || n == '_' {
                            s.push(n);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    self.push(TokenKind::Other(s), line);
                }
                '<' if self.chars.peek() == Some(&'<') => match self.heredoc_opener() {
                    Some((squiggly, terminator)) => {
                        self.push(TokenKind::Str(String::new()), line);
                        self.pending.push(Heredoc {
                            token: self.tokens.len() - 1,
                            terminator,
                            squiggly,
                            line,
                        });
                    }
                    None => self.push(TokenKind::Other("<".to_string()), line),
                },
                '(' | ')' | '{' | '}' | '=' | '>' | '<' | '.' | '|' | '&' | '!' | '+' | '-'
                | '*' | '/' | '?' | '%' => self.push(TokenKind::Other(c.to_string()), line),
                other => return Err(ParseError::UnexpectedChar { ch: other, line }),
            }
        }
        if let Some(heredoc) = self.pending.pop() {
            return Err(ParseError::UnterminatedHeredoc {
                terminator: heredoc.terminator,
                line: heredoc.line,
            });
        }
        Ok(())
    }

    /// Consume `<~ID`, `<-ID` or a quoted ID after the first `<`.
    ///
    /// Leaves the input untouched and returns `None` for a plain `<<`.
    fn heredoc_opener(&mut self) -> Option<(bool, String)> {
        let mut ahead = self.chars.clone();
        ahead.next();
        let squiggly = match ahead.next() {
            Some('~') => true,
            Some('-') => false,
            _ => return None,
        };
        let quote = match ahead.peek() {
            Some(&q) if q == '\'' || q == '"' => {
                ahead.next();
                Some(q)
            }
            _ => None,
        };

        let mut terminator = String::new();
        while let Some(&c) = ahead.peek() {
            if is_ident_char(c) {
                terminator.push(c);
                ahead.next();
            } else {
                break;
            }
        }
        if !terminator.starts_with(is_ident_start) {
            return None;
        }
        if let Some(q) = quote
            && ahead.next() != Some(q)
        {
            return None;
        }

        self.chars = ahead;
        Some((squiggly, terminator))
    }

    /// Read the bodies of heredocs opened on the line just finished.
    fn heredoc_bodies(&mut self) -> Result<(), ParseError> {
        for heredoc in std::mem::take(&mut self.pending) {
            let mut lines = Vec::new();
            loop {
                let Some(text) = self.raw_line() else {
                    return Err(ParseError::UnterminatedHeredoc {
                        terminator: heredoc.terminator,
                        line: heredoc.line,
                    });
                };
                if text.trim() == heredoc.terminator {
                    break;
                }
                lines.push(text);
            }

            let indent = if heredoc.squiggly {
                common_indent(&lines)
            } else {
                0
            };
            let body: String = lines
                .iter()
                .map(|l| format!("{}\n", l.get(indent..).unwrap_or_default()))
                .collect();
            self.tokens[heredoc.token].kind = TokenKind::Str(body);
        }
        Ok(())
    }

    /// The next source line without its line break, or `None` at end of input.
    fn raw_line(&mut self) -> Option<String> {
        self.chars.peek()?;
        let mut text = String::new();
        for c in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
            text.push(c);
        }
        self.line += 1;
        Some(text)
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn ident(&mut self, first: char, line: usize) {
        let mut name = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if is_ident_char(c) {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if let Some(&c) = self.chars.peek()
            && (c == '?' || c == '!')
        {
            name.push(c);
            self.chars.next();
        }

        // `key:` but not `Foo::Bar`
        if self.chars.peek() == Some(&':') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek() != Some(&':') {
                self.chars.next();
                self.push(TokenKind::Key(name), line);
                return;
            }
        }

        let kind = match name.as_str() {
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            _ => TokenKind::Ident(name),
        };
        self.push(kind, line);
    }

    fn colon(&mut self, line: usize) {
        match self.chars.peek() {
            Some(&c) if is_ident_start(c) => {
                let mut name = String::new();
                while let Some(&c) = self.chars.peek() {
                    if is_ident_char(c) || c == '?' || c == '!' {
                        name.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                self.push(TokenKind::Symbol(name), line);
            }
            Some(&':') => {
                self.chars.next();
                self.push(TokenKind::Other("::".to_string()), line);
            }
            _ => self.push(TokenKind::Other(":".to_string()), line),
        }
    }

    fn string(&mut self, quote: char, line: usize) -> Result<String, ParseError> {
        let mut s = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                c if c == quote => return Ok(s),
                '\\' => match self.chars.next() {
                    Some(e) if e == quote || e == '\\' => s.push(e),
                    Some('n') if quote == '"' => s.push('\n'),
                    Some('t') if quote == '"' => s.push('\t'),
                    Some(e) => {
                        s.push('\\');
                        s.push(e);
                    }
                    None => break,
                },
                '#' if quote == '"' && self.chars.peek() == Some(&'{') => {
                    // Interpolation bodies may contain quotes; copy up to the
                    // closing brace verbatim.
                    s.push('#');
                    for n in self.chars.by_ref() {
                        s.push(n);
                        if n == '}' {
                            break;
                        }
                        if n == '\n' {
                            self.line += 1;
                        }
                    }
                }
                '\n' => {
                    self.line += 1;
                    s.push('\n');
                }
                c => s.push(c),
            }
        }
        Err(ParseError::UnterminatedString { line })
    }
}

/// Smallest leading-whitespace width among non-blank lines.
fn common_indent(lines: &[String]) -> usize {
    lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_stanza_with_string() {
        assert_eq!(
            kinds("version \"1.0.0\"\n"),
            vec![
                TokenKind::Ident("version".into()),
                TokenKind::Str("1.0.0".into()),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_tokenize_symbol_and_comment() {
        assert_eq!(
            kinds("sha256 :no_check # skip verification\n"),
            vec![
                TokenKind::Ident("sha256".into()),
                TokenKind::Symbol("no_check".into()),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_interpolation_verbatim() {
        assert_eq!(
            kinds(r#"url "https://x.org/v#{version}/a-#{version}.dmg""#),
            vec![
                TokenKind::Ident("url".into()),
                TokenKind::Str("https://x.org/v#{version}/a-#{version}.dmg".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_hash_inside_string_is_not_comment() {
        assert_eq!(
            kinds(r#"desc "Issue #42 tracker""#),
            vec![
                TokenKind::Ident("desc".into()),
                TokenKind::Str("Issue #42 tracker".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_keyword_array() {
        assert_eq!(
            kinds("zap trash: [\n  \"~/.cola\",\n]\n"),
            vec![
                TokenKind::Ident("zap".into()),
                TokenKind::Key("trash".into()),
                TokenKind::LBracket,
                TokenKind::Newline,
                TokenKind::Str("~/.cola".into()),
                TokenKind::Comma,
                TokenKind::Newline,
                TokenKind::RBracket,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_tokenize_do_end() {
        assert_eq!(
            kinds("livecheck do\nend"),
            vec![
                TokenKind::Ident("livecheck".into()),
                TokenKind::Do,
                TokenKind::Newline,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_tokenize_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c" 'it\'s'"#),
            vec![
                TokenKind::Str("a\"b\\c".into()),
                TokenKind::Str("it's".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_line_numbers() {
        let tokens = tokenize("a\n\n\nb").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize("url \"https://x.org\nname \"x\"").unwrap_err();
        // The second quote closes the first string, the third is left open.
        assert_eq!(err, ParseError::UnterminatedString { line: 2 });
    }

    #[test]
    fn test_tokenize_unexpected_char() {
        assert_eq!(
            tokenize("version `1`").unwrap_err(),
            ParseError::UnexpectedChar { ch: '`', line: 1 }
        );
    }

    #[test]
    fn test_tokenize_scope_operator_is_not_key() {
        assert_eq!(
            kinds("Foo::Bar"),
            vec![
                TokenKind::Ident("Foo".into()),
                TokenKind::Other("::".into()),
                TokenKind::Ident("Bar".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_squiggly_heredoc() {
        let source = "caveats <<~EOS\n    Don't forget to log in.\n\n      Run #{token} once.\n  EOS\napp \"A.app\"\n";
        let tokens = tokenize(source).unwrap();
        let kinds: Vec<&TokenKind> = tokens.iter().map(|t| &t.kind).collect();

        assert_eq!(
            kinds,
            vec![
                &TokenKind::Ident("caveats".into()),
                &TokenKind::Str("Don't forget to log in.\n\n  Run #{token} once.\n".into()),
                &TokenKind::Newline,
                &TokenKind::Ident("app".into()),
                &TokenKind::Str("A.app".into()),
                &TokenKind::Newline,
            ]
        );
        assert_eq!(tokens[1].line, 1);
        assert_eq!(tokens[3].line, 6);
    }

    #[test]
    fn test_tokenize_dash_heredoc_keeps_indentation() {
        assert_eq!(
            kinds("caveats <<-'TEXT'\n  keep \"this\"\n  TEXT\n"),
            vec![
                TokenKind::Ident("caveats".into()),
                TokenKind::Str("  keep \"this\"\n".into()),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_heredoc() {
        assert_eq!(
            tokenize("cask \"a\" do\n  caveats <<~EOS\n    text\nend\n").unwrap_err(),
            ParseError::UnterminatedHeredoc {
                terminator: "EOS".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn test_tokenize_shift_operator_is_not_heredoc() {
        assert_eq!(
            kinds("a << b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Other("<".into()),
                TokenKind::Other("<".into()),
                TokenKind::Ident("b".into()),
            ]
        );
    }
}
