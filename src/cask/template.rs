//! Source-location templates.
//!
//! A `url` stanza may interpolate the cask version with Ruby string
//! interpolation, e.g. `.../v#{version}/App-#{version}.dmg`. Only
//! `version` and its derived forms are resolvable without a Ruby runtime.

use serde::Serialize;

use super::version::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `#{` without a closing `}`.
    Unterminated { offset: usize },
    /// An interpolated expression other than `version` or `version.<method>`.
    Unsupported { expression: String },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Unterminated { offset } => {
                write!(f, "unterminated interpolation starting at offset {}", offset)
            }
            TemplateError::Unsupported { expression } => {
                write!(f, "cannot interpolate '#{{{}}}'", expression)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// A URL with `#{...}` placeholders, kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        UrlTemplate(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template interpolates anything at all.
    pub fn is_templated(&self) -> bool {
        self.0.contains("#{")
    }

    /// Substitute every `#{...}` expression with its value for `version`.
    pub fn resolve(&self, version: &Version) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();
        let mut consumed = 0;

        while let Some(start) = rest.find("#{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or(TemplateError::Unterminated {
                offset: consumed + start,
            })?;
            let expression = after[..end].trim();
            out.push_str(&evaluate(expression, version)?);

            let advanced = start + 2 + end + 1;
            consumed += advanced;
            rest = &rest[advanced..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn evaluate(expression: &str, version: &Version) -> Result<String, TemplateError> {
    let unsupported = || TemplateError::Unsupported {
        expression: expression.to_string(),
    };

    if expression == "version" {
        return Ok(version.as_str().to_string());
    }

    let method = expression.strip_prefix("version.").ok_or_else(unsupported)?;
    version.call(method).ok_or_else(unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLA_URL: &str = "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v#{version}/ClaudeCode-Cola-#{version}.dmg";

    #[test]
    fn test_resolve_version_twice() {
        let template = UrlTemplate::new(COLA_URL);
        let resolved = template.resolve(&Version::new("1.0.1")).unwrap();
        assert_eq!(
            resolved,
            "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.1/ClaudeCode-Cola-1.0.1.dmg"
        );
    }

    #[test]
    fn test_resolve_without_placeholders() {
        let template = UrlTemplate::new("https://example.org/app.dmg");
        assert!(!template.is_templated());
        assert_eq!(
            template.resolve(&Version::new("2.0.0")).unwrap(),
            "https://example.org/app.dmg"
        );
    }

    #[test]
    fn test_resolve_version_methods() {
        let template =
            UrlTemplate::new("https://dl.example.org/#{version.major_minor}/app-#{version.no_dots}.zip");
        assert_eq!(
            template.resolve(&Version::new("3.4.5")).unwrap(),
            "https://dl.example.org/3.4/app-345.zip"
        );
    }

    #[test]
    fn test_resolve_unsupported_expression() {
        let template = UrlTemplate::new("https://dl.example.org/#{arch}/app.zip");
        let err = template.resolve(&Version::new("1.0.0")).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unsupported {
                expression: "arch".to_string()
            }
        );
        assert!(err.to_string().contains("#{arch}"));
    }

    #[test]
    fn test_resolve_unknown_version_method() {
        let template = UrlTemplate::new("https://dl.example.org/#{version.csv.first}.zip");
        assert!(matches!(
            template.resolve(&Version::new("1.0.0")),
            Err(TemplateError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_resolve_unterminated() {
        let template = UrlTemplate::new("https://dl.example.org/v#{version/app.zip");
        assert_eq!(
            template.resolve(&Version::new("1.0.0")),
            Err(TemplateError::Unterminated { offset: 24 })
        );
    }
}
