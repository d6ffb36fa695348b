use anyhow::{Result, anyhow};
use std::path::Path;

use crate::{cask::Version, runtime::Runtime};

use super::load_manifest;

/// Print the source URL with the version substituted.
#[tracing::instrument(skip(runtime))]
pub fn url<R: Runtime>(runtime: &R, path: &Path, version: Option<&str>) -> Result<()> {
    println!("{}", resolve_url(runtime, path, version)?);
    Ok(())
}

/// Resolve the `url` stanza against the record's version, or `version_override`.
pub fn resolve_url<R: Runtime>(
    runtime: &R,
    path: &Path,
    version_override: Option<&str>,
) -> Result<String> {
    let manifest = load_manifest(runtime, path)?;
    let template = manifest
        .url
        .ok_or_else(|| anyhow!("{} has no 'url' stanza", path.display()))?;

    let version = match version_override {
        Some(version) => Version::new(version),
        None => manifest
            .version
            .ok_or_else(|| anyhow!("{} has no 'version' stanza", path.display()))?,
    };

    Ok(template.resolve(&version)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cask::TemplateError;
    use crate::commands::test_support::{DRAFT, PUBLISHED, mock_files};
    use crate::runtime::MockRuntime;

    fn runtime_with(files: &[(&str, &'static str)]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        mock_files(&mut runtime, files);
        runtime
    }

    #[test]
    fn test_resolve_url_with_record_version() {
        let runtime = runtime_with(&[("cola.rb", PUBLISHED)]);
        assert_eq!(
            resolve_url(&runtime, Path::new("cola.rb"), None).unwrap(),
            "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.0/ClaudeCode-Cola-1.0.0.dmg"
        );
    }

    #[test]
    fn test_resolve_url_with_override() {
        let runtime = runtime_with(&[("cola.rb", PUBLISHED)]);
        assert_eq!(
            resolve_url(&runtime, Path::new("cola.rb"), Some("1.0.1")).unwrap(),
            "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.1/ClaudeCode-Cola-1.0.1.dmg"
        );
    }

    #[test]
    fn test_resolve_url_does_not_judge_placeholders() {
        let runtime = runtime_with(&[("draft.rb", DRAFT)]);
        assert_eq!(
            resolve_url(&runtime, Path::new("draft.rb"), None).unwrap(),
            "https://your-server.com/ClaudeCode-Cola-1.0.0.dmg"
        );
    }

    #[test]
    fn test_resolve_url_missing_stanzas() {
        let runtime = runtime_with(&[
            ("no-url.rb", "cask \"a\" do\n  version \"1.0.0\"\nend\n"),
            (
                "no-version.rb",
                "cask \"a\" do\n  url \"https://acme.dev/a-#{version}.zip\"\nend\n",
            ),
        ]);

        let err = resolve_url(&runtime, Path::new("no-url.rb"), None).unwrap_err();
        assert_eq!(err.to_string(), "no-url.rb has no 'url' stanza");

        let err = resolve_url(&runtime, Path::new("no-version.rb"), None).unwrap_err();
        assert_eq!(err.to_string(), "no-version.rb has no 'version' stanza");

        // an override makes the missing version irrelevant
        assert_eq!(
            resolve_url(&runtime, Path::new("no-version.rb"), Some("2.0.0")).unwrap(),
            "https://acme.dev/a-2.0.0.zip"
        );
    }

    #[test]
    fn test_resolve_url_unsupported_expression() {
        let runtime = runtime_with(&[(
            "odd.rb",
            "cask \"a\" do\n  version \"1.0.0\"\n  url \"https://acme.dev/#{version.reverse}.zip\"\nend\n",
        )]);

        let err = resolve_url(&runtime, Path::new("odd.rb"), None).unwrap_err();
        assert!(err.downcast_ref::<TemplateError>().is_some());
    }
}
