use anyhow::Result;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

use crate::{
    cask::{CleanupDirective, Manifest},
    lint::resolved_url,
    runtime::{Runtime, expand_home},
};

use super::{OutputFormat, load_manifest};

/// Print the parsed record.
#[tracing::instrument(skip(runtime))]
pub fn show<R: Runtime>(runtime: &R, path: &Path, format: OutputFormat) -> Result<()> {
    print!("{}", render_show(runtime, path, format)?);
    Ok(())
}

pub fn render_show<R: Runtime>(runtime: &R, path: &Path, format: OutputFormat) -> Result<String> {
    let manifest = load_manifest(runtime, path)?;
    match format {
        OutputFormat::Text => Ok(render_text(runtime, &manifest)),
        OutputFormat::Json => render_json(runtime, &manifest),
    }
}

/// `(stanza, directive)` for every cleanup entry, uninstall first.
fn cleanup_entries(manifest: &Manifest) -> impl Iterator<Item = (&'static str, &CleanupDirective)> {
    manifest
        .uninstall
        .iter()
        .map(|d| ("uninstall", d))
        .chain(manifest.zap.iter().map(|d| ("zap", d)))
}

fn render_text<R: Runtime>(runtime: &R, manifest: &Manifest) -> String {
    let mut out = String::new();

    let version = manifest
        .version
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(no version)".to_string());
    let _ = writeln!(out, "{} {}", manifest.token, version);

    for name in &manifest.names {
        let _ = writeln!(out, "  Name: {}", name);
    }
    if let Some(desc) = &manifest.desc {
        let _ = writeln!(out, "  Description: {}", desc);
    }
    if let Some(homepage) = &manifest.homepage {
        let _ = writeln!(out, "  Homepage: {}", homepage);
    }
    if let Some(template) = &manifest.url {
        let url = resolved_url(manifest).unwrap_or_else(|| template.as_str().to_string());
        let _ = writeln!(out, "  URL: {}", url);
    }
    if let Some(sha256) = &manifest.sha256 {
        let _ = writeln!(out, "  SHA-256: {}", sha256);
    }
    if let Some(livecheck) = &manifest.livecheck {
        let reference = livecheck
            .url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        match &livecheck.strategy {
            Some(strategy) => {
                let _ = writeln!(out, "  Livecheck: {} (strategy :{})", reference, strategy);
            }
            None => {
                let _ = writeln!(out, "  Livecheck: {}", reference);
            }
        }
    }

    if !manifest.artifacts.is_empty() {
        let _ = writeln!(out, "  Install:");
        for artifact in &manifest.artifacts {
            let _ = writeln!(out, "    {} {}", artifact.kind(), artifact.source());
        }
    }

    let mut entries = cleanup_entries(manifest).peekable();
    if entries.peek().is_some() {
        let _ = writeln!(out, "  Cleanup:");
        for (stanza, directive) in entries {
            for path in &directive.paths {
                let _ = writeln!(
                    out,
                    "    {} {}: {}",
                    stanza,
                    directive.kind.as_str(),
                    expand_home(runtime, path).display()
                );
            }
        }
    }

    out
}

fn render_json<R: Runtime>(runtime: &R, manifest: &Manifest) -> Result<String> {
    let cleanup: Vec<_> = cleanup_entries(manifest)
        .flat_map(|(stanza, directive)| {
            directive.paths.iter().map(move |path| {
                json!({
                    "stanza": stanza,
                    "kind": directive.kind,
                    "path": path,
                    "expanded": expand_home(runtime, path),
                })
            })
        })
        .collect();

    let value = json!({
        "manifest": manifest,
        "resolved_url": resolved_url(manifest),
        "cleanup": cleanup,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{PUBLISHED, mock_files};
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    fn runtime_with(files: &[(&str, &'static str)]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        mock_files(&mut runtime, files);
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        runtime
    }

    #[test]
    fn test_render_show_text() {
        let runtime = runtime_with(&[("cola.rb", PUBLISHED)]);
        let text = render_show(&runtime, Path::new("cola.rb"), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "claudecode-cola 1.0.0");
        assert!(lines.contains(&"  Name: ClaudeCode-Cola"));
        assert!(lines.contains(
            &"  URL: https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.0/ClaudeCode-Cola-1.0.0.dmg"
        ));
        assert!(lines.contains(&"  Livecheck: :url (strategy :github_latest)"));
        assert!(lines.contains(&"    app ClaudeCode-Cola.app"));
        assert_eq!(
            lines.last().copied(),
            Some("    zap trash: /home/user/.claudecode-cola")
        );
    }

    #[test]
    fn test_render_show_unresolvable_url_falls_back_to_template() {
        const NO_VERSION: &str = r#"cask "cola" do
  url "https://downloads.acme.dev/cola-#{version}.dmg"
end
"#;
        let runtime = runtime_with(&[("cola.rb", NO_VERSION)]);
        let text = render_show(&runtime, Path::new("cola.rb"), OutputFormat::Text).unwrap();

        assert!(text.starts_with("cola (no version)\n"));
        assert!(text.contains("  URL: https://downloads.acme.dev/cola-#{version}.dmg\n"));
    }

    #[test]
    fn test_render_show_json() {
        let runtime = runtime_with(&[("cola.rb", PUBLISHED)]);
        let json = render_show(&runtime, Path::new("cola.rb"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["manifest"]["token"], "claudecode-cola");
        assert_eq!(value["manifest"]["version"], "1.0.0");
        assert_eq!(value["manifest"]["artifacts"][0]["type"], "app");
        assert_eq!(
            value["resolved_url"],
            "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.0/ClaudeCode-Cola-1.0.0.dmg"
        );
        assert_eq!(value["cleanup"][0]["stanza"], "zap");
        assert_eq!(value["cleanup"][0]["kind"], "trash");
        assert_eq!(value["cleanup"][0]["path"], "~/.claudecode-cola");
        assert_eq!(value["cleanup"][0]["expanded"], "/home/user/.claudecode-cola");
    }

    #[test]
    fn test_render_show_parse_error() {
        let runtime = runtime_with(&[("bad.rb", "cask do\nend\n")]);
        let err = render_show(&runtime, Path::new("bad.rb"), OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("Failed to parse bad.rb"));
    }
}
