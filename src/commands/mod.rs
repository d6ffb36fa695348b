use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::{
    cask::{self, Manifest},
    runtime::Runtime,
};

mod audit;
pub mod config;
mod show;
mod url;

pub use audit::{audit, build_report};
pub use show::{render_show, show};
pub use self::url::{resolve_url, url};

/// Output format shared by `audit` and `show`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Read and parse one cask file.
#[tracing::instrument(skip(runtime))]
pub fn load_manifest<R: Runtime>(runtime: &R, path: &Path) -> Result<Manifest> {
    let source = runtime.read_to_string(path)?;
    let manifest =
        cask::parse(&source).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Parsed cask '{}' from {:?}", manifest.token, path);
    Ok(manifest)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::runtime::MockRuntime;
    use std::path::{Path, PathBuf};

    pub const PUBLISHED: &str = r#"cask "claudecode-cola" do
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

    pub const DRAFT: &str = r#"cask "claudecode-cola" do
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

    /// Serve `files` as a flat directory tree from the mock runtime.
    pub fn mock_files(runtime: &mut MockRuntime, files: &[(&str, &'static str)]) {
        let owned: Vec<(PathBuf, &'static str)> = files
            .iter()
            .map(|(p, content)| (PathBuf::from(p), *content))
            .collect();

        let known = owned.clone();
        runtime
            .expect_exists()
            .returning(move |p: &Path| known.iter().any(|(f, _)| f == p));
        runtime.expect_is_dir().returning(|_| false);
        runtime
            .expect_read_to_string()
            .returning(move |p: &Path| {
                owned
                    .iter()
                    .find(|(f, _)| f == p)
                    .map(|(_, content)| content.to_string())
                    .ok_or_else(|| anyhow::anyhow!("Failed to read {}", p.display()))
            });
    }
}
