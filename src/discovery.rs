use anyhow::{Result, bail};
use glob::Pattern;
use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Default file-name pattern for cask files inside directories.
pub const DEFAULT_PATTERN: &str = "*.rb";

/// Expand command-line paths into the list of cask files to check.
///
/// Files are taken as given, whatever their name. Directories are walked
/// recursively and contribute every file whose name matches `pattern`.
/// Symlinked directories below a walked directory are not followed.
/// The result is sorted and free of duplicates.
#[tracing::instrument(skip(runtime, paths))]
pub fn find_cask_files<R: Runtime>(
    runtime: &R,
    paths: &[PathBuf],
    pattern: &Pattern,
) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for path in paths {
        if !runtime.exists(path) {
            bail!("Path not found: {}", path.display());
        }
        if runtime.is_dir(path) {
            walk(runtime, path, pattern, &mut found)?;
        } else {
            found.insert(path.clone());
        }
    }

    debug!("Found {} cask file(s)", found.len());
    Ok(found.into_iter().collect())
}

fn walk<R: Runtime>(
    runtime: &R,
    dir: &Path,
    pattern: &Pattern,
    found: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    for entry in runtime.read_dir(dir)? {
        if runtime.is_dir(&entry) {
            if runtime.is_symlink(&entry) {
                debug!("Not following symlinked directory {:?}", entry);
            } else {
                walk(runtime, &entry, pattern, found)?;
            }
            continue;
        }
        let matches = entry
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name));
        if matches {
            found.insert(entry);
        } else {
            debug!("Skipping {:?}", entry);
        }
    }
    Ok(())
}
