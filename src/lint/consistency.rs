//! Checks across several records that share a token.
//!
//! Draft and published copies of one cask tend to drift apart. Every record
//! in a group is compared with the first one seen; the diagnostic is attached
//! to the record that disagrees.

use std::collections::BTreeMap;
use std::path::Path;

use super::{Diagnostic, Rule};
use crate::cask::Manifest;

/// Compare records grouped by token.
///
/// Returns `(index, diagnostic)` pairs where `index` points into `records`.
pub fn check_variants(records: &[(&Path, &Manifest)]) -> Vec<(usize, Diagnostic)> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, (_, manifest)) in records.iter().enumerate() {
        groups.entry(manifest.token.as_str()).or_default().push(index);
    }

    let mut out = Vec::new();
    for indices in groups.values().filter(|g| g.len() > 1) {
        let (first_path, first) = records[indices[0]];
        for &index in &indices[1..] {
            let (_, other) = records[index];
            for diagnostic in compare(first_path, first, other) {
                out.push((index, diagnostic));
            }
        }
    }
    out
}

fn compare(first_path: &Path, first: &Manifest, other: &Manifest) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if first.names != other.names {
        out.push(Diagnostic::error(
            Rule::VariantNameMismatch,
            format!(
                "display name {:?} differs from {:?} in {}",
                other.names,
                first.names,
                first_path.display()
            ),
            other.line_of("name").or(other.line_of("cask")),
        ));
    }

    let first_ref = first.livecheck.as_ref().and_then(|l| l.url.as_ref());
    let other_ref = other.livecheck.as_ref().and_then(|l| l.url.as_ref());
    if let (Some(a), Some(b)) = (first_ref, other_ref)
        && a != b
    {
        out.push(Diagnostic::warning(
            Rule::VariantLivecheckDivergence,
            format!(
                "livecheck url {} differs from {} in {}",
                b,
                a,
                first_path.display()
            ),
            other.line_of("livecheck"),
        ));
    }

    if let (Some(v1), Some(v2), Some(c1), Some(c2)) = (
        &first.version,
        &other.version,
        &first.sha256,
        &other.sha256,
    ) && v1 == v2
        && c1 != c2
    {
        out.push(Diagnostic::warning(
            Rule::VariantChecksumDivergence,
            format!(
                "version {} has sha256 {} here but {} in {}",
                v2,
                c2,
                c1,
                first_path.display()
            ),
            other.line_of("sha256"),
        ));
    }

    out
}
