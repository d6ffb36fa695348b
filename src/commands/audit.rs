use anyhow::{Result, bail};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    cask::{Manifest, ParseError},
    discovery::find_cask_files,
    http::Probe,
    lint::{
        Diagnostic, FileReport, LintPolicy, Linter, Report, Rule, check_variants, is_live_url,
        resolved_url,
    },
    runtime::Runtime,
};

use super::{OutputFormat, config::Config, load_manifest};

/// Check every cask file under `paths` and print the report.
///
/// Returns whether every record is publishable.
#[tracing::instrument(skip(runtime, config, paths))]
pub async fn audit<R: Runtime, P: Probe>(
    runtime: &R,
    config: &Config<P>,
    paths: &[PathBuf],
    format: OutputFormat,
) -> Result<bool> {
    let report = build_report(runtime, config, paths).await?;

    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    info!(
        "Audit finished: {} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    Ok(report.is_publishable())
}

/// Discover, parse and lint, without printing anything.
pub async fn build_report<R: Runtime, P: Probe>(
    runtime: &R,
    config: &Config<P>,
    paths: &[PathBuf],
) -> Result<Report> {
    let files = find_cask_files(runtime, paths, &config.pattern)?;
    if files.is_empty() {
        bail!(
            "No cask files found matching '{}'",
            config.pattern.as_str()
        );
    }

    let linter = Linter::new(config.policy.clone());
    let mut reports = Vec::with_capacity(files.len());
    // (report index, manifest) for every file that parsed
    let mut parsed: Vec<(usize, Manifest)> = Vec::new();

    for path in files {
        let manifest = match load_manifest(runtime, &path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("{:#}", e);
                let reason = match e.downcast_ref::<ParseError>() {
                    Some(parse_error) => parse_error.to_string(),
                    None => format!("{:#}", e),
                };
                reports.push(FileReport::unparsable(path, reason));
                continue;
            }
        };

        let mut diagnostics = linter.lint(&manifest);
        if let Some(probe) = &config.probe {
            diagnostics.extend(probe_manifest(probe, &manifest, &config.policy).await);
        }
        debug!("{:?}: {} diagnostic(s)", path, diagnostics.len());

        parsed.push((reports.len(), manifest.clone()));
        reports.push(FileReport::parsed(path, manifest.token, diagnostics));
    }

    let variants: Vec<(usize, Diagnostic)> = {
        let records: Vec<(&Path, &Manifest)> = parsed
            .iter()
            .map(|(index, manifest)| (reports[*index].path.as_path(), manifest))
            .collect();
        check_variants(&records)
            .into_iter()
            .map(|(record, diagnostic)| (parsed[record].0, diagnostic))
            .collect()
    };
    for (index, diagnostic) in variants {
        reports[index].diagnostics.push(diagnostic);
    }

    for report in &mut reports {
        report.diagnostics.sort_by_key(|d| d.line.unwrap_or(0));
    }

    Ok(Report { files: reports })
}

/// Probe the resolved url and the homepage.
///
/// URLs the linter already rejects are not requested.
async fn probe_manifest<P: Probe + ?Sized>(
    probe: &P,
    manifest: &Manifest,
    policy: &LintPolicy,
) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if let Some(url) = resolved_url(manifest).filter(|u| is_live_url(u, policy))
        && let Err(e) = probe.check(&url).await
    {
        out.push(Diagnostic::error(
            Rule::UrlUnreachable,
            format!("url {} is unreachable: {:#}", url, e),
            manifest.line_of("url"),
        ));
    }

    if let Some(homepage) = manifest.homepage.as_deref().filter(|h| is_live_url(h, policy))
        && let Err(e) = probe.check(homepage).await
    {
        out.push(Diagnostic::error(
            Rule::HomepageUnreachable,
            format!("homepage {} is unreachable: {:#}", homepage, e),
            manifest.line_of("homepage"),
        ));
    }

    out
}
