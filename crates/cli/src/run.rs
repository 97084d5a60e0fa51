//! `titres run` / `titres validate`: config-driven lifecycle reconciliation.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use titres_io::{load_reference_areas, load_snapshot, write_history, OutputReceipt};
use titres_recon::summary::DomainSummary;
use titres_recon::{reconcile, AreaIndex, RunConfig};

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_USAGE};
use crate::CliError;

/// The `--json` document: one value on stdout.
#[derive(Serialize)]
struct RunReport<'a> {
    status: &'static str,
    name: &'a str,
    engine_version: &'a str,
    output: OutputReport,
    domains: Vec<&'a DomainSummary>,
}

#[derive(Serialize)]
struct OutputReport {
    path: String,
    #[serde(flatten)]
    receipt: OutputReceipt,
}

fn load_config(config_path: &Path) -> Result<RunConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("cannot read config {}: {e}", config_path.display()),
        hint: None,
    })?;
    RunConfig::from_toml(&config_str).map_err(CliError::from)
}

/// Resolve file paths relative to the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = base_dir(&config_path);

    let index = match &config.areas {
        Some(areas) => AreaIndex::new(load_reference_areas(&base.join(&areas.file), &areas.id_property)?),
        None => AreaIndex::empty(),
    };

    let result = reconcile(&config, &index, |domain, source| {
        let path = base.join(&source.path);
        info!(domain = %domain.name, date = %source.date, path = %path.display(), "loading snapshot");
        load_snapshot(&path).map_err(CliError::from)
    })?;

    let output_path = output.unwrap_or_else(|| base.join(&config.output.file));
    let receipt = write_history(&output_path, &result)?;

    // Human summary to stderr
    for domain in &result.domains {
        let s = &domain.summary;
        eprintln!(
            "domain {}: {} snapshots, {} titles, {} records ({} open, {} closed), {} of {} features rejected",
            s.domain,
            s.snapshots.len(),
            s.titles,
            s.records,
            s.open,
            s.closed,
            s.rejected.values().sum::<usize>(),
            s.features_read,
        );
    }
    eprintln!("wrote {} ({} bytes, {})", output_path.display(), receipt.bytes, receipt.blake3);

    if json_output {
        let report = RunReport {
            status: "ok",
            name: &result.meta.config_name,
            engine_version: &result.meta.engine_version,
            output: OutputReport {
                path: output_path.display().to_string(),
                receipt,
            },
            domains: result.domains.iter().map(|d| &d.summary).collect(),
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::from(titres_io::IoError::from(e)))?;
        println!("{json_str}");
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = base_dir(&config_path);

    let sources: usize = config.domains.iter().map(|d| d.sources.len()).sum();
    let missing: Vec<String> = config
        .domains
        .iter()
        .flat_map(|d| d.sources.iter().map(|s| s.path.as_str()))
        .chain(config.areas.as_ref().map(|a| a.file.as_str()))
        .map(|p| base.join(p))
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();

    if !missing.is_empty() {
        return Err(CliError {
            code: EXIT_INVALID_CONFIG,
            message: format!("{} input file(s) not found: {}", missing.len(), missing.join(", ")),
            hint: Some("input paths are resolved relative to the config file".into()),
        });
    }

    eprintln!(
        "config '{}' ok: {} domain(s), {} source(s)",
        config.name,
        config.domains.len(),
        sources
    );
    Ok(())
}
