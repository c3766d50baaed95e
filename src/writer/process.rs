use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use super::FittingSink;
use crate::catalog::Catalog;
use crate::fitting::extract;
use crate::parser::RawKillmail;

/// Tally of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStats {
    pub read: u64,
    pub accepted: u64,
    /// Lines that were not valid killmail packages
    pub malformed: u64,
    pub rejected: BTreeMap<&'static str, u64>,
}

impl ProcessStats {
    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }
}

/// Extract every killmail in a JSON-lines stream into `sink`
pub fn process_reader<R: BufRead>(
    catalog: &Catalog,
    reader: R,
    source: &str,
    sink: &mut impl FittingSink,
    stats: &mut ProcessStats,
    progress: &ProgressBar,
) -> Result<()> {
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line from {}", source))?;
        progress.inc(1);
        if line.trim().is_empty() {
            continue;
        }
        stats.read += 1;

        let killmail = match RawKillmail::from_json(&line) {
            Ok(killmail) => killmail,
            Err(e) => {
                warn!("{}:{}: {:#}", source, idx + 1, e);
                stats.malformed += 1;
                continue;
            }
        };

        match extract(catalog, &killmail) {
            Ok(fitting) => {
                sink.accept(fitting)?;
                stats.accepted += 1;
            }
            Err(rejection) => {
                debug!(killmail = killmail.kill_id, "skipped: {}", rejection);
                *stats.rejected.entry(rejection.reason()).or_default() += 1;
            }
        }
    }
    Ok(())
}

/// Process JSON-lines killmail files with a progress bar per file
pub fn process_files(
    catalog: &Catalog,
    paths: &[impl AsRef<Path>],
    sink: &mut impl FittingSink,
) -> Result<ProcessStats> {
    let multi = MultiProgress::new();
    let style = ProgressStyle::default_bar()
        .template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len}")
        .context("Invalid progress template")?
        .progress_chars("=>-");

    let mut stats = ProcessStats::default();

    for path in paths {
        let path = path.as_ref();
        let line_count = BufReader::new(
            File::open(path).with_context(|| format!("Failed to open: {:?}", path))?,
        )
        .lines()
        .count() as u64;

        let pb = multi.add(ProgressBar::new(line_count));
        pb.set_style(style.clone());
        pb.set_message(path.display().to_string());

        let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
        let source = path.display().to_string();
        process_reader(catalog, BufReader::new(file), &source, sink, &mut stats, &pb)?;
        pb.finish();
    }

    sink.flush()?;

    info!(
        read = stats.read,
        accepted = stats.accepted,
        rejected = stats.rejected_total(),
        malformed = stats.malformed,
        "processed killmails"
    );
    Ok(stats)
}
