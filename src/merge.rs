//! # Aggregate CSV Merger
//! Unions every `Weights_<sector>_companies.csv` in a directory into one file
//! tagged by sector.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const PREFIX: &str = "Weights_";
const SUFFIX: &str = "_companies.csv";
const INDEX_LABEL: &str = "Company";
const SECTOR_COLUMN: &str = "Sector";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No sector file matched; nothing was written.
    NoInputs,
    Written { files: Vec<PathBuf>, rows: usize },
}

/// Sector label of a weights file name: its second `_`-delimited token.
pub fn sector_from_file_name(name: &str) -> Option<&str> {
    name.split('_').nth(1)
}

fn is_weights_file(name: &str) -> bool {
    name.len() >= PREFIX.len() + SUFFIX.len() && name.starts_with(PREFIX) && name.ends_with(SUFFIX)
}

/// Weights files in `dir`, sorted by name.
pub fn find_weight_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for e in entries {
        let e = e?;
        let path = e.path();
        let is_match = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(is_weights_file);
        if is_match && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

struct SectorFrame {
    columns: Vec<String>,
    rows: Vec<(String, HashMap<String, String>)>,
}

fn read_sector_file(path: &Path) -> Result<SectorFrame> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    // first column is the index
    let columns: Vec<String> = dedupe_columns(&headers).into_iter().skip(1).collect();

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        let index = rec.get(0).unwrap_or_default().to_string();
        let values = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| rec.get(i + 1).map(|v| (c.clone(), v.to_string())))
            .collect();
        rows.push((index, values));
    }
    Ok(SectorFrame { columns, rows })
}

/// Repeated header names get a `.N` suffix (`X`, `X.1`, `X.2`), skipping any
/// suffixed name the header already uses.
pub fn dedupe_columns(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for h in headers {
        let mut name = h.clone();
        let mut n = seen.get(h).copied().unwrap_or(0);
        while n > 0 && (seen.contains_key(&name) || headers.contains(&name)) {
            name = format!("{h}.{n}");
            n += 1;
        }
        if n > 0 {
            seen.insert(h.clone(), n);
        } else {
            seen.entry(h.clone()).or_insert(1);
        }
        seen.entry(name.clone()).or_insert(1);
        out.push(name);
    }
    out
}

/// Merge the weights files of the current directory into `output`.
pub fn generate_aggregate_csv(output: &Path) -> Result<MergeOutcome> {
    generate_aggregate_csv_in(Path::new("."), output)
}

/// Merge the weights files found in `dir` into `output`, semicolon-delimited,
/// index labeled `Company`, `Sector` last. Columns missing from a file are
/// left empty.
pub fn generate_aggregate_csv_in(dir: &Path, output: &Path) -> Result<MergeOutcome> {
    let files = find_weight_files(dir)?;
    if files.is_empty() {
        tracing::warn!(target: "merge", dir = %dir.display(), "No CSV files found in the specified folder.");
        return Ok(MergeOutcome::NoInputs);
    }

    let mut columns: Vec<String> = Vec::new();
    let mut tagged: Vec<(String, String, HashMap<String, String>)> = Vec::new();

    for path in &files {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let sector = sector_from_file_name(name).unwrap_or_default().to_string();
        let frame = read_sector_file(path)?;

        for c in frame.columns {
            if c != SECTOR_COLUMN && !columns.contains(&c) {
                columns.push(c);
            }
        }
        tracing::debug!(target: "merge", file = %path.display(), %sector, rows = frame.rows.len(), "sector file loaded");
        for (index, values) in frame.rows {
            tagged.push((index, sector.clone(), values));
        }
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output)
        .with_context(|| format!("creating {}", output.display()))?;

    let mut header = Vec::with_capacity(columns.len() + 2);
    header.push(INDEX_LABEL.to_string());
    header.extend(columns.iter().cloned());
    header.push(SECTOR_COLUMN.to_string());
    wtr.write_record(&header)?;

    for (index, sector, values) in &tagged {
        let mut rec = Vec::with_capacity(header.len());
        rec.push(index.as_str());
        for c in &columns {
            rec.push(values.get(c).map(String::as_str).unwrap_or_default());
        }
        rec.push(sector.as_str());
        wtr.write_record(&rec)?;
    }
    wtr.flush()
        .with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(target: "merge", output = %output.display(), files = files.len(), rows = tagged.len(), "Aggregate CSV file generated");
    Ok(MergeOutcome::Written {
        files,
        rows: tagged.len(),
    })
}
