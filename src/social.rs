//! # ESG Social-Score Fetcher
//! Social pillar scores over a fixed reporting window for a company list.
//!
//! The provider grid is normalized column by column: every column whose
//! non-empty cells are all numbers becomes `f64`, and the `Date` column becomes
//! calendar dates. Per-field provider errors are passed through untouched.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use crate::config::SocialSettings;
use crate::provider::{CrossSectionalTable, FieldError, MarketDataProvider};
use crate::telemetry::ensure_metrics_described;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Float(f64),
    Date(NaiveDate),
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Cell::Float(v) => v.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialScoreRow {
    pub instrument: String,
    pub date: Option<NaiveDate>,
    pub esg_score: Option<f64>,
    pub social_pillar_score: Option<f64>,
}

/// Normalized provider grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialScoreTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SocialScoreTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Typed view: one record per company per reporting date.
    pub fn records(&self) -> Vec<SocialScoreRow> {
        let inst = self.column("Instrument");
        let date = self.column("Date");
        let esg = self.column("ESG Score");
        let social = self.column("Social Pillar Score");
        self.rows
            .iter()
            .map(|row| SocialScoreRow {
                instrument: match cell_at(row, inst) {
                    Some(Cell::Text(s)) => s,
                    Some(other) => other.render(),
                    None => String::new(),
                },
                date: cell_at(row, date).and_then(|c| c.as_date()),
                esg_score: cell_at(row, esg).and_then(|c| c.as_f64()),
                social_pillar_score: cell_at(row, social).and_then(|c| c.as_f64()),
            })
            .collect()
    }

    /// Semicolon-delimited dump of the normalized grid.
    pub fn to_writer<W: Write>(&self, w: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(w);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::render))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn cell_at(row: &[Cell], idx: Option<usize>) -> Option<Cell> {
    idx.and_then(|i| row.get(i).cloned())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialScores {
    pub table: SocialScoreTable,
    pub errors: Vec<FieldError>,
}

impl SocialScores {
    pub fn records(&self) -> Vec<SocialScoreRow> {
        self.table.records()
    }
}

pub async fn fetch_social_scores<P: MarketDataProvider + ?Sized>(
    provider: &P,
    companies: &[String],
    settings: &SocialSettings,
) -> Result<SocialScores> {
    ensure_metrics_described();

    let resp = provider
        .cross_sectional(companies, &settings.fields, &settings.parameters())
        .await
        .with_context(|| format!("{} social scores for {} companies", provider.name(), companies.len()))?;

    let table = normalize_table(&resp.table)
        .with_context(|| format!("{} social score grid", provider.name()))?;
    counter!("social_rows_total").increment(table.rows.len() as u64);
    if !resp.errors.is_empty() {
        tracing::warn!(target: "social", errors = resp.errors.len(), "provider reported field errors");
    }
    tracing::info!(target: "social", companies = companies.len(), rows = table.rows.len(), "social scores fetched");

    Ok(SocialScores {
        table,
        errors: resp.errors,
    })
}

fn is_null(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Indexes of columns whose non-empty cells are all JSON numbers (and which
/// have at least one).
pub fn numeric_columns(table: &CrossSectionalTable) -> Vec<usize> {
    (0..table.headers.len())
        .filter(|&c| {
            let mut seen = false;
            for row in &table.rows {
                match row.get(c) {
                    Some(v) if v.is_number() => seen = true,
                    Some(v) if is_null(v) => {}
                    None => {}
                    Some(_) => return false,
                }
            }
            seen
        })
        .collect()
}

/// RFC 3339, `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Fails on a non-empty `Date` cell that is not a recognizable date.
pub fn normalize_table(table: &CrossSectionalTable) -> Result<SocialScoreTable> {
    let numeric = numeric_columns(table);
    let date_col = table
        .headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("Date"));

    let mut rows = Vec::with_capacity(table.rows.len());
    for (r, row) in table.rows.iter().enumerate() {
        let mut cells = Vec::with_capacity(table.headers.len());
        for c in 0..table.headers.len() {
            let v = row.get(c).unwrap_or(&Value::Null);
            let cell = if is_null(v) {
                Cell::Missing
            } else if numeric.contains(&c) {
                v.as_f64().map_or(Cell::Missing, Cell::Float)
            } else if Some(c) == date_col {
                let d = v
                    .as_str()
                    .and_then(parse_calendar_date)
                    .with_context(|| format!("row {r}: unparseable date {v}"))?;
                Cell::Date(d)
            } else {
                match v {
                    Value::String(s) => Cell::Text(s.clone()),
                    other => Cell::Text(other.to_string()),
                }
            };
            cells.push(cell);
        }
        rows.push(cells);
    }

    Ok(SocialScoreTable {
        headers: table.headers.clone(),
        rows,
    })
}
