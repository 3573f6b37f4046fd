//! # Score Aggregator
//! Reduces one company's annotated headlines to a weight row.
//!
//! Means are taken over annotated rows only; `datapoints` counts every row,
//! annotated or not. [`WeightTable`] keeps the rows in call order and never
//! deduplicates tickers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::annotate::AnnotatedHeadline;
use crate::sentiment::SentimentBucket;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Polarity")]
    pub polarity: Option<f64>,
    #[serde(rename = "Subjectivity")]
    pub subjectivity: Option<f64>,
    #[serde(rename = "Positive")]
    pub positive: usize,
    #[serde(rename = "Negative")]
    pub negative: usize,
    #[serde(rename = "Neutral")]
    pub neutral: usize,
    /// Mean polarity rescaled to [0, 1].
    #[serde(rename = "Sentiment Score")]
    pub sentiment_score: Option<f64>,
    #[serde(rename = "Datapoints")]
    pub datapoints: usize,
}

pub fn summarize_company(ticker: &str, rows: &[AnnotatedHeadline]) -> CompanySummary {
    let scored: Vec<_> = rows.iter().filter_map(|r| r.sentiment.as_ref()).collect();
    let count = |b: SentimentBucket| scored.iter().filter(|s| s.bucket == b).count();

    let polarity = mean(scored.iter().map(|s| s.polarity));
    let subjectivity = mean(scored.iter().map(|s| s.subjectivity));

    CompanySummary {
        company: ticker.to_string(),
        polarity,
        subjectivity,
        positive: count(SentimentBucket::Positive),
        negative: count(SentimentBucket::Negative),
        neutral: count(SentimentBucket::Neutral),
        sentiment_score: polarity.map(|p| (p + 1.0) / 2.0),
        datapoints: rows.len(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// `Weights_<sector>_companies.csv`
pub fn weights_file_name(sector: &str) -> String {
    format!("Weights_{sector}_companies.csv")
}

/// Growable list of company rows, written out once at the end.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    rows: Vec<CompanySummary>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize `rows` for `ticker` and append the result.
    pub fn append_company(&mut self, ticker: &str, rows: &[AnnotatedHeadline]) -> &CompanySummary {
        self.rows.push(summarize_company(ticker, rows));
        &self.rows[self.rows.len() - 1]
    }

    pub fn rows(&self) -> &[CompanySummary] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Semicolon-delimited, header row first.
    pub fn to_writer<W: Write>(&self, w: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(w);
        if self.rows.is_empty() {
            wtr.write_record(HEADER)?;
        }
        for r in &self.rows {
            wtr.serialize(r).context("writing weight row")?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let f = std::fs::File::create(path)
            .with_context(|| format!("creating weights file {}", path.display()))?;
        self.to_writer(f)
            .with_context(|| format!("writing weights file {}", path.display()))
    }
}

const HEADER: [&str; 8] = [
    "Company",
    "Polarity",
    "Subjectivity",
    "Positive",
    "Negative",
    "Neutral",
    "Sentiment Score",
    "Datapoints",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_still_has_header() {
        let mut buf = Vec::new();
        WeightTable::new().to_writer(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Company;Polarity;Subjectivity;Positive;Negative;Neutral;Sentiment Score;Datapoints\n"
        );
    }

    #[test]
    fn nothing_annotated_leaves_means_empty() {
        let s = summarize_company("XOM", &[]);
        assert_eq!(s.polarity, None);
        assert_eq!(s.sentiment_score, None);
        assert_eq!(s.datapoints, 0);
    }

    #[test]
    fn file_name_pattern() {
        assert_eq!(weights_file_name("Tech"), "Weights_Tech_companies.csv");
    }
}
