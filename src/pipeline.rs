//! # Sector Pipeline
//! Headlines → annotation → weight row, for every company of one sector,
//! strictly one after another.

use anyhow::{Context, Result};
use metrics::gauge;
use std::path::{Path, PathBuf};

use crate::aggregate::{weights_file_name, WeightTable};
use crate::annotate::{annotate_headlines, StoryFetchError};
use crate::config::HeadlineSettings;
use crate::headlines::fetch_company_headlines;
use crate::provider::MarketDataProvider;
use crate::sentiment::SentimentAnalyzer;

#[derive(Debug, Clone, Default)]
pub struct SectorRun {
    pub sector: String,
    pub weights: WeightTable,
    /// Story fetch failures across all companies, in encounter order.
    pub errors: Vec<StoryFetchError>,
}

impl SectorRun {
    /// Write `Weights_<sector>_companies.csv` into `dir`.
    pub fn write_weights(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(weights_file_name(&self.sector));
        self.weights.write_csv(&path)?;
        tracing::info!(target: "pipeline", sector = %self.sector, path = %path.display(), rows = self.weights.len(), "weights written");
        Ok(path)
    }
}

pub async fn run_sector<P: MarketDataProvider + ?Sized>(
    provider: &P,
    analyzer: &SentimentAnalyzer,
    sector: &str,
    companies: &[String],
    settings: &HeadlineSettings,
) -> Result<SectorRun> {
    let mut run = SectorRun {
        sector: sector.to_string(),
        ..SectorRun::default()
    };

    for company in companies {
        let headlines = fetch_company_headlines(provider, company, settings)
            .await
            .with_context(|| format!("headlines for {company}"))?;
        let mut annotation = annotate_headlines(provider, analyzer, headlines).await;
        let summary = run.weights.append_company(company, &annotation.rows);
        tracing::info!(
            target: "pipeline",
            sector,
            company = %company,
            datapoints = summary.datapoints,
            score = ?summary.sentiment_score,
            "company summarized"
        );
        run.errors.append(&mut annotation.errors);
    }

    gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    Ok(run)
}
