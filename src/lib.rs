// src/lib.rs
//! ESG social-news sentiment: headline paging, story scoring, per-company
//! weights, social-pillar scores and the cross-sector weights merge.

pub mod aggregate;
pub mod annotate;
pub mod config;
pub mod headlines;
pub mod merge;
pub mod pipeline;
pub mod provider;
pub mod sentiment;
pub mod social;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{summarize_company, CompanySummary, WeightTable};
pub use crate::annotate::{annotate_headlines, AnnotatedHeadline, Annotation, StoryFetchError};
pub use crate::headlines::fetch_company_headlines;
pub use crate::merge::{generate_aggregate_csv, generate_aggregate_csv_in, MergeOutcome};
pub use crate::pipeline::{run_sector, SectorRun};
pub use crate::provider::{Headline, MarketDataProvider};
pub use crate::sentiment::{SentimentAnalyzer, SentimentBucket};
pub use crate::social::{fetch_social_scores, SocialScoreRow, SocialScores};
