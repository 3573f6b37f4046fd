// src/provider/mod.rs
//! Market-data provider seam: news search, story bodies, cross-sectional grids.
//!
//! Everything the pipeline needs from the vendor goes through
//! [`MarketDataProvider`], so the HTTP client and test doubles are
//! interchangeable.

pub mod data_proxy;
pub mod fixture;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use data_proxy::DataProxyProvider;
pub use fixture::FixtureProvider;

/// One news headline as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub story_id: String,
    pub version_created: DateTime<Utc>,
    pub text: String,
    /// Company the search query was built for; filled in by the fetcher.
    #[serde(default)]
    pub company: String,
}

/// Raw grid returned by the cross-sectional data call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrossSectionalTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Per-field error reported by the provider next to the data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub col: Option<usize>,
    #[serde(default)]
    pub row: Option<usize>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrossSectionalResponse {
    pub table: CrossSectionalTable,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to `count` headlines matching `query`, created at or before `date_to`,
    /// newest first.
    async fn search_headlines(
        &self,
        query: &str,
        date_to: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Headline>>;

    /// Raw story markup for a story identifier.
    async fn fetch_story(&self, story_id: &str) -> Result<String>;

    async fn cross_sectional(
        &self,
        instruments: &[String],
        fields: &[String],
        parameters: &BTreeMap<String, String>,
    ) -> Result<CrossSectionalResponse>;

    fn name(&self) -> &'static str;
}
