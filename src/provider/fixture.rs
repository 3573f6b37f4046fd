// src/provider/fixture.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::provider::{CrossSectionalResponse, Headline, MarketDataProvider};

/// Offline provider serving headlines, stories and a grid from memory.
///
/// Search honours `date_to` (inclusive) and `count` the way the live endpoint
/// does, so pagination behaves the same against a fixture. Headlines carrying
/// a `company` only match queries scoped to that company.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    headlines: Vec<Headline>,
    stories: HashMap<String, String>,
    grid: CrossSectionalResponse,
}

#[derive(Debug, Deserialize)]
struct FixtureDoc {
    #[serde(default)]
    headlines: Vec<Headline>,
    #[serde(default)]
    stories: HashMap<String, String>,
    #[serde(default)]
    grid: CrossSectionalResponse,
}

impl FixtureProvider {
    pub fn new(headlines: Vec<Headline>, stories: HashMap<String, String>) -> Self {
        Self {
            headlines,
            stories,
            grid: CrossSectionalResponse::default(),
        }
    }

    pub fn with_grid(mut self, grid: CrossSectionalResponse) -> Self {
        self.grid = grid;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: FixtureDoc = serde_json::from_str(s).context("parsing provider fixture")?;
        Ok(Self {
            headlines: doc.headlines,
            stories: doc.stories,
            grid: doc.grid,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading provider fixture {}", path.display()))?;
        Self::from_json_str(&s)
    }
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    async fn search_headlines(
        &self,
        query: &str,
        date_to: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Headline>> {
        let mut hits: Vec<Headline> = self
            .headlines
            .iter()
            .filter(|h| h.version_created <= date_to)
            .filter(|h| h.company.is_empty() || query.ends_with(&format!("R:{}", h.company)))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.version_created
                .cmp(&a.version_created)
                .then_with(|| a.story_id.cmp(&b.story_id))
        });
        hits.truncate(count);
        Ok(hits)
    }

    async fn fetch_story(&self, story_id: &str) -> Result<String> {
        self.stories
            .get(story_id)
            .cloned()
            .ok_or_else(|| anyhow!("story {story_id} is not available"))
    }

    async fn cross_sectional(
        &self,
        instruments: &[String],
        _fields: &[String],
        _parameters: &BTreeMap<String, String>,
    ) -> Result<CrossSectionalResponse> {
        let mut out = self.grid.clone();
        let keyed = out
            .table
            .headers
            .first()
            .is_some_and(|h| h.eq_ignore_ascii_case("instrument"));
        if keyed {
            out.table.rows.retain(|row| {
                row.first()
                    .and_then(|v| v.as_str())
                    .is_some_and(|id| instruments.iter().any(|i| i == id))
            });
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Fixture"
    }
}
