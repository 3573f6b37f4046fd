// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use esg_news_sentiment::provider::{
    CrossSectionalResponse, FixtureProvider, Headline, MarketDataProvider,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Fixture-backed provider that records every call.
pub struct RecordingProvider {
    inner: FixtureProvider,
    pub searches: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub fetches: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new(inner: FixtureProvider) -> Self {
        Self {
            inner,
            searches: Mutex::new(vec![]),
            fetches: Mutex::new(vec![]),
        }
    }

    pub fn search_dates(&self) -> Vec<DateTime<Utc>> {
        self.searches.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

#[async_trait]
impl MarketDataProvider for RecordingProvider {
    async fn search_headlines(
        &self,
        query: &str,
        date_to: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Headline>> {
        self.searches.lock().unwrap().push((query.to_string(), date_to));
        self.inner.search_headlines(query, date_to, count).await
    }

    async fn fetch_story(&self, story_id: &str) -> Result<String> {
        self.fetches.lock().unwrap().push(story_id.to_string());
        self.inner.fetch_story(story_id).await
    }

    async fn cross_sectional(
        &self,
        instruments: &[String],
        fields: &[String],
        parameters: &BTreeMap<String, String>,
    ) -> Result<CrossSectionalResponse> {
        self.inner.cross_sectional(instruments, fields, parameters).await
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap()
}

/// `n` headlines one hour apart, newest first (`s0` is the newest).
pub fn hourly_headlines(n: usize) -> Vec<Headline> {
    (0..n)
        .map(|i| Headline {
            story_id: format!("s{i}"),
            version_created: base_time() - Duration::hours(i as i64),
            text: format!("Headline {i}"),
            company: String::new(),
        })
        .collect()
}

pub fn headline(id: &str, version_created: DateTime<Utc>) -> Headline {
    Headline {
        story_id: id.to_string(),
        version_created,
        text: format!("Headline {id}"),
        company: String::new(),
    }
}

/// Story bodies for every headline, all with the same markup.
pub fn stories_for(headlines: &[Headline], markup: &str) -> HashMap<String, String> {
    headlines
        .iter()
        .map(|h| (h.story_id.clone(), markup.to_string()))
        .collect()
}
