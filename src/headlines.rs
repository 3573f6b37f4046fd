//! # Headline Fetcher
//! Walks the news search backwards in time for one company.
//!
//! Each page ends at the oldest timestamp of the previous one. The walk stops
//! when a page comes back empty or when its oldest-timestamp stories are the
//! same ones already sitting at the bottom of the accumulated result: the
//! provider has nothing older to give.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::collections::BTreeSet;

use crate::config::HeadlineSettings;
use crate::provider::{Headline, MarketDataProvider};
use crate::telemetry::ensure_metrics_described;

/// ESG social topic, English only, scoped to one company RIC.
pub fn company_query(company: &str) -> String {
    format!("PresetTopic:[ESG: Social] AND Language:LEN AND R:{company}")
}

/// Oldest `version_created` in a set of headlines.
pub fn oldest_timestamp(headlines: &[Headline]) -> Option<DateTime<Utc>> {
    headlines.iter().map(|h| h.version_created).min()
}

/// Story ids sharing the oldest timestamp.
pub fn oldest_story_ids(headlines: &[Headline]) -> BTreeSet<String> {
    match oldest_timestamp(headlines) {
        Some(min) => headlines
            .iter()
            .filter(|h| h.version_created == min)
            .map(|h| h.story_id.clone())
            .collect(),
        None => BTreeSet::new(),
    }
}

/// Fetch every ESG-social headline for `company` up to `settings.cutoff`.
///
/// Pages are concatenated as returned; stories on a page boundary can appear
/// twice. Provider errors propagate.
pub async fn fetch_company_headlines<P: MarketDataProvider + ?Sized>(
    provider: &P,
    company: &str,
    settings: &HeadlineSettings,
) -> Result<Vec<Headline>> {
    ensure_metrics_described();

    let query = company_query(company);
    let mut date_to = settings.cutoff;
    let mut pages = 1usize;

    let mut page = search_page(provider, &query, date_to, settings.page_size).await?;
    let mut acc: Vec<Headline> = Vec::new();

    while !page.is_empty() {
        if let Some(min) = oldest_timestamp(&page) {
            // never move forward, even if the provider ignores date_to
            date_to = date_to.min(min);
        }
        tracing::info!(
            target: "headlines",
            company,
            page = pages,
            size = page.len(),
            date_to = %date_to,
            "headline page"
        );
        acc.append(&mut page);
        let boundary = oldest_story_ids(&acc);

        if settings.max_pages.is_some_and(|max| pages >= max) {
            tracing::warn!(target: "headlines", company, pages, "page limit reached");
            break;
        }

        let next = search_page(provider, &query, date_to, settings.page_size).await?;
        pages += 1;
        if next.is_empty() || oldest_story_ids(&next) == boundary {
            break;
        }
        page = next;
    }

    for h in acc.iter_mut() {
        h.company = company.to_string();
    }
    counter!("headlines_fetched_total").increment(acc.len() as u64);
    tracing::info!(target: "headlines", company, pages, total = acc.len(), "headlines fetched");
    Ok(acc)
}

async fn search_page<P: MarketDataProvider + ?Sized>(
    provider: &P,
    query: &str,
    date_to: DateTime<Utc>,
    count: usize,
) -> Result<Vec<Headline>> {
    counter!("headline_pages_total").increment(1);
    provider
        .search_headlines(query, date_to, count)
        .await
        .with_context(|| format!("{} news search until {date_to}", provider.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn h(id: &str, hour: u32) -> Headline {
        Headline {
            story_id: id.to_string(),
            version_created: Utc.with_ymd_and_hms(2023, 6, 1, hour, 0, 0).unwrap(),
            text: format!("headline {id}"),
            company: String::new(),
        }
    }

    #[test]
    fn query_is_scoped_to_company() {
        assert_eq!(
            company_query("TSLA.O"),
            "PresetTopic:[ESG: Social] AND Language:LEN AND R:TSLA.O"
        );
    }

    #[test]
    fn oldest_ids_collect_ties() {
        let hs = vec![h("a", 5), h("b", 1), h("c", 1), h("d", 3)];
        let ids = oldest_story_ids(&hs);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["b", "c"]);
        assert!(oldest_story_ids(&[]).is_empty());
        assert_eq!(oldest_timestamp(&hs), Some(hs[1].version_created));
    }
}
