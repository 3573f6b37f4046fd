//! # Sentiment Annotator
//! Pulls the full story behind every headline and scores it.
//!
//! Stories are fetched one at a time, in input order, without retry. A story
//! that cannot be fetched leaves its row unannotated and lands in
//! [`Annotation::errors`] instead of failing the batch.

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use crate::provider::{Headline, MarketDataProvider};
use crate::sentiment::{SentimentAnalyzer, SentimentBucket};
use crate::telemetry::ensure_metrics_described;

/// Fields derived from one story body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySentiment {
    pub news_text: String,
    pub polarity: f64,
    pub subjectivity: f64,
    pub bucket: SentimentBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedHeadline {
    pub headline: Headline,
    /// `None` when the story could not be fetched or had no text.
    pub sentiment: Option<StorySentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryFetchError {
    pub story_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Annotation {
    pub rows: Vec<AnnotatedHeadline>,
    pub errors: Vec<StoryFetchError>,
}

impl Annotation {
    pub fn annotated_count(&self) -> usize {
        self.rows.iter().filter(|r| r.sentiment.is_some()).count()
    }
}

/// Story markup → plain text: drop script/style blocks and tags, decode
/// entities, collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let re_blocks = RE_BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap()
    });
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<!--.*?-->|</?[^>]+>").unwrap());
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let out = re_blocks.replace_all(html, " ");
    // tags become spaces so adjacent block elements don't glue words together
    let out = re_tags.replace_all(&out, " ");
    let out = html_escape::decode_html_entities(&out)
        .replace('\u{00A0}', " ")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Fetch and score every headline's story.
pub async fn annotate_headlines<P: MarketDataProvider + ?Sized>(
    provider: &P,
    analyzer: &SentimentAnalyzer,
    headlines: Vec<Headline>,
) -> Annotation {
    ensure_metrics_described();

    let mut out = Annotation {
        rows: Vec::with_capacity(headlines.len()),
        errors: Vec::new(),
    };

    for headline in headlines {
        counter!("story_fetch_total").increment(1);
        let sentiment = match provider.fetch_story(&headline.story_id).await {
            Ok(markup) => score_story(analyzer, &markup),
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(
                    target: "annotate",
                    story_id = %headline.story_id,
                    provider = provider.name(),
                    error = %message,
                    "story fetch failed"
                );
                counter!("story_fetch_errors_total").increment(1);
                out.errors.push(StoryFetchError {
                    story_id: headline.story_id.clone(),
                    message,
                });
                None
            }
        };
        out.rows.push(AnnotatedHeadline { headline, sentiment });
    }

    tracing::info!(
        target: "annotate",
        rows = out.rows.len(),
        annotated = out.annotated_count(),
        errors = out.errors.len(),
        "annotation done"
    );
    out
}

fn score_story(analyzer: &SentimentAnalyzer, markup: &str) -> Option<StorySentiment> {
    let news_text = strip_markup(markup);
    if news_text.is_empty() {
        tracing::debug!(target: "annotate", "empty story body");
        return None;
    }
    let s = analyzer.analyze(&news_text);
    Some(StorySentiment {
        news_text,
        polarity: s.polarity,
        subjectivity: s.subjectivity,
        bucket: s.bucket(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_scripts_and_entities() {
        let html = r#"<html><head><style>p { color: red }</style><script>var x = "<b>";</script></head>
<body><p>Workers&nbsp;&amp; unions</p><p>welcome the deal</p><!-- tracking --></body></html>"#;
        assert_eq!(strip_markup(html), "Workers & unions welcome the deal");
    }

    #[test]
    fn escaped_markup_stays_text() {
        assert_eq!(strip_markup("a &lt;b&gt; c"), "a <b> c");
    }

    #[test]
    fn empty_body_is_not_scored() {
        let a = SentimentAnalyzer::new();
        assert!(score_story(&a, "<div>  </div>").is_none());
        let s = score_story(&a, "<p>An excellent year</p>").unwrap();
        assert_eq!(s.bucket, SentimentBucket::Positive);
        assert_eq!(s.news_text, "An excellent year");
    }
}
