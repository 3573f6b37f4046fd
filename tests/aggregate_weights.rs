// tests/aggregate_weights.rs
mod common;

use common::hourly_headlines;
use esg_news_sentiment::aggregate::{summarize_company, weights_file_name, WeightTable};
use esg_news_sentiment::annotate::{AnnotatedHeadline, StorySentiment};
use esg_news_sentiment::sentiment::SentimentBucket;

fn rows(scored: &[(f64, SentimentBucket)]) -> Vec<AnnotatedHeadline> {
    hourly_headlines(scored.len())
        .into_iter()
        .zip(scored)
        .map(|(headline, &(polarity, bucket))| AnnotatedHeadline {
            headline,
            sentiment: Some(StorySentiment {
                news_text: "text".into(),
                polarity,
                subjectivity: 0.5,
                bucket,
            }),
        })
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn three_row_summary() {
    use SentimentBucket::*;
    let r = rows(&[(0.2, Positive), (0.4, Positive), (-0.3, Negative)]);
    let s = summarize_company("AAPL.O", &r);

    assert_eq!(s.company, "AAPL.O");
    assert!(close(s.polarity.unwrap(), 0.1));
    assert!(close(s.subjectivity.unwrap(), 0.5));
    assert_eq!((s.positive, s.negative, s.neutral), (2, 1, 0));
    assert!(close(s.sentiment_score.unwrap(), 0.55));
    assert_eq!(s.datapoints, 3);
}

#[test]
fn unannotated_rows_count_as_datapoints_only() {
    use SentimentBucket::*;
    let mut r = rows(&[(0.6, Positive), (0.0, Neutral)]);
    r[1].sentiment = None;
    let s = summarize_company("XOM", &r);
    assert!(close(s.polarity.unwrap(), 0.6));
    assert_eq!((s.positive, s.negative, s.neutral), (1, 0, 0));
    assert_eq!(s.datapoints, 2);
}

#[test]
fn accumulator_keeps_duplicates_in_call_order() {
    use SentimentBucket::*;
    let r = rows(&[(0.2, Positive)]);
    let mut table = WeightTable::new();
    table.append_company("AAPL.O", &r);
    table.append_company("MSFT.O", &r);
    table.append_company("AAPL.O", &r);

    let tickers: Vec<_> = table.rows().iter().map(|s| s.company.as_str()).collect();
    assert_eq!(tickers, vec!["AAPL.O", "MSFT.O", "AAPL.O"]);
}

#[test]
fn weights_csv_is_semicolon_delimited() {
    use SentimentBucket::*;
    let mut table = WeightTable::new();
    table.append_company("AAPL.O", &rows(&[(0.5, Positive), (-0.5, Negative)]));
    table.append_company("EMPTY", &[]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(weights_file_name("Tech"));
    table.write_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines[0],
        "Company;Polarity;Subjectivity;Positive;Negative;Neutral;Sentiment Score;Datapoints"
    );
    let first: Vec<_> = lines[1].split(';').collect();
    assert_eq!(first[0], "AAPL.O");
    assert!(close(first[1].parse().unwrap(), 0.0));
    assert!(close(first[2].parse().unwrap(), 0.5));
    assert_eq!(&first[3..6], &["1", "1", "0"]);
    assert!(close(first[6].parse().unwrap(), 0.5));
    assert_eq!(first[7], "2");
    assert_eq!(lines[2], "EMPTY;;;0;0;0;;0");
}
