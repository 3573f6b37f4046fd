use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Polarity at or above this is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Polarity at or below this is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, Deserialize)]
struct Entry {
    polarity: f64,
    subjectivity: f64,
}

#[derive(Debug, Deserialize)]
struct Lexicon {
    words: HashMap<String, Entry>,
    intensifiers: HashMap<String, f64>,
}

static LEXICON: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<Lexicon>(raw).expect("valid sentiment lexicon")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBucket {
    Positive,
    Neutral,
    Negative,
}

impl SentimentBucket {
    /// `>= 0.05` positive, strictly between the thresholds neutral, anything
    /// else (including exactly -0.05) negative.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if NEGATIVE_THRESHOLD < polarity && polarity < POSITIVE_THRESHOLD {
            Self::Neutral
        } else {
            Self::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sentiment {
    /// In [-1, 1].
    pub polarity: f64,
    /// In [0, 1].
    pub subjectivity: f64,
}

impl Sentiment {
    pub fn bucket(&self) -> SentimentBucket {
        SentimentBucket::from_polarity(self.polarity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Average of the per-word assessments found in the lexicon.
    ///
    /// An intensifier right before a word scales both values; a negator in
    /// the previous 1..=3 tokens flips polarity and halves it.
    pub fn analyze(&self, text: &str) -> Sentiment {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum_p = 0.0f64;
        let mut sum_s = 0.0f64;
        let mut n = 0usize;

        for i in 0..tokens.len() {
            let Some(entry) = LEXICON.words.get(tokens[i].as_str()) else {
                continue;
            };
            let mut p = entry.polarity;
            let mut s = entry.subjectivity;

            if i >= 1 {
                if let Some(&factor) = LEXICON.intensifiers.get(tokens[i - 1].as_str()) {
                    p *= factor;
                    s *= factor;
                }
            }

            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                p *= -0.5;
            }

            sum_p += p.clamp(-1.0, 1.0);
            sum_s += s.clamp(0.0, 1.0);
            n += 1;
        }

        if n == 0 {
            return Sentiment::default();
        }
        Sentiment {
            polarity: sum_p / n as f64,
            subjectivity: sum_s / n as f64,
        }
    }
}

/// Alphanumeric tokens (inner apostrophes kept), lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\u{2019}', "'").to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(tok, "not" | "no" | "never" | "without" | "cannot" | "nor")
        || tok.ends_with("n't")
}
