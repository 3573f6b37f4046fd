// src/config/pipeline.rs
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "ESG_PIPELINE_CONFIG";
pub const ENV_APP_KEY: &str = "ESG_APP_KEY";
const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub provider: ProviderConfig,
    pub headlines: HeadlineSettings,
    pub social: SocialSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// "ENV" means: read from `ESG_APP_KEY`.
    pub app_key: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            app_key: "ENV".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn resolve_app_key(&self) -> Result<String> {
        if self.app_key.trim().eq_ignore_ascii_case("env") {
            return env::var(ENV_APP_KEY).map_err(|_| anyhow!("Missing {ENV_APP_KEY} env var"));
        }
        Ok(self.app_key.clone())
    }
}

/// Headline paging window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlineSettings {
    /// Newest timestamp requested; paging walks backwards from here.
    pub cutoff: DateTime<Utc>,
    pub page_size: usize,
    /// Unbounded when `None`.
    pub max_pages: Option<usize>,
}

impl Default for HeadlineSettings {
    fn default() -> Self {
        Self {
            cutoff: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            page_size: 100,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSettings {
    pub fields: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for SocialSettings {
    fn default() -> Self {
        Self {
            fields: vec![
                "TR.TRESGScore.date".to_string(),
                "TR.SocialPillarScore".to_string(),
            ],
            start_date: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        }
    }
}

impl SocialSettings {
    /// `SDate`/`EDate` request parameters.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("SDate".to_string(), self.start_date.format("%Y-%m-%d").to_string()),
            ("EDate".to_string(), self.end_date.format("%Y-%m-%d").to_string()),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where sector weight files are written and merged from.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: PipelineConfig = toml::from_str(s).context("parsing pipeline config")?;
        if cfg.headlines.page_size == 0 {
            cfg.headlines.page_size = HeadlineSettings::default().page_size;
        }
        if cfg.social.start_date > cfg.social.end_date {
            std::mem::swap(&mut cfg.social.start_date, &mut cfg.social.end_date);
        }
        Ok(cfg)
    }
}

pub fn load_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    PipelineConfig::parse(&content)
}

/// Load config using env var + fallbacks:
/// 1) $ESG_PIPELINE_CONFIG
/// 2) config/pipeline.toml
/// 3) built-in defaults
pub fn load_default() -> Result<PipelineConfig> {
    if let Ok(p) = env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if p.exists() {
        return load_from(&p);
    }
    Ok(PipelineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::parse(
            r#"
[headlines]
page_size = 50

[social]
start_date = "2023-12-31"
end_date = "2022-12-31"
"#,
        )
        .unwrap();
        assert_eq!(cfg.headlines.page_size, 50);
        assert_eq!(cfg.headlines.cutoff, HeadlineSettings::default().cutoff);
        assert!(cfg.headlines.max_pages.is_none());
        // swapped back into a valid window
        assert_eq!(cfg.social.start_date, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(cfg.social.fields.len(), 2);
        assert_eq!(cfg.provider.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn zero_page_size_falls_back() {
        let cfg = PipelineConfig::parse("[headlines]\npage_size = 0\n").unwrap();
        assert_eq!(cfg.headlines.page_size, 100);
    }

    #[test]
    fn literal_app_key_is_used_as_is() {
        let p = ProviderConfig {
            app_key: "abc123".into(),
            ..ProviderConfig::default()
        };
        assert_eq!(p.resolve_app_key().unwrap(), "abc123");
    }

    #[test]
    fn social_parameters_use_iso_dates() {
        let params = SocialSettings::default().parameters();
        assert_eq!(params["SDate"], "2022-12-31");
        assert_eq!(params["EDate"], "2023-12-31");
    }
}
