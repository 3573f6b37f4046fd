// src/provider/data_proxy.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::provider::{
    CrossSectionalResponse, CrossSectionalTable, FieldError, Headline, MarketDataProvider,
};

const DATA_PATH: &str = "/api/v1/data";
const APP_KEY_HEADER: &str = "x-tr-applicationid";

/// Client for the desktop data proxy (`POST /api/v1/data`).
///
/// The session behind the proxy is assumed to be up; this type only forwards
/// the configured application key.
pub struct DataProxyProvider {
    client: reqwest::Client,
    endpoint: String,
    app_key: String,
}

impl DataProxyProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let app_key = cfg.resolve_app_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building data proxy http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", cfg.base_url.trim_end_matches('/'), DATA_PATH),
            app_key,
        })
    }

    async fn send(&self, directive: &str, payload: Value) -> Result<Value> {
        let body = envelope(directive, payload);
        tracing::debug!(target: "provider", directive, endpoint = %self.endpoint, "data proxy request");

        let resp = match self
            .client
            .post(&self.endpoint)
            .header(APP_KEY_HEADER, &self.app_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, provider = "DataProxy", directive, "provider http error");
                counter!("provider_errors_total").increment(1);
                return Err(e).with_context(|| format!("data proxy {directive} request"));
            }
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("data proxy {directive} response body"))?;
        decode_response(directive, status, &text)
    }
}

/// Status first, then JSON, then the proxy's own error envelope.
fn decode_response(directive: &str, status: StatusCode, text: &str) -> Result<Value> {
    if !status.is_success() {
        counter!("provider_errors_total").increment(1);
        tracing::warn!(provider = "DataProxy", directive, %status, "provider http status");
        bail!("data proxy {directive} returned {status}: {}", text.trim());
    }
    let value: Value = serde_json::from_str(text)
        .with_context(|| format!("data proxy {directive} response body"))?;
    check_proxy_error(&value)?;
    Ok(value)
}

#[async_trait]
impl MarketDataProvider for DataProxyProvider {
    async fn search_headlines(
        &self,
        query: &str,
        date_to: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Headline>> {
        let v = self
            .send("News_Headlines", headlines_payload(query, date_to, count, &self.app_key))
            .await?;
        parse_headlines(v)
    }

    async fn fetch_story(&self, story_id: &str) -> Result<String> {
        let payload = json!({
            "attributionCode": "",
            "productName": self.app_key,
            "storyId": story_id,
        });
        let v = self.send("News_Story", payload).await?;
        parse_story(v).with_context(|| format!("story {story_id}"))
    }

    async fn cross_sectional(
        &self,
        instruments: &[String],
        fields: &[String],
        parameters: &BTreeMap<String, String>,
    ) -> Result<CrossSectionalResponse> {
        let v = self
            .send("DataGrid_StandardAsync", grid_payload(instruments, fields, parameters))
            .await?;
        parse_grid(v)
    }

    fn name(&self) -> &'static str {
        "DataProxy"
    }
}

fn envelope(directive: &str, payload: Value) -> Value {
    json!({ "Entity": { "E": directive, "W": payload } })
}

fn check_proxy_error(v: &Value) -> Result<()> {
    if let Some(code) = v.get("ErrorCode") {
        let msg = v
            .get("ErrorMessage")
            .and_then(Value::as_str)
            .unwrap_or_default();
        counter!("provider_errors_total").increment(1);
        bail!("data proxy error {code}: {msg}");
    }
    Ok(())
}

fn headlines_payload(query: &str, date_to: DateTime<Utc>, count: usize, app_key: &str) -> Value {
    json!({
        "number": count.to_string(),
        "query": query,
        "productName": app_key,
        "attributionCode": "",
        "dateTo": date_to.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
    })
}

fn grid_payload(
    instruments: &[String],
    fields: &[String],
    parameters: &BTreeMap<String, String>,
) -> Value {
    let fields: Vec<Value> = fields.iter().map(|f| json!({ "name": f })).collect();
    json!({
        "requests": [{
            "instruments": instruments,
            "fields": fields,
            "parameters": parameters,
        }]
    })
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    headlines: Vec<Headline>,
}

fn parse_headlines(v: Value) -> Result<Vec<Headline>> {
    let resp: HeadlinesResponse =
        serde_json::from_value(v).context("parsing News_Headlines response")?;
    Ok(resp.headlines)
}

fn parse_story(v: Value) -> Result<String> {
    v.pointer("/story/storyHtml")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("News_Story response without story.storyHtml"))
}

#[derive(Debug, Deserialize)]
struct GridEnvelope {
    #[serde(default)]
    responses: Vec<GridResponse>,
}

#[derive(Debug, Deserialize)]
struct GridResponse {
    #[serde(default)]
    headers: Vec<Vec<GridHeader>>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    error: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct GridHeader {
    #[serde(rename = "displayName")]
    display_name: String,
}

fn parse_grid(v: Value) -> Result<CrossSectionalResponse> {
    let env: GridEnvelope = serde_json::from_value(v).context("parsing DataGrid response")?;
    let resp = env
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("DataGrid response without responses[0]"))?;
    let headers = resp
        .headers
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.display_name)
        .collect();
    Ok(CrossSectionalResponse {
        table: CrossSectionalTable {
            headers,
            rows: resp.data,
        },
        errors: resp.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn headlines_payload_carries_query_and_cutoff() {
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let p = headlines_payload("R:AAPL.O", to, 100, "key");
        assert_eq!(p["number"], "100");
        assert_eq!(p["query"], "R:AAPL.O");
        assert_eq!(p["dateTo"], "2024-01-01T00:00:00.000");
        let env = envelope("News_Headlines", p);
        assert_eq!(env["Entity"]["E"], "News_Headlines");
    }

    #[test]
    fn parses_headlines_and_story() {
        let v = json!({
            "headlines": [
                {"storyId": "urn:1", "versionCreated": "2023-12-29T10:00:00.000Z", "text": "A", "sourceCode": "NS:RTRS"},
                {"storyId": "urn:2", "versionCreated": "2023-12-28T09:30:00.000Z", "text": "B"}
            ]
        });
        let hs = parse_headlines(v).unwrap();
        assert_eq!(hs.len(), 2);
        assert_eq!(hs[1].story_id, "urn:2");
        assert!(hs[0].company.is_empty());

        let story = json!({"story": {"headlineHtml": "<h1>A</h1>", "storyHtml": "<p>body</p>"}});
        assert_eq!(parse_story(story).unwrap(), "<p>body</p>");
        assert!(parse_story(json!({"story": {}})).is_err());
    }

    #[test]
    fn parses_grid_with_errors() {
        let v = json!({
            "responses": [{
                "headers": [[{"displayName": "Instrument"}, {"displayName": "Date"}, {"displayName": "Social Pillar Score"}]],
                "data": [["AAPL.O", "2023-12-31T00:00:00Z", 61.5]],
                "error": [{"code": 416, "col": 2, "row": 1, "message": "Unable to collect data"}]
            }]
        });
        let out = parse_grid(v).unwrap();
        assert_eq!(out.table.headers, vec!["Instrument", "Date", "Social Pillar Score"]);
        assert_eq!(out.table.rows.len(), 1);
        assert_eq!(out.errors[0].code, 416);
    }

    #[test]
    fn proxy_error_is_reported() {
        let v = json!({"ErrorCode": 401, "ErrorMessage": "Eikon Proxy not running"});
        let err = check_proxy_error(&v).unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn failed_status_keeps_code_and_body() {
        let err = decode_response(
            "News_Story",
            StatusCode::BAD_GATEWAY,
            "<html>upstream down</html>\n",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn ok_status_decodes_json() {
        let v = decode_response("News_Story", StatusCode::OK, r#"{"story":{"storyHtml":"x"}}"#)
            .unwrap();
        assert_eq!(parse_story(v).unwrap(), "x");
        assert!(decode_response("News_Story", StatusCode::OK, "not json").is_err());
    }
}
