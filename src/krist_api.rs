use crate::config::Config;
use crate::debug::{self, cat};
use crate::endpoint::{LookupEndpoint, LookupError};
use crate::net::send_with_backoff;
use crate::options::{LookupFilters, LookupOptions};
use crate::types::{KristBlock, LookupResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Wire shape of `/lookup/blocks`. Failures come back as `{ ok: false, error, message }`.
#[derive(Debug, Deserialize)]
struct LookupBlocksResponse {
    ok: bool,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    blocks: Vec<KristBlock>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the Krist node lookup API.
#[derive(Clone, Debug)]
pub struct KristClient {
    base_url: String,
    timeout_ms: u64,
    retries: u8,
    http: reqwest::Client,
}

impl KristClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64, retries: u8) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .user_agent(concat!("kristx/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
            retries,
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.node_url.clone(), cfg.timeout_ms, cfg.retries)
    }

    /// `/lookup/blocks`, with a comma-separated address segment when filtering.
    pub fn lookup_url(&self, filters: &LookupFilters) -> String {
        if filters.is_empty() {
            format!("{}/lookup/blocks", self.base_url)
        } else {
            format!(
                "{}/lookup/blocks/{}",
                self.base_url,
                urlencoding::encode(&filters.addresses.join(","))
            )
        }
    }

    pub async fn lookup_blocks(
        &self,
        options: &LookupOptions,
    ) -> Result<LookupResult<KristBlock>, LookupError> {
        let url = self.lookup_url(options.filters());
        let request = self
            .http
            .get(&url)
            .query(&[
                ("limit", options.limit().to_string()),
                ("offset", options.offset().to_string()),
                ("orderBy", options.order_by().as_str().to_string()),
                ("order", options.order().as_api_str().to_string()),
            ])
            .timeout(Duration::from_millis(self.timeout_ms));

        if debug::is(cat::NET) {
            debug::log(
                cat::NET,
                format!(
                    "GET {url} limit={} offset={} orderBy={} order={}",
                    options.limit(),
                    options.offset(),
                    options.order_by(),
                    options.order().as_api_str()
                ),
            );
        }

        let response = send_with_backoff(request, "lookup/blocks", self.retries)
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        parse_lookup_response(status, &body)
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout_ms)
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl LookupEndpoint for KristClient {
    type Item = KristBlock;

    async fn lookup(
        &self,
        options: &LookupOptions,
    ) -> Result<LookupResult<KristBlock>, LookupError> {
        self.lookup_blocks(options).await
    }
}

/// Turn a `/lookup/blocks` response into a page or an error.
pub fn parse_lookup_response(
    status: u16,
    body: &str,
) -> Result<LookupResult<KristBlock>, LookupError> {
    let parsed: LookupBlocksResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            if !(200..300).contains(&status) {
                return Err(LookupError::Http {
                    status,
                    message: body.trim().chars().take(200).collect(),
                });
            }
            return Err(LookupError::Decode(e.to_string()));
        }
    };

    if !parsed.ok {
        let code = parsed.error.unwrap_or_else(|| "unknown_error".to_string());
        let message = parsed.message.unwrap_or_else(|| code.clone());
        return Err(LookupError::Api { code, message });
    }
    if !(200..300).contains(&status) {
        return Err(LookupError::Http {
            status,
            message: "unexpected status for ok response".to_string(),
        });
    }

    let total = parsed
        .total
        .ok_or_else(|| LookupError::Decode("missing total".to_string()))?;
    let count = parsed.count.unwrap_or(parsed.blocks.len() as u64);
    if count != parsed.blocks.len() as u64 {
        log::warn!(
            "lookup/blocks count {} disagrees with {} blocks returned",
            count,
            parsed.blocks.len()
        );
    }

    Ok(LookupResult::new(parsed.blocks, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "ok": true,
        "count": 2,
        "total": 5000,
        "blocks": [
            {"height": 5000, "address": "kfoo000000", "hash": "000000000abc1234567890abcdef1234567890abcdef1234567890abcdef1234", "short_hash": "000000000abc", "value": 25, "time": "2021-02-03T04:05:06.000Z", "difficulty": 400000},
            {"height": 4999, "address": null, "hash": null, "short_hash": null, "value": 25, "time": "2021-02-03T04:04:06.000Z", "difficulty": 400000}
        ]
    }"#;

    #[test]
    fn parses_page() {
        let page = parse_lookup_response(200, PAGE).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.total, 5000);
        assert_eq!(page.items[0].height, 5000);
        assert_eq!(page.items[0].short_hash.as_deref(), Some("000000000abc"));
        assert!(page.items[1].address.is_none());
    }

    #[test]
    fn api_error_keeps_code_and_message() {
        let err = parse_lookup_response(
            400,
            r#"{"ok": false, "error": "invalid_parameter", "message": "Invalid parameter limit"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LookupError::Api {
                code: "invalid_parameter".into(),
                message: "Invalid parameter limit".into()
            }
        );
    }

    #[test]
    fn non_json_error_is_http() {
        let err = parse_lookup_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, LookupError::Http { status: 502, .. }));
    }

    #[test]
    fn garbage_success_is_decode_error() {
        let err = parse_lookup_response(200, "{\"ok\": true, \"blocks\": 7}").unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));

        let err = parse_lookup_response(200, "{\"ok\": true, \"blocks\": []}").unwrap_err();
        assert_eq!(err, LookupError::Decode("missing total".into()));
    }

    #[test]
    fn url_includes_address_filter() {
        let client = KristClient::new("https://krist.dev/", 8000, 0).unwrap();
        assert_eq!(
            client.lookup_url(&LookupFilters::default()),
            "https://krist.dev/lookup/blocks"
        );
        assert_eq!(
            client.lookup_url(&LookupFilters::addresses(["kfoo000000", "kbar000000"])),
            "https://krist.dev/lookup/blocks/kfoo000000%2Ckbar000000"
        );
    }
}
