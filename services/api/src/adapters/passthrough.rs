//! services/api/src/adapters/passthrough.rs
//!
//! Adapters for the outbound integrations that ride through the Pica
//! gateway. Each one forwards a request body to a fixed upstream with the
//! gateway credentials injected as headers and hands the upstream JSON back
//! verbatim. No retry, no backoff; the caller sees upstream failures as-is.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use estate_crm_core::ports::{
    AdsService, EmailSendRequest, EmailService, ExtractAction, ExtractRequest, ExtractionService,
    PortError, PortResult, SearchRequest, SearchService, SmsService, SmsWebhookRequest,
};

// Pica action ids are fixed per connector operation.
const MAILGUN_ACTION_ID: &str = "conn_mod_def::GDZyQu30Pmg::9nm34WfDS0mYXuJmihxLhg";
const TWILIO_ACTION_ID: &str = "conn_mod_def::GC7O6JcKir8::bb_ivBihQWG7I1-EjRVhzg";
const SERP_ACTION_ID: &str = "conn_mod_def::GCMod7dviGg::xZnK1c2iRYugO4QvBVtMUA";
const FIRECRAWL_CRAWL_ACTION_ID: &str = "conn_mod_def::GClH_mo3YYg::aIBsc5axSY6zSqWRu0s-hg";
const FIRECRAWL_SEARCH_ACTION_ID: &str = "conn_mod_def::GClH-wc_XMo::Lm5ew3DCSp2L1yETSndVHA";
const META_ACTION_ID: &str = "conn_mod_def::GCt0jtIxY_E::qgzgCmSdQ5KjxDIpoEXvYA";

//=========================================================================================
// Shared gateway plumbing
//=========================================================================================

/// Shared state for all Pica-backed adapters: one HTTP client plus the
/// gateway secret and per-connector connection keys from the configuration.
#[derive(Clone)]
pub struct PicaGateway {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl PicaGateway {
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Resolves the secret and the named connection key, or reports the
    /// integration as unconfigured.
    fn credentials(
        &self,
        connection_key: &Option<String>,
        integration: &str,
    ) -> PortResult<(String, String)> {
        let secret = self
            .config
            .pica_secret_key
            .clone()
            .ok_or_else(|| PortError::NotConfigured(integration.to_string()))?;
        let key = connection_key
            .clone()
            .ok_or_else(|| PortError::NotConfigured(integration.to_string()))?;
        Ok((secret, key))
    }

    fn apply_headers(
        request: reqwest::RequestBuilder,
        secret: &str,
        connection_key: &str,
        action_id: &str,
    ) -> reqwest::RequestBuilder {
        request
            .header("x-pica-secret", secret)
            .header("x-pica-connection-key", connection_key)
            .header("x-pica-action-id", action_id)
    }
}

async fn upstream_json(response: reqwest::Response) -> PortResult<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    if !status.is_success() {
        return Err(PortError::Unexpected(format!(
            "Upstream returned {status}: {body}"
        )));
    }
    Ok(body)
}

//=========================================================================================
// Mailgun (email)
//=========================================================================================

/// Sends email through Mailgun's messages endpoint. `email_data` fields map
/// to form fields; array values are appended once per element so multiple
/// recipients come through.
pub struct MailgunAdapter {
    gateway: PicaGateway,
}

impl MailgunAdapter {
    pub fn new(gateway: PicaGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl EmailService for MailgunAdapter {
    async fn send(&self, request: &EmailSendRequest) -> PortResult<Value> {
        let (secret, key) = self
            .gateway
            .credentials(&self.gateway.config.mailgun_connection_key, "mailgun")?;

        let mut form = reqwest::multipart::Form::new();
        if let Some(fields) = request.email_data.as_object() {
            for (name, value) in fields {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            form = form.text(name.clone(), text_of(item));
                        }
                    }
                    other => form = form.text(name.clone(), text_of(other)),
                }
            }
        }

        let url = format!(
            "{}/v3/{}/messages",
            self.gateway.config.mailgun_endpoint, request.domain
        );
        let response = PicaGateway::apply_headers(
            self.gateway.http.post(&url),
            &secret,
            &key,
            MAILGUN_ACTION_ID,
        )
        .multipart(form)
        .send()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        upstream_json(response).await
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//=========================================================================================
// Twilio Verify (sms webhook)
//=========================================================================================

/// Updates a Twilio Verify webhook; `data` is forwarded form-urlencoded.
pub struct TwilioAdapter {
    gateway: PicaGateway,
}

impl TwilioAdapter {
    pub fn new(gateway: PicaGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SmsService for TwilioAdapter {
    async fn update_webhook(&self, request: &SmsWebhookRequest) -> PortResult<Value> {
        let (secret, key) = self
            .gateway
            .credentials(&self.gateway.config.twilio_connection_key, "twilio")?;

        let url = format!(
            "https://verify.twilio.com/v2/Services/{}/Webhooks/{}",
            request.service_sid, request.sid
        );
        let form: Vec<(String, String)> = request
            .data
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), text_of(value)))
                    .collect()
            })
            .unwrap_or_default();

        let response = PicaGateway::apply_headers(
            self.gateway.http.post(&url),
            &secret,
            &key,
            TWILIO_ACTION_ID,
        )
        .header("Accept", "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        upstream_json(response).await
    }
}

//=========================================================================================
// SerpApi (web search)
//=========================================================================================

pub struct SerpAdapter {
    gateway: PicaGateway,
}

impl SerpAdapter {
    pub fn new(gateway: PicaGateway) -> Self {
        Self { gateway }
    }
}

/// Builds the SerpApi query string: `q` always, the supported options only
/// when present.
pub fn build_search_query(request: &SearchRequest) -> Vec<(String, String)> {
    let mut params = vec![("q".to_string(), request.query.clone())];
    let options = request.options.as_object().cloned().unwrap_or_default();
    for name in ["location", "google_domain", "gl", "hl", "device", "num", "start"] {
        if let Some(value) = options.get(name) {
            if !value.is_null() {
                params.push((name.to_string(), text_of(value)));
            }
        }
    }
    params
}

#[async_trait]
impl SearchService for SerpAdapter {
    async fn search(&self, request: &SearchRequest) -> PortResult<Value> {
        let (secret, key) = self
            .gateway
            .credentials(&self.gateway.config.serp_connection_key, "serp")?;

        let response = PicaGateway::apply_headers(
            self.gateway
                .http
                .get("https://api.picaos.com/v1/passthrough/search")
                .query(&build_search_query(request)),
            &secret,
            &key,
            SERP_ACTION_ID,
        )
        .send()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        upstream_json(response).await
    }
}

//=========================================================================================
// Firecrawl (site extraction)
//=========================================================================================

pub struct FirecrawlAdapter {
    gateway: PicaGateway,
}

impl FirecrawlAdapter {
    pub fn new(gateway: PicaGateway) -> Self {
        Self { gateway }
    }
}

/// Assembles the crawl request body, filling the scrape option defaults the
/// upstream expects (wait action, markdown output, Tunisian locale, stealth
/// proxy) where the caller left them unset.
pub fn build_crawl_params(request: &ExtractRequest) -> Value {
    let scrape = request.scrape_options.as_object().cloned().unwrap_or_default();
    let get = |name: &str| scrape.get(name).cloned();

    json!({
        "url": request.url,
        "webhook": request.webhook,
        "scrapeOptions": {
            "actions": [{ "type": "wait" }],
            "formats": get("formats").unwrap_or_else(|| json!(["markdown"])),
            "onlyMainContent": get("onlyMainContent").and_then(|v| v.as_bool()).unwrap_or(true),
            "includeTags": get("includeTags").unwrap_or_else(|| json!([])),
            "excludeTags": get("excludeTags").unwrap_or_else(|| json!([])),
            "headers": get("headers").unwrap_or_else(|| json!({})),
            "waitFor": get("waitFor").unwrap_or_else(|| json!(0)),
            "mobile": get("mobile").and_then(|v| v.as_bool()).unwrap_or(false),
            "skipTlsVerification": get("skipTlsVerification").and_then(|v| v.as_bool()).unwrap_or(false),
            "timeout": get("timeout").unwrap_or_else(|| json!(30_000)),
            "jsonOptions": get("jsonOptions").unwrap_or_else(|| json!({})),
            "location": get("location").unwrap_or_else(|| json!({ "country": "TN", "languages": ["fr"] })),
            "removeBase64Images": get("removeBase64Images").and_then(|v| v.as_bool()).unwrap_or(true),
            "blockAds": get("blockAds").and_then(|v| v.as_bool()).unwrap_or(true),
            "proxy": get("proxy").unwrap_or_else(|| json!("stealth")),
        },
        "excludePaths": request.exclude_paths,
        "includePaths": request.include_paths,
        "maxDepth": request.max_depth,
        "ignoreSitemap": request.ignore_sitemap,
        "ignoreQueryParameters": request.ignore_query_parameters,
        "limit": request.limit,
        "allowBackwardLinks": request.allow_backward_links,
        "allowExternalLinks": request.allow_external_links,
    })
}

/// Assembles the search request body. Result counts are capped at 10 per
/// call, the upstream maximum; `options` fields ride along untouched.
pub fn build_search_params(request: &ExtractRequest) -> Value {
    let mut params = json!({
        "query": request.query,
        "limit": request.limit.min(10),
        "start": request.start,
        "num": request.num.min(10),
    });
    if let (Some(target), Some(extra)) = (params.as_object_mut(), request.options.as_object()) {
        for (name, value) in extra {
            target.insert(name.clone(), value.clone());
        }
    }
    params
}

#[async_trait]
impl ExtractionService for FirecrawlAdapter {
    async fn extract(&self, request: &ExtractRequest) -> PortResult<Value> {
        let (secret, key) = self
            .gateway
            .credentials(&self.gateway.config.firecrawl_connection_key, "firecrawl")?;

        let (url, action_id, params, action_label) = match request.action {
            ExtractAction::Crawl => (
                "https://api.picaos.com/v1/passthrough/crawl",
                FIRECRAWL_CRAWL_ACTION_ID,
                build_crawl_params(request),
                "crawl",
            ),
            ExtractAction::Search => (
                "https://api.picaos.com/v1/passthrough/v1/search",
                FIRECRAWL_SEARCH_ACTION_ID,
                build_search_params(request),
                "search",
            ),
        };

        let response = PicaGateway::apply_headers(
            self.gateway.http.post(url).json(&params),
            &secret,
            &key,
            action_id,
        )
        .send()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut result = upstream_json(response).await?;
        if let Some(body) = result.as_object_mut() {
            body.insert(
                "_metadata".to_string(),
                json!({
                    "action": action_label,
                    "usedParams": params,
                    "timestamp": Utc::now().to_rfc3339(),
                }),
            );
        }
        Ok(result)
    }
}

//=========================================================================================
// Meta (ads account overview)
//=========================================================================================

const META_FIELDS: &str = "account_id,adset_id,bid_amount,campaign_id,configured_status,\
conversion_specs,created_time,creative,display_sequence,effective_status,id,\
last_updated_by_app_id,name,priority,recommendations,source_ad_id,status,targeting,\
tracking_specs,updated_time";

pub struct MetaAdapter {
    gateway: PicaGateway,
}

impl MetaAdapter {
    pub fn new(gateway: PicaGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AdsService for MetaAdapter {
    async fn account_overview(&self) -> PortResult<Value> {
        let (secret, key) = self
            .gateway
            .credentials(&self.gateway.config.meta_connection_key, "meta")?;

        let response = PicaGateway::apply_headers(
            self.gateway
                .http
                .get("https://api.picaos.com/v1/passthrough/me")
                .query(&[("fields", META_FIELDS)]),
            &secret,
            &key,
            META_ACTION_ID,
        )
        .header("content-type", "application/json")
        .send()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        upstream_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_request(action: ExtractAction) -> ExtractRequest {
        serde_json::from_value(json!({
            "action": match action {
                ExtractAction::Crawl => "crawl",
                ExtractAction::Search => "search",
            },
            "url": "https://tayara.tn",
            "query": "villa la marsa",
        }))
        .unwrap()
    }

    #[test]
    fn crawl_params_carry_the_upstream_defaults() {
        let params = build_crawl_params(&extract_request(ExtractAction::Crawl));
        let scrape = &params["scrapeOptions"];
        assert_eq!(scrape["actions"], json!([{ "type": "wait" }]));
        assert_eq!(scrape["formats"], json!(["markdown"]));
        assert_eq!(scrape["timeout"], json!(30_000));
        assert_eq!(scrape["proxy"], json!("stealth"));
        assert_eq!(scrape["location"]["country"], json!("TN"));
        assert_eq!(scrape["location"]["languages"], json!(["fr"]));
        assert_eq!(params["maxDepth"], json!(2));
        assert_eq!(params["limit"], json!(5));
    }

    #[test]
    fn crawl_params_respect_caller_overrides() {
        let mut request = extract_request(ExtractAction::Crawl);
        request.scrape_options = json!({
            "formats": ["html"],
            "timeout": 5000,
            "onlyMainContent": false,
        });
        let params = build_crawl_params(&request);
        let scrape = &params["scrapeOptions"];
        assert_eq!(scrape["formats"], json!(["html"]));
        assert_eq!(scrape["timeout"], json!(5000));
        assert_eq!(scrape["onlyMainContent"], json!(false));
        // Untouched defaults survive.
        assert_eq!(scrape["proxy"], json!("stealth"));
    }

    #[test]
    fn search_params_cap_result_counts_at_ten() {
        let mut request = extract_request(ExtractAction::Search);
        request.limit = 50;
        request.num = 99;
        request.options = json!({ "lang": "fr" });
        let params = build_search_params(&request);
        assert_eq!(params["limit"], json!(10));
        assert_eq!(params["num"], json!(10));
        assert_eq!(params["query"], json!("villa la marsa"));
        assert_eq!(params["lang"], json!("fr"));
    }

    #[test]
    fn serp_query_keeps_only_supported_options() {
        let request = SearchRequest {
            query: "immobilier tunis".to_string(),
            options: json!({
                "location": "Tunisia",
                "num": 20,
                "unsupported": "dropped",
                "gl": null,
            }),
        };
        let params = build_search_query(&request);
        assert_eq!(params[0], ("q".to_string(), "immobilier tunis".to_string()));
        assert!(params.contains(&("location".to_string(), "Tunisia".to_string())));
        assert!(params.contains(&("num".to_string(), "20".to_string())));
        assert!(!params.iter().any(|(name, _)| name == "unsupported"));
        assert!(!params.iter().any(|(name, _)| name == "gl"));
    }
}
