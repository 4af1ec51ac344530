//! crates/estate_crm_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the JSON
//! file store or third-party APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{
    AiProvider, AiProviderKind, Campaign, IntegrationConfig, Mandate, MatchScore, Opportunity,
    OpportunityType, Property, Prospect,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Integration not configured: {0}")]
    NotConfigured(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistent collection keys
//=========================================================================================

/// Keys of the persisted collections. The names mirror the storage keys the
/// original browser profile used, so exported data stays interchangeable.
pub mod keys {
    pub const PROPERTIES: &str = "crm-properties";
    pub const PROSPECTS: &str = "crm-prospects";
    pub const MANDATES: &str = "crm-mandates";
    pub const OPPORTUNITIES: &str = "crm-opportunities";
    pub const CAMPAIGNS: &str = "crm-campaigns";
    pub const AI_PROVIDERS: &str = "crm-ai-providers";
    pub const INTEGRATIONS: &str = "crm-integrations";

    // Opaque settings blobs, read and written without a schema.
    pub const ZONES: &str = "crm-zones";
    pub const MAP_PROVIDER: &str = "crm-map-provider";
    pub const GOOGLE_MAPS_KEY: &str = "crm-google-maps-api-key";
}

//=========================================================================================
// Storage port and change notification
//=========================================================================================

/// Observer for collection changes. Observers are notified synchronously
/// after a successful write, in registration order. Notification carries the
/// collection key only; observers re-read the collection (last write wins).
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, key: &str);
}

/// The repository owning read/write/notify semantics for all persisted
/// collections. Readers must tolerate absent or malformed state by falling
/// back to the empty collection.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn load_properties(&self) -> PortResult<Vec<Property>>;
    async fn save_properties(&self, items: &[Property]) -> PortResult<()>;

    async fn load_prospects(&self) -> PortResult<Vec<Prospect>>;
    async fn save_prospects(&self, items: &[Prospect]) -> PortResult<()>;

    async fn load_mandates(&self) -> PortResult<Vec<Mandate>>;
    async fn save_mandates(&self, items: &[Mandate]) -> PortResult<()>;

    async fn load_opportunities(&self) -> PortResult<Vec<Opportunity>>;
    async fn save_opportunities(&self, items: &[Opportunity]) -> PortResult<()>;

    async fn load_campaigns(&self) -> PortResult<Vec<Campaign>>;
    async fn save_campaigns(&self, items: &[Campaign]) -> PortResult<()>;

    async fn load_ai_providers(&self) -> PortResult<Vec<AiProvider>>;
    async fn save_ai_providers(&self, items: &[AiProvider]) -> PortResult<()>;

    async fn load_integrations(&self) -> PortResult<Vec<IntegrationConfig>>;
    async fn save_integrations(&self, items: &[IntegrationConfig]) -> PortResult<()>;

    /// Opaque settings blobs (map provider choice, API keys, zone lists...).
    async fn load_blob(&self, key: &str) -> PortResult<Option<Value>>;
    async fn save_blob(&self, key: &str, value: &Value) -> PortResult<()>;

    fn register_observer(&self, observer: Arc<dyn ChangeObserver>);
}

//=========================================================================================
// Scoring ports
//=========================================================================================

/// Pluggable compatibility scoring strategy between a property and a
/// prospect. `None` is the no-match sentinel: callers treat it as score 0
/// with an empty reason list.
pub trait MatchScoringService: Send + Sync {
    fn score_match(&self, property: &Property, prospect: &Prospect) -> Option<MatchScore>;
}

/// Attributes of an opportunity being generated, handed to the scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub kind: OpportunityType,
    pub location: &'a str,
    pub price: Option<u64>,
}

/// Injectable scoring function for generated opportunities.
///
/// The default implementation draws uniform noise in [60, 100], deliberately
/// independent of the generated attributes. That independence is part of the
/// simulator's observable behavior; a real heuristic can be swapped in here
/// without touching the generator.
pub trait OpportunityScorer: Send + Sync {
    fn score(&self, rng: &mut dyn rand::RngCore, inputs: &ScoreInputs<'_>) -> u8;
}

//=========================================================================================
// AI analysis port
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Property,
    Lead,
}

/// A request to analyze a record (property or lead) with an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub data: Value,
    #[serde(default = "AnalysisRequest::default_type")]
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub criteria: Value,
    #[serde(default = "AnalysisRequest::default_provider")]
    pub ai_provider: AiProviderKind,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

impl AnalysisRequest {
    fn default_type() -> AnalysisType {
        AnalysisType::Property
    }

    fn default_provider() -> AiProviderKind {
        AiProviderKind::OpenAi
    }
}

/// The structured result extracted from the model's reply, either parsed as
/// JSON or recovered by best-effort text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnalysis {
    pub score: u8,
    pub category: String,
    pub summary: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> PortResult<StructuredAnalysis>;
}

//=========================================================================================
// Passthrough integration ports
//=========================================================================================
// Each forwards a request body to a fixed upstream with injected credentials
// and returns the upstream JSON verbatim. No retry, no backoff.
//=========================================================================================

/// Email sending (Mailgun). `email_data` fields are forwarded as form fields;
/// array values are appended repeatedly (multiple recipients).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendRequest {
    pub domain: String,
    pub email_data: Value,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, request: &EmailSendRequest) -> PortResult<Value>;
}

/// Twilio Verify webhook update: `data` is forwarded form-urlencoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsWebhookRequest {
    pub service_sid: String,
    pub sid: String,
    pub data: Value,
}

#[async_trait]
pub trait SmsService: Send + Sync {
    async fn update_webhook(&self, request: &SmsWebhookRequest) -> PortResult<Value>;
}

/// SerpApi-style web search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub options: Value,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> PortResult<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractAction {
    Search,
    Crawl,
}

/// Firecrawl-style search/crawl extraction request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default = "ExtractRequest::default_action")]
    pub action: ExtractAction,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "ExtractRequest::default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub start: u32,
    #[serde(default = "ExtractRequest::default_num")]
    pub num: u32,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub scrape_options: Value,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default = "ExtractRequest::default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub ignore_sitemap: bool,
    #[serde(default)]
    pub ignore_query_parameters: bool,
    #[serde(default)]
    pub allow_backward_links: bool,
    #[serde(default)]
    pub allow_external_links: bool,
}

impl ExtractRequest {
    fn default_action() -> ExtractAction {
        ExtractAction::Search
    }

    fn default_limit() -> u32 {
        5
    }

    fn default_num() -> u32 {
        10
    }

    fn default_max_depth() -> u32 {
        2
    }
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> PortResult<Value>;
}

/// Social-ads account query (Meta).
#[async_trait]
pub trait AdsService: Send + Sync {
    async fn account_overview(&self) -> PortResult<Value>;
}
