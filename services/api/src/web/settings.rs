//! services/api/src/web/settings.rs
//!
//! Handlers for the persisted settings surface: the AI provider and
//! integration collections (replaced wholesale on PUT, the way the settings
//! screens save them) and the opaque keyed blobs (zone list, map provider
//! choice, map API key).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::web::opportunities::internal;
use crate::web::state::AppState;
use estate_crm_core::domain::{AiProvider, IntegrationConfig};

pub async fn get_providers_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AiProvider>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_ai_providers().await.map_err(internal)?))
}

pub async fn put_providers_handler(
    State(app_state): State<Arc<AppState>>,
    Json(providers): Json<Vec<AiProvider>>,
) -> Result<Json<Vec<AiProvider>>, (StatusCode, String)> {
    app_state
        .store
        .save_ai_providers(&providers)
        .await
        .map_err(internal)?;
    Ok(Json(providers))
}

pub async fn get_integrations_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<IntegrationConfig>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_integrations().await.map_err(internal)?))
}

pub async fn put_integrations_handler(
    State(app_state): State<Arc<AppState>>,
    Json(integrations): Json<Vec<IntegrationConfig>>,
) -> Result<Json<Vec<IntegrationConfig>>, (StatusCode, String)> {
    app_state
        .store
        .save_integrations(&integrations)
        .await
        .map_err(internal)?;
    Ok(Json(integrations))
}

// The key names a file in the data directory, so only plain names pass.
fn valid_blob_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub async fn get_blob_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if !valid_blob_key(&key) {
        return Err((StatusCode::BAD_REQUEST, format!("Invalid settings key: {key}")));
    }
    match app_state.store.load_blob(&key).await.map_err(internal)? {
        Some(value) => Ok(Json(value)),
        None => Err((StatusCode::NOT_FOUND, format!("No value stored under {key}"))),
    }
}

pub async fn put_blob_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if !valid_blob_key(&key) {
        return Err((StatusCode::BAD_REQUEST, format!("Invalid settings key: {key}")));
    }
    app_state
        .store
        .save_blob(&key, &value)
        .await
        .map_err(internal)?;
    Ok(Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        analysis::MultiProviderAnalysisAdapter,
        passthrough::{
            FirecrawlAdapter, MailgunAdapter, MetaAdapter, PicaGateway, SerpAdapter, TwilioAdapter,
        },
        store::JsonFileStore,
    };
    use crate::config::Config;
    use crate::web::state::CampaignRunner;
    use estate_crm_core::ports::keys;
    use serde_json::json;

    fn test_state(data_dir: &std::path::Path) -> Arc<AppState> {
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            data_dir: data_dir.to_path_buf(),
            log_level: tracing::Level::INFO,
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            openai_model: "gpt-4".to_string(),
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            gemini_model: "gemini-pro".to_string(),
            pica_secret_key: None,
            mailgun_connection_key: None,
            twilio_connection_key: None,
            serp_connection_key: None,
            firecrawl_connection_key: None,
            meta_connection_key: None,
            mailgun_endpoint: "https://api.picaos.com/v1/passthrough".to_string(),
        });
        let store = Arc::new(JsonFileStore::new(data_dir.to_path_buf()).unwrap());
        let http = reqwest::Client::new();
        let gateway = PicaGateway::new(config.clone(), http.clone());

        Arc::new(AppState {
            store,
            config: config.clone(),
            analysis_adapter: Arc::new(MultiProviderAnalysisAdapter::new(config, http)),
            email_adapter: Arc::new(MailgunAdapter::new(gateway.clone())),
            sms_adapter: Arc::new(TwilioAdapter::new(gateway.clone())),
            search_adapter: Arc::new(SerpAdapter::new(gateway.clone())),
            extraction_adapter: Arc::new(FirecrawlAdapter::new(gateway.clone())),
            ads_adapter: Arc::new(MetaAdapter::new(gateway)),
            campaign_runner: Arc::new(CampaignRunner::new()),
        })
    }

    #[tokio::test]
    async fn blob_endpoints_round_trip_a_settings_value() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let missing = get_blob_handler(
            State(state.clone()),
            Path(keys::MAP_PROVIDER.to_string()),
        )
        .await;
        assert_eq!(missing.unwrap_err().0, StatusCode::NOT_FOUND);

        let value = json!({"provider": "google"});
        put_blob_handler(
            State(state.clone()),
            Path(keys::MAP_PROVIDER.to_string()),
            Json(value.clone()),
        )
        .await
        .unwrap();

        let stored = get_blob_handler(State(state), Path(keys::MAP_PROVIDER.to_string()))
            .await
            .unwrap();
        assert_eq!(stored.0, value);
    }

    #[tokio::test]
    async fn blob_keys_are_restricted_to_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let too_long = "k".repeat(65);
        for key in ["", "a/b", "../escape", "a b", too_long.as_str()] {
            let rejected = put_blob_handler(
                State(state.clone()),
                Path(key.to_string()),
                Json(json!(1)),
            )
            .await;
            assert_eq!(rejected.unwrap_err().0, StatusCode::BAD_REQUEST, "key {key:?}");
        }

        assert!(valid_blob_key(keys::ZONES));
        assert!(valid_blob_key(keys::GOOGLE_MAPS_KEY));
    }
}
