//! services/api/src/web/integrations.rs
//!
//! Handlers in front of the outbound integration ports: AI analysis, email,
//! SMS webhook management, web search, site extraction and the ads account
//! overview. These are thin; the adapters own the upstream protocols.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;
use estate_crm_core::ports::{
    AnalysisRequest, EmailSendRequest, ExtractRequest, PortError, SearchRequest,
    SmsWebhookRequest,
};

/// Run an LLM analysis of a property or lead record.
pub async fn ai_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let analysis = app_state
        .analysis_adapter
        .analyze(&request)
        .await
        .map_err(integration_error)?;

    Ok(Json(json!({
        "success": true,
        "analysis": analysis,
        "metadata": {
            "analysisType": request.analysis_type,
            "criteria": request.criteria,
            "aiProvider": request.ai_provider,
            "timestamp": Utc::now().to_rfc3339(),
        },
    })))
}

pub async fn send_email_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<EmailSendRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = app_state
        .email_adapter
        .send(&request)
        .await
        .map_err(integration_error)?;
    Ok(Json(result))
}

pub async fn sms_webhook_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SmsWebhookRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = app_state
        .sms_adapter
        .update_webhook(&request)
        .await
        .map_err(integration_error)?;
    Ok(Json(result))
}

pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = app_state
        .search_adapter
        .search(&request)
        .await
        .map_err(integration_error)?;
    Ok(Json(result))
}

pub async fn extract_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = app_state
        .extraction_adapter
        .extract(&request)
        .await
        .map_err(integration_error)?;
    Ok(Json(result))
}

pub async fn ads_accounts_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = app_state
        .ads_adapter
        .account_overview()
        .await
        .map_err(integration_error)?;
    Ok(Json(result))
}

fn integration_error(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotConfigured(which) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Integration not configured: {which}"),
        ),
        other => {
            error!("Integration call failed: {:?}", other);
            (StatusCode::BAD_GATEWAY, other.to_string())
        }
    }
}
