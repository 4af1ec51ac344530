//! services/api/src/web/opportunities.rs
//!
//! Handlers for the prospecting pipeline: generating opportunity batches,
//! listing them with filters and pagination, deleting, and converting an
//! opportunity into a prospect.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use estate_crm_core::domain::{Opportunity, OpportunityStatus, OpportunityType};
use estate_crm_core::filter::{paginate, OpportunityFilter, Page, PageSize};
use estate_crm_core::generator::{convert_to_prospect, GenerationSpec, OpportunityGenerator};

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    /// Region or city names narrowing the generator's location pool.
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default = "ScrapeRequest::default_currency")]
    pub currency: String,
}

impl ScrapeRequest {
    fn default_currency() -> String {
        "TND".to_string()
    }
}

/// The response payload sent after a prospecting run.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    /// Number of opportunities generated by this run.
    pub generated: usize,
    /// Total opportunities now in the stored list.
    pub total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOpportunitiesQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<OpportunityType>,
    pub status: Option<OpportunityStatus>,
    /// Comma-separated region or city names.
    pub regions: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Run the opportunity generator and prepend the batch to the stored list.
#[utoipa::path(
    post,
    path = "/prospecting/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Batch generated and stored", body = ScrapeResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn scrape_opportunities_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ScrapeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let spec = GenerationSpec {
        regions: payload.regions,
        currency: payload.currency,
    };
    let mut rng = StdRng::from_entropy();
    let batch = OpportunityGenerator::default().generate(&mut rng, &spec);

    let result = async {
        let existing = app_state.store.load_opportunities().await?;
        let mut merged = batch.clone();
        merged.extend(existing);
        app_state.store.save_opportunities(&merged).await?;
        Ok::<usize, estate_crm_core::ports::PortError>(merged.len())
    }
    .await;

    match result {
        Ok(total) => {
            info!(generated = batch.len(), total, "Prospecting run stored");
            Ok(Json(ScrapeResponse {
                generated: batch.len(),
                total,
            }))
        }
        Err(e) => {
            error!("Failed to store prospecting run: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store prospecting run".to_string(),
            ))
        }
    }
}

/// Filtered, paginated opportunity listing.
pub async fn list_opportunities_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListOpportunitiesQuery>,
) -> Result<Json<Page<Opportunity>>, (StatusCode, String)> {
    let page_size = match query.page_size {
        Some(size) => PageSize::try_from(size).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => PageSize::DEFAULT,
    };
    let filter = OpportunityFilter {
        search: query.search,
        kind: query.kind,
        status: query.status,
        regions: query
            .regions
            .map(|r| {
                r.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let items = app_state.store.load_opportunities().await.map_err(|e| {
        error!("Failed to load opportunities: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load opportunities".to_string(),
        )
    })?;

    let filtered = filter.apply(&items);
    Ok(Json(paginate(&filtered, query.page.unwrap_or(1), page_size)))
}

/// Remove one opportunity from the stored list.
pub async fn delete_opportunity_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut items = app_state.store.load_opportunities().await.map_err(internal)?;
    let before = items.len();
    items.retain(|o| o.id != id);
    if items.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("Opportunity {id} not found")));
    }
    app_state
        .store
        .save_opportunities(&items)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Convert an opportunity into a hot-request prospect. The opportunity stays
/// in the list with status `converted` as an audit trail.
pub async fn convert_opportunity_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut opportunities = app_state.store.load_opportunities().await.map_err(internal)?;
    let Some(opportunity) = opportunities.iter_mut().find(|o| o.id == id) else {
        return Err((StatusCode::NOT_FOUND, format!("Opportunity {id} not found")));
    };
    if opportunity.status == OpportunityStatus::Converted {
        return Err((
            StatusCode::CONFLICT,
            format!("Opportunity {id} is already converted"),
        ));
    }

    let prospect = convert_to_prospect(opportunity);
    opportunity.status = OpportunityStatus::Converted;

    let mut prospects = app_state.store.load_prospects().await.map_err(internal)?;
    prospects.push(prospect.clone());
    app_state
        .store
        .save_prospects(&prospects)
        .await
        .map_err(internal)?;
    app_state
        .store
        .save_opportunities(&opportunities)
        .await
        .map_err(internal)?;

    info!(%id, prospect_id = %prospect.id, "Opportunity converted to prospect");
    Ok((StatusCode::CREATED, Json(prospect)))
}

pub(crate) fn internal(e: estate_crm_core::ports::PortError) -> (StatusCode, String) {
    error!("Storage operation failed: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Storage operation failed".to_string(),
    )
}
