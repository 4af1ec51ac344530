//! services/api/src/web/matches.rs
//!
//! Handler for the property/prospect matching endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::web::opportunities::internal;
use crate::web::state::AppState;
use estate_crm_core::domain::{Match, Property, Prospect};
use estate_crm_core::matching::{demo_fixtures, filter_matches, score_all, WeightedMatchScorer};

pub const DEFAULT_THRESHOLD: u8 = 70;

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub threshold: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesResponse {
    pub threshold: u8,
    pub total_pairs: usize,
    pub matches: Vec<Match>,
    pub properties: Vec<Property>,
    pub prospects: Vec<Prospect>,
}

/// Scores every stored property against every stored prospect and keeps the
/// pairs at or above the threshold, strongest first. When both collections
/// are empty the hand-authored demo dataset is scored instead, so a fresh
/// install still demonstrates the matching screen. The scored entities ride
/// along in the response so the pair details can be rendered from it alone.
pub async fn get_matches_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<MatchesResponse>, (StatusCode, String)> {
    let threshold = query.threshold.unwrap_or(DEFAULT_THRESHOLD).min(100);

    let mut properties = app_state.store.load_properties().await.map_err(internal)?;
    let mut prospects = app_state.store.load_prospects().await.map_err(internal)?;

    let matches = if properties.is_empty() && prospects.is_empty() {
        let (demo_properties, demo_prospects, scorer) = demo_fixtures();
        let matches = score_all(&scorer, &demo_properties, &demo_prospects);
        properties = demo_properties;
        prospects = demo_prospects;
        matches
    } else {
        score_all(&WeightedMatchScorer, &properties, &prospects)
    };

    let kept = filter_matches(&matches, threshold);
    Ok(Json(MatchesResponse {
        threshold,
        total_pairs: matches.len(),
        matches: kept,
        properties,
        prospects,
    }))
}
