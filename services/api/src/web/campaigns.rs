//! services/api/src/web/campaigns.rs
//!
//! Campaign handlers: the CRUD-lite surface plus launch and pause/resume.
//! Launching spawns the per-campaign delivery task; the runner guarantees at
//! most one task per campaign.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::web::campaign_task::delivery_process;
use crate::web::opportunities::internal;
use crate::web::state::AppState;
use estate_crm_core::domain::{Campaign, CampaignStatus};

pub async fn list_campaigns_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Campaign>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_campaigns().await.map_err(internal)?))
}

pub async fn upsert_campaign_handler(
    State(app_state): State<Arc<AppState>>,
    Json(campaign): Json<Campaign>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut items = app_state.store.load_campaigns().await.map_err(internal)?;
    let status = match items.iter_mut().find(|c| c.id == campaign.id) {
        Some(existing) => {
            *existing = campaign.clone();
            StatusCode::OK
        }
        None => {
            items.push(campaign.clone());
            StatusCode::CREATED
        }
    };
    app_state.store.save_campaigns(&items).await.map_err(internal)?;
    Ok((status, Json(campaign)))
}

pub async fn delete_campaign_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut items = app_state.store.load_campaigns().await.map_err(internal)?;
    let before = items.len();
    items.retain(|c| c.id != id);
    if items.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("Campaign {id} not found")));
    }
    // Stop any running delivery task before the record disappears.
    app_state.campaign_runner.stop(id);
    app_state.store.save_campaigns(&items).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Launch (or relaunch) a campaign. Counters are kept as-is, so relaunching
/// a paused campaign resumes delivery instead of starting over.
pub async fn launch_campaign_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let campaign = activate(&app_state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(campaign)))
}

/// Flip a campaign between active and paused.
pub async fn toggle_campaign_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let campaigns = app_state.store.load_campaigns().await.map_err(internal)?;
    let Some(campaign) = campaigns.iter().find(|c| c.id == id) else {
        return Err((StatusCode::NOT_FOUND, format!("Campaign {id} not found")));
    };

    match campaign.status {
        CampaignStatus::Active => {
            let mut campaigns = campaigns;
            if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
                campaign.status = CampaignStatus::Paused;
            }
            app_state.store.save_campaigns(&campaigns).await.map_err(internal)?;
            app_state.campaign_runner.stop(id);
            info!(%id, "Campaign paused");
            let paused = campaigns.into_iter().find(|c| c.id == id);
            Ok((StatusCode::OK, Json(paused)))
        }
        CampaignStatus::Paused => {
            let campaign = activate(&app_state, id).await?;
            Ok((StatusCode::OK, Json(Some(campaign))))
        }
        other => Err((
            StatusCode::CONFLICT,
            format!("Campaign {id} cannot be toggled from status {other:?}"),
        )),
    }
}

/// Marks the campaign active, persists it, and spawns its delivery task.
async fn activate(
    app_state: &Arc<AppState>,
    id: Uuid,
) -> Result<Campaign, (StatusCode, String)> {
    let mut campaigns = app_state.store.load_campaigns().await.map_err(internal)?;
    let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) else {
        return Err((StatusCode::NOT_FOUND, format!("Campaign {id} not found")));
    };
    if campaign.recipients == 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Campaign {id} has no recipients"),
        ));
    }

    campaign.status = CampaignStatus::Active;
    let launched = campaign.clone();
    app_state.store.save_campaigns(&campaigns).await.map_err(internal)?;

    let token = app_state.campaign_runner.begin(id);
    tokio::spawn(delivery_process(app_state.store.clone(), id, token));
    info!(%id, recipients = launched.recipients, "Campaign delivery task launched");
    Ok(launched)
}
