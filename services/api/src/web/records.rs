//! services/api/src/web/records.rs
//!
//! CRUD-lite handlers for the portfolio collections: properties, prospects
//! and mandates. Each collection supports list, upsert (by id) and delete;
//! anything richer lives in dedicated endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::opportunities::internal;
use crate::web::state::AppState;
use estate_crm_core::domain::{Mandate, Property, Prospect};

//=========================================================================================
// Properties
//=========================================================================================

pub async fn list_properties_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Property>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_properties().await.map_err(internal)?))
}

pub async fn upsert_property_handler(
    State(app_state): State<Arc<AppState>>,
    Json(property): Json<Property>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut items = app_state.store.load_properties().await.map_err(internal)?;
    let created = replace_or_push(&mut items, property.clone(), |p| p.id == property.id);
    app_state.store.save_properties(&items).await.map_err(internal)?;
    Ok((status_of(created), Json(property)))
}

pub async fn delete_property_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut items = app_state.store.load_properties().await.map_err(internal)?;
    let before = items.len();
    items.retain(|p| p.id != id);
    if items.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("Property {id} not found")));
    }
    app_state.store.save_properties(&items).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Prospects
//=========================================================================================

pub async fn list_prospects_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Prospect>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_prospects().await.map_err(internal)?))
}

pub async fn upsert_prospect_handler(
    State(app_state): State<Arc<AppState>>,
    Json(prospect): Json<Prospect>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut items = app_state.store.load_prospects().await.map_err(internal)?;
    let created = replace_or_push(&mut items, prospect.clone(), |p| p.id == prospect.id);
    app_state.store.save_prospects(&items).await.map_err(internal)?;
    Ok((status_of(created), Json(prospect)))
}

pub async fn delete_prospect_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut items = app_state.store.load_prospects().await.map_err(internal)?;
    let before = items.len();
    items.retain(|p| p.id != id);
    if items.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("Prospect {id} not found")));
    }
    app_state.store.save_prospects(&items).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Mandates
//=========================================================================================

pub async fn list_mandates_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Mandate>>, (StatusCode, String)> {
    Ok(Json(app_state.store.load_mandates().await.map_err(internal)?))
}

pub async fn upsert_mandate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(mandate): Json<Mandate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut items = app_state.store.load_mandates().await.map_err(internal)?;
    let created = replace_or_push(&mut items, mandate.clone(), |m| m.id == mandate.id);
    app_state.store.save_mandates(&items).await.map_err(internal)?;
    Ok((status_of(created), Json(mandate)))
}

pub async fn delete_mandate_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut items = app_state.store.load_mandates().await.map_err(internal)?;
    let before = items.len();
    items.retain(|m| m.id != id);
    if items.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("Mandate {id} not found")));
    }
    app_state.store.save_mandates(&items).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Shared helpers
//=========================================================================================

/// Replaces the first item matching the predicate, or appends. Returns true
/// when the item was newly created.
fn replace_or_push<T>(items: &mut Vec<T>, item: T, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter_mut().find(|existing| matches(existing)) {
        Some(existing) => {
            *existing = item;
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}

fn status_of(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_or_push_distinguishes_create_from_update() {
        let mut items = vec![1, 2, 3];
        assert!(!replace_or_push(&mut items, 20, |i| *i == 2));
        assert_eq!(items, vec![1, 20, 3]);
        assert!(replace_or_push(&mut items, 4, |i| *i == 4));
        assert_eq!(items, vec![1, 20, 3, 4]);
    }
}
