use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use gateway::{
    Gateway,
    models::cms::{self, CmsContent, CmsKey, CmsSection},
    records::Quarantined,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::Payload;
use crate::{error::AppError, guard::Staff, state::AppState};

#[derive(Debug, Serialize)]
pub struct ContentView {
    pub content: CmsContent,
    pub quarantined: Vec<Quarantined>,
}

pub async fn show<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
) -> Result<Json<ContentView>, AppError> {
    let loaded = cms::load(&state.scoped(&staff.session)).await?;

    Ok(Json(ContentView {
        content: loaded.value,
        quarantined: loaded.quarantined,
    }))
}

/// Saves one whole section; its siblings are not touched.
pub async fn save<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path(key): Path<String>,
    Payload(content): Payload<Value>,
) -> Result<Json<ContentView>, AppError> {
    let key = CmsKey::parse(&key)
        .ok_or_else(|| AppError::NotFound(format!("content section {key}")))?;
    let section = CmsSection::from_json(key, content)
        .map_err(|e| AppError::MalformedPayload(format!("{key}: {e}")))?;

    let store = state.scoped(&staff.session);
    cms::save(&store, &section).await?;
    info!(%key, by = %staff.user.id, "Content section saved");

    let loaded = cms::load(&store).await?;

    Ok(Json(ContentView {
        content: loaded.value,
        quarantined: loaded.quarantined,
    }))
}
