use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use gateway::{
    Gateway,
    models::calculator::{self, CalculatorSettings, OnRejection, WritePhase},
    records::Quarantined,
};
use serde::Serialize;
use tracing::info;

use super::Payload;
use crate::{error::AppError, guard::Staff, state::AppState};

#[derive(Debug, Serialize)]
pub struct CalculatorView {
    pub settings: CalculatorSettings,
    pub quarantined: Vec<Quarantined>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<WritePhase>,
}

pub async fn show<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
) -> Result<Json<CalculatorView>, AppError> {
    let loaded = calculator::load(&state.scoped(&staff.session)).await?;

    Ok(Json(CalculatorView {
        settings: loaded.value,
        quarantined: loaded.quarantined,
        written: None,
    }))
}

pub async fn save<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Payload(settings): Payload<CalculatorSettings>,
) -> Result<Json<CalculatorView>, AppError> {
    settings.validate()?;

    let store = state.scoped(&staff.session);
    let phase = calculator::save(&store, &settings, OnRejection::default()).await?;
    info!(?phase, by = %staff.user.id, "Calculator settings saved");

    let loaded = calculator::load(&store).await?;

    Ok(Json(CalculatorView {
        settings: loaded.value,
        quarantined: loaded.quarantined,
        written: Some(phase),
    }))
}
