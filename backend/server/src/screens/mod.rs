//! One module per back-office screen. Every handler runs as the signed-in
//! staff member and answers with the freshly re-fetched data it touched.
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{FromRequest, State},
};
use gateway::{
    Gateway,
    records::{self, Entity, Fetched},
};

use crate::{error::AppError, guard::Staff, state::AppState};

pub mod auth;
pub mod calculator;
pub mod catalog;
pub mod content;
pub mod dashboard;
pub mod status;
pub mod uploads;

#[cfg(test)]
mod tests;

/// JSON body whose rejections surface as [`AppError::MalformedPayload`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

pub async fn list<T, G>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
) -> Result<Json<Fetched<T>>, AppError>
where
    T: Entity,
    G: Gateway,
{
    let store = state.scoped(&staff.session);

    Ok(Json(records::fetch_all::<T, _>(&store).await?))
}
