//! Status changes for orders and applications.
use std::{fmt, str::FromStr, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use gateway::{
    Gateway, RecordId,
    models::{Lifecycle, Tracked},
    records::{self, Fetched},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::Payload;
use crate::{error::AppError, guard::Staff, state::AppState};

/// How strictly status edits follow the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any enumerated status may replace any other.
    #[default]
    Permissive,
    /// Only moves along the workflow, see [`Lifecycle::can_advance_to`].
    ForwardOnly,
}

impl StatusPolicy {
    pub fn allows<S: Lifecycle>(self, from: S, to: S) -> bool {
        match self {
            StatusPolicy::Permissive => true,
            StatusPolicy::ForwardOnly => from.can_advance_to(to),
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(StatusPolicy::Permissive),
            "forward_only" | "forward-only" => Ok(StatusPolicy::ForwardOnly),
            other => Err(format!("expected permissive or forward_only, got {other}")),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusPolicy::Permissive => "permissive",
            StatusPolicy::ForwardOnly => "forward_only",
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
}

/// Writes only the `status` field of one record, then re-fetches the list.
#[instrument(skip_all, fields(table = T::TABLE, %id))]
pub async fn set_status<T, G>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path(id): Path<String>,
    Payload(change): Payload<StatusChange<T::Status>>,
) -> Result<Json<Fetched<T>>, AppError>
where
    T: Tracked,
    G: Gateway,
{
    let store = state.scoped(&staff.session);
    let id = RecordId::parse(&id);
    let target = change.status;

    if state.config.status_policy == StatusPolicy::ForwardOnly {
        let current = records::fetch_one::<T, _>(&store, &id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {id}", T::TABLE)))?
            .status();

        if !state.config.status_policy.allows(current, target) {
            return Err(AppError::StatusTransition {
                from: current.as_str(),
                to: target.as_str(),
            });
        }
    }

    let changed =
        records::update::<T, _, _>(&store, &id, &json!({ "status": target.as_str() })).await?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("{} {id}", T::TABLE)));
    }

    info!(table = T::TABLE, %id, status = target.as_str(), by = %staff.user.id, "Status updated");

    Ok(Json(records::fetch_all::<T, _>(&store).await?))
}
