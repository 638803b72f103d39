//! Editors for products, services and portfolio items.
//!
//! All three share one create/replace/delete flow; [`Editable`] supplies the
//! per-entity draft type, its validation and the image URLs it links to.
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use gateway::{
    Gateway, RecordId,
    models::{
        InvalidDraft, PortfolioDraft, PortfolioItem, Product, ProductDraft, Service, ServiceDraft,
    },
    records::{self, Entity, Fetched},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use super::Payload;
use crate::{
    error::AppError,
    guard::Staff,
    state::AppState,
    upload::{OrphanPolicy, discard_unlinked},
};

pub trait Editable: Entity {
    type Draft: DeserializeOwned + Serialize + Send + Sync + 'static;

    fn validate(draft: &Self::Draft) -> Result<(), InvalidDraft>;

    fn images(&self) -> Vec<String>;

    fn draft_images(draft: &Self::Draft) -> Vec<String>;
}

fn non_empty<'a>(urls: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    urls.into_iter()
        .filter(|url| !url.is_empty())
        .cloned()
        .collect()
}

impl Editable for Product {
    type Draft = ProductDraft;

    fn validate(draft: &ProductDraft) -> Result<(), InvalidDraft> {
        draft.validate()
    }

    fn images(&self) -> Vec<String> {
        non_empty(&self.images)
    }

    fn draft_images(draft: &ProductDraft) -> Vec<String> {
        non_empty(&draft.images)
    }
}

impl Editable for Service {
    type Draft = ServiceDraft;

    fn validate(draft: &ServiceDraft) -> Result<(), InvalidDraft> {
        draft.validate()
    }

    fn images(&self) -> Vec<String> {
        non_empty([&self.image])
    }

    fn draft_images(draft: &ServiceDraft) -> Vec<String> {
        non_empty([&draft.image])
    }
}

impl Editable for PortfolioItem {
    type Draft = PortfolioDraft;

    fn validate(draft: &PortfolioDraft) -> Result<(), InvalidDraft> {
        draft.validate()
    }

    fn images(&self) -> Vec<String> {
        non_empty(self.before_image.iter().chain(self.after_image.iter()))
    }

    fn draft_images(draft: &PortfolioDraft) -> Vec<String> {
        non_empty([&draft.before_image, &draft.after_image])
    }
}

fn not_found<T: Entity>(id: &RecordId) -> AppError {
    AppError::NotFound(format!("{} {id}", T::TABLE))
}

pub async fn create<T, G>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Payload(draft): Payload<T::Draft>,
) -> Result<Json<Fetched<T>>, AppError>
where
    T: Editable,
    G: Gateway,
{
    T::validate(&draft)?;

    let store = state.scoped(&staff.session);
    records::insert::<T, _, _>(&store, &draft).await?;
    info!(table = T::TABLE, by = %staff.user.id, "Record created");

    Ok(Json(records::fetch_all::<T, _>(&store).await?))
}

/// Full replacement of an existing record's editable fields.
pub async fn replace<T, G>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path(id): Path<String>,
    Payload(draft): Payload<T::Draft>,
) -> Result<Json<Fetched<T>>, AppError>
where
    T: Editable,
    G: Gateway,
{
    T::validate(&draft)?;

    let store = state.scoped(&staff.session);
    let id = RecordId::parse(&id);
    let policy = state.config.orphan_policy;

    let previous = match policy {
        OrphanPolicy::Keep => Vec::new(),
        OrphanPolicy::Delete => records::fetch_one::<T, _>(&store, &id)
            .await?
            .ok_or_else(|| not_found::<T>(&id))?
            .images(),
    };

    if records::update::<T, _, _>(&store, &id, &draft).await? == 0 {
        return Err(not_found::<T>(&id));
    }
    info!(table = T::TABLE, %id, by = %staff.user.id, "Record updated");

    discard_unlinked(
        &store,
        &state.config.upload_buckets,
        policy,
        &previous,
        &T::draft_images(&draft),
    )
    .await;

    Ok(Json(records::fetch_all::<T, _>(&store).await?))
}

pub async fn remove<T, G>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path(id): Path<String>,
) -> Result<Json<Fetched<T>>, AppError>
where
    T: Editable,
    G: Gateway,
{
    let store = state.scoped(&staff.session);
    let id = RecordId::parse(&id);
    let policy = state.config.orphan_policy;

    let previous = match policy {
        OrphanPolicy::Keep => Vec::new(),
        OrphanPolicy::Delete => records::fetch_one::<T, _>(&store, &id)
            .await?
            .map(|record| record.images())
            .unwrap_or_default(),
    };

    records::delete::<T, _>(&store, &id).await?;
    info!(table = T::TABLE, %id, by = %staff.user.id, "Record deleted");

    discard_unlinked(&store, &state.config.upload_buckets, policy, &previous, &[]).await;

    Ok(Json(records::fetch_all::<T, _>(&store).await?))
}
