use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use gateway::{
    Gateway, TableStore,
    models::{Application, Order, Product, Service},
    records::Entity,
};
use serde::Serialize;
use tracing::warn;

use crate::{guard::Staff, state::AppState};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Overview {
    pub orders: u64,
    pub products: u64,
    pub services: u64,
    pub applications: u64,
}

/// A table that cannot be counted shows as empty rather than failing the page.
async fn count_or_zero<S: TableStore>(store: &S, table: &str) -> u64 {
    store.count(table).await.unwrap_or_else(|e| {
        warn!(table, error = %e, "Could not count rows");
        0
    })
}

pub async fn overview<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
) -> Json<Overview> {
    let store = state.scoped(&staff.session);

    let (orders, products, services, applications) = tokio::join!(
        count_or_zero(&store, Order::TABLE),
        count_or_zero(&store, Product::TABLE),
        count_or_zero(&store, Service::TABLE),
        count_or_zero(&store, Application::TABLE),
    );

    Json(Overview {
        orders,
        products,
        services,
        applications,
    })
}
