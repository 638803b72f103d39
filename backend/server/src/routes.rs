use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use gateway::{
    Gateway,
    models::{Application, Order, PortfolioItem, Product, Service},
};
use tower_http::trace::TraceLayer;

use crate::{
    error::AppError,
    guard::{LOGIN_PATH, session_guard},
    screens::{auth, calculator, catalog, content, dashboard, list, status::set_status, uploads},
    state::AppState,
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

fn editor<T: catalog::Editable, G: Gateway>(
    router: Router<Arc<AppState<G>>>,
    path: &str,
) -> Router<Arc<AppState<G>>> {
    router
        .route(path, get(list::<T, G>).post(catalog::create::<T, G>))
        .route(
            &format!("{path}/{{id}}"),
            put(catalog::replace::<T, G>).delete(catalog::remove::<T, G>),
        )
}

pub fn router<G: Gateway>(state: Arc<AppState<G>>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes + MULTIPART_OVERHEAD);

    let router = Router::new()
        .route("/", get(dashboard::overview::<G>))
        .route(LOGIN_PATH, get(auth::login_page).post(auth::login::<G>))
        .route("/logout", post(auth::logout::<G>))
        .route("/orders", get(list::<Order, G>))
        .route("/orders/{id}/status", patch(set_status::<Order, G>))
        .route("/applications", get(list::<Application, G>))
        .route("/applications/{id}/status", patch(set_status::<Application, G>))
        .route(
            "/calculator",
            get(calculator::show::<G>).put(calculator::save::<G>),
        )
        .route("/content", get(content::show::<G>))
        .route("/content/{key}", put(content::save::<G>))
        .route(
            "/uploads/{bucket}",
            post(uploads::upload_image::<G>).layer(upload_limit),
        )
        .route(
            "/uploads/{bucket}/{slot}",
            get(uploads::show_slot::<G>)
                .put(uploads::open_slot::<G>)
                .post(uploads::upload_to_slot::<G>)
                .delete(uploads::clear_slot::<G>)
                .layer(upload_limit),
        );

    let router = editor::<Product, G>(router, "/products");
    let router = editor::<Service, G>(router, "/services");
    let router = editor::<PortfolioItem, G>(router, "/portfolio");

    router
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), session_guard::<G>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
