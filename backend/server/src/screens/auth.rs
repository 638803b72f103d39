use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use gateway::{Gateway, GatewayError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Payload;
use crate::{
    cookies::{expired_cookie, session_cookie, set_cookie_value},
    error::AppError,
    guard::{HOME_PATH, LOGIN_PATH, Staff},
    state::AppState,
};

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginPage {
    pub message: &'static str,
}

pub async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        message: "Sign in with your staff email and password",
    })
}

pub async fn login<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Payload(credentials): Payload<Credentials>,
) -> Result<Response, AppError> {
    let email = credentials.email.trim();
    if email.is_empty() || credentials.password.is_empty() {
        return Err(AppError::MalformedPayload(
            "email and password are required".to_string(),
        ));
    }

    let session = state
        .gateway
        .sign_in_with_password(email, &credentials.password)
        .await
        .map_err(|e| match e {
            GatewayError::Unauthorized => AppError::BadCredentials,
            other => other.into(),
        })?;

    let config = &state.config;
    let cookie = session_cookie(&config.session_cookie, &session, config.cookie_secure);
    let value = set_cookie_value(&cookie).map_err(|e| AppError::InternalError(Box::new(e)))?;

    info!(email, "Staff signed in");

    Ok(([(SET_COOKIE, value)], Redirect::to(HOME_PATH)).into_response())
}

/// Ends the session at the gateway (best effort) and always clears the cookie.
pub async fn logout<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
) -> Result<Response, AppError> {
    if let Err(e) = state.gateway.sign_out(&staff.session.access_token).await {
        warn!(error = %e, "Gateway sign-out failed, clearing cookie anyway");
    }

    let config = &state.config;
    let value = set_cookie_value(&expired_cookie(&config.session_cookie, config.cookie_secure))
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    let closed = state.uploads.forget_user(&staff.user.id);
    info!(user = %staff.user.id, closed, "Staff signed out");

    Ok(([(SET_COOKIE, value)], Redirect::to(LOGIN_PATH)).into_response())
}
