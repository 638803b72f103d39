//! Session guard in front of every route.
//!
//! The routing rule itself is the pure [`decide`]; the middleware resolves who
//! is signed in (refreshing an expired session once) and then applies it.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use gateway::{AuthService, AuthUser, Gateway, Session};
use tracing::{debug, warn};

use crate::{cookies, state::AppState};


pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    RedirectToLogin,
    RedirectToHome,
    PassThrough,
}

pub fn decide(has_user: bool, path: &str) -> GuardDecision {
    match (has_user, path == LOGIN_PATH) {
        (false, false) => GuardDecision::RedirectToLogin,
        (true, true) => GuardDecision::RedirectToHome,
        _ => GuardDecision::PassThrough,
    }
}

/// Signed-in staff member, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct Staff {
    pub user: AuthUser,
    pub session: Session,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub staff: Option<Staff>,
    /// Set when the stored session was refreshed and the cookie must be rewritten.
    pub rotated: bool,
}

/// Any gateway failure resolves to anonymous.
pub async fn resolve<A: AuthService>(auth: &A, stored: Option<Session>) -> Resolution {
    let Some(mut session) = stored else {
        return Resolution::default();
    };

    let mut rotated = false;
    if session.is_expired() {
        match auth.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                session = fresh;
                rotated = true;
            }
            Err(e) => {
                debug!(error = %e, "Session refresh failed");
                return Resolution::default();
            }
        }
    }

    match auth.get_user(&session.access_token).await {
        Ok(Some(user)) => Resolution {
            staff: Some(Staff { user, session }),
            rotated,
        },
        Ok(None) => Resolution::default(),
        Err(e) => {
            warn!(error = %e, "Auth service unavailable, treating request as anonymous");
            Resolution::default()
        }
    }
}

pub async fn session_guard<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    let stored = cookies::read_session(req.headers(), &config.session_cookie);
    let resolution = resolve(&state.gateway, stored).await;

    let rotated = resolution
        .staff
        .as_ref()
        .filter(|_| resolution.rotated)
        .map(|staff| {
            cookies::session_cookie(&config.session_cookie, &staff.session, config.cookie_secure)
        });

    let decision = decide(resolution.staff.is_some(), req.uri().path());
    debug!(path = req.uri().path(), ?decision, "Session guard");

    let mut response = match decision {
        GuardDecision::RedirectToLogin => Redirect::temporary(LOGIN_PATH).into_response(),
        GuardDecision::RedirectToHome => Redirect::temporary(HOME_PATH).into_response(),
        GuardDecision::PassThrough => {
            if let Some(cookie) = &rotated {
                cookies::replace_in_request(req.headers_mut(), cookie);
            }
            if let Some(staff) = resolution.staff {
                req.extensions_mut().insert(staff);
            }

            next.run(req).await
        }
    };

    // Handlers that set the session cookie themselves (sign-out) win.
    let prefix = format!("{}=", config.session_cookie);
    let handler_set_cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| value.as_bytes().starts_with(prefix.as_bytes()));

    if let Some(cookie) = rotated.filter(|_| !handler_set_cookie) {
        match cookies::set_cookie_value(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode rotated session cookie"),
        }
    }

    response
}
