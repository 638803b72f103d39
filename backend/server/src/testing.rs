//! Shared fixtures for router-level tests.
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use chrono::Utc;
use gateway::{Session, memory::MemoryGateway};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::{config::Config, cookies, routes, state::AppState};

pub const EMAIL: &str = "staff@ironforge.test";
pub const PASSWORD: &str = "hunter22";

pub fn app(gateway: &MemoryGateway) -> Router {
    app_with(gateway, Config::testing())
}

pub fn app_with(gateway: &MemoryGateway, config: Config) -> Router {
    routes::router(AppState::new(config, gateway.clone()))
}

/// `Cookie` header value carrying `session`.
pub fn cookie_for(session: &Session) -> String {
    let cookie = cookies::session_cookie(&Config::testing().session_cookie, session, false);
    cookie.encoded().stripped().to_string()
}

/// Registers the staff account and returns a cookie for a live session.
pub fn signed_in(gateway: &MemoryGateway) -> String {
    gateway.add_user(EMAIL, PASSWORD);
    let session = gateway
        .issue_session(EMAIL, Utc::now().timestamp() + 3600)
        .unwrap();

    cookie_for(&session)
}

pub fn request(
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    request(Method::GET, path, cookie, None)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// `Set-Cookie` headers of a response turned back into a `Cookie` header.
pub fn returned_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or_default().to_string())
        .next()
}
