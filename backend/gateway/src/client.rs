//! Seams between the admin service and the hosted backend.
//!
//! One trait per backend concern; [`Gateway`] ties them together so a single
//! client value can be built at startup and handed to every component.
use std::future::Future;

use serde_json::Value;

use crate::{
    error::GatewayError,
    query::TableQuery,
    session::{AuthUser, Session},
};

pub trait TableStore: Send + Sync + 'static {
    fn select(
        &self,
        query: &TableQuery,
    ) -> impl Future<Output = Result<Vec<Value>, GatewayError>> + Send;

    /// Exact row count of a table.
    fn count(&self, table: &str) -> impl Future<Output = Result<u64, GatewayError>> + Send;

    fn insert(
        &self,
        table: &str,
        rows: &[Value],
    ) -> impl Future<Output = Result<Vec<Value>, GatewayError>> + Send;

    /// Applies `patch` to every row matched by the query's filters.
    fn update(
        &self,
        query: &TableQuery,
        patch: &Value,
    ) -> impl Future<Output = Result<Vec<Value>, GatewayError>> + Send;

    fn delete(&self, query: &TableQuery) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Inserts rows, merging into existing ones that collide on `on_conflict`.
    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &str,
    ) -> impl Future<Output = Result<Vec<Value>, GatewayError>> + Send;
}

pub trait AuthService: Send + Sync + 'static {
    /// `Ok(None)` when the token is not (or no longer) accepted.
    fn get_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Option<AuthUser>, GatewayError>> + Send;

    fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Session, GatewayError>> + Send;

    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, GatewayError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

pub trait ObjectStore: Send + Sync + 'static {
    fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Publicly addressable URL of an object. Pure; performs no request.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    fn remove(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

pub trait Gateway: TableStore + AuthService + ObjectStore + Clone {
    /// Handle whose table and storage calls run as the holder of `access_token`.
    fn authorized(&self, access_token: &str) -> Self;
}
