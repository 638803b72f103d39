//! HTTP client for the hosted backend: `/rest/v1` tables, `/auth/v1` sessions
//! and `/storage/v1` objects.
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::{Value, json};
use tracing::{instrument, warn};
use url::Url;

use crate::{
    client::{AuthService, Gateway, ObjectStore, TableStore},
    error::GatewayError,
    query::TableQuery,
    session::{AuthUser, Session, TokenResponse},
};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";

#[derive(Clone)]
pub struct RestGateway {
    base: Url,
    anon_key: String,
    bearer: String,
    client: Client,
}

impl RestGateway {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, GatewayError> {
        let api_key = HeaderValue::from_str(anon_key)
            .map_err(|_| GatewayError::InvalidHeader(API_KEY_HEADER))?;
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder().default_headers(headers).build()?;

        // Url::join drops the last segment unless the base ends in a slash.
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            base,
            anon_key: anon_key.to_string(),
            bearer: anon_key.to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base.join(path)?)
    }

    fn table_url(&self, table: &str) -> Result<Url, GatewayError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn object_path(bucket: &str, key: &str) -> String {
        format!("storage/v1/object/{bucket}/{key}")
    }

    fn with_bearer(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", self.bearer))
    }
}

async fn checked(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|field| value.get(field).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);

    if status == StatusCode::UNAUTHORIZED {
        return Err(GatewayError::Unauthorized);
    }

    if status.is_server_error() {
        return Err(GatewayError::Unavailable(format!("{status}: {message}")));
    }

    Err(GatewayError::rejected(status, message))
}

async fn decode_rows(response: Response) -> Result<Vec<Value>, GatewayError> {
    let text = checked(response).await?.text().await?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(&text)?)
}

/// Total from a `Content-Range` header such as `0-24/318` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

impl TableStore for RestGateway {
    #[instrument(skip(self), fields(table = %query.table))]
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .client
            .get(self.table_url(&query.table)?)
            .query(&query.params());

        decode_rows(self.with_bearer(request).send().await?).await
    }

    #[instrument(skip(self))]
    async fn count(&self, table: &str) -> Result<u64, GatewayError> {
        let request = self
            .client
            .head(self.table_url(table)?)
            .query(&[("select", "*")])
            .header(PREFER_HEADER, "count=exact");

        let response = checked(self.with_bearer(request).send().await?).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                GatewayError::rejected(StatusCode::BAD_GATEWAY, "missing Content-Range total")
            })
    }

    #[instrument(skip(self, rows))]
    async fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .client
            .post(self.table_url(table)?)
            .header(PREFER_HEADER, "return=representation")
            .json(rows);

        decode_rows(self.with_bearer(request).send().await?).await
    }

    #[instrument(skip(self, patch), fields(table = %query.table))]
    async fn update(&self, query: &TableQuery, patch: &Value) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .client
            .patch(self.table_url(&query.table)?)
            .query(&query.filter_params())
            .header(PREFER_HEADER, "return=representation")
            .json(patch);

        decode_rows(self.with_bearer(request).send().await?).await
    }

    #[instrument(skip(self), fields(table = %query.table))]
    async fn delete(&self, query: &TableQuery) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.table_url(&query.table)?)
            .query(&query.filter_params());

        checked(self.with_bearer(request).send().await?).await?;

        Ok(())
    }

    #[instrument(skip(self, rows))]
    async fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .client
            .post(self.table_url(table)?)
            .query(&[("on_conflict", on_conflict)])
            .header(
                PREFER_HEADER,
                "resolution=merge-duplicates,return=representation",
            )
            .json(rows);

        decode_rows(self.with_bearer(request).send().await?).await
    }
}

impl RestGateway {
    async fn token(&self, grant_type: &str, body: Value) -> Result<Session, GatewayError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/token")?)
            .query(&[("grant_type", grant_type)])
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .json(&body);

        let response = checked(request.send().await?).await?;

        Ok(response.json::<TokenResponse>().await?.into())
    }
}

impl AuthService for RestGateway {
    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, GatewayError> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        Ok(Some(checked(response).await?.json().await?))
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, GatewayError> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError> {
        self.token("password", json!({ "email": email, "password": password }))
            .await
            .map_err(|e| match e {
                // the token endpoint answers bad credentials with 400
                GatewayError::Rejected { status: 400, .. } => GatewayError::Unauthorized,
                other => other,
            })
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        checked(response).await?;

        Ok(())
    }
}

impl ObjectStore for RestGateway {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&Self::object_path(bucket, key))?)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);

        checked(self.with_bearer(request).send().await?).await?;

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}storage/v1/object/public/{bucket}/{key}", self.base)
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), GatewayError> {
        if keys.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .delete(self.endpoint(&format!("storage/v1/object/{bucket}"))?)
            .json(&json!({ "prefixes": keys }));

        if let Err(e) = checked(self.with_bearer(request).send().await?).await {
            warn!(error = %e, bucket, "Failed to remove objects");
            return Err(e);
        }

        Ok(())
    }
}

impl Gateway for RestGateway {
    fn authorized(&self, access_token: &str) -> Self {
        Self {
            bearer: access_token.to_string(),
            ..self.clone()
        }
    }
}
