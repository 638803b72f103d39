//! In-process stand-in for the hosted backend, used by tests.
//!
//! Clones share state, so a test can keep one handle for assertions while the
//! service under test owns another. Faults can be switched on to exercise the
//! unreachable/rejecting paths.
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::{
    client::{AuthService, Gateway, ObjectStore, TableStore},
    error::GatewayError,
    query::{Direction, TableQuery},
    session::{AuthUser, Session},
};

pub const PUBLIC_BASE: &str = "https://storage.test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    auth_unreachable: bool,
    tables_unreachable: bool,
    reject_upserts: bool,
    reject_uploads: bool,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    issued: u64,
    users: HashMap<String, (String, AuthUser)>,
    access: HashMap<String, AuthUser>,
    refresh: HashMap<String, AuthUser>,
    objects: BTreeMap<(String, String), StoredObject>,
    last_bearer: Option<String>,
    faults: Faults,
}

impl Inner {
    fn issue(&mut self, user: AuthUser, expires_at: i64) -> Session {
        self.issued += 1;
        let session = Session {
            access_token: format!("access-{}", self.issued),
            refresh_token: format!("refresh-{}", self.issued),
            expires_at,
        };

        self.access.insert(session.access_token.clone(), user.clone());
        self.refresh.insert(session.refresh_token.clone(), user);
        session
    }

    fn table_call(&mut self, bearer: &Option<String>) -> Result<(), GatewayError> {
        if self.faults.tables_unreachable {
            return Err(GatewayError::Unavailable("tables offline".to_string()));
        }

        self.last_bearer = bearer.clone();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
    bearer: Option<String>,
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (field, value) in patch {
            target.insert(field.clone(), value.clone());
        }
    }
}

fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }

    let projected: Map<String, Value> = columns
        .split(',')
        .map(str::trim)
        .filter_map(|column| Some((column.to_string(), row.get(column)?.clone())))
        .collect();

    Value::Object(projected)
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn add_user(&self, email: &str, password: &str) -> AuthUser {
        let mut inner = self.lock();
        let user = AuthUser {
            id: format!("user-{}", inner.users.len() + 1),
            email: Some(email.to_string()),
        };

        inner
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Issues a session for an existing user without going through sign-in.
    pub fn issue_session(&self, email: &str, expires_at: i64) -> Option<Session> {
        let mut inner = self.lock();
        let (_, user) = inner.users.get(email)?.clone();

        Some(inner.issue(user, expires_at))
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(stored_bucket, _)| stored_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Bearer of the most recent table call, `None` for the anonymous client.
    pub fn last_bearer(&self) -> Option<String> {
        self.lock().last_bearer.clone()
    }

    pub fn set_auth_unreachable(&self, on: bool) {
        self.lock().faults.auth_unreachable = on;
    }

    pub fn set_tables_unreachable(&self, on: bool) {
        self.lock().faults.tables_unreachable = on;
    }

    pub fn set_reject_upserts(&self, on: bool) {
        self.lock().faults.reject_upserts = on;
    }

    pub fn set_reject_uploads(&self, on: bool) {
        self.lock().faults.reject_uploads = on;
    }

    fn auth_reachable(&self) -> Result<(), GatewayError> {
        if self.lock().faults.auth_unreachable {
            return Err(GatewayError::Unavailable("auth offline".to_string()));
        }

        Ok(())
    }
}

impl TableStore for MemoryGateway {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        let mut rows: Vec<Value> = inner
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();

        if let Some((field, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(field), b.get(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(rows.iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn count(&self, table: &str) -> Result<u64, GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        Ok(inner.tables.get(table).map_or(0, |rows| rows.len() as u64))
    }

    async fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = row.clone();
            if let Value::Object(fields) = &mut row {
                if !fields.contains_key("id") {
                    inner.next_id += 1;
                    fields.insert("id".to_string(), Value::from(inner.next_id));
                }
                fields
                    .entry("created_at")
                    .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
            }
            inserted.push(row);
        }

        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn update(&self, query: &TableQuery, patch: &Value) -> Result<Vec<Value>, GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        let mut updated = Vec::new();
        if let Some(rows) = inner.tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                merge(row, patch);
                updated.push(row.clone());
            }
        }

        Ok(updated)
    }

    async fn delete(&self, query: &TableQuery) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        if let Some(rows) = inner.tables.get_mut(&query.table) {
            rows.retain(|row| !query.matches(row));
        }

        Ok(())
    }

    async fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        let mut inner = self.lock();
        inner.table_call(&self.bearer)?;

        if inner.faults.reject_upserts {
            return Err(GatewayError::rejected(
                StatusCode::BAD_REQUEST,
                "null value in column violates not-null constraint",
            ));
        }

        let stored = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            let existing = stored
                .iter_mut()
                .find(|candidate| candidate.get(on_conflict) == row.get(on_conflict));

            match existing {
                Some(existing) => merge(existing, row),
                None => stored.push(row.clone()),
            }
        }

        Ok(rows.to_vec())
    }
}

impl AuthService for MemoryGateway {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, GatewayError> {
        self.auth_reachable()?;

        Ok(self.lock().access.get(access_token).cloned())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, GatewayError> {
        self.auth_reachable()?;

        let mut inner = self.lock();
        let user = inner
            .refresh
            .remove(refresh_token)
            .ok_or(GatewayError::Unauthorized)?;

        Ok(inner.issue(user, Utc::now().timestamp() + 3600))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError> {
        self.auth_reachable()?;

        let mut inner = self.lock();
        let user = match inner.users.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(GatewayError::Unauthorized),
        };

        Ok(inner.issue(user, Utc::now().timestamp() + 3600))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        self.auth_reachable()?;

        self.lock().access.remove(access_token);
        Ok(())
    }
}

impl ObjectStore for MemoryGateway {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();

        if inner.faults.reject_uploads {
            return Err(GatewayError::rejected(
                StatusCode::BAD_REQUEST,
                "bucket refused the object",
            ));
        }

        let slot = (bucket.to_string(), key.to_string());
        if inner.objects.contains_key(&slot) {
            return Err(GatewayError::rejected(
                StatusCode::CONFLICT,
                "The resource already exists",
            ));
        }

        inner.objects.insert(
            slot,
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{PUBLIC_BASE}/{bucket}/{key}")
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        for key in keys {
            inner.objects.remove(&(bucket.to_string(), key.clone()));
        }

        Ok(())
    }
}

impl Gateway for MemoryGateway {
    fn authorized(&self, access_token: &str) -> Self {
        Self {
            inner: self.inner.clone(),
            bearer: Some(access_token.to_string()),
        }
    }
}
