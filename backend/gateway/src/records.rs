//! Typed access to gateway tables.
//!
//! Rows are decoded at this boundary. A row that does not fit its entity's
//! shape is quarantined with the decode reason instead of leaking half-filled
//! values to callers.
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::{
    client::TableStore,
    error::GatewayError,
    id::RecordId,
    query::{Direction, TableQuery},
};

pub trait Entity: DeserializeOwned + Serialize + Send + Sync + 'static {
    const TABLE: &'static str;
    const ORDER_BY: (&'static str, Direction);

    fn list_query() -> TableQuery {
        let (field, direction) = Self::ORDER_BY;
        TableQuery::from(Self::TABLE).order(field, direction)
    }

    fn by_id(id: &RecordId) -> TableQuery {
        TableQuery::from(Self::TABLE).eq("id", id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Quarantined {
    pub row: Value,
    pub reason: String,
}

/// A single derived value plus whatever rows could not contribute to it.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub quarantined: Vec<Quarantined>,
}

#[derive(Debug, Serialize)]
pub struct Fetched<T> {
    pub records: Vec<T>,
    pub quarantined: Vec<Quarantined>,
}

impl<T> Fetched<T> {
    pub fn decode(table: &str, rows: Vec<Value>) -> Self
    where
        T: DeserializeOwned,
    {
        let mut records = Vec::with_capacity(rows.len());
        let mut quarantined = Vec::new();

        for row in rows {
            match serde_json::from_value::<T>(row.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(table, error = %e, "Quarantining malformed row");
                    quarantined.push(Quarantined {
                        row,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            records,
            quarantined,
        }
    }
}

pub async fn fetch_all<T, S>(store: &S) -> Result<Fetched<T>, GatewayError>
where
    T: Entity,
    S: TableStore,
{
    let rows = store.select(&T::list_query()).await?;

    Ok(Fetched::decode(T::TABLE, rows))
}

/// `Ok(None)` when the row is missing; a malformed row is an error here since
/// the caller asked for exactly that record.
pub async fn fetch_one<T, S>(store: &S, id: &RecordId) -> Result<Option<T>, GatewayError>
where
    T: Entity,
    S: TableStore,
{
    let rows = store.select(&T::by_id(id)).await?;

    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
        .transpose()
}

pub async fn insert<T, S, R>(store: &S, row: &R) -> Result<(), GatewayError>
where
    T: Entity,
    S: TableStore,
    R: Serialize,
{
    store.insert(T::TABLE, &[serde_json::to_value(row)?]).await?;

    Ok(())
}

/// Returns how many rows the gateway reports as changed.
pub async fn update<T, S, R>(store: &S, id: &RecordId, patch: &R) -> Result<usize, GatewayError>
where
    T: Entity,
    S: TableStore,
    R: Serialize,
{
    let rows = store
        .update(&T::by_id(id), &serde_json::to_value(patch)?)
        .await?;

    Ok(rows.len())
}

pub async fn delete<T, S>(store: &S, id: &RecordId) -> Result<(), GatewayError>
where
    T: Entity,
    S: TableStore,
{
    store.delete(&T::by_id(id)).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Fetched;
    use crate::models::Application;

    #[test]
    fn test_decode_quarantines_bad_rows() {
        let rows = vec![
            json!({
                "id": 1,
                "created_at": "2025-03-01T10:00:00Z",
                "name": "Ivan",
                "phone": "+1 555 0100",
                "details": "gate repair",
                "status": "new"
            }),
            json!({ "id": 2, "status": "teleported" }),
        ];

        let fetched: Fetched<Application> = Fetched::decode("applications", rows);

        assert_eq!(fetched.records.len(), 1);
        assert_eq!(fetched.quarantined.len(), 1);
        assert_eq!(fetched.quarantined[0].row["id"], 2);
    }
}
