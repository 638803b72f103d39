//! Price calculator coefficients.
//!
//! The table is a sparse key/value store. Reads are merged over the built-in
//! defaults so a missing row never leaves a coefficient undefined.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    client::TableStore,
    de,
    error::GatewayError,
    query::{Direction, TableQuery},
    records::{Entity, Fetched, Loaded},
};

pub const TABLE: &str = "calculator_settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    RateMig,
    RateTig,
    RateStick,
    MultAluminum,
    MultStainless,
    MultTitanium,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::RateMig,
        SettingKey::RateTig,
        SettingKey::RateStick,
        SettingKey::MultAluminum,
        SettingKey::MultStainless,
        SettingKey::MultTitanium,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::RateMig => "rate_mig",
            SettingKey::RateTig => "rate_tig",
            SettingKey::RateStick => "rate_stick",
            SettingKey::MultAluminum => "mult_aluminum",
            SettingKey::MultStainless => "mult_stainless",
            SettingKey::MultTitanium => "mult_titanium",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_str() == key)
    }

    pub fn default_value(self) -> f64 {
        match self {
            SettingKey::RateMig => 500.0,
            SettingKey::RateTig => 800.0,
            SettingKey::RateStick => 600.0,
            SettingKey::MultAluminum => 1.5,
            SettingKey::MultStainless => 1.8,
            SettingKey::MultTitanium => 3.0,
        }
    }

    /// Rates are currency per meter of seam; multipliers scale the steel price.
    pub fn minimum(self) -> f64 {
        match self {
            SettingKey::RateMig | SettingKey::RateTig | SettingKey::RateStick => 0.0,
            SettingKey::MultAluminum | SettingKey::MultStainless | SettingKey::MultTitanium => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSetting {
    pub key: String,
    #[serde(deserialize_with = "de::number")]
    pub value: f64,
}

impl Entity for CalculatorSetting {
    const TABLE: &'static str = TABLE;
    const ORDER_BY: (&'static str, Direction) = ("key", Direction::Ascending);

    fn list_query() -> TableQuery {
        TableQuery::from(TABLE).select("key, value")
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("{key} must be a finite number of at least {minimum}, got {value}")]
pub struct InvalidSetting {
    pub key: String,
    pub value: f64,
    pub minimum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculatorSettings(BTreeMap<String, f64>);

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self(
            SettingKey::ALL
                .into_iter()
                .map(|key| (key.as_str().to_string(), key.default_value()))
                .collect(),
        )
    }
}

impl CalculatorSettings {
    /// Stored rows win over defaults; keys unknown to this build are kept.
    pub fn merged(rows: impl IntoIterator<Item = CalculatorSetting>) -> Self {
        let mut settings = Self::default();
        for row in rows {
            settings.0.insert(row.key, row.value);
        }
        settings
    }

    pub fn get(&self, key: SettingKey) -> f64 {
        self.0
            .get(key.as_str())
            .copied()
            .unwrap_or_else(|| key.default_value())
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|key, _| keep(key));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn validate(&self) -> Result<(), InvalidSetting> {
        for (key, value) in self.iter() {
            let minimum = SettingKey::parse(key).map_or(f64::MIN, SettingKey::minimum);

            if !value.is_finite() || value < minimum {
                return Err(InvalidSetting {
                    key: key.to_string(),
                    value,
                    minimum,
                });
            }
        }

        Ok(())
    }

    fn rows(&self) -> Vec<Value> {
        self.iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect()
    }
}

/// What to do when the gateway refuses the batched upsert, e.g. because the
/// row-level policy forbids inserts on this table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnRejection {
    #[default]
    PerKeyUpdate,
    Fail,
}

/// Which write actually landed the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePhase {
    Batched,
    PerKey,
}

pub async fn load<S: TableStore>(store: &S) -> Result<Loaded<CalculatorSettings>, GatewayError> {
    let rows = store.select(&CalculatorSetting::list_query()).await?;
    let fetched: Fetched<CalculatorSetting> = Fetched::decode(TABLE, rows);

    Ok(Loaded {
        value: CalculatorSettings::merged(fetched.records),
        quarantined: fetched.quarantined,
    })
}

/// Batched upsert on `key`, falling back to one update per key when the
/// gateway answers with a rejection. Transport failures are returned as is.
/// An update that matches no row writes nothing, so the fallback fails with
/// the keys that were left out.
pub async fn save<S: TableStore>(
    store: &S,
    settings: &CalculatorSettings,
    on_rejection: OnRejection,
) -> Result<WritePhase, GatewayError> {
    let rows = settings.rows();

    match store.upsert(TABLE, &rows, "key").await {
        Ok(_) => Ok(WritePhase::Batched),
        Err(e) if e.is_rejection() && on_rejection == OnRejection::PerKeyUpdate => {
            warn!(error = %e, "Batched settings upsert rejected, updating per key");

            let mut unwritten = Vec::new();
            for (key, value) in settings.iter() {
                let updated = store
                    .update(
                        &TableQuery::from(TABLE).eq("key", key),
                        &json!({ "value": value }),
                    )
                    .await?;

                if updated.is_empty() {
                    unwritten.push(key.to_string());
                }
            }

            if !unwritten.is_empty() {
                warn!(?unwritten, "Per key update matched no stored row");
                return Err(GatewayError::Unwritten(unwritten));
            }

            info!(keys = rows.len(), "Settings written per key");
            Ok(WritePhase::PerKey)
        }
        Err(e) => Err(e),
    }
}
