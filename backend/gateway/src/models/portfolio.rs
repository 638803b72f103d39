use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InvalidDraft;
use crate::{de, id::RecordId, query::Direction, records::Entity};

/// Before/after pair shown in the public gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub sort_order: i64,
    #[serde(default)]
    pub before_image: Option<String>,
    #[serde(default)]
    pub after_image: Option<String>,
}

impl Entity for PortfolioItem {
    const TABLE: &'static str = "portfolio_items";
    const ORDER_BY: (&'static str, Direction) = ("sort_order", Direction::Ascending);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub before_image: String,
    #[serde(default)]
    pub after_image: String,
}

impl PortfolioDraft {
    pub fn validate(&self) -> Result<(), InvalidDraft> {
        if self.title.trim().is_empty() {
            return Err(InvalidDraft("title is required".to_string()));
        }

        Ok(())
    }
}
