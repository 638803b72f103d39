use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InvalidDraft;
use crate::{de, id::RecordId, query::Direction, records::Entity};

pub const MAX_PRODUCT_IMAGES: usize = 5;

const DEFAULT_WEIGHT: f64 = 20000.0;

/// Packed size used for shipping quotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: 60.0,
            width: 40.0,
            height: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub description: String,
    #[serde(deserialize_with = "de::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de::optional_number")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub images: Vec<String>,
}

impl Entity for Product {
    const TABLE: &'static str = "products";
    const ORDER_BY: (&'static str, Direction) = ("created_at", Direction::Descending);
}

/// Editor payload for inserting or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), InvalidDraft> {
        if self.title.trim().is_empty() {
            return Err(InvalidDraft("title is required".to_string()));
        }

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(InvalidDraft(format!("invalid price {}", self.price)));
        }

        if self.images.len() > MAX_PRODUCT_IMAGES {
            return Err(InvalidDraft(format!(
                "at most {MAX_PRODUCT_IMAGES} images per product, got {}",
                self.images.len()
            )));
        }

        let Dimensions {
            length,
            width,
            height,
        } = self.dimensions;
        if [self.weight, length, width, height]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Err(InvalidDraft(
                "weight and dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub description: String,
    /// Free-form, e.g. "from 1500 per meter".
    #[serde(default, deserialize_with = "de::nullable")]
    pub price: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub image: String,
}

impl Entity for Service {
    const TABLE: &'static str = "services";
    const ORDER_BY: (&'static str, Direction) = ("created_at", Direction::Descending);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
}

impl ServiceDraft {
    pub fn validate(&self) -> Result<(), InvalidDraft> {
        if self.title.trim().is_empty() {
            return Err(InvalidDraft("title is required".to_string()));
        }

        Ok(())
    }
}
