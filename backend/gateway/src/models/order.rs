use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::{Lifecycle, Tracked};
use crate::{
    de,
    id::RecordId,
    query::Direction,
    records::Entity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Processing,
    Completed,
    Cancelled,
}

impl Lifecycle for OrderStatus {
    fn stage(self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Completed | OrderStatus::Cancelled => 2,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Line item as written by the storefront; unknown fields are carried along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetail {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub customer_info: CustomerInfo,
    #[serde(default, deserialize_with = "de::nullable")]
    pub items: Vec<OrderItem>,
    #[serde(deserialize_with = "de::number")]
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default, deserialize_with = "de::optional_number")]
    pub shipping_cost: Option<f64>,
    #[serde(default)]
    pub delivery_detail: Option<DeliveryDetail>,
}

impl Entity for Order {
    const TABLE: &'static str = "orders";
    const ORDER_BY: (&'static str, Direction) = ("created_at", Direction::Descending);
}

impl Tracked for Order {
    type Status = OrderStatus;

    fn status(&self) -> OrderStatus {
        self.status
    }
}
