//! # Gateway
//!
//! Client side of the hosted backend that owns every admin record: the table
//! API, the auth service issuing sessions and the object storage holding
//! uploaded images.
//!
//! The admin service never caches authoritative state. Screens read through
//! [`records`], write through the same [`TableStore`], then read again.
//!
//! ## Tables
//!
//! | Table | Record | Listed by |
//! |---|---|---|
//! | `orders` | [`models::Order`] | `created_at` desc |
//! | `applications` | [`models::Application`] | `created_at` desc |
//! | `products` | [`models::Product`] | `created_at` desc |
//! | `services` | [`models::Service`] | `created_at` desc |
//! | `portfolio_items` | [`models::PortfolioItem`] | `sort_order` asc |
//! | `calculator_settings` | [`models::calculator::CalculatorSetting`] | sparse key/value |
//! | `cms_content` | [`models::cms::CmsRow`] | one JSON document per key |
pub mod client;
pub mod de;
pub mod error;
pub mod id;
pub mod models;
pub mod query;
pub mod records;
pub mod rest;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use client::{AuthService, Gateway, ObjectStore, TableStore};
pub use error::GatewayError;
pub use id::RecordId;
pub use query::{Direction, TableQuery};
pub use rest::RestGateway;
pub use session::{AuthUser, Session};
