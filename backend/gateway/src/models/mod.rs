mod application;
mod catalog;
mod order;
mod portfolio;
mod status;

pub mod calculator;
pub mod cms;

use thiserror::Error;

pub use application::{Application, ApplicationStatus};
pub use catalog::{Dimensions, MAX_PRODUCT_IMAGES, Product, ProductDraft, Service, ServiceDraft};
pub use order::{CustomerInfo, DeliveryDetail, Order, OrderItem, OrderStatus};
pub use portfolio::{PortfolioDraft, PortfolioItem};
pub use status::{Lifecycle, Tracked};

/// A staff-submitted row that the gateway should never see.
#[derive(Error, Debug, PartialEq)]
#[error("{0}")]
pub struct InvalidDraft(pub String);
