//! pCloud API client module

pub mod client;
pub mod error;
pub mod models;
pub mod request;
#[cfg(test)]
pub mod testing;

pub use client::{Gateway, HttpGateway, PCloudClient};
pub use error::{GatewayError, GatewayErrorKind};
pub use models::*;
pub use request::Request;
