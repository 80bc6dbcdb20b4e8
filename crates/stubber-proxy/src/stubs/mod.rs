//! Mock response registry.
//!
//! This module provides:
//! - `MockRegistry`: stubs keyed by request target, with use-count expiry
//! - `DeliveryClaim`: a reserved delivery, completed after the response is sent
//! - `DeliveryBody`: response body that completes its claim at end of stream
//!
//! ## Module Structure
//!
//! - `types`: stub and outcome types
//! - `registry`: the registry and claim implementation
//! - `response`: stub response encoding and the delivery body

mod registry;
mod response;
mod types;

#[cfg(test)]
mod tests;

pub use registry::{DeliveryClaim, MockRegistry};
pub use response::{render_body, to_json_4, DeliveryBody, StubResponseBuilder};
pub use types::{DeliveryOutcome, MockStub, SetOutcome, StubLookup};
