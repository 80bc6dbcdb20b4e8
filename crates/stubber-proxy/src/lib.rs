// Library exports for the binary, integration tests and benchmarks.

pub mod admin_api;
pub mod config;
pub mod delay;
pub mod metrics;
pub mod proxy;
pub mod recording;
pub mod stubs;
pub mod upsert;
