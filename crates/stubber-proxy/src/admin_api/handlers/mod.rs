//! Admin command handlers, one module per resource.

pub mod delays;
pub mod history;
pub mod mocks;
pub mod system;
