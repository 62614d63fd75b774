//! Projection module
//!
//! Query side: transfers projected into per-account payments.

mod service;

pub use service::ProjectionService;
