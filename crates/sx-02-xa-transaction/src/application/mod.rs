//! # Application Layer
//!
//! The transaction coordinator service.

pub mod service;

pub use service::TransactionCoordinator;
