//! # Application Module
//!
//! Coordinator Session service.

pub mod service;

pub use service::CoordinatorSession;
