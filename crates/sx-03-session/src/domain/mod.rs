//! # Domain Module
//!
//! Configuration, results and errors of the Coordinator Session.

pub mod config;
pub mod entities;
pub mod errors;

pub use config::*;
pub use entities::*;
pub use errors::*;
