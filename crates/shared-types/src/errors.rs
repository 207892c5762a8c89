//! # Error Types
//!
//! Defines the error type reported by physical resource managers.

use std::borrow::Borrow;
use thiserror::Error;

/// Failure reported by a shard's physical connection (driver I/O or an XA
/// error code returned by the resource manager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource error{}: {message}", code_suffix(.code))]
pub struct ResourceError {
    /// XA or vendor error code, when the resource manager returned one.
    pub code: Option<i32>,
    /// Driver message.
    pub message: String,
}

fn code_suffix(code: impl Borrow<Option<i32>>) -> String {
    match code.borrow() {
        Some(code) => format!(" (code {})", code),
        None => String::new(),
    }
}

impl ResourceError {
    /// Error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Error carrying a resource-manager code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}
