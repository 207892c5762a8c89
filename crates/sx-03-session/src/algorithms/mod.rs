//! # Algorithms Module
//!
//! Batch result reassembly.

pub mod batch_results;

pub use batch_results::reassemble_batch_results;
