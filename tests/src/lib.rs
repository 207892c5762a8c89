//! # Shard-XA Test Suite
//!
//! Unified test crate for flows that span more than one subsystem.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── routing_benchmarks.rs   # Route resolution and batch partitioning
//! └── src/
//!     └── integration/
//!         ├── fixtures.rs         # Shared router, tables and sessions
//!         ├── xa_flows.rs         # Coordinator + participants over in-memory RMs
//!         ├── concurrency.rs      # Concurrent phases against slow shards
//!         └── session_flows.rs    # Routing + enlistment + commit end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sx-tests
//!
//! # By category
//! cargo test -p sx-tests integration::xa_flows::
//! cargo test -p sx-tests integration::session_flows::
//!
//! # Benchmarks
//! cargo bench -p sx-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]
