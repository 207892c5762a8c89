//! In-Memory Data Source Adapter
//!
//! Opens connections to the shards of an `InMemoryResourceManager`.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ResourceError, ShardIndex};
use std::collections::HashSet;
use sx_02_xa_transaction::{InMemoryResourceManager, XaConnection};

use crate::ports::outbound::ShardDataSource;

/// Data source over a fixed number of in-memory shards.
pub struct InMemoryDataSource {
    rm: InMemoryResourceManager,
    shard_count: u32,
    unreachable: Mutex<HashSet<ShardIndex>>,
}

impl InMemoryDataSource {
    /// Data source for shards `0..shard_count` of `rm`.
    pub fn new(rm: InMemoryResourceManager, shard_count: u32) -> Self {
        Self {
            rm,
            shard_count,
            unreachable: Mutex::new(HashSet::new()),
        }
    }

    /// Make `connect(shard)` fail until [`InMemoryDataSource::restore`].
    pub fn make_unreachable(&self, shard: ShardIndex) {
        self.unreachable.lock().insert(shard);
    }

    /// Undo [`InMemoryDataSource::make_unreachable`].
    pub fn restore(&self, shard: ShardIndex) {
        self.unreachable.lock().remove(&shard);
    }

    /// Backing resource manager.
    pub fn resource_manager(&self) -> &InMemoryResourceManager {
        &self.rm
    }
}

#[async_trait]
impl ShardDataSource for InMemoryDataSource {
    async fn connect(&self, shard: ShardIndex) -> Result<Box<dyn XaConnection>, ResourceError> {
        if u32::from(shard) >= self.shard_count {
            return Err(ResourceError::new(format!(
                "no shard {} (shard count {})",
                shard, self.shard_count
            )));
        }
        if self.unreachable.lock().contains(&shard) {
            return Err(ResourceError::new(format!("shard {} unreachable", shard)));
        }
        Ok(Box::new(self.rm.connection(shard)))
    }
}
