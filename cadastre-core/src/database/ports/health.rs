use async_trait::async_trait;

use crate::error::Result;

/// Liveness check for the backing store.
#[async_trait]
pub trait StorageHealth: Send + Sync {
    async fn ping(&self) -> Result<()>;
}
