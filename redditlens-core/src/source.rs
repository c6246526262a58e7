//! Seams between the status components and the external systems they talk to.

use crate::{CoreError, DataSource, Freshness, HealthTarget};
use async_trait::async_trait;

/// A dependency that can answer a minimal round-trip.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    fn target(&self) -> HealthTarget;

    /// Performs the round-trip and returns a short description of what answered.
    async fn ping(&self) -> Result<String, CoreError>;
}

/// Somewhere extracted posts end up.
#[async_trait]
pub trait ExtractionSource: Send + Sync {
    fn kind(&self) -> DataSource;

    /// Timestamp bounds and row count. An empty but reachable source is not an error.
    async fn freshness(&self) -> Result<Freshness, CoreError>;
}
