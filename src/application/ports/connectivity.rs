use async_trait::async_trait;

/// A single reachability probe. A probe failure reads as offline and is
/// never raised to callers.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}
