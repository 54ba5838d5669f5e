use std::future::Future;
use tokio::sync::OnceCell;
use tracing::debug;

/// Owned init-once slot. The first completed initialisation wins and is
/// returned for the lifetime of the value; there is no invalidation.
pub struct InitOnce<V>
where
    V: Clone + Send + Sync,
{
    inner: OnceCell<V>,
}

impl<V> InitOnce<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<V> {
        let value = self.inner.get().cloned();
        if value.is_some() {
            debug!("Cache HIT");
        } else {
            debug!("Cache MISS");
        }
        value
    }

    /// Returns the cached value, running `init` when the slot is unset.
    /// Concurrent callers wait for the in-flight initialisation.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get() {
            return value;
        }
        self.inner
            .get_or_init(|| async move {
                let value = init().await;
                debug!("Cache PUT");
                value
            })
            .await
            .clone()
    }
}

impl<V> Default for InitOnce<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
