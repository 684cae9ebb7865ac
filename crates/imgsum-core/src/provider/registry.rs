//! Process-wide registry of loaded local models.
//!
//! Local backends load a model once and share it across every describer and
//! summarizer built in the process. Loads for the same key are serialized:
//! concurrent callers wait for the first load instead of starting their own.
//! A failed load is not cached, so the next call tries again.

use crate::error::{ProviderError, ProviderResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OnceCell;

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Keyed cache of lazily loaded values.
pub struct ModelRegistry<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ModelRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `load` only if nothing is cached.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> ProviderResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let slot = self.slot(key);
        let value = slot
            .get_or_try_init(|| async {
                tracing::info!("Loading model {key}");
                let value = load().await?;
                tracing::info!("Model {key} ready");
                Ok::<_, ProviderError>(Arc::new(value))
            })
            .await?;
        Ok(value.clone())
    }

    fn slot(&self, key: &str) -> Slot<T> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }
}

/// Marker stored for a warmed-up local model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    /// Endpoint the model is served from
    pub endpoint: String,
    /// Model identifier on that endpoint
    pub model: String,
}

/// The registry shared by all local backends in this process.
pub fn local_models() -> &'static ModelRegistry<LoadedModel> {
    static LOCAL_MODELS: OnceLock<ModelRegistry<LoadedModel>> = OnceLock::new();
    LOCAL_MODELS.get_or_init(ModelRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_loads_once_and_shares_instance() {
        let registry = ModelRegistry::new();
        let loads = AtomicU32::new(0);

        let first = registry
            .get_or_load("llava", || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            })
            .await
            .unwrap();
        let second = registry
            .get_or_load("llava", || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(7u32)
            })
            .await
            .unwrap();

        assert_eq!(*second, 42);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_run_once() {
        let registry = Arc::new(ModelRegistry::new());
        let loads = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let loads = loads.clone();
                tokio::spawn(async move {
                    registry
                        .get_or_load("falcon", || async move {
                            loads.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok("model".to_string())
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.await.unwrap(), "model");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let registry: ModelRegistry<u32> = ModelRegistry::new();

        let err = registry
            .get_or_load("blip", || async {
                Err(ProviderError::ModelLoad {
                    model: "blip".to_string(),
                    message: "server offline".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("server offline"));

        let value = registry.get_or_load("blip", || async { Ok(1) }).await.unwrap();
        assert_eq!(*value, 1);
        let cached = registry.get_or_load("blip", || async { Ok(2) }).await.unwrap();
        assert_eq!(*cached, 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let registry = ModelRegistry::new();
        let a = registry.get_or_load("a", || async { Ok(1u8) }).await.unwrap();
        let b = registry.get_or_load("b", || async { Ok(2u8) }).await.unwrap();
        assert_eq!((*a, *b), (1, 2));
    }
}
