//! Process-wide query cache with wholesale invalidation.

use std::{collections::HashMap, future::Future};

use tokio::sync::RwLock;

struct Entries<T> {
    /// Bumped on every invalidation so loads that raced a write are not stored
    generation: u64,
    values: HashMap<&'static str, T>,
}

pub struct QueryCache<T> {
    inner: RwLock<Entries<T>>,
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Entries {
                generation: 0,
                values: HashMap::new(),
            }),
        }
    }
}

impl<T: Clone> QueryCache<T> {
    pub async fn get(&self, key: &'static str) -> Option<T> {
        self.inner.read().await.values.get(key).cloned()
    }

    /// Return the cached value for `key`, running `load` on a miss.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: &'static str, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = {
            let entries = self.inner.read().await;
            if let Some(value) = entries.values.get(key) {
                return Ok(value.clone());
            }
            entries.generation
        };

        let value = load().await?;

        let mut entries = self.inner.write().await;
        if entries.generation == generation {
            entries.values.insert(key, value.clone());
        }
        Ok(value)
    }

    /// Drop every entry
    pub async fn invalidate_all(&self) {
        let mut entries = self.inner.write().await;
        entries.generation += 1;
        entries.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_loads_once_until_invalidated() {
        let cache: QueryCache<u32> = QueryCache::default();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_load("answer", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate_all().await;
        assert!(cache.get("answer").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache: QueryCache<u32> = QueryCache::default();
        let result = cache
            .get_or_try_load("answer", || async { Err::<u32, _>("boom") })
            .await;
        assert!(result.is_err());
        assert!(cache.get("answer").await.is_none());
    }
}
