//! Process-wide, type-keyed memoization.
//!
//! Union descriptors and polymorphic registries are pure functions of their
//! type, so each is computed once per type and shared for the process
//! lifetime. Population races are tolerated: two threads may build the same
//! entry concurrently, the first insert wins, and both observe the winner.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

/// Concurrent cache mapping a (key type, value type) pair to one immutable, shared value.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: RwLock<HashMap<(TypeId, TypeId), Arc<dyn Any + Send + Sync>>>,
}

impl TypeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value cached for key type `K`, building it with `build` on first use.
    ///
    /// `build` runs outside the lock and may run more than once under
    /// contention; only the first finished value is kept.
    pub fn get_or_insert_with<K, V, F>(&self, build: F) -> Arc<V>
    where
        K: 'static,
        V: Send + Sync + 'static,
        F: FnOnce() -> V,
    {
        let key = (TypeId::of::<K>(), TypeId::of::<V>());

        if let Some(hit) = self.lookup::<V>(key) {
            return hit;
        }

        let built = Arc::new(build());
        let winner = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let erased: Arc<dyn Any + Send + Sync> = built.clone();
            Arc::clone(entries.entry(key).or_insert(erased))
        };
        debug!(type_name = std::any::type_name::<K>(), "populated type cache entry");

        winner.downcast::<V>().unwrap_or(built)
    }

    /// Number of populated entries.
    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[cfg(test)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<V: Send + Sync + 'static>(&self, key: (TypeId, TypeId)) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).cloned().and_then(|hit| hit.downcast::<V>().ok())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    struct KeyA;
    struct KeyB;

    #[test]
    fn test_builds_once_per_type() {
        let cache = TypeCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_insert_with::<KeyA, _, _>(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            "a".to_owned()
        });
        let second = cache.get_or_insert_with::<KeyA, _, _>(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            "other".to_owned()
        });

        assert_eq!(*first, "a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_types_have_distinct_entries() {
        let cache = TypeCache::new();
        assert!(cache.is_empty());
        let a = cache.get_or_insert_with::<KeyA, _, _>(|| 1_u32);
        let b = cache.get_or_insert_with::<KeyB, _, _>(|| 2_u32);
        assert_eq!((*a, *b), (1, 2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_first_use_converges() {
        let cache = Arc::new(TypeCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_insert_with::<KeyA, _, _>(move || i))
            })
            .collect();

        let values: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
