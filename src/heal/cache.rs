use crate::adapter::Framework;
use crate::store::KvStore;

/// Permanent memoization of successful repairs.
///
/// Keys are `framework:failed_locator:context_hint`, case-sensitive. There
/// is no TTL and no eviction; a cached locator that later breaks simply
/// re-enters the pipeline as the next failed locator.
pub struct HealingCache {
    store: Box<dyn KvStore>,
}

impl HealingCache {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Stable cache key for a healing request
    pub fn key(framework: Framework, failed_locator: &str, context_hint: &str) -> String {
        format!("{}:{}:{}", framework, failed_locator, context_hint)
    }

    pub fn get(&self, framework: Framework, failed_locator: &str, context_hint: &str) -> Option<String> {
        self.store
            .get(&Self::key(framework, failed_locator, context_hint))
            .map(|s| s.to_string())
    }

    /// Store a repair and flush to the backing store. Flush failures are
    /// logged, not propagated; the in-memory entry stays usable.
    pub fn insert(
        &mut self,
        framework: Framework,
        failed_locator: &str,
        context_hint: &str,
        healed_locator: &str,
    ) {
        self.store
            .set(&Self::key(framework, failed_locator, context_hint), healed_locator);
        if let Err(e) = self.store.flush() {
            log::warn!("Failed to persist healing cache: {}", e);
        }
    }

    pub fn clear(&mut self) {
        self.store.clear();
        if let Err(e) = self.store.flush() {
            log::warn!("Failed to persist healing cache: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
