//! Central registry of throttle buckets.
//!
//! The registry decides whether a call is the first of its window and drains
//! suppressed counts at flush time.

use crate::application::metrics::Metrics;
use crate::application::ports::Storage;
use crate::domain::{
    bucket::{FlushSummary, ThrottleBucket},
    context::Context,
    field::Field,
    key::ThrottleKey,
};

/// Outcome of observing one log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First occurrence in the window; the caller must forward it.
    First,
    /// Counted against an existing bucket; the caller must drop it.
    Suppressed,
}

/// Registry managing all throttle buckets.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct ThrottleRegistry<S>
where
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    storage: S,
    metrics: Metrics,
}

impl<S> ThrottleRegistry<S>
where
    S: Storage<ThrottleKey, ThrottleBucket> + Clone,
{
    pub fn new(storage: S, metrics: Metrics) -> Self {
        Self { storage, metrics }
    }

    /// Record one occurrence of `key`.
    ///
    /// Creates the bucket (keeping `ctx` and `fields`) on first sight,
    /// otherwise bumps its pending count. Fields are only cloned when the
    /// bucket is created.
    pub fn observe(&self, key: ThrottleKey, ctx: &Context, fields: &[Field]) -> Observation {
        let observation = self.storage.get_or_insert_with(
            key,
            || ThrottleBucket::new(ctx.clone(), fields.to_vec()),
            |bucket, created| {
                if created {
                    Observation::First
                } else {
                    bucket.record_suppression();
                    Observation::Suppressed
                }
            },
        );

        match observation {
            Observation::First => self.metrics.record_forwarded(),
            Observation::Suppressed => self.metrics.record_suppressed(),
        }
        observation
    }

    /// Drain every bucket.
    ///
    /// Buckets with pending occurrences yield one summary each and stay in
    /// place with a zero count; buckets with nothing pending are evicted so
    /// their next occurrence is forwarded again.
    pub fn drain(&self) -> Vec<FlushSummary> {
        let mut summaries = Vec::new();
        let mut evicted = 0;

        self.storage.retain(|key, bucket| match bucket.take_pending() {
            0 => {
                evicted += 1;
                false
            }
            suppressed => {
                summaries.push(FlushSummary::from_bucket(key.clone(), bucket, suppressed));
                true
            }
        });

        self.metrics.record_evictions(evicted);
        summaries
    }

    /// Total occurrences currently waiting for the next flush.
    pub fn pending(&self) -> u64 {
        let mut total = 0;
        self.storage.for_each(|_, bucket| total += bucket.pending());
        total
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the number of live buckets.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop every bucket without emitting summaries.
    pub fn clear(&self) {
        self.storage.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::Level;
    use crate::infrastructure::storage::ShardedStorage;
    use std::sync::Arc;

    fn registry() -> ThrottleRegistry<Arc<ShardedStorage<ThrottleKey, ThrottleBucket>>> {
        ThrottleRegistry::new(Arc::new(ShardedStorage::new()), Metrics::new())
    }

    fn key(message: &str) -> ThrottleKey {
        ThrottleKey::new(Level::Warn, message)
    }

    #[test]
    fn test_first_then_suppressed() {
        let registry = registry();
        let ctx = Context::background();

        assert_eq!(registry.observe(key("a"), &ctx, &[]), Observation::First);
        assert_eq!(registry.observe(key("a"), &ctx, &[]), Observation::Suppressed);
        assert_eq!(registry.observe(key("b"), &ctx, &[]), Observation::First);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.pending(), 1);
    }

    #[test]
    fn test_drain_summarizes_and_evicts() {
        let registry = registry();
        let ctx = Context::background();

        for _ in 0..5 {
            registry.observe(key("busy"), &ctx, &[]);
        }
        registry.observe(key("quiet"), &ctx, &[]);

        let summaries = registry.drain();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].key, key("busy"));
        assert_eq!(summaries[0].times(), 5);

        // "quiet" had nothing pending and is gone, "busy" stays with zero.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.metrics().buckets_evicted(), 1);

        // Nothing pending now, so the next drain evicts "busy" too.
        assert!(registry.drain().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evicted_key_is_first_again() {
        let registry = registry();
        let ctx = Context::background();

        registry.observe(key("a"), &ctx, &[]);
        registry.drain();

        assert_eq!(registry.observe(key("a"), &ctx, &[]), Observation::First);
    }

    #[test]
    fn test_first_seen_fields_are_kept() {
        let registry = registry();
        let ctx = Context::background().with_value("correlation_id", "first");

        registry.observe(key("a"), &ctx, &[Field::new("attempt", 1_i64)]);
        registry.observe(
            key("a"),
            &Context::background().with_value("correlation_id", "second"),
            &[Field::new("attempt", 2_i64)],
        );

        let summary = registry.drain().pop().unwrap();
        assert_eq!(summary.context.get("correlation_id"), Some("first"));
        assert_eq!(summary.fields, vec![Field::new("attempt", 1_i64)]);
    }

    #[test]
    fn test_concurrent_first_occurrence_has_one_winner() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        let registry = Arc::new(registry());
        let firsts = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let firsts = Arc::clone(&firsts);
                thread::spawn(move || {
                    let ctx = Context::background();
                    for _ in 0..100 {
                        if registry.observe(key("race"), &ctx, &[]) == Observation::First {
                            firsts.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(firsts.load(Ordering::Relaxed), 1);
        assert_eq!(registry.pending(), 16 * 100 - 1);
    }

    #[test]
    fn test_drain_while_producing_loses_nothing() {
        use std::thread;

        let registry = Arc::new(registry());
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let ctx = Context::background();
                    for _ in 0..2_000 {
                        registry.observe(key("hot"), &ctx, &[]);
                    }
                })
            })
            .collect();

        let mut drained = 0;
        for _ in 0..20 {
            drained += registry.drain().iter().map(|s| s.suppressed).sum::<u64>();
        }
        for handle in producers {
            handle.join().unwrap();
        }
        drained += registry.drain().iter().map(|s| s.suppressed).sum::<u64>();

        // Every call is either forwarded as a first occurrence or drained.
        let metrics = registry.metrics().snapshot();
        assert_eq!(metrics.total_events(), 8_000);
        assert_eq!(metrics.events_forwarded + drained, 8_000);
    }
}
