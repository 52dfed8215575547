//! Per-key suppression buckets and the summaries drained from them.

use crate::domain::context::Context;
use crate::domain::field::{keys, Field};
use crate::domain::key::ThrottleKey;
use std::sync::atomic::{AtomicU64, Ordering};

/// State kept for one `(level, message)` pair during a flush window.
///
/// The first occurrence is forwarded immediately and its context and fields
/// are kept here; every later occurrence only bumps `pending`.
#[derive(Debug)]
pub struct ThrottleBucket {
    context: Context,
    fields: Vec<Field>,
    /// Occurrences suppressed since the last flush.
    pending: AtomicU64,
}

impl ThrottleBucket {
    pub fn new(context: Context, fields: Vec<Field>) -> Self {
        Self {
            context,
            fields,
            pending: AtomicU64::new(0),
        }
    }

    /// Count one suppressed occurrence.
    pub fn record_suppression(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Current number of suppressed occurrences.
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    /// Atomically read the pending count and reset it to zero.
    ///
    /// A single swap, so an increment racing with the drain is either
    /// returned here or left for the next drain, never lost.
    pub fn take_pending(&self) -> u64 {
        self.pending.swap(0, Ordering::AcqRel)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// One bucket's worth of suppressed occurrences, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct FlushSummary {
    pub key: ThrottleKey,
    pub context: Context,
    pub fields: Vec<Field>,
    /// Occurrences suppressed during the window.
    pub suppressed: u64,
}

impl FlushSummary {
    pub fn from_bucket(key: ThrottleKey, bucket: &ThrottleBucket, suppressed: u64) -> Self {
        Self {
            key,
            context: bucket.context.clone(),
            fields: bucket.fields.clone(),
            suppressed,
        }
    }

    /// Total occurrences in the window, counting the one forwarded immediately.
    pub fn times(&self) -> u64 {
        self.suppressed + 1
    }

    /// The first-seen fields with `times` appended.
    pub fn into_fields(self) -> Vec<Field> {
        let times = self.times();
        let mut fields = self.fields;
        fields.push(Field::new(keys::TIMES, times));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldValue;
    use crate::domain::level::Level;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_bucket_has_nothing_pending() {
        let bucket = ThrottleBucket::new(Context::background(), Vec::new());
        assert_eq!(bucket.pending(), 0);
        assert_eq!(bucket.take_pending(), 0);
    }

    #[test]
    fn test_take_pending_resets() {
        let bucket = ThrottleBucket::new(Context::background(), Vec::new());
        bucket.record_suppression();
        bucket.record_suppression();

        assert_eq!(bucket.take_pending(), 2);
        assert_eq!(bucket.pending(), 0);

        bucket.record_suppression();
        assert_eq!(bucket.take_pending(), 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let bucket = Arc::new(ThrottleBucket::new(Context::background(), Vec::new()));
        let mut drained = 0;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bucket = Arc::clone(&bucket);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        bucket.record_suppression();
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            drained += bucket.take_pending();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drained += bucket.take_pending();

        assert_eq!(drained, 8_000);
    }

    #[test]
    fn test_summary_appends_times() {
        let bucket = ThrottleBucket::new(
            Context::background(),
            vec![Field::new("disk", "/dev/sda")],
        );
        let key = ThrottleKey::new(Level::Warn, "disk full");
        let summary = FlushSummary::from_bucket(key, &bucket, 4);

        assert_eq!(summary.times(), 5);

        let fields = summary.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].key(), "times");
        assert_eq!(fields[1].value, FieldValue::Uint(5));
    }
}
