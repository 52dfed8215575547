//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::{context::Context, field::Field, level::Level};
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// The logging capability every component consumes and every sink provides.
///
/// Only [`Logger::log`], [`Logger::is_debug`] and [`Logger::dump`] are
/// required; the per-level methods forward to `log`.
pub trait Logger: Send + Sync {
    /// Log `message` at `level` with call-site `fields`.
    fn log(&self, ctx: &Context, level: Level, message: &str, fields: Vec<Field>);

    /// Whether debug output is enabled for this context.
    fn is_debug(&self, ctx: &Context) -> bool;

    /// Development aid: log `values` as `arg0..argN` at debug level.
    ///
    /// Implementations must do nothing unless debug output is enabled.
    fn dump(&self, message: &str, values: &[&dyn Debug]);

    fn debug(&self, ctx: &Context, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Debug, message, fields);
    }

    fn info(&self, ctx: &Context, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Info, message, fields);
    }

    fn warn(&self, ctx: &Context, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Warn, message, fields);
    }

    fn error(&self, ctx: &Context, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Error, message, fields);
    }

    /// Log at [`Level::Panic`]. Sinks panic after writing the entry.
    fn panic(&self, ctx: &Context, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Panic, message, fields);
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, ctx: &Context, level: Level, message: &str, fields: Vec<Field>) {
        (**self).log(ctx, level, message, fields)
    }

    fn is_debug(&self, ctx: &Context) -> bool {
        (**self).is_debug(ctx)
    }

    fn dump(&self, message: &str, values: &[&dyn Debug]) {
        (**self).dump(message, values)
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn log(&self, ctx: &Context, level: Level, message: &str, fields: Vec<Field>) {
        (**self).log(ctx, level, message, fields)
    }

    fn is_debug(&self, ctx: &Context) -> bool {
        (**self).is_debug(ctx)
    }

    fn dump(&self, message: &str, values: &[&dyn Debug]) {
        (**self).dump(message, values)
    }
}

/// Port for turning request context into log fields.
pub trait ContextMapper: Send + Sync + Debug {
    fn values(&self, ctx: &Context) -> Vec<(String, String)>;
}

/// Port for obtaining the current wall-clock time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Port for the concurrent bucket map.
///
/// Implementations must run `accessor` while holding whatever guard keeps the
/// entry alive, and `retain` must hold off `get_or_insert_with` for the entries
/// it is visiting, so an accessor can never act on an entry that `retain` has
/// already dropped.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Look up `key`, inserting `factory()` if absent.
    ///
    /// `accessor` receives the value and whether this call created it. Exactly
    /// one of any number of racing callers observes `created == true`.
    fn get_or_insert_with<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&V, bool) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}
