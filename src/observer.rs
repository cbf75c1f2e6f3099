//! Resolution observers.
//!
//! Observers receive a callback for every node the container visits while
//! resolving a request, including cache hits. They are called synchronously
//! on the resolving thread, so implementations should stay cheap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::ScopeName;

/// What is being resolved, from where, and in which scope.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionEvent<'a> {
    pub key: &'a TypeKey,
    /// Declaration site of the binding that serves `key`.
    pub declared_at: &'a Location,
    pub requested_by: &'a Location,
    pub scope: &'a ScopeName,
}

/// Observer hooks for resolution events.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{location, Registrations, ResolutionEvent, ResolutionObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl ResolutionObserver for Counting {
///     fn resolving(&self, _event: &ResolutionEvent<'_>) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counting = Arc::new(Counting::default());
/// let mut regs = Registrations::new();
/// regs.supply(42i32, location!());
/// regs.add_observer(counting.clone());
///
/// let container = regs.build().unwrap();
/// container.get_root::<i32>(&location!()).unwrap();
/// assert_eq!(counting.0.load(Ordering::Relaxed), 1);
/// ```
pub trait ResolutionObserver: Send + Sync {
    /// Called before the container looks at the node's cache.
    fn resolving(&self, event: &ResolutionEvent<'_>);

    /// Called after a value was produced. `cached` is true when the value
    /// came from a memo cell: the container's, a scope instance's, or a
    /// group's. Group members are not reported on their own.
    fn resolved(&self, event: &ResolutionEvent<'_>, duration: Duration, cached: bool) {
        let _ = (event, duration, cached);
    }

    fn failed(&self, event: &ResolutionEvent<'_>, error: &DiError) {
        let _ = (event, error);
    }
}

/// Registered observers. Empty in the common case, which keeps the
/// resolution fast path free of timing calls.
///
/// Callbacks run on a snapshot taken outside the lock, so an observer may
/// register further observers; those see the next event onwards.
pub(crate) struct Observers {
    observers: RwLock<Arc<[Arc<dyn ResolutionObserver>]>>,
}

impl Default for Observers {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn ResolutionObserver>>) -> Self {
        Self {
            observers: RwLock::new(observers.into()),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn ResolutionObserver>) {
        let mut observers = self.observers.write();
        let mut next = observers.to_vec();
        next.push(observer);
        *observers = next.into();
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.read().is_empty()
    }

    fn snapshot(&self) -> Arc<[Arc<dyn ResolutionObserver>]> {
        self.observers.read().clone()
    }

    pub(crate) fn resolving(&self, event: &ResolutionEvent<'_>) {
        for observer in self.snapshot().iter() {
            observer.resolving(event);
        }
    }

    pub(crate) fn resolved(&self, event: &ResolutionEvent<'_>, duration: Duration, cached: bool) {
        for observer in self.snapshot().iter() {
            observer.resolved(event, duration, cached);
        }
    }

    pub(crate) fn failed(&self, event: &ResolutionEvent<'_>, error: &DiError) {
        for observer in self.snapshot().iter() {
            observer.failed(event, error);
        }
    }
}

/// Emits every resolution event through `tracing` at DEBUG level, failures
/// at WARN.
///
/// ```
/// use ferrous_wire::{Registrations, TracingObserver};
/// use std::sync::Arc;
///
/// let mut regs = Registrations::new();
/// regs.add_observer(Arc::new(TracingObserver::new()));
/// let _container = regs.build().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_label("ferrous-wire")
    }

    /// Observer whose events carry `label`, to tell containers apart.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionObserver for TracingObserver {
    fn resolving(&self, event: &ResolutionEvent<'_>) {
        tracing::debug!(
            container = %self.label,
            key = %event.key,
            declared_at = %event.declared_at,
            requested_by = %event.requested_by,
            scope = %event.scope,
            "resolving"
        );
    }

    fn resolved(&self, event: &ResolutionEvent<'_>, duration: Duration, cached: bool) {
        tracing::debug!(
            container = %self.label,
            key = %event.key,
            scope = %event.scope,
            ?duration,
            cached,
            "resolved"
        );
    }

    fn failed(&self, event: &ResolutionEvent<'_>, error: &DiError) {
        tracing::warn!(
            container = %self.label,
            key = %event.key,
            requested_by = %event.requested_by,
            scope = %event.scope,
            %error,
            "resolution failed"
        );
    }
}

/// Counts resolutions, cache hits and failures.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful resolutions, cached or not.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / count))
    }

    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }
}

impl ResolutionObserver for MetricsObserver {
    fn resolving(&self, _event: &ResolutionEvent<'_>) {}

    fn resolved(&self, _event: &ResolutionEvent<'_>, duration: Duration, cached: bool) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if cached {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        self.total_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _event: &ResolutionEvent<'_>, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
