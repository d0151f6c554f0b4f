use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use serde::Serialize;

// ─── Public types ────────────────────────────────────────────────

/// Process-wide traffic counters.
///
/// Intake tasks bump `total_requests`, `dropped_bodies` and the per-method
/// tally; workers are the only writers of `total_body_size`. Each counter is
/// independent, so `Ordering::Relaxed` is enough everywhere.
#[derive(Default)]
pub struct MetricsStore {
    total_requests: AtomicU64,
    total_body_size: AtomicU64,
    dropped_bodies: AtomicU64,
    methods: MethodRegistry,
}

/// Lazily populated method → counter map.
///
/// An entry is created at most once per method name; increments on an
/// existing entry only ever take the shared lock.
#[derive(Default)]
pub struct MethodRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
}

/// Per-method line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCount {
    pub method: String,
    pub count: u64,
}

/// Read-only copy of every counter, taken once the workers have exited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_body_size: u64,
    pub dropped_bodies: u64,
    pub methods: Vec<MethodCount>,
}

// ─── MetricsStore impl ───────────────────────────────────────────

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One completed intake.
    pub fn record_request(&self, method: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.methods.increment(method);
    }

    /// A body was rejected because the queue was full.
    pub fn record_dropped_body(&self) {
        self.dropped_bodies.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by workers after consuming a queued body.
    pub fn record_consumed_body(&self, len: usize) {
        self.total_body_size.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_body_size(&self) -> u64 {
        self.total_body_size.load(Ordering::Relaxed)
    }

    pub fn dropped_bodies(&self) -> u64 {
        self.dropped_bodies.load(Ordering::Relaxed)
    }

    pub fn method_count(&self, method: &str) -> Option<u64> {
        self.methods.get(method)
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Copy all counters. Only meaningful at a quiescent point; the
    /// lifecycle calls it after every worker has been joined.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests(),
            total_body_size: self.total_body_size(),
            dropped_bodies: self.dropped_bodies(),
            methods: self.methods.counts(),
        }
    }
}

// ─── MethodRegistry impl ─────────────────────────────────────────

impl MethodRegistry {
    /// Double-checked increment: shared lookup first, exclusive insert only
    /// on the very first request for a method.
    pub fn increment(&self, method: &str) {
        // Fast path: method already registered
        {
            let counters = self.counters.read();
            if let Some(counter) = counters.get(method) {
                counter.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        // Slow path: only one upgradable reader at a time, so the re-check
        // below cannot race another creator.
        let counters = self.counters.upgradable_read();
        let counters = if counters.contains_key(method) {
            RwLockUpgradableReadGuard::downgrade(counters)
        } else {
            let mut counters = RwLockUpgradableReadGuard::upgrade(counters);
            counters.insert(method.to_owned(), AtomicU64::new(0));
            RwLockWriteGuard::downgrade(counters)
        };

        if let Some(counter) = counters.get(method) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, method: &str) -> Option<u64> {
        self.counters
            .read()
            .get(method)
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Number of distinct methods seen so far.
    pub fn len(&self) -> usize {
        self.counters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total(&self) -> u64 {
        self.counters
            .read()
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Busiest method first, ties broken by name so output is stable.
    pub fn counts(&self) -> Vec<MethodCount> {
        let mut counts: Vec<MethodCount> = self
            .counters
            .read()
            .iter()
            .map(|(method, c)| MethodCount {
                method: method.clone(),
                count: c.load(Ordering::Relaxed),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.method.cmp(&b.method)));
        counts
    }
}

// ─── Derived figures ─────────────────────────────────────────────

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

impl MetricsSnapshot {
    pub fn total_body_mb(&self) -> f64 {
        self.total_body_size as f64 / BYTES_PER_MB
    }

    /// Consumed bytes per request in KB, `None` when nothing was consumed.
    pub fn average_body_kb(&self) -> Option<f64> {
        if self.total_body_size == 0 || self.total_requests == 0 {
            return None;
        }
        Some(self.total_body_size as f64 / self.total_requests as f64 / BYTES_PER_KB)
    }

    /// Share of requests whose body was dropped, `None` when nothing was.
    pub fn drop_percentage(&self) -> Option<f64> {
        if self.dropped_bodies == 0 || self.total_requests == 0 {
            return None;
        }
        Some(self.dropped_bodies as f64 / self.total_requests as f64 * 100.0)
    }

    pub fn method_total(&self) -> u64 {
        self.methods.iter().map(|m| m.count).sum()
    }
}

impl MethodCount {
    pub fn percentage_of(&self, total_requests: u64) -> f64 {
        if total_requests == 0 {
            return 0.0;
        }
        self.count as f64 / total_requests as f64 * 100.0
    }
}
