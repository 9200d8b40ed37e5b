//! Telemetry sinks: where outcome records accumulate.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::record::OutcomeRecord;
use crate::error::TelemetryError;

/// Accumulated records, keyed by hook name, in submission order per hook.
pub type HookRecords = BTreeMap<String, Vec<OutcomeRecord>>;

/// Append-oriented collector of outcome records.
///
/// Must accept submissions from concurrent in-flight taps. Ordering across
/// submitters is not guaranteed; dropping a submission is never allowed
/// without reporting an error.
pub trait TelemetrySink: Send + Sync {
    /// Merge `records` into the accumulated state under `hook`.
    fn submit(&self, hook: &str, records: Vec<OutcomeRecord>) -> Result<(), TelemetryError>;

    /// Everything accumulated so far.
    fn snapshot(&self) -> HookRecords;

    /// Human-readable sink name (e.g. "memory").
    fn name(&self) -> &str;
}

/// In-memory sink backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<HookRecords>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemorySink {
    /// Acquire the records lock, recovering from poison.
    ///
    /// A panic in another submitter leaves at worst a partially extended
    /// vector behind; later records must still be kept.
    fn lock_records(&self) -> MutexGuard<'_, HookRecords> {
        self.records.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(
                target: "tapscope::telemetry",
                "Telemetry sink mutex was poisoned, recovering"
            );
            poisoned.into_inner()
        })
    }
}

impl TelemetrySink for MemorySink {
    fn submit(&self, hook: &str, records: Vec<OutcomeRecord>) -> Result<(), TelemetryError> {
        trace!(hook, count = records.len(), "Submitting outcome records");
        self.lock_records()
            .entry(hook.to_string())
            .or_default()
            .extend(records);
        Ok(())
    }

    fn snapshot(&self) -> HookRecords {
        self.lock_records().clone()
    }

    fn name(&self) -> &str {
        "memory"
    }
}
