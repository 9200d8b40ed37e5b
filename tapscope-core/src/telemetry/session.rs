//! BuildSession - the build-scoped owner of collected telemetry.
//!
//! Created once when a build (or watch session) starts and shared with
//! every instrumented tap through an `Arc`. All outcome records produced
//! during the build are attributed to it.
//!
//! ## Lifecycle
//!
//! 1. Created with the resolved config (`BuildSession::new()`)
//! 2. Passed to `intercept()` for each hook that should be observed
//! 3. Proxies submit records through `submit()` as taps complete
//! 4. Report produced via `finish()`; `Drop` logs a summary otherwise

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::record::OutcomeRecord;
use super::sink::{HookRecords, MemorySink, TelemetrySink};
use crate::config::{InstrumentationConfig, ReportMode};
use crate::error::TelemetryError;

pub struct BuildSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: InstrumentationConfig,
    sink: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    start_instant: Instant,
    /// Whether finish() has been called (prevents the Drop summary)
    is_finished: AtomicBool,
}

impl BuildSession {
    /// New session with an in-memory sink and the system clock.
    pub fn new(config: InstrumentationConfig) -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: Utc::now(),
            config,
            sink: Arc::new(MemorySink::new()),
            clock: Arc::new(SystemClock::new()),
            start_instant: Instant::now(),
            is_finished: AtomicBool::new(false),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current time on the session clock, in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Append records for `hook` to the session sink.
    pub fn submit(&self, hook: &str, records: Vec<OutcomeRecord>) -> Result<(), TelemetryError> {
        self.sink.submit(hook, records)
    }

    /// Everything collected so far, keyed by hook name.
    pub fn records(&self) -> HookRecords {
        self.sink.snapshot()
    }

    /// Close the session and build its report.
    ///
    /// Safe to call more than once; each call reflects the current state.
    pub fn finish(&self) -> SessionReport {
        self.is_finished.store(true, Ordering::SeqCst);
        let report = SessionReport::build(self);

        info!(
            session_id = %report.session_id,
            hooks = report.hooks.len(),
            records = report.total_records(),
            errors = report.total_errors(),
            duration_ms = report.duration_ms,
            "Build session finished"
        );
        report
    }
}

impl std::fmt::Debug for BuildSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("config", &self.config)
            .field("sink", &self.sink.name())
            .finish()
    }
}

/// A session dropped without finish() still leaves a trace in the logs.
impl Drop for BuildSession {
    fn drop(&mut self) {
        if self.is_finished.load(Ordering::SeqCst) {
            return;
        }

        let records = self.sink.snapshot();
        let total: usize = records.values().map(Vec::len).sum();
        debug!(
            session_id = %self.id,
            hooks = records.len(),
            records = total,
            duration_ms = self.start_instant.elapsed().as_millis() as u64,
            "Build session dropped without finish()"
        );
    }
}

/// Per-hook totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSummary {
    pub hook: String,
    pub calls: usize,
    pub errors: usize,
    pub total_costs: u64,
}

/// Snapshot handed to the reporting/export layer at build end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: String,
    /// RFC3339
    pub started_at: String,
    pub duration_ms: u64,
    pub mode: ReportMode,
    /// Sorted by total cost, most expensive first
    pub hooks: Vec<HookSummary>,
    pub records: HookRecords,
}

impl SessionReport {
    fn build(session: &BuildSession) -> Self {
        let records = session.records();

        let mut hooks: Vec<HookSummary> = records
            .iter()
            .map(|(hook, rows)| HookSummary {
                hook: hook.clone(),
                calls: rows.len(),
                errors: rows.iter().filter(|r| r.is_error()).count(),
                total_costs: rows.iter().map(|r| r.costs).sum(),
            })
            .collect();
        hooks.sort_by(|a, b| {
            b.total_costs
                .cmp(&a.total_costs)
                .then_with(|| a.hook.cmp(&b.hook))
        });

        Self {
            session_id: session.id.to_string(),
            started_at: session.started_at.to_rfc3339(),
            duration_ms: session.start_instant.elapsed().as_millis() as u64,
            mode: session.config.mode,
            hooks,
            records,
        }
    }

    pub fn total_records(&self) -> usize {
        self.hooks.iter().map(|h| h.calls).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.hooks.iter().map(|h| h.errors).sum()
    }
}
