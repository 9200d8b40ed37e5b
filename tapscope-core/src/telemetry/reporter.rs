//! Outcome reporter: turns one finished tap invocation into one record.
//!
//! Everything here runs on the host's critical path. Nothing in this module
//! may fail outward: sink errors and panics anywhere on the telemetry path
//! are logged and dropped.

use std::panic::{self, AssertUnwindSafe};

use super::record::{OutcomeRecord, TapErrorDescriptor};
use super::session::BuildSession;
use crate::hooks::{TapKind, TapResult};

/// Start timestamp for a tap invocation on the session clock.
///
/// A panicking clock yields 0 rather than unwinding into the host.
pub fn sample_start(session: &BuildSession) -> u64 {
    panic::catch_unwind(AssertUnwindSafe(|| session.now_ms())).unwrap_or_else(|_| {
        tracing::warn!(target: "tapscope::telemetry", "Session clock panicked; start time lost");
        0
    })
}

/// Record the outcome of a tap invocation that started at `start_at`.
///
/// The success value is discarded; only timing and the error (if any)
/// are kept. Exactly one record is submitted under `hook_name`.
pub fn report_outcome<R>(
    session: &BuildSession,
    hook_name: &str,
    tap_name: &str,
    start_at: u64,
    kind: TapKind,
    outcome: &TapResult<R>,
) {
    // Clock reads and error formatting run user code (a tap error's
    // `Display`, a custom clock), so they sit under the same guard as the sink.
    let submitted = panic::catch_unwind(AssertUnwindSafe(|| {
        let record = build_record(session, hook_name, tap_name, start_at, kind, outcome);
        session.submit(hook_name, vec![record])
    }));

    match submitted {
        Ok(Ok(())) => {}
        Ok(Err(e)) => e.log_isolated(),
        Err(_) => tracing::warn!(
            target: "tapscope::telemetry",
            hook = hook_name,
            tap = tap_name,
            "Telemetry path panicked; record dropped"
        ),
    }
}

fn build_record<R>(
    session: &BuildSession,
    hook_name: &str,
    tap_name: &str,
    start_at: u64,
    kind: TapKind,
    outcome: &TapResult<R>,
) -> OutcomeRecord {
    let end_at = session.now_ms();

    let error = match outcome {
        Ok(_) => Vec::new(),
        Err(err) => vec![TapErrorDescriptor::from_tap_error(tap_name, hook_name, err)],
    };

    OutcomeRecord {
        hook: hook_name.to_string(),
        tap_name: tap_name.to_string(),
        kind,
        start_at,
        end_at,
        costs: end_at.saturating_sub(start_at),
        result: None,
        error,
    }
}
