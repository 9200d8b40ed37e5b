//! Per-tap telemetry: records, sinks, the build session, and the reporter.
//!
//! ## Architecture
//!
//! ```text
//! BuildSession (one per build / watch session)
//!   ├── id, started_at, config
//!   ├── clock: Arc<dyn Clock>
//!   └── sink: Arc<dyn TelemetrySink>
//!         └── hook name -> [OutcomeRecord, ...]   (append-only)
//!
//! report_outcome(session, hook, tap, start, kind, &result)
//!   └── one OutcomeRecord -> session.submit(hook, [record])
//! ```
//!
//! ## Key Features
//!
//! - **Results discarded**: success values never enter a record
//! - **Isolated**: sink errors and panics are logged, never propagated
//! - **Drop guard**: an unfinished session logs a summary when dropped

pub mod clock;
pub mod record;
pub mod reporter;
pub mod session;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use record::{OutcomeRecord, TapErrorDescriptor};
pub use reporter::{report_outcome, sample_start};
pub use session::{BuildSession, HookSummary, SessionReport};
pub use sink::{HookRecords, MemorySink, TelemetrySink};
