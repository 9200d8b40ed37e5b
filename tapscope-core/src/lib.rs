//! Tapscope core library exports
//!
//! Build-time observability for bundler hooks: every tap registered on an
//! intercepted hook is replaced by a proxy that measures its cost, captures
//! its outcome, and reports one record per invocation into a
//! [`telemetry::BuildSession`], without changing what the tap returns.

pub mod config;
pub mod error;
pub mod hooks;
pub mod intercept;
pub mod telemetry;

pub use config::{HookCategory, InstrumentationConfig};
pub use error::TelemetryError;
pub use intercept::{intercept, intercept_all, intercept_if_enabled};
pub use telemetry::{BuildSession, OutcomeRecord};
