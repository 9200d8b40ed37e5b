//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use tapscope_core::hooks::TapArgs;
use tapscope_core::telemetry::{BuildSession, ManualClock};
use tapscope_core::InstrumentationConfig;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Minimal stand-in for a bundler compilation passed as a hook's first argument.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub name: String,
    pub parent: Option<String>,
}

impl Compilation {
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            name: "main".into(),
            parent: None,
        })
    }

    pub fn child(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some("main".into()),
        })
    }
}

impl TapArgs for Compilation {
    fn is_child_context(&self) -> bool {
        self.parent.is_some()
    }
}

/// A session on a manual clock starting at `start_ms`.
pub fn manual_session(start_ms: u64) -> (Arc<BuildSession>, Arc<ManualClock>) {
    init_test_logging();
    let clock = Arc::new(ManualClock::new(start_ms));
    let session =
        BuildSession::new(InstrumentationConfig::default()).with_clock(clock.clone());
    (Arc::new(session), clock)
}
