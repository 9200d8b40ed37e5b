//! A simulated build: several hooks across categories, config gating,
//! and the report produced when the session finishes.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tapscope_core::config::ReportMode;
use tapscope_core::hooks::Hook;
use tapscope_core::telemetry::{
    BuildSession, HookRecords, HookSummary, ManualClock, MemorySink, TelemetrySink,
};
use tapscope_core::{
    intercept_all, intercept_if_enabled, HookCategory, InstrumentationConfig, OutcomeRecord,
    TelemetryError,
};

use common::{init_test_logging, Compilation};

/// Counts submissions and forwards to an in-memory sink.
#[derive(Default)]
struct CountingSink {
    inner: MemorySink,
    submissions: AtomicUsize,
}

impl TelemetrySink for CountingSink {
    fn submit(&self, hook: &str, records: Vec<OutcomeRecord>) -> Result<(), TelemetryError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(hook, records)
    }

    fn snapshot(&self) -> HookRecords {
        self.inner.snapshot()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Rejects everything it is given.
struct ClosedSink;

impl TelemetrySink for ClosedSink {
    fn submit(&self, hook: &str, _records: Vec<OutcomeRecord>) -> Result<(), TelemetryError> {
        Err(TelemetryError::SinkRejected {
            hook: hook.to_string(),
            reason: "sink closed".into(),
        })
    }

    fn snapshot(&self) -> HookRecords {
        HookRecords::new()
    }

    fn name(&self) -> &str {
        "closed"
    }
}

fn session_with(
    config: InstrumentationConfig,
    sink: Arc<dyn TelemetrySink>,
) -> (Arc<BuildSession>, Arc<ManualClock>) {
    init_test_logging();
    let clock = Arc::new(ManualClock::new(0));
    let session = BuildSession::new(config)
        .with_sink(sink)
        .with_clock(clock.clone());
    (Arc::new(session), clock)
}

#[tokio::test]
async fn test_simulated_build_report() {
    let sink = Arc::new(CountingSink::default());
    let (session, clock) = session_with(InstrumentationConfig::default(), sink.clone());

    let compile: Hook<Arc<Compilation>, ()> = Hook::new("compile");
    let emit: Hook<Arc<Compilation>, ()> = Hook::new("emit");
    let build_module: Hook<String, usize> = Hook::new("buildModule");

    assert_eq!(
        intercept_all(&session, HookCategory::Plugin, [&compile, &emit]),
        2
    );
    assert!(intercept_if_enabled(
        &session,
        HookCategory::Loader,
        "buildModule",
        &build_module
    ));

    let c = clock.clone();
    compile.tap_sync("define-plugin", move |_| {
        c.advance(2);
        Ok(())
    });
    let c = clock.clone();
    emit.tap_promise("copy-plugin", move |_| {
        let clock = c.clone();
        async move {
            clock.advance(20);
            Ok(())
        }
    });
    let c = clock.clone();
    build_module.tap_async("babel-loader", move |source: String| {
        let clock = c.clone();
        async move {
            clock.advance(5);
            if source.contains("syntax error") {
                anyhow::bail!("Unexpected token in {source}");
            }
            Ok(source.len())
        }
    });

    compile.call_async(Compilation::root()).await.unwrap();
    for source in ["a.js", "b.js", "syntax error.js"] {
        let _ = build_module.call_async(source.to_string()).await;
    }
    emit.call_async(Compilation::root()).await.unwrap();
    // Child compilation emits are not attributed to the session.
    emit.call_async(Compilation::child("worker")).await.unwrap();

    let report = session.finish();
    assert_eq!(
        report.hooks,
        vec![
            HookSummary {
                hook: "emit".into(),
                calls: 1,
                errors: 0,
                total_costs: 20,
            },
            HookSummary {
                hook: "buildModule".into(),
                calls: 3,
                errors: 1,
                total_costs: 15,
            },
            HookSummary {
                hook: "compile".into(),
                calls: 1,
                errors: 0,
                total_costs: 2,
            },
        ]
    );
    assert_eq!(report.total_records(), 5);
    assert_eq!(report.total_errors(), 1);
    assert_eq!(report.mode, ReportMode::Normal);
    assert_eq!(report.session_id, session.id().to_string());
    assert_eq!(sink.submissions.load(Ordering::SeqCst), 5);

    let failed = &report.records["buildModule"][2];
    assert_eq!(failed.error[0].title, "babel-loader buildModule Error");
    assert_eq!(failed.error[0].message, "Unexpected token in syntax error.js");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["mode"], json!("normal"));
    assert_eq!(json["hooks"][0]["totalCosts"], json!(20));
    assert!(json["records"]["compile"][0]["startAt"].is_u64());
    assert!(chrono::DateTime::parse_from_rfc3339(json["startedAt"].as_str().unwrap()).is_ok());
}

#[test]
fn test_config_gates_categories() {
    let config = InstrumentationConfig::from_yaml_str(
        "mode: brief\nfeatures:\n  loader: false\n  resolver: true\n",
    )
    .unwrap();
    let (session, _) = session_with(config, Arc::new(MemorySink::new()));

    let loader: Hook<(), ()> = Hook::new("buildModule");
    let resolver: Hook<(), ()> = Hook::new("resolve");
    let plugin: Hook<(), ()> = Hook::new("done");

    assert!(!intercept_if_enabled(&session, HookCategory::Loader, "buildModule", &loader));
    assert!(intercept_if_enabled(&session, HookCategory::Resolver, "resolve", &resolver));
    assert!(intercept_if_enabled(&session, HookCategory::Plugin, "done", &plugin));

    for hook in [&loader, &resolver, &plugin] {
        hook.tap_sync("p", |_| Ok(()));
        hook.call(&()).unwrap();
    }

    let records = session.records();
    let hooks: Vec<&str> = records.keys().map(String::as_str).collect();
    assert_eq!(hooks, vec!["done", "resolve"]);
    assert_eq!(session.finish().mode, ReportMode::Brief);
}

#[test]
fn test_disabled_config_intercepts_nothing() {
    let (session, _) = session_with(InstrumentationConfig::disabled(), Arc::new(MemorySink::new()));
    let hooks: Vec<Hook<(), ()>> = vec![Hook::new("compile"), Hook::new("emit")];

    assert_eq!(intercept_all(&session, HookCategory::Plugin, &hooks), 0);
    assert!(hooks.iter().all(|h| h.taps().is_empty()));

    hooks[0].tap_sync("p", |_| Ok(()));
    assert!(!hooks[0].taps()[0].is_instrumented());
}

#[test]
fn test_failing_sink_never_reaches_the_bundler() {
    let (session, _) = session_with(InstrumentationConfig::default(), Arc::new(ClosedSink));
    let optimize: Hook<u32, u32> = Hook::new("optimize");
    let seal: Hook<u32, u32> = Hook::new("seal");
    assert_eq!(intercept_all(&session, HookCategory::Plugin, [&optimize, &seal]), 2);
    optimize.tap_sync("terser", |n| Ok(n * 2));
    seal.tap_sync("broken", |_| Err(anyhow::anyhow!("bad chunk")));

    assert_eq!(optimize.call(&21).unwrap(), vec![42]);
    assert_eq!(seal.call(&21).unwrap_err().to_string(), "bad chunk");

    let report = session.finish();
    assert_eq!(report.total_records(), 0);
}

#[test]
fn test_config_loaded_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tapscope.json");
    std::fs::write(&path, r#"{"mode": "lite", "features": false}"#).unwrap();

    let config = InstrumentationConfig::load(&path).unwrap();
    assert_eq!(config.mode, ReportMode::Lite);
    assert!(config.enabled);
    assert!(!config.allows(HookCategory::Plugin));
    assert!(!config.allows(HookCategory::Bundle));
}
