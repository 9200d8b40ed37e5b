//! Instrumented proxies, one shape per calling convention.
//!
//! Each proxy samples the start time, runs the original callback with the
//! original arguments, reports, and hands back the original outcome by
//! move. Panics from the original unwind straight through.

use futures::FutureExt;
use std::sync::Arc;
use tracing::trace;

use crate::hooks::{AsyncTapFn, PromiseTapFn, SyncTapFn, Tap, TapArgs, TapFn, TapKind};
use crate::telemetry::{report_outcome, sample_start, BuildSession};

/// Replace a tap's callback with a proxy reporting into `session`.
///
/// Taps that already carry a proxy come back unchanged, so installing the
/// observer twice never stacks proxies.
pub(crate) fn instrument<A, R>(
    session: &Arc<BuildSession>,
    hook: &Arc<str>,
    tap: Tap<A, R>,
) -> Tap<A, R>
where
    A: TapArgs,
    R: Send + 'static,
{
    if tap.is_instrumented() {
        trace!(hook = %hook, tap = %tap.name, "Tap already instrumented");
        return tap;
    }

    let name: Arc<str> = Arc::from(tap.name.as_str());
    let session = Arc::clone(session);
    let hook = Arc::clone(hook);

    trace!(hook = %hook, tap = %name, kind = %tap.kind(), "Instrumenting tap");

    let func = match tap.func() {
        TapFn::Sync(original) => TapFn::Sync(sync_proxy(session, hook, name, Arc::clone(original))),
        TapFn::Async(original) => {
            TapFn::Async(async_proxy(session, hook, name, Arc::clone(original)))
        }
        TapFn::Promise(original) => {
            TapFn::Promise(promise_proxy(session, hook, name, Arc::clone(original)))
        }
    };
    tap.into_instrumented(func)
}

fn sync_proxy<A, R>(
    session: Arc<BuildSession>,
    hook: Arc<str>,
    tap: Arc<str>,
    original: SyncTapFn<A, R>,
) -> SyncTapFn<A, R>
where
    A: 'static,
    R: 'static,
{
    Arc::new(move |args: &A| {
        let start_at = sample_start(&session);
        let outcome = original(args);
        report_outcome(&session, &hook, &tap, start_at, TapKind::Sync, &outcome);
        outcome
    })
}

fn async_proxy<A, R>(
    session: Arc<BuildSession>,
    hook: Arc<str>,
    tap: Arc<str>,
    original: AsyncTapFn<A, R>,
) -> AsyncTapFn<A, R>
where
    A: 'static,
    R: Send + 'static,
{
    Arc::new(move |args: A| {
        let session = Arc::clone(&session);
        let hook = Arc::clone(&hook);
        let tap = Arc::clone(&tap);

        let start_at = sample_start(&session);
        let pending = original(args);
        async move {
            let outcome = pending.await;
            report_outcome(&session, &hook, &tap, start_at, TapKind::Async, &outcome);
            outcome
        }
        .boxed()
    })
}

fn promise_proxy<A, R>(
    session: Arc<BuildSession>,
    hook: Arc<str>,
    tap: Arc<str>,
    original: PromiseTapFn<A, R>,
) -> PromiseTapFn<A, R>
where
    A: TapArgs,
    R: Send + 'static,
{
    Arc::new(move |args: A| {
        // Child compilations re-run observer hooks; only the top-level run counts.
        if args.is_child_context() {
            return original(args);
        }

        let session = Arc::clone(&session);
        let hook = Arc::clone(&hook);
        let tap = Arc::clone(&tap);

        let start_at = sample_start(&session);
        original(args)
            .map(move |outcome| {
                report_outcome(&session, &hook, &tap, start_at, TapKind::Promise, &outcome);
                outcome
            })
            .boxed()
    })
}
