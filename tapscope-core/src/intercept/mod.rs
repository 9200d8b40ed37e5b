//! Hook interception: swap every registered tap for an instrumented proxy.
//!
//! `intercept` installs a register observer on a hook's interception point.
//! From then on every tap the hook stores (including taps registered
//! earlier) is a proxy that reports one [`OutcomeRecord`] per invocation
//! into the session, while returning exactly what the original returned.
//!
//! [`OutcomeRecord`]: crate::telemetry::OutcomeRecord

mod proxy;

use std::sync::Arc;
use tracing::debug;

use crate::config::HookCategory;
use crate::hooks::{HookRegistration, RegisterFn, Tap, TapArgs};
use crate::telemetry::BuildSession;

/// Instrument every tap on `registration`, reporting under `hook_name`.
///
/// Returns `false` (and does nothing) when the hook exposes no interception
/// point. Calling this again for the same hook is harmless: taps that are
/// already instrumented pass through the second observer untouched.
pub fn intercept<A, R, H>(session: &Arc<BuildSession>, hook_name: &str, registration: &H) -> bool
where
    A: TapArgs,
    R: Send + 'static,
    H: HookRegistration<A, R> + ?Sized,
{
    let Some(point) = registration.interception_point() else {
        debug!(hook = hook_name, "Hook has no interception point, skipping");
        return false;
    };

    let session = Arc::clone(session);
    let hook: Arc<str> = Arc::from(hook_name);
    let register: RegisterFn<A, R> =
        Arc::new(move |tap: Tap<A, R>| proxy::instrument(&session, &hook, tap));
    point.add_register_interceptor(register);

    debug!(hook = hook_name, "Installed tap instrumentation");
    true
}

/// Like [`intercept`], but only when the session config enables `category`.
pub fn intercept_if_enabled<A, R, H>(
    session: &Arc<BuildSession>,
    category: HookCategory,
    hook_name: &str,
    registration: &H,
) -> bool
where
    A: TapArgs,
    R: Send + 'static,
    H: HookRegistration<A, R> + ?Sized,
{
    if !session.config().allows(category) {
        debug!(hook = hook_name, %category, "Instrumentation disabled for category");
        return false;
    }
    intercept(session, hook_name, registration)
}

/// Intercept a set of hooks of one category under their own names.
///
/// Returns how many hooks were actually instrumented.
pub fn intercept_all<'a, A, R, H, I>(
    session: &Arc<BuildSession>,
    category: HookCategory,
    hooks: I,
) -> usize
where
    A: TapArgs,
    R: Send + 'static,
    H: HookRegistration<A, R> + ?Sized + 'a,
    I: IntoIterator<Item = &'a H>,
{
    let instrumented = hooks
        .into_iter()
        .filter(|hook| intercept_if_enabled(session, category, hook.name(), *hook))
        .count();

    debug!(%category, instrumented, "Intercepted hook set");
    instrumented
}
