//! Host-facing traits: how a hook exposes registration-time interception.

use std::sync::Arc;

use super::tap::Tap;

/// Observer invoked with each tap at registration time.
///
/// Receives the tap by value and hands back the tap the hook should store,
/// which may be the same tap unchanged.
pub type RegisterFn<A, R> = Arc<dyn Fn(Tap<A, R>) -> Tap<A, R> + Send + Sync>;

/// Registration-time interception capability of a hook.
pub trait InterceptionPoint<A, R>: Send + Sync {
    /// Install a register observer.
    ///
    /// Implementations apply it to every tap registered afterwards and
    /// re-map taps that were already registered.
    fn add_register_interceptor(&self, register: RegisterFn<A, R>);
}

/// One named extensibility point of the build pipeline.
pub trait HookRegistration<A, R>: Send + Sync {
    /// Name of the hook as the host knows it.
    fn name(&self) -> &str;

    /// The interception point, if this hook supports one.
    ///
    /// Hooks without registration interception return `None`; that is an
    /// ordinary condition, not an error.
    fn interception_point(&self) -> Option<&dyn InterceptionPoint<A, R>> {
        None
    }
}
