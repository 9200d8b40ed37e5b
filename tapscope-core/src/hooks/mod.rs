//! The host side: hooks, taps, and registration-time interception.
//!
//! A bundler exposes named hooks (`compile`, `make`, `emit`, ...). Plugins
//! register taps on them using one of three calling conventions:
//!
//! - **sync** - `Fn(&A) -> TapResult<R>`, returns immediately
//! - **async** - `Fn(A) -> BoxFuture<TapResult<R>>`, awaited inline by the caller
//! - **promise** - same shape, but the host may hold or join the future
//!
//! A hook that implements [`InterceptionPoint`] lets an observer see (and
//! replace) each tap as it is registered. That is the only seam the
//! interceptor needs.

pub mod hook;
pub mod registration;
pub mod tap;

pub use hook::Hook;
pub use registration::{HookRegistration, InterceptionPoint, RegisterFn};
pub use tap::{
    AsyncTapFn, PromiseTapFn, SyncTapFn, Tap, TapArgs, TapError, TapFn, TapKind, TapResult,
};
