//! Tap types: one registered callback on a hook.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Error type returned by tap callbacks.
///
/// Taps own their errors; instrumentation moves the value through untouched.
pub type TapError = anyhow::Error;

/// Result type returned by tap callbacks.
pub type TapResult<R> = anyhow::Result<R>;

/// A synchronous tap callback.
pub type SyncTapFn<A, R> = Arc<dyn Fn(&A) -> TapResult<R> + Send + Sync>;

/// An async tap callback. The caller awaits it inline.
pub type AsyncTapFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, TapResult<R>> + Send + Sync>;

/// A promise-returning tap callback. The returned future may be held,
/// joined with others, or awaited later by the host.
pub type PromiseTapFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, TapResult<R>> + Send + Sync>;

/// Calling convention of a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapKind {
    /// Returns immediately
    Sync,
    /// Must be awaited by the caller
    Async,
    /// Returns a future the caller settles later
    Promise,
}

impl TapKind {
    /// Get the convention tag as a string (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            TapKind::Sync => "sync",
            TapKind::Async => "async",
            TapKind::Promise => "promise",
        }
    }
}

impl fmt::Display for TapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sync" => Ok(TapKind::Sync),
            "async" => Ok(TapKind::Async),
            "promise" => Ok(TapKind::Promise),
            _ => Err(format!(
                "Unknown tap type: '{s}'. Valid options: sync, async, promise"
            )),
        }
    }
}

/// The callback half of a tap, tagged by calling convention.
pub enum TapFn<A, R> {
    Sync(SyncTapFn<A, R>),
    Async(AsyncTapFn<A, R>),
    Promise(PromiseTapFn<A, R>),
}

impl<A, R> TapFn<A, R> {
    pub fn kind(&self) -> TapKind {
        match self {
            TapFn::Sync(_) => TapKind::Sync,
            TapFn::Async(_) => TapKind::Async,
            TapFn::Promise(_) => TapKind::Promise,
        }
    }
}

impl<A, R> Clone for TapFn<A, R> {
    fn clone(&self) -> Self {
        match self {
            TapFn::Sync(f) => TapFn::Sync(Arc::clone(f)),
            TapFn::Async(f) => TapFn::Async(Arc::clone(f)),
            TapFn::Promise(f) => TapFn::Promise(Arc::clone(f)),
        }
    }
}

/// A registered callback plus its metadata.
///
/// Names are not unique: several plugins may tap the same hook under the
/// same name. `stage` orders taps within a hook (lower runs first).
/// The callback is only replaced through [`Tap::with_func`], which drops
/// the instrumented mark along with the old proxy.
pub struct Tap<A, R> {
    pub name: String,
    pub stage: i32,
    func: TapFn<A, R>,
    instrumented: bool,
}

impl<A, R> Tap<A, R> {
    /// Build a tap from an already-erased callback.
    pub fn new(name: impl Into<String>, func: TapFn<A, R>) -> Self {
        Self {
            name: name.into(),
            stage: 0,
            func,
            instrumented: false,
        }
    }

    /// Synchronous tap.
    pub fn sync<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&A) -> TapResult<R> + Send + Sync + 'static,
    {
        Self::new(name, TapFn::Sync(Arc::new(f)))
    }

    /// Awaited async tap.
    pub fn from_async<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TapResult<R>> + Send + 'static,
    {
        Self::new(name, TapFn::Async(Arc::new(move |args| f(args).boxed())))
    }

    /// Promise-returning tap.
    pub fn promise<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TapResult<R>> + Send + 'static,
    {
        Self::new(name, TapFn::Promise(Arc::new(move |args| f(args).boxed())))
    }

    pub fn with_stage(mut self, stage: i32) -> Self {
        self.stage = stage;
        self
    }

    pub fn kind(&self) -> TapKind {
        self.func.kind()
    }

    pub fn func(&self) -> &TapFn<A, R> {
        &self.func
    }

    /// Swap in a new callback. The result is an uninstrumented tap, so an
    /// installed register observer will wrap it again.
    pub fn with_func(self, func: TapFn<A, R>) -> Self {
        Self {
            func,
            instrumented: false,
            ..self
        }
    }

    /// Whether this tap's callback is already an instrumented proxy.
    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }

    /// Replace the callback, keeping name and stage, and mark the result
    /// as instrumented.
    pub(crate) fn into_instrumented(self, func: TapFn<A, R>) -> Self {
        Self {
            name: self.name,
            stage: self.stage,
            func,
            instrumented: true,
        }
    }
}

impl<A, R> Clone for Tap<A, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            stage: self.stage,
            func: self.func.clone(),
            instrumented: self.instrumented,
        }
    }
}

impl<A, R> fmt::Debug for Tap<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tap")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("stage", &self.stage)
            .field("instrumented", &self.instrumented)
            .finish()
    }
}

/// Capability implemented by hook argument types.
///
/// For tuple arguments the first element decides. Argument types that can
/// describe a nested (child) compilation override `is_child_context`;
/// everything else reports `false`.
pub trait TapArgs: Send + Sync + 'static {
    fn is_child_context(&self) -> bool {
        false
    }
}

impl TapArgs for () {}
impl TapArgs for bool {}
impl TapArgs for u32 {}
impl TapArgs for u64 {}
impl TapArgs for i64 {}
impl TapArgs for String {}
impl TapArgs for &'static str {}
impl TapArgs for serde_json::Value {}

impl<T: TapArgs + ?Sized> TapArgs for Arc<T> {
    fn is_child_context(&self) -> bool {
        (**self).is_child_context()
    }
}

impl<T: TapArgs + ?Sized> TapArgs for Box<T> {
    fn is_child_context(&self) -> bool {
        (**self).is_child_context()
    }
}

impl<T: TapArgs> TapArgs for Option<T> {
    fn is_child_context(&self) -> bool {
        self.as_ref().map(TapArgs::is_child_context).unwrap_or(false)
    }
}

impl<T0: TapArgs> TapArgs for (T0,) {
    fn is_child_context(&self) -> bool {
        self.0.is_child_context()
    }
}

impl<T0: TapArgs, T1: Send + Sync + 'static> TapArgs for (T0, T1) {
    fn is_child_context(&self) -> bool {
        self.0.is_child_context()
    }
}

impl<T0: TapArgs, T1: Send + Sync + 'static, T2: Send + Sync + 'static> TapArgs for (T0, T1, T2) {
    fn is_child_context(&self) -> bool {
        self.0.is_child_context()
    }
}
