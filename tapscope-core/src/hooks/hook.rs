//! A concrete hook for hosts that don't bring their own.
//!
//! Taps run in stage order (stable for equal stages). `call` runs sync
//! taps and stops at the first error; `call_async` runs every tap in
//! series, awaiting async and promise taps as it goes.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::registration::{HookRegistration, InterceptionPoint, RegisterFn};
use super::tap::{Tap, TapFn, TapResult};

pub struct Hook<A, R> {
    name: String,
    registry: Mutex<Registry<A, R>>,
    interceptable: bool,
}

/// Taps and register observers share one lock, so a tap can never be
/// inserted between an observer re-mapping existing taps and joining the
/// observer list.
struct Registry<A, R> {
    taps: Vec<Tap<A, R>>,
    interceptors: Vec<RegisterFn<A, R>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A: 'static, R: 'static> Hook<A, R> {
    /// Create a hook that supports registration interception.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Mutex::new(Registry {
                taps: Vec::new(),
                interceptors: Vec::new(),
            }),
            interceptable: true,
        }
    }

    /// Create a hook that exposes no interception point.
    pub fn without_interception(name: impl Into<String>) -> Self {
        Self {
            interceptable: false,
            ..Self::new(name)
        }
    }

    /// Register a tap, passing it through every installed register observer.
    ///
    /// Observers run while the registry is locked; they must not call back
    /// into this hook.
    pub fn tap(&self, tap: Tap<A, R>) {
        let mut registry = lock(&self.registry);
        let tap = registry
            .interceptors
            .iter()
            .fold(tap, |tap, register| register(tap));

        trace!(hook = %self.name, tap = %tap.name, kind = %tap.kind(), "Registering tap");

        let position = registry
            .taps
            .iter()
            .position(|existing| existing.stage > tap.stage)
            .unwrap_or(registry.taps.len());
        registry.taps.insert(position, tap);
    }

    pub fn tap_sync<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&A) -> TapResult<R> + Send + Sync + 'static,
    {
        self.tap(Tap::sync(name, f));
    }

    pub fn tap_async<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TapResult<R>> + Send + 'static,
    {
        self.tap(Tap::from_async(name, f));
    }

    pub fn tap_promise<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TapResult<R>> + Send + 'static,
    {
        self.tap(Tap::promise(name, f));
    }

    /// Snapshot of the registered taps in run order.
    pub fn taps(&self) -> Vec<Tap<A, R>> {
        lock(&self.registry).taps.clone()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.registry).taps.is_empty()
    }

    /// Run all taps synchronously.
    ///
    /// Fails if an async or promise tap is registered, since those can't
    /// be driven without an executor.
    pub fn call(&self, args: &A) -> TapResult<Vec<R>> {
        let taps = self.taps();
        let mut results = Vec::with_capacity(taps.len());
        for tap in &taps {
            match tap.func() {
                TapFn::Sync(f) => results.push(f(args)?),
                TapFn::Async(_) | TapFn::Promise(_) => anyhow::bail!(
                    "Tap '{}' on hook '{}' is {} and cannot run in a synchronous call",
                    tap.name,
                    self.name,
                    tap.kind()
                ),
            }
        }
        Ok(results)
    }

    /// Run all taps in series, awaiting async and promise taps.
    pub async fn call_async(&self, args: A) -> TapResult<Vec<R>>
    where
        A: Clone,
    {
        let taps = self.taps();
        let mut results = Vec::with_capacity(taps.len());
        for tap in &taps {
            let result = match tap.func() {
                TapFn::Sync(f) => f(&args)?,
                TapFn::Async(f) => f(args.clone()).await?,
                TapFn::Promise(f) => f(args.clone()).await?,
            };
            results.push(result);
        }
        Ok(results)
    }
}

impl<A, R> InterceptionPoint<A, R> for Hook<A, R>
where
    A: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    fn add_register_interceptor(&self, register: RegisterFn<A, R>) {
        let mut registry = lock(&self.registry);
        let existing = std::mem::take(&mut registry.taps);
        registry.taps = existing.into_iter().map(|tap| register(tap)).collect();
        registry.interceptors.push(register);
    }
}

impl<A, R> HookRegistration<A, R> for Hook<A, R>
where
    A: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn interception_point(&self) -> Option<&dyn InterceptionPoint<A, R>> {
        if self.interceptable {
            Some(self)
        } else {
            None
        }
    }
}
