//! Custom per-handler guards.
//!
//! A [`Guard`] decides whether an [`Invocation`] may reach its handler. Guards
//! are attached with [`ModuleClass::guard`](crate::module::ModuleClass::guard)
//! and wrapped around the executor as [`GuardLayer`]s when the method is bound.
//! A denied call resolves to [`GuardRejected`], which the routers log at
//! `debug` and otherwise ignore.
//!
//! ```rust,ignore
//! struct InGuild;
//!
//! #[async_trait]
//! impl Guard for InGuild {
//!     async fn can_use(&self, invocation: &Invocation) -> bool {
//!         invocation.interaction().is_some_and(|i| i.guild_id.is_some())
//!     }
//! }
//! ```

use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::{BoxError, Service};
use tower_layer::Layer;

use crate::error::GuardRejected;
use crate::handler::Invocation;

#[async_trait]
pub trait Guard: Send + Sync + 'static {
    async fn can_use(&self, invocation: &Invocation) -> bool;

    /// Name reported in [`GuardRejected`].
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// A [`Guard`] backed by a synchronous predicate.
pub struct FnGuard<F> {
    name: &'static str,
    check: F,
}

/// Builds a guard from a predicate.
pub fn guard_fn<F>(name: &'static str, check: F) -> FnGuard<F>
where
    F: Fn(&Invocation) -> bool + Send + Sync + 'static,
{
    FnGuard { name, check }
}

#[async_trait]
impl<F> Guard for FnGuard<F>
where
    F: Fn(&Invocation) -> bool + Send + Sync + 'static,
{
    async fn can_use(&self, invocation: &Invocation) -> bool {
        (self.check)(invocation)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────────

/// A tower [`Layer`] that consults a [`Guard`] before calling the inner
/// service.
#[derive(Clone)]
pub struct GuardLayer {
    guard: Arc<dyn Guard>,
}

impl GuardLayer {
    pub fn new(guard: Arc<dyn Guard>) -> Self {
        Self { guard }
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService {
            guard: self.guard.clone(),
            inner,
        }
    }
}

/// Service produced by [`GuardLayer`].
#[derive(Clone)]
pub struct GuardService<S> {
    guard: Arc<dyn Guard>,
    inner: S,
}

impl<S> Service<Invocation> for GuardService<S>
where
    S: Service<Invocation, Response = (), Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        let guard = self.guard.clone();
        let mut inner = self.inner.clone();
        async move {
            if !guard.can_use(&invocation).await {
                return Err(GuardRejected { guard: guard.name() }.into());
            }
            inner.call(invocation).await
        }
        .boxed()
    }
}

// ─── Function services ───────────────────────────────────────────────────────

/// Adapts an async closure into a cloneable handler service.
pub(crate) struct FnService<F, Fut> {
    f: Arc<F>,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnService<F, Fut>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    pub(crate) fn new(f: F) -> Self {
        Self {
            f: Arc::new(f),
            _marker: PhantomData,
        }
    }
}

impl<F, Fut> Clone for FnService<F, Fut> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, Fut> Service<Invocation> for FnService<F, Fut>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        (self.f)(invocation).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cordage_core::GatewayEvent;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::handler::Executor;

    fn event() -> Invocation {
        Invocation::Event(Arc::new(GatewayEvent::new("ready", Value::Null)))
    }

    fn counting(counter: Arc<AtomicUsize>) -> Executor {
        Executor::new(FnService::new(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        }))
    }

    #[tokio::test]
    async fn test_allowing_guard_calls_inner() {
        let counter = Arc::new(AtomicUsize::new(0));
        let svc = GuardLayer::new(Arc::new(guard_fn("always", |_| true)))
            .layer(counting(counter.clone()));

        tokio_test::assert_ok!(svc.oneshot(event()).await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denying_guard_skips_inner() {
        let counter = Arc::new(AtomicUsize::new(0));
        let svc = GuardLayer::new(Arc::new(guard_fn("never", |_| false)))
            .layer(counting(counter.clone()));

        let err = svc.oneshot(event()).await.unwrap_err();
        let rejected = err.downcast_ref::<GuardRejected>().unwrap();
        assert_eq!(rejected.guard, "never");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
