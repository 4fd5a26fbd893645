use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use minions_auth::Role;
use tower::{Layer, Service};

use crate::context::CurrentPrincipal;
use crate::guard::{Access, Guard};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Layer produced by [`Guard::layer`].
#[derive(Clone)]
pub struct GuardLayer {
    guard: Guard,
    roles: Arc<[Role]>,
}

impl GuardLayer {
    pub(crate) fn new(guard: Guard, roles: Arc<[Role]>) -> Self {
        Self { guard, roles }
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService::new(self.guard.clone(), self.roles.clone(), inner)
    }
}

/// Service that checks the guard before calling `inner`.
///
/// Denied requests never reach `inner`; allowed ones carry the resolved
/// principal as a [`CurrentPrincipal`] extension.
#[derive(Clone)]
pub struct GuardService<S> {
    guard: Guard,
    roles: Arc<[Role]>,
    inner: S,
}

impl<S> GuardService<S> {
    pub(crate) fn new(guard: Guard, roles: Arc<[Role]>, inner: S) -> Self {
        Self { guard, roles, inner }
    }
}

impl<S> Service<Request> for GuardService<S>
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let guard = self.guard.clone();
        let roles = self.roles.clone();
        // Keep the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            match guard.check(&parts, &roles).await {
                Access::Unauthenticated => Ok(guard.unauthorized(&parts)),
                Access::Forbidden => Ok(guard.forbidden(&parts)),
                Access::Granted(principal) => {
                    parts.extensions.insert(CurrentPrincipal(principal));
                    let response = inner.call(Request::from_parts(parts, body)).await?;
                    Ok(response.into_response())
                }
            }
        })
    }
}
