//! Role-based access guard for request handlers.
//!
//! Before a visitor reaches a protected handler they must be authenticated
//! and hold at least one of the required roles. Authentication itself is
//! outside the guard: the principal comes from a caller-supplied lookup.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use minions_auth::{Anonymous, Principal, Role};

use crate::middleware::{GuardLayer, GuardService};

/// Resolves the principal behind a request.
///
/// Any I/O needed to find the principal (session store, token validation)
/// happens here; the guard itself performs none.
#[async_trait]
pub trait PrincipalSource: Send + Sync {
    async fn principal(&self, parts: &Parts) -> Arc<dyn Principal>;
}

struct FnSource<F>(F);

#[async_trait]
impl<F, P> PrincipalSource for FnSource<F>
where
    F: Fn(&Parts) -> P + Send + Sync,
    P: Principal + 'static,
{
    async fn principal(&self, parts: &Parts) -> Arc<dyn Principal> {
        Arc::new((self.0)(parts))
    }
}

type Responder = Arc<dyn Fn(&Parts) -> Response + Send + Sync>;

/// Outcome of a guard check.
#[derive(Clone)]
pub enum Access {
    Granted(Arc<dyn Principal>),
    Unauthenticated,
    Forbidden,
}

impl core::fmt::Debug for Access {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Access::Granted(p) => f.debug_tuple("Granted").field(&p.id()).finish(),
            Access::Unauthenticated => f.write_str("Unauthenticated"),
            Access::Forbidden => f.write_str("Forbidden"),
        }
    }
}

/// Enforces authentication and role membership in front of handlers.
///
/// Unconfigured, every request resolves to [`Anonymous`] and is answered with
/// `401 Unauthorized`. Configure at least the principal lookup before use.
/// Configuration consumes and returns the guard; once built it is cheap to
/// clone and can be shared by any number of routes.
#[derive(Clone)]
pub struct Guard {
    principal: Arc<dyn PrincipalSource>,
    unauthorized: Responder,
    forbidden: Responder,
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

impl Guard {
    pub fn new() -> Self {
        Self {
            principal: Arc::new(FnSource(|_: &Parts| Anonymous)),
            unauthorized: Arc::new(|_: &Parts| plain_error(StatusCode::UNAUTHORIZED, "Unauthorized")),
            forbidden: Arc::new(|_: &Parts| plain_error(StatusCode::FORBIDDEN, "Forbidden")),
        }
    }

    /// Replace the principal lookup with a synchronous function.
    pub fn principal_fn<F, P>(mut self, f: F) -> Self
    where
        F: Fn(&Parts) -> P + Send + Sync + 'static,
        P: Principal + 'static,
    {
        self.principal = Arc::new(FnSource(f));
        self
    }

    /// Replace the principal lookup with an (async) [`PrincipalSource`].
    pub fn principal_source(mut self, source: impl PrincipalSource + 'static) -> Self {
        self.principal = Arc::new(source);
        self
    }

    /// Replace the response sent when the principal is not authenticated.
    pub fn unauthorized_fn<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Parts) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.unauthorized = Arc::new(move |parts: &Parts| f(parts).into_response());
        self
    }

    /// Replace the response sent when the principal lacks the required roles.
    pub fn forbidden_fn<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Parts) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        self.forbidden = Arc::new(move |parts: &Parts| f(parts).into_response());
        self
    }

    /// Decide whether the request may reach a handler requiring `roles`.
    pub async fn check(&self, parts: &Parts, roles: &[Role]) -> Access {
        let principal = self.principal.principal(parts).await;

        if !principal.authenticated() {
            tracing::debug!(principal = principal.id(), path = %parts.uri.path(), "not authenticated");
            return Access::Unauthenticated;
        }

        if !principal.has_any_role(roles) {
            tracing::debug!(
                principal = principal.id(),
                path = %parts.uri.path(),
                required = ?roles,
                "missing required role"
            );
            return Access::Forbidden;
        }

        Access::Granted(principal)
    }

    pub(crate) fn unauthorized(&self, parts: &Parts) -> Response {
        (self.unauthorized)(parts)
    }

    pub(crate) fn forbidden(&self, parts: &Parts) -> Response {
        (self.forbidden)(parts)
    }

    /// Wrap a handler so it only runs for principals holding one of `roles`.
    ///
    /// ```ignore
    /// let app = Router::new().route("/admin", get_service(guard.protect(admin_page, ["admin"])));
    /// ```
    pub fn protect<H, T, I, R>(&self, handler: H, roles: I) -> GuardService<axum::handler::HandlerService<H, T, ()>>
    where
        H: axum::handler::Handler<T, ()>,
        T: 'static,
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        GuardService::new(self.clone(), collect_roles(roles), handler.with_state(()))
    }

    /// Tower layer applying the same check to every route it wraps.
    pub fn layer<I, R>(&self, roles: I) -> GuardLayer
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        GuardLayer::new(self.clone(), collect_roles(roles))
    }
}

fn collect_roles<I, R>(roles: I) -> Arc<[Role]>
where
    I: IntoIterator<Item = R>,
    R: Into<Role>,
{
    roles.into_iter().map(Into::into).collect()
}

/// Plain-text error response: `<message>\n` with the given status.
pub fn plain_error(status: StatusCode, message: &str) -> Response {
    let mut response = (status, format!("{message}\n")).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
