use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use minions_auth::Principal;

/// Principal that passed the guard for the current request.
///
/// Inserted into the request extensions before the protected handler runs,
/// so handlers can take it as an extractor.
#[derive(Clone)]
pub struct CurrentPrincipal(pub Arc<dyn Principal>);

impl CurrentPrincipal {
    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn principal(&self) -> &dyn Principal {
        self.0.as_ref()
    }
}

impl core::fmt::Debug for CurrentPrincipal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("CurrentPrincipal").field(&self.0.id()).finish()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present behind a guard; a missing value is a wiring bug.
        parts
            .extensions
            .get::<CurrentPrincipal>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
