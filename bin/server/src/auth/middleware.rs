//! Authentication extractors for Axum.
//!
//! Protected routes take [`RequireAuth`]; an unauthenticated request is
//! always answered with a redirect to the public entry page, never an error
//! body. Every successful extraction renews the session's sliding window.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use pathfinder_gate_access::{Principal, SessionId};
use pathfinder_gate_session_store::SessionStore;
use std::sync::Arc;

use super::{AppState, SESSION_COOKIE};

/// Extractor for requiring an authenticated user.
///
/// Yields the session's [`Principal`]; unauthenticated requests are
/// redirected to the public entry page.
pub struct RequireAuth(pub Principal);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let session_cookie = jar
            .get(SESSION_COOKIE)
            .ok_or(AuthRejection::NotAuthenticated)?;

        let session_id = SessionId::new(session_cookie.value().to_string());

        let mut session = app_state
            .store
            .get(&session_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session store read failed");
                AuthRejection::InternalError
            })?
            .ok_or(AuthRejection::NotAuthenticated)?;

        // The store already filters expired rows; this covers a row lapsing
        // between the read and now.
        if session.is_expired() {
            let _ = app_state.store.delete(&session_id).await;
            return Err(AuthRejection::SessionExpired);
        }

        let principal = session
            .principal()
            .cloned()
            .ok_or(AuthRejection::NotAuthenticated)?;

        // Sliding renewal: every authenticated request restarts the window.
        // A failed renewal leaves the previous window in place, so the
        // request itself still succeeds.
        let ttl = app_state.session_config.ttl();
        session.touch(ttl);
        if let Err(e) = app_state.store.put(&session, ttl).await {
            tracing::warn!(error = %e, "session renewal write failed");
        }

        Ok(RequireAuth(principal))
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns `None` if the user is not authenticated.
pub struct OptionalAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(principal)) => Ok(OptionalAuth(Some(principal))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    SessionExpired,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            // Page-based app: unauthenticated requests go back to the entry
            // page rather than getting an error body.
            Self::NotAuthenticated | Self::SessionExpired => Redirect::to("/").into_response(),
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}
