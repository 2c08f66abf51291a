//! Route layer: login, callback, failure, dashboard, and logout.
//!
//! Per-request state machine: `Anonymous` → (login-start) →
//! `PendingProviderRedirect` → (callback) → `Authenticated`,
//! `RejectedUnauthorized`, or `RejectedProviderError`. Authenticated
//! sessions end via `/logout` or by expiring. No session row exists until
//! the callback writes one.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use pathfinder_gate_access::{Principal, Session, SessionId};
use pathfinder_gate_session_store::SessionStore;
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, OptionalAuth, RequireAuth, SESSION_COOKIE, oidc::AuthState};
use crate::config::SessionConfig;
use crate::pages;

/// Auth state cookie name (CSRF/PKCE material for the OIDC round-trip).
const AUTH_STATE_COOKIE: &str = "gate_auth_state";

/// Query parameters for the OIDC callback.
///
/// Everything is optional: a provider denial arrives as
/// `?error=access_denied&state=…` with no code at all, and still has to land
/// on the failure page rather than bounce off the extractor.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Query parameters for the failure page.
#[derive(Debug, Deserialize)]
pub struct FailureQuery {
    reason: Option<String>,
}

/// Builds the application router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(entry))
        .route("/login-start", get(login_start))
        .route("/oauth-callback", get(callback))
        .route("/login-failure", get(login_failure))
        .route("/dashboard", get(dashboard))
        .route("/logout", get(logout))
        .with_state(state)
}

/// `GET /` — public entry page; authenticated users go straight to the
/// dashboard.
pub async fn entry(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    OptionalAuth(principal): OptionalAuth,
) -> Response {
    match principal {
        Some(_) => {
            let jar = refresh_session_cookie(&state.session_config, jar);
            (jar, Redirect::to("/dashboard")).into_response()
        }
        None => Html(pages::entry_page()).into_response(),
    }
}

/// `GET /dashboard` — protected; renders the role-conditioned dashboard.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    RequireAuth(principal): RequireAuth,
) -> impl IntoResponse {
    // The extractor slid the store row; the cookie has to slide with it or
    // the browser drops it a fixed 14 days after login.
    let jar = refresh_session_cookie(&state.session_config, jar);
    (jar, Html(pages::dashboard(&principal)))
}

/// `GET /login-start` — initiates the OIDC flow by redirecting to the
/// identity provider. No session row is created.
pub async fn login_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (auth_url, auth_state) = state.oidc_client.authorization_url();

    // The CSRF token, PKCE verifier, and nonce ride the redirect round-trip
    // in a short-lived cookie, validated on callback.
    let auth_state_json = serde_json::to_string(&AuthStateData {
        csrf_token: auth_state.csrf_token,
        pkce_verifier: auth_state.pkce_verifier,
        nonce: auth_state.nonce,
    })
    .expect("serialize auth state");

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&auth_url))
}

/// `GET /oauth-callback` — completes the OIDC flow.
///
/// Runs the allow-list policy over the asserted email. Success establishes
/// the principal in a fresh session and lands on the dashboard; rejection
/// flashes a one-line reason and lands on the failure page.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    // A provider denial or error short-circuits before any local checks.
    if let Some(error) = query.error {
        return Err(AuthError::Delegation(format!(
            "provider returned error: {error}"
        )));
    }

    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;

    let auth_state_data: AuthStateData =
        serde_json::from_str(auth_state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    if query.state.as_deref() != Some(auth_state_data.csrf_token.as_str()) {
        return Err(AuthError::CsrfMismatch);
    }

    let code = query.code.ok_or_else(|| {
        AuthError::Delegation("callback carried no authorization code".to_string())
    })?;

    let auth_state = AuthState {
        csrf_token: auth_state_data.csrf_token,
        pkce_verifier: auth_state_data.pkce_verifier,
        nonce: auth_state_data.nonce,
    };

    let assertion = state
        .oidc_client
        .exchange_code(&code, &auth_state)
        .await
        .map_err(|e| AuthError::Delegation(e.to_string()))?;

    let ttl = state.session_config.ttl();

    // An assertion without an email cannot be authorized; treat it as an
    // unauthenticated failure with a generic reason.
    let Some(email) = assertion.email else {
        return reject(
            &state,
            jar,
            "The identity provider did not share an email address for your account.".to_string(),
        )
        .await;
    };

    let decision = state.policy.authorize(&email);
    if !decision.authorized {
        return reject(
            &state,
            jar,
            format!("{email} is not on the student allow-list."),
        )
        .await;
    }

    // Display name falls back to the email's local part.
    let display_name = assertion
        .display_name
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    let principal = Principal::new(email, display_name, decision.role);
    let session = Session::authenticated(SessionId::generate(), principal, ttl);

    state
        .store
        .put(&session, ttl)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    let jar = jar
        .add(session_cookie(&state.session_config, session.id()))
        .add(removal_cookie(AUTH_STATE_COOKIE));

    Ok((jar, Redirect::to("/dashboard")))
}

/// Writes an anonymous session carrying the rejection reason in its flash
/// slot, then redirects to the failure page.
async fn reject(
    state: &AppState,
    jar: CookieJar,
    reason: String,
) -> Result<(CookieJar, Redirect), AuthError> {
    let ttl = state.session_config.ttl();
    let mut session = Session::anonymous(SessionId::generate(), ttl);
    session.set_flash(reason);

    state
        .store
        .put(&session, ttl)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    let jar = jar
        .add(session_cookie(&state.session_config, session.id()))
        .add(removal_cookie(AUTH_STATE_COOKIE));

    Ok((jar, Redirect::to("/login-failure")))
}

/// `GET /login-failure` — renders the failure page.
///
/// The one-shot flash (when a session carries one) wins; otherwise a known
/// `?reason=` key maps to a fixed generic line. Provider internals are never
/// echoed.
pub async fn login_failure(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FailureQuery>,
    jar: CookieJar,
) -> Html<String> {
    let flash = take_flash(&state, &jar).await;
    let message =
        flash.unwrap_or_else(|| generic_failure_message(query.reason.as_deref()).to_string());
    Html(pages::failure(&message))
}

/// Takes the session's flash message, persisting the cleared slot so the
/// message renders exactly once.
async fn take_flash(state: &AppState, jar: &CookieJar) -> Option<String> {
    let session_cookie = jar.get(SESSION_COOKIE)?;
    let session_id = SessionId::new(session_cookie.value().to_string());

    let mut session = match state.store.get(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "session store read failed on failure page");
            return None;
        }
    };

    let message = session.take_flash()?;
    if let Err(e) = state
        .store
        .put(&session, state.session_config.ttl())
        .await
    {
        tracing::warn!(error = %e, "failed to persist cleared flash slot");
    }
    Some(message)
}

/// Maps a known failure reason key to a fixed user-facing line.
fn generic_failure_message(reason: Option<&str>) -> &'static str {
    match reason {
        Some("provider") => "We could not complete sign-in with the identity provider. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// `GET /logout` — deletes the session and clears the cookie.
///
/// Fail-open: a store error is logged and the user is still redirected to
/// the entry page, never trapped in a broken session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(session_cookie.value().to_string());
        if let Err(e) = state.store.delete(&session_id).await {
            tracing::warn!(error = %e, "failed to delete session on logout");
        }
    }

    (jar.add(removal_cookie(SESSION_COOKIE)), Redirect::to("/"))
}

/// Builds the HTTP-only session cookie referencing (never containing) the
/// session record.
fn session_cookie(config: &SessionConfig, id: &SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(config.ttl_minutes))
        .build()
}

/// Re-issues the session cookie with a full max-age, so the browser's copy
/// slides in step with the store row.
fn refresh_session_cookie(config: &SessionConfig, jar: CookieJar) -> CookieJar {
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let id = SessionId::new(cookie.value().to_string());
            jar.add(session_cookie(config, &id))
        }
        None => jar,
    }
}

/// Builds an expired cookie that removes `name` from the browser.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Serializable auth state for cookie storage.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct AuthStateData {
    csrf_token: String,
    pkce_verifier: String,
    nonce: String,
}

/// Authentication errors surfaced by the route layer.
#[derive(Debug)]
pub enum AuthError {
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    Delegation(String),
    Store(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            // Page-based app: a broken or replayed OIDC round-trip lands on
            // the generic failure page, with the detail only in the log.
            Self::MissingAuthState | Self::InvalidAuthState | Self::CsrfMismatch => {
                tracing::warn!(error = ?self, "rejected OIDC callback");
                Redirect::to("/login-failure?reason=provider").into_response()
            }
            Self::Delegation(msg) => {
                tracing::error!("delegation failure: {}", msg);
                Redirect::to("/login-failure?reason=provider").into_response()
            }
            Self::Store(msg) => {
                tracing::error!("session store failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OidcClient;
    use crate::config::OidcConfig;
    use axum::body::Body;
    use axum::http::{Request, Uri, header};
    use chrono::Duration;
    use pathfinder_gate_access::{AccessPolicy, Role};
    use pathfinder_gate_session_store::MemoryStore;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let oidc_config = OidcConfig {
            issuer_url: "https://accounts.example.com".to_string(),
            client_id: "gate".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://portal.example.com/oauth-callback".to_string(),
            scopes: "openid,email,profile".to_string(),
        };
        let session_config = SessionConfig {
            secure_cookies: false,
            ..SessionConfig::default()
        };
        Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            OidcClient::with_static_metadata(oidc_config),
            session_config,
            AccessPolicy::new(
                "stu.pathfinder-mm.org",
                vec!["mentor@pathfinder-mm.org".to_string()],
            ),
        ))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn get_request_with_session(uri: &str, id: &SessionId) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, format!("{SESSION_COOKIE}={id}"))
            .body(Body::empty())
            .expect("request")
    }

    async fn seed_student_session(state: &AppState) -> SessionId {
        let session = Session::authenticated(
            SessionId::generate(),
            Principal::new(
                "student1@stu.pathfinder-mm.org".to_string(),
                "Student One".to_string(),
                Role::Student,
            ),
            Duration::hours(1),
        );
        state
            .store
            .put(&session, Duration::hours(1))
            .await
            .expect("seed session");
        session.id().clone()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("location str")
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[test]
    fn provider_error_callback_query_still_parses() {
        // A consent denial carries no code; the extractor must not 400 it.
        let uri: Uri = "/oauth-callback?error=access_denied&state=xyz"
            .parse()
            .expect("uri");
        let Query(query) = Query::<CallbackQuery>::try_from_uri(&uri).expect("query parses");
        assert_eq!(query.error.as_deref(), Some("access_denied"));
        assert!(query.code.is_none());
    }

    #[tokio::test]
    async fn provider_error_callback_redirects_to_failure_page() {
        let app = router(test_state());
        let response = app
            .oneshot(get_request("/oauth-callback?error=access_denied&state=xyz"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login-failure?reason=provider");
    }

    #[tokio::test]
    async fn callback_without_code_redirects_to_failure_page() {
        let app = router(test_state());
        let response = app
            .oneshot(get_request("/oauth-callback?state=xyz"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login-failure?reason=provider");
    }

    #[tokio::test]
    async fn unauthenticated_dashboard_redirects_to_entry_page() {
        let app = router(test_state());
        let response = app
            .oneshot(get_request("/dashboard"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn authenticated_dashboard_renders_and_reissues_cookie() {
        let state = test_state();
        let session_id = seed_student_session(&state).await;

        let response = router(state)
            .oneshot(get_request_with_session("/dashboard", &session_id))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .expect("set-cookie str");
        assert!(set_cookie.contains(SESSION_COOKIE));
        assert!(set_cookie.contains("Max-Age"));

        let body = body_string(response).await;
        assert!(body.contains("documents-panel"));
    }

    #[tokio::test]
    async fn logout_destroys_session_and_dashboard_reverts_to_redirect() {
        let state = test_state();
        let session_id = seed_student_session(&state).await;

        let response = router(state.clone())
            .oneshot(get_request_with_session("/logout", &session_id))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        assert!(
            state
                .store
                .get(&session_id)
                .await
                .expect("get")
                .is_none()
        );

        let response = router(state)
            .oneshot(get_request_with_session("/dashboard", &session_id))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn rejection_flash_renders_once_and_sets_no_principal() {
        let state = test_state();

        let (jar, redirect) = reject(
            &state,
            CookieJar::new(),
            "random@gmail.com is not on the student allow-list.".to_string(),
        )
        .await
        .expect("reject");

        let response = (jar.clone(), redirect).into_response();
        assert_eq!(location(&response), "/login-failure");

        let session_id =
            SessionId::new(jar.get(SESSION_COOKIE).expect("cookie").value().to_string());
        let session = state
            .store
            .get(&session_id)
            .await
            .expect("get")
            .expect("session row written");
        assert!(!session.is_authenticated());

        let response = router(state.clone())
            .oneshot(get_request_with_session("/login-failure", &session_id))
            .await
            .expect("response");
        let body = body_string(response).await;
        assert!(body.contains("not on the student allow-list"));

        // The flash is read-once: a reload falls back to the generic line.
        let response = router(state)
            .oneshot(get_request_with_session("/login-failure", &session_id))
            .await
            .expect("response");
        let body = body_string(response).await;
        assert!(!body.contains("not on the student allow-list"));
        assert!(body.contains("Sign-in failed"));
    }

    #[test]
    fn refreshed_session_cookie_restarts_max_age() {
        let config = SessionConfig::default();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "01ARZ3NDEKTSV4RRFFQ69G5FAV"));

        let jar = refresh_session_cookie(&config, jar);
        let cookie = jar.get(SESSION_COOKIE).expect("cookie");

        assert_eq!(cookie.value(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(
            cookie.max_age(),
            Some(TimeDuration::minutes(config.ttl_minutes))
        );
    }

    #[test]
    fn known_failure_reason_maps_to_fixed_line() {
        assert!(generic_failure_message(Some("provider")).contains("identity provider"));
    }

    #[test]
    fn unknown_failure_reason_is_never_echoed() {
        let message = generic_failure_message(Some("<script>alert(1)</script>"));
        assert_eq!(message, "Sign-in failed. Please try again.");
    }

    #[test]
    fn missing_failure_reason_gets_generic_line() {
        assert_eq!(
            generic_failure_message(None),
            "Sign-in failed. Please try again."
        );
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(SESSION_COOKIE);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.max_age(), Some(TimeDuration::ZERO));
    }
}
