//! Authentication module for the Pathfinder gate server.
//!
//! This module provides:
//! - OIDC delegation to the external identity provider
//! - Session-cookie handling over the pluggable session store
//! - Authentication extractors for Axum routes
//!
//! # Authorization Model
//!
//! Authorization is decided once, at callback time, by the email allow-list
//! ([`AccessPolicy`]): student-domain emails and configured exceptions sign
//! in as students; everyone else is refused with a one-line reason. The
//! resulting role lives in the session for its lifetime; a change in the
//! rule set takes effect on next login.

pub mod middleware;
pub mod oidc;
pub mod routes;

use pathfinder_gate_access::AccessPolicy;
use pathfinder_gate_session_store::SessionStore;
use std::sync::Arc;

use crate::config::SessionConfig;

pub use middleware::{OptionalAuth, RequireAuth};
pub use oidc::OidcClient;

/// Session cookie name. The value is the opaque session ID, never session
/// content.
pub const SESSION_COOKIE: &str = "gate_session";

/// Shared application state.
pub struct AppState {
    /// Session persistence, constructed once at startup.
    pub store: Arc<dyn SessionStore>,
    /// OIDC client for authentication.
    pub oidc_client: OidcClient,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Email allow-list policy.
    pub policy: AccessPolicy,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        store: Arc<dyn SessionStore>,
        oidc_client: OidcClient,
        session_config: SessionConfig,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            store,
            oidc_client,
            session_config,
            policy,
        }
    }
}
