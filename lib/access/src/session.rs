//! Session records for the gateway.
//!
//! A session is created on the first write (successful login, or a flashed
//! rejection), never for anonymous browsing. The cookie holds only the
//! session ID; all state lives in the session store. Expiration is sliding:
//! every request that touches the session extends it from now.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::principal::Principal;

/// Unique identifier for a session.
///
/// Session IDs are opaque ULID strings; the cookie value is the ID and
/// nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from an existing string (e.g. a cookie value).
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A session record: the unit the session store persists.
///
/// Holds an optional [`Principal`] (present iff the session is
/// authenticated) and an optional one-shot flash message used to carry a
/// rejection reason across the redirect to the failure page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier; doubles as the cookie value.
    id: SessionId,
    /// The authenticated identity, absent until login succeeds.
    principal: Option<Principal>,
    /// One-shot message slot, cleared atomically on read.
    flash: Option<String>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires; pushed forward on every touch.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session with no principal, valid for `ttl` from now.
    #[must_use]
    pub fn anonymous(id: SessionId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            principal: None,
            flash: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Creates a session carrying an authenticated principal.
    #[must_use]
    pub fn authenticated(id: SessionId, principal: Principal, ttl: Duration) -> Self {
        let mut session = Self::anonymous(id, ttl);
        session.principal = Some(principal);
        session
    }

    /// Reconstructs a session from stored fields.
    ///
    /// Used by store adapters when reading a persisted row back.
    #[must_use]
    pub fn from_parts(
        id: SessionId,
        principal: Option<Principal>,
        flash: Option<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            principal,
            flash,
            created_at,
            expires_at,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the authenticated principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns true iff the session holds a principal.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Establishes the authenticated principal in this session.
    pub fn attach_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// Returns the pending flash message without consuming it.
    #[must_use]
    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    /// Sets the one-shot flash message, replacing any pending one.
    pub fn set_flash(&mut self, message: String) {
        self.flash = Some(message);
    }

    /// Takes the flash message, clearing the slot.
    ///
    /// Read-once: a second take returns `None` until a new message is set.
    #[must_use]
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Sliding renewal: extends the expiration window to `ttl` from now.
    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn test_principal() -> Principal {
        Principal::new(
            "student1@stu.pathfinder-mm.org".to_string(),
            "Student One".to_string(),
            Role::Student,
        )
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn session_id_display_and_from() {
        let id: SessionId = "01ARZ3NDEKTSV4RRFFQ69G5FAV".into();
        assert_eq!(id.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(id.as_str(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    }

    #[test]
    fn anonymous_session_has_no_principal() {
        let session = Session::anonymous(SessionId::generate(), Duration::hours(1));
        assert!(!session.is_authenticated());
        assert!(session.principal().is_none());
        assert!(!session.is_expired());
        assert!(session.expires_at() > session.created_at());
    }

    #[test]
    fn authenticated_session_holds_principal() {
        let session =
            Session::authenticated(SessionId::generate(), test_principal(), Duration::hours(1));
        assert!(session.is_authenticated());
        assert_eq!(
            session.principal().map(Principal::email),
            Some("student1@stu.pathfinder-mm.org")
        );
    }

    #[test]
    fn attach_principal_authenticates() {
        let mut session = Session::anonymous(SessionId::generate(), Duration::hours(1));
        session.attach_principal(test_principal());
        assert!(session.is_authenticated());
    }

    #[test]
    fn expired_session_is_detected() {
        let session = Session::anonymous(SessionId::generate(), Duration::seconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn touch_extends_expiration() {
        let mut session = Session::anonymous(SessionId::generate(), Duration::seconds(1));
        let old_expires = session.expires_at();

        std::thread::sleep(std::time::Duration::from_millis(10));
        session.touch(Duration::hours(2));

        assert!(session.expires_at() > old_expires);
        assert!(!session.is_expired());
    }

    #[test]
    fn flash_is_read_once() {
        let mut session = Session::anonymous(SessionId::generate(), Duration::hours(1));
        session.set_flash("not on the student list".to_string());

        assert_eq!(session.flash(), Some("not on the student list"));
        assert_eq!(
            session.take_flash(),
            Some("not on the student list".to_string())
        );
        assert_eq!(session.take_flash(), None);
        assert_eq!(session.flash(), None);
    }

    #[test]
    fn set_flash_replaces_pending_message() {
        let mut session = Session::anonymous(SessionId::generate(), Duration::hours(1));
        session.set_flash("first".to_string());
        session.set_flash("second".to_string());
        assert_eq!(session.take_flash(), Some("second".to_string()));
    }

    #[test]
    fn session_serialization_roundtrip() {
        let mut session =
            Session::authenticated(SessionId::generate(), test_principal(), Duration::hours(1));
        session.set_flash("pending".to_string());

        let json = serde_json::to_string(&session).expect("serialize");
        let parsed: Session = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(session, parsed);
    }

    #[test]
    fn from_parts_reconstructs_stored_session() {
        let original =
            Session::authenticated(SessionId::generate(), test_principal(), Duration::hours(1));
        let rebuilt = Session::from_parts(
            original.id().clone(),
            original.principal().cloned(),
            None,
            original.created_at(),
            original.expires_at(),
        );
        assert_eq!(original, rebuilt);
    }
}
