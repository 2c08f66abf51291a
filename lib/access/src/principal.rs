//! The authenticated principal attached to a session.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Identity record established once per login from the identity provider's
/// profile assertion.
///
/// A principal is immutable for the lifetime of its session and is not
/// persisted anywhere else: it lives and dies with the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Verified email asserted by the identity provider.
    email: String,
    /// Display name from the provider profile.
    display_name: String,
    /// Role assigned by the allow-list decision.
    role: Role,
}

impl Principal {
    /// Creates a new principal.
    #[must_use]
    pub fn new(email: String, display_name: String, role: Role) -> Self {
        Self {
            email,
            display_name,
            role,
        }
    }

    /// Returns the verified email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}
