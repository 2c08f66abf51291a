//! Role types for portal access control.
//!
//! The portal distinguishes exactly two roles, assigned at login from the
//! allow-list decision. The role only shapes what the dashboard shows; it is
//! never re-derived after the session is established.

use serde::{Deserialize, Serialize};

/// Portal role derived from the allow-list decision at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A member of the institution's student body.
    Student,
    /// Any other authenticated identity.
    General,
}

impl Role {
    /// Returns true if this role sees the student-facing dashboard panels.
    #[must_use]
    pub fn is_student(&self) -> bool {
        matches!(self, Self::Student)
    }
}
