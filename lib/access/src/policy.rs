//! Email allow-list policy.
//!
//! Authorization is a pure function over the verified email the identity
//! provider asserts at login. The rule set is static configuration: a
//! domain-suffix rule for the institution's student domain plus an exact-match
//! exception list. Rules are evaluated in order and the first match decides;
//! an email matching no rule is refused.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Outcome of an authorization check.
///
/// `role` is only meaningful when `authorized` is true; a refused email is
/// never surfaced with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    /// Role the email signs in with.
    pub role: Role,
    /// Whether the email may sign in at all.
    pub authorized: bool,
}

impl AccessDecision {
    fn allow(role: Role) -> Self {
        Self {
            role,
            authorized: true,
        }
    }

    fn deny() -> Self {
        Self {
            role: Role::General,
            authorized: false,
        }
    }
}

/// Static allow-list rule set, resolved once from configuration.
///
/// Evaluation order is fixed: student-domain rule, then the exception list,
/// then refusal. Both shipped rules currently map to [`Role::Student`], so
/// the ordering is only observable if the rules ever diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Email domain whose members sign in as students
    /// (e.g. "stu.pathfinder-mm.org").
    student_domain: String,
    /// Exact addresses outside the student domain that may also sign in.
    #[serde(default)]
    exception_emails: Vec<String>,
}

impl AccessPolicy {
    /// Creates a policy from the student domain and exception addresses.
    #[must_use]
    pub fn new(student_domain: impl Into<String>, exception_emails: Vec<String>) -> Self {
        Self {
            student_domain: student_domain.into(),
            exception_emails,
        }
    }

    /// Returns the configured student domain.
    #[must_use]
    pub fn student_domain(&self) -> &str {
        &self.student_domain
    }

    /// Decides whether `email` may sign in, and with which role.
    ///
    /// Pure function: no I/O, no side effects. Matching is ASCII
    /// case-insensitive, as email domains are.
    #[must_use]
    pub fn authorize(&self, email: &str) -> AccessDecision {
        if self.in_student_domain(email) {
            return AccessDecision::allow(Role::Student);
        }

        if self
            .exception_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
        {
            return AccessDecision::allow(Role::Student);
        }

        AccessDecision::deny()
    }

    /// Returns true if the email's domain is exactly the student domain.
    fn in_student_domain(&self, email: &str) -> bool {
        match email.rsplit_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.eq_ignore_ascii_case(&self.student_domain)
            }
            None => false,
        }
    }
}
