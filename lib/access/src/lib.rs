//! Identity, authorization policy, and session model for the Pathfinder gate.
//!
//! This crate provides:
//! - The authenticated principal (`Principal`) and its role (`Role`)
//! - The email allow-list policy (`AccessPolicy`, `AccessDecision`)
//! - Session records (`Session`, `SessionId`) with sliding expiration and a
//!   one-shot flash slot
//!
//! # Access Control Model
//!
//! Access to the portal is decided by a static allow-list over the verified
//! email the identity provider asserts at login:
//! - Emails in the institution's student domain sign in as `Student`
//! - A fixed list of exception addresses also signs in as `Student`
//! - Every other email is refused
//!
//! # Example
//!
//! ```
//! use pathfinder_gate_access::{AccessPolicy, Principal, Role, Session, SessionId};
//! use chrono::Duration;
//!
//! let policy = AccessPolicy::new(
//!     "stu.pathfinder-mm.org",
//!     vec!["mentor@pathfinder-mm.org".to_string()],
//! );
//!
//! let decision = policy.authorize("student1@stu.pathfinder-mm.org");
//! assert!(decision.authorized);
//! assert_eq!(decision.role, Role::Student);
//!
//! // Establish the principal in a fresh session
//! let principal = Principal::new(
//!     "student1@stu.pathfinder-mm.org".to_string(),
//!     "Student One".to_string(),
//!     decision.role,
//! );
//! let session = Session::authenticated(SessionId::generate(), principal, Duration::days(14));
//!
//! assert!(session.is_authenticated());
//! assert!(!session.is_expired());
//! ```

pub mod policy;
pub mod principal;
pub mod role;
pub mod session;

// Re-export main types at crate root
pub use policy::{AccessDecision, AccessPolicy};
pub use principal::Principal;
pub use role::Role;
pub use session::{Session, SessionId};
