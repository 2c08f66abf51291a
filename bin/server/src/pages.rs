//! Server-rendered pages.
//!
//! Three small pages, rendered straight from session data: the public entry
//! page, the role-conditioned dashboard, and the sign-in failure page. No
//! lookups happen here; everything shown derives from the principal.

use pathfinder_gate_access::Principal;

/// Public entry page with the sign-in link.
#[must_use]
pub fn entry_page() -> String {
    page(
        "Pathfinder Portal",
        r#"<h1>Pathfinder Student Portal</h1>
<p>Sign in with your school account to continue.</p>
<p><a class="button" href="/login-start">Sign in</a></p>"#,
    )
}

/// Role-conditioned dashboard.
///
/// Students see the documents panel; any other authenticated role sees the
/// enrollment panel.
#[must_use]
pub fn dashboard(principal: &Principal) -> String {
    let name = escape(principal.display_name());
    let email = escape(principal.email());

    let panel = if principal.role().is_student() {
        r#"<section id="documents-panel">
<h2>Documents</h2>
<p>Your coursework, submissions, and school documents.</p>
</section>"#
    } else {
        r#"<section id="enrollment-panel">
<h2>Enrollment</h2>
<p>Enrollment information and next steps.</p>
</section>"#
    };

    page(
        "Dashboard",
        &format!(
            r#"<h1>Welcome, {name}</h1>
<p class="signed-in-as">Signed in as {email}</p>
{panel}
<p><a href="/logout">Sign out</a></p>"#
        ),
    )
}

/// Sign-in failure page with a one-line reason.
#[must_use]
pub fn failure(reason: &str) -> String {
    let reason = escape(reason);
    page(
        "Sign-in failed",
        &format!(
            r#"<h1>Sign-in failed</h1>
<p class="reason">{reason}</p>
<p><a href="/">Back to the portal</a></p>"#
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/assets/gate.css">
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
        body = body
    )
}

/// Minimal HTML escaping for text interpolated into pages.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_gate_access::Role;

    #[test]
    fn student_sees_documents_panel() {
        let principal = Principal::new(
            "student1@stu.pathfinder-mm.org".to_string(),
            "Student One".to_string(),
            Role::Student,
        );
        let html = dashboard(&principal);
        assert!(html.contains("documents-panel"));
        assert!(!html.contains("enrollment-panel"));
        assert!(html.contains("Student One"));
    }

    #[test]
    fn general_role_sees_enrollment_panel() {
        let principal = Principal::new(
            "mentor@pathfinder-mm.org".to_string(),
            "Mentor".to_string(),
            Role::General,
        );
        let html = dashboard(&principal);
        assert!(html.contains("enrollment-panel"));
        assert!(!html.contains("documents-panel"));
    }

    #[test]
    fn failure_page_carries_the_reason() {
        let html = failure("random@gmail.com is not on the student allow-list.");
        assert!(html.contains("not on the student allow-list"));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let principal = Principal::new(
            "a@b.c".to_string(),
            "<script>alert(1)</script>".to_string(),
            Role::Student,
        );
        let html = dashboard(&principal);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn entry_page_links_to_login_start() {
        assert!(entry_page().contains("/login-start"));
    }
}
