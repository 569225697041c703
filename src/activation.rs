//! Activation landing contract and shared query-string conventions.
//!
//! The activation page receives `?status=success|error` and an optional
//! `?error=<code>`; message selection is a total function on that tuple.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationNotice {
    pub success: bool,
    pub message: &'static str,
}

/// Map the `{status, error}` query tuple to exactly one user-facing message.
pub fn activation_message(status: Option<&str>, error: Option<&str>) -> ActivationNotice {
    if status == Some("success") {
        return ActivationNotice {
            success: true,
            message: "Your account has been activated. You can now log in.",
        };
    }
    let message = match error {
        Some("invalid_token") => "This activation link is invalid or has expired.",
        Some("already_activated") => "This account has already been activated.",
        Some("user_not_found") => {
            "We couldn't find an account associated with this activation link."
        }
        _ => "There was a problem activating your account.",
    };
    ActivationNotice {
        success: false,
        message,
    }
}

/// Post-login destination from a query string: `redirect` wins over `next`,
/// default is `/`. Only same-site paths (leading `/`) are honored.
pub fn redirect_target(query: &str) -> String {
    let mut redirect = None;
    let mut next = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "redirect" => redirect = Some(value.into_owned()),
            "next" => next = Some(value.into_owned()),
            _ => {}
        }
    }
    redirect
        .or(next)
        .filter(|target| target.starts_with('/'))
        .unwrap_or_else(|| "/".to_string())
}

/// `community_id` preselection for the submit page.
pub fn community_id(query: &str) -> Option<i64> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "community_id")
        .and_then(|(_, value)| value.parse().ok())
}

/// Client-side email shape check used by forgot-password; malformed
/// addresses never reach the network.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"))
        .is_match(email)
}
