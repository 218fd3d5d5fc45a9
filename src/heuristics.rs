//! Free-text page classifiers.
//!
//! The gateway only gives us page text, so these are plain case-insensitive
//! substring matches against fixed phrase tables. They will false-positive on
//! page copy that merely mentions a phrase (help text about two-factor auth,
//! a field label containing "required"); that trade-off is accepted.

/// Phrases that mean the platform wants the user to log in or verify.
pub const AUTH_PATTERNS: &[&str] = &[
    "sign in",
    "log in",
    "login",
    "sign up",
    "create account",
    "enter your email",
    "enter your password",
    "verification code",
    "2fa",
    "two-factor",
    "authenticate",
    "verify your",
    "continue with google",
    "continue with apple",
    "continue with email",
];

/// Subset of auth phrases that specifically ask for a second factor.
pub const SECOND_FACTOR_PATTERNS: &[&str] = &["verification code", "2fa", "two-factor"];

/// Generic form-validation error phrases.
pub const VALIDATION_ERROR_PATTERNS: &[&str] = &[
    "required",
    "fix errors",
    "please enter",
    "invalid",
    "can't be blank",
    "must be",
    "is required",
    "please fill",
];

/// Affordances that usually only appear on a page the user owns.
pub const MANAGE_PATTERNS: &[&str] = &["edit", "manage", "settings"];

/// True if `text` contains any of `patterns`, ignoring ASCII/Unicode case.
///
/// Patterns are expected to be lowercase already.
pub fn contains_any(text: &str, patterns: &[&str]) -> bool {
    let lower = text.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

pub fn needs_auth(text: &str) -> bool {
    contains_any(text, AUTH_PATTERNS)
}

/// True if the auth gate is a second-factor prompt rather than a login form.
pub fn needs_second_factor(text: &str) -> bool {
    contains_any(text, SECOND_FACTOR_PATTERNS)
}

pub fn has_validation_errors(text: &str) -> bool {
    contains_any(text, VALIDATION_ERROR_PATTERNS)
}

pub fn has_manage_affordance(text: &str) -> bool {
    contains_any(text, MANAGE_PATTERNS)
}
