//! Input checks for intake answers.

use std::sync::LazyLock;

use regex::Regex;

/// One `@`, a local part and a dotted domain, none of them containing whitespace.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Syntactic sanity check for an email address. Not RFC validation.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}
