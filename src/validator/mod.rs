mod types;

pub use types::{Email, EmailError};

use std::sync::LazyLock;

use regex::Regex;

/// Shortest accepted address, in bytes.
pub const MIN_LENGTH: usize = 6;
/// Longest accepted address, in bytes.
pub const MAX_LENGTH: usize = 60;

// ASCII only: `\w` reste [0-9A-Za-z_] avec (?-u)
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i-u)^([\w-]+(?:\.[\w-]+)*)@((?:[\w-]+\.)*\w[\w-]{0,66})\.([a-z]{2,6}(?:\.[a-z]{2})?)$",
    )
    .expect("email pattern is a valid regex")
});

/// Checks `email` against the `local@domain.tld` shape and the length bounds,
/// returning the lower-cased address on success.
///
/// Surrounding whitespace is ignored. No network access is performed.
pub fn validate_email(email: &str) -> Result<Email, EmailError> {
    let input = email.trim();
    if input.is_empty() {
        return Err(EmailError::Empty);
    }
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&input.len()) {
        return Err(EmailError::Length {
            len: input.len(),
            min: MIN_LENGTH,
            max: MAX_LENGTH,
        });
    }
    if !EMAIL_PATTERN.is_match(input) {
        return Err(EmailError::InvalidFormat);
    }

    // le motif garantit un seul '@'
    let (local, domain) = input.split_once('@').ok_or(EmailError::InvalidFormat)?;
    Ok(Email::from_parts(local, domain))
}
