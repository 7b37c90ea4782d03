use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::ValidationError;

pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)^[a-z0-9_+\-.]+@[a-z0-9\-.]+\.[a-z]+$").expect("email pattern compiles")
});

/// bcrypt ignores everything past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Rejects empty and whitespace-only values.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("can't be blank")));
    }
    Ok(())
}

/// Non-blank and short enough for bcrypt to read in full.
pub fn valid_password(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("too_long")
            .with_message(Cow::Borrowed("is too long (maximum is 72 bytes)")));
    }
    Ok(())
}
