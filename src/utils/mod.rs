pub mod password;
pub mod validation;

pub use password::{digest, new_token, verify_digest};
pub use validation::{not_blank, valid_password, EMAIL_REGEX};
