use crate::utils::password::{MAX_COST, MIN_COST};
use std::env;

/// How long a password reset token stays honourable after it is issued.
pub const PASSWORD_RESET_WINDOW_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// bcrypt work factor used for passwords and every token digest.
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|cost| cost.clamp(MIN_COST, MAX_COST))
            .unwrap_or(bcrypt::DEFAULT_COST);

        Self { bcrypt_cost }
    }

    /// Cheapest hashing the algorithm allows.
    pub fn minimal() -> Self {
        Self {
            bcrypt_cost: MIN_COST,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}
