//! Password hashing using bcrypt.

use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Salted one-way hashing of admin passwords.
///
/// Each call to [`hash`](Self::hash) draws a fresh salt, so hashing the same
/// password twice yields different digests that both verify.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit bcrypt cost (4..=31).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The configured bcrypt cost.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password into a bcrypt PHC-style digest.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// A malformed digest fails closed: it is logged and reported as a
    /// mismatch rather than surfaced as an error.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match bcrypt::verify(password, digest) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(error = %e, "Rejecting password against malformed digest");
                false
            }
        }
    }
}
