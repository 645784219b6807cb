use anyhow::Context;

use crate::models::user::MAX_PASSWORD_BYTES;

/// One-way hashing of user secrets. bcrypt embeds a fresh random salt and the
/// cost in every hash, so `verify` needs nothing but the stored string.
#[derive(Debug, Clone, Copy)]
pub struct PasswordVault {
    cost: u32,
}

impl PasswordVault {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Refuses input bcrypt would silently truncate.
    pub fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            anyhow::bail!("Password exceeds {MAX_PASSWORD_BYTES} bytes");
        }
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a bcrypt hash.
    /// Input longer than bcrypt can see never matches.
    pub fn verify(&self, hash: &str, plaintext: &str) -> anyhow::Result<bool> {
        let matches = bcrypt::verify(plaintext, hash).context("Stored password hash is malformed")?;
        Ok(matches && plaintext.len() <= MAX_PASSWORD_BYTES)
    }
}
