use crate::error::{AppError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifier of the user owning a record, supplied by the authentication
/// collaborator (an email address or equivalent). Operations without an
/// identifier are rejected; there is no default user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Authentication(
                "missing user identifier".to_string(),
            ));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(AppError::Authentication(
                "user identifier contains control characters".to_string(),
            ));
        }
        Ok(UserId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable filesystem-safe key derived from the identifier
    pub fn storage_key(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hex[..12].to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
