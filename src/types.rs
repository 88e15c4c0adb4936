//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique client identifier
//! - `Username`: validated chat room display name

use uuid::Uuid;

use crate::error::AppError;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe client identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated username
///
/// Non-empty ASCII alphanumeric (`^[A-Za-z0-9]+$`). Construction goes
/// through [`Username::parse`], so holding a `Username` means the syntax
/// check already passed. Comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Parse and validate a username candidate
    ///
    /// Returns an error if the candidate is empty or contains anything
    /// outside ASCII `[A-Za-z0-9]`.
    pub fn parse(candidate: &str) -> Result<Self, AppError> {
        if candidate.is_empty() || !candidate.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidUsername(candidate.to_string()));
        }
        Ok(Self(candidate.to_string()))
    }

    /// The raw name as submitted
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
