//! API credential.

use std::fmt;

use crate::error::{GeminiError, GeminiResult};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini API key.
///
/// Passed explicitly to [`crate::GeminiClient::new`]. `Debug` never prints
/// the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting empty values.
    pub fn new(key: impl Into<String>) -> GeminiResult<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(GeminiError::config("API key is empty"));
        }
        Ok(Self(key))
    }

    /// Read the key from `GEMINI_API_KEY`.
    pub fn from_env() -> GeminiResult<Self> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| GeminiError::config(format!("{} not set", API_KEY_ENV)))?;
        Self::new(key)
    }

    /// The raw key, for the request header only.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_key() {
        assert!(matches!(ApiKey::new("   "), Err(GeminiError::Config(_))));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ApiKey::new("AIza-secret").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(****)");
        assert_eq!(key.expose(), "AIza-secret");
    }
}
