//! Server-side bearer token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::AuthError;

#[derive(Debug, Deserialize)]
struct Claims {
    #[allow(dead_code)]
    aud: serde_json::Value,
}

/// Validates a presented bearer token's `aud` claim against the server's
/// own resource URL.
///
/// Only audience equality is checked by default — [`BearerValidator::strict`]
/// additionally enables signature and expiry checks for deployments that
/// supply a verification key.
#[derive(Debug, Clone)]
pub struct BearerValidator {
    expected_audience: String,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl BearerValidator {
    /// Audience-only validation: the default hardening level.
    #[must_use]
    pub fn new(expected_audience: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_aud = true;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            expected_audience: expected_audience.into(),
            decoding_key: None,
            validation,
        }
    }

    /// Full signature + issuer + expiry validation against `key`, for
    /// deployments that want production-grade hardening rather than the
    /// audience-only default.
    #[must_use]
    pub fn strict(expected_audience: impl Into<String>, key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = true;
        validation.validate_exp = true;

        Self {
            expected_audience: expected_audience.into(),
            decoding_key: Some(key),
            validation,
        }
    }

    /// Decode and check `token`. The audience set is exactly
    /// `{expected_audience}`.
    pub fn validate(&self, token: &str) -> Result<(), AuthError> {
        let mut validation = self.validation.clone();
        validation.set_audience(&[self.expected_audience.clone()]);

        let key = self
            .decoding_key
            .clone()
            .unwrap_or_else(|| DecodingKey::from_secret(&[]));

        decode::<Claims>(token, &key, &validation)
            .map(|_| ())
            .map_err(|e| AuthError::TokenRejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn token_with_aud(aud: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({ "aud": aud, "sub": "client" }),
            &EncodingKey::from_secret(b"irrelevant-in-default-mode"),
        )
        .unwrap()
    }

    #[test]
    fn matching_audience_is_accepted() {
        let validator = BearerValidator::new("https://mcp.example.com/");
        let token = token_with_aud("https://mcp.example.com/");
        assert!(validator.validate(&token).is_ok());
    }

    #[test]
    fn mismatched_audience_is_rejected() {
        let validator = BearerValidator::new("https://mcp.example.com/");
        let token = token_with_aud("https://someone-else.example.com/");
        assert!(validator.validate(&token).is_err());
    }
}
