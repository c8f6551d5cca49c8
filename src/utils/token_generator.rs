//! Short token generation.
//!
//! Tokens are drawn from the operating system CSPRNG and encoded as URL-safe
//! base64 without padding. Uniqueness is not checked here; registration
//! retries on a registry conflict.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;
use std::fmt::Display;

pub const MIN_TOKEN_LENGTH: usize = 4;
pub const MAX_TOKEN_LENGTH: usize = 64;

/// Tokens that would shadow a fixed route segment.
pub const RESERVED_TOKENS: &[&str] = &["stats", "health"];

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Random source unavailable: {0}")]
    RandomSource(String),
    #[error("Token length must be between {MIN_TOKEN_LENGTH} and {MAX_TOKEN_LENGTH}, got {0}")]
    InvalidLength(usize),
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::internal("Failed to generate token", json!({ "reason": e.to_string() }))
    }
}

/// Generates a random token of exactly `length` characters.
///
/// # Errors
///
/// Returns [`TokenError::RandomSource`] if the system entropy source fails and
/// [`TokenError::InvalidLength`] for lengths outside
/// `MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH`.
///
/// # Examples
///
/// ```ignore
/// let token = generate_token(8)?;
/// assert_eq!(token.len(), 8);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn generate_token(length: usize) -> Result<String, TokenError> {
    generate_with(length, getrandom::fill)
}

fn generate_with<F, E>(length: usize, mut fill: F) -> Result<String, TokenError>
where
    F: FnMut(&mut [u8]) -> Result<(), E>,
    E: Display,
{
    if !(MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&length) {
        return Err(TokenError::InvalidLength(length));
    }

    // Four base64 characters carry three bytes.
    let mut buffer = vec![0u8; length.div_ceil(4) * 3];

    loop {
        fill(&mut buffer).map_err(|e| TokenError::RandomSource(e.to_string()))?;

        let mut token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
        token.truncate(length);

        if !RESERVED_TOKENS.contains(&token.as_str()) {
            return Ok(token);
        }
    }
}
