//! Collection-name validation and normalization.
//!
//! Names are rejected outright when they contain anything outside ASCII
//! letters, digits, `_` and `-`. Rejecting instead of substituting keeps
//! two distinct raw names from ever landing on the same file paths.

use crate::error::NameError;
use crate::types::Token;

/// True iff `raw` is non-empty and contains only allowed characters.
pub fn is_valid(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validate `raw` and return it as a [`Token`].
///
/// Validation and normalization are separate steps on purpose: today
/// normalization is the identity, but stricter rules (case folding, length
/// caps) can land here later without touching the validation contract.
pub fn normalize(raw: &str) -> Result<Token, NameError> {
    if !is_valid(raw) {
        return Err(NameError {
            name: raw.to_owned(),
        });
    }
    Ok(Token(raw.to_owned()))
}
