//! Confirmation tokens tie a destructive pass to the exact preview that
//! produced it. Nothing is stored: the token is re-derived and compared.

use super::criteria::ScanCriteria;
use crate::model::Handle;
use serde::Serialize;
use sha2::{Digest, Sha256};

const TOKEN_VERSION: u8 = 1;
pub const MIN_TOKEN_LENGTH: usize = 32;

#[derive(Serialize)]
struct TokenInput<'a> {
    v: u8,
    criteria: &'a ScanCriteria,
    handles: Vec<&'a str>,
}

/// Hex SHA-256 over the criteria and the lexicographically sorted handles.
pub fn confirmation_token<'a, I>(criteria: &ScanCriteria, handles: I) -> String
where
    I: IntoIterator<Item = &'a Handle>,
{
    let mut handles: Vec<&str> = handles.into_iter().map(Handle::as_str).collect();
    handles.sort_unstable();

    let input = TokenInput {
        v: TOKEN_VERSION,
        criteria,
        handles,
    };

    let mut hasher = Sha256::new();
    // Serializing a plain struct of strings, numbers and booleans cannot fail.
    if let Ok(bytes) = serde_json::to_vec(&input) {
        hasher.update(&bytes);
    }
    format!("{:x}", hasher.finalize())
}

pub fn is_plausible(token: &str) -> bool {
    token.trim().len() >= MIN_TOKEN_LENGTH
}
