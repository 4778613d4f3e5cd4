use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;
use sha2::{Digest, Sha256};
use thiserror::Error;

const BASE63_ALPHABET: &[u8; 63] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_";

// Largest multiple of 63 that fits in a byte; bytes at or above it are rejected
// so every symbol stays equally likely.
const BASE63_LIMIT: u8 = 252;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// Random string of `len` symbols drawn from `[0-9A-Za-z_]`.
pub fn gen_random_base63(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while out.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
        for &byte in buf.iter().filter(|&&b| b < BASE63_LIMIT) {
            if out.len() == len {
                break;
            }
            out.push(BASE63_ALPHABET[(byte % 63) as usize] as char);
        }
    }
    Ok(out)
}

/// SHA-256 of the input, base64url encoded without padding.
pub(crate) fn hash_base64url(input: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(input.as_bytes()))
}

pub(crate) fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}
