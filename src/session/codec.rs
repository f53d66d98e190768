//! Secure cookie codec.
//!
//! # Responsibilities
//! - Encrypt cookie payloads with the application secret
//! - Reject tampered, truncated or foreign payloads
//!
//! # Design Decisions
//! - AES-256-GCM; the key is SHA-256 of the secret
//! - A fresh 96-bit nonce per value, prefixed to the ciphertext
//! - The cookie name is the associated data, so a value sealed for one
//!   cookie never opens under another name
//! - URL-safe base64 without padding, so values need no cookie quoting

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Shortest secret accepted at startup.
pub const MIN_SECRET_LEN: usize = 16;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("application secret must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("failed to encrypt cookie value")]
    Encrypt,

    #[error("cookie value is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("cookie value is too short to carry a nonce")]
    Truncated,

    #[error("cookie value failed authentication")]
    Decrypt,

    #[error("cookie value is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("cookie payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encrypts and decrypts cookie values with the application secret.
#[derive(Clone)]
pub struct SecureCookie {
    cipher: Aes256Gcm,
}

impl SecureCookie {
    pub fn new(secret: &str) -> Result<Self, CodecError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CodecError::SecretTooShort {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CodecError::Encrypt)?;
        Ok(Self { cipher })
    }

    /// Encrypt and encode a value for the cookie `name`.
    pub fn seal(&self, name: &str, plaintext: &[u8]) -> Result<String, CodecError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CodecError::Encrypt)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    /// Decode and decrypt a value read from the cookie `name`.
    pub fn open(&self, name: &str, value: &str) -> Result<Vec<u8>, CodecError> {
        let payload = URL_SAFE_NO_PAD.decode(value)?;
        if payload.len() < NONCE_LEN {
            return Err(CodecError::Truncated);
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CodecError::Decrypt)
    }

    pub fn open_str(&self, name: &str, value: &str) -> Result<String, CodecError> {
        Ok(String::from_utf8(self.open(name, value)?)?)
    }

    /// JSON-serialize then seal.
    pub fn encode_json<T: Serialize>(&self, name: &str, value: &T) -> Result<String, CodecError> {
        let json = serde_json::to_vec(value)?;
        self.seal(name, &json)
    }

    /// Open then JSON-deserialize.
    pub fn decode_json<T: DeserializeOwned>(&self, name: &str, value: &str) -> Result<T, CodecError> {
        let json = self.open(name, value)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl fmt::Debug for SecureCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureCookie { .. }")
    }
}
