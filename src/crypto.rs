// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! At-rest field encryption for sensitive columns.
//!
//! Uses AES-256-GCM with a random 16-byte IV per call. The key is derived as
//! SHA-256 of the `FIELD_SECRET` environment secret.
//!
//! Ciphertext wire format (base64-encoded):
//!   [ iv (16 bytes) | tag (16 bytes) | ciphertext ]
//!
//! Decryption tolerates legacy plaintext rows: any value that does not parse
//! as ciphertext is returned unchanged.
//!
//! Each encrypted column carries a companion deterministic lookup hash
//! (HMAC-SHA256 of the plaintext, hex-encoded) so that equality searches work
//! without decrypting every row.

use aes::Aes256;
use aes_gcm::{
    aead::{consts::U16, Aead, AeadCore, KeyInit, OsRng},
    AesGcm,
};
use hmac::{Hmac, Mac};
use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::FIELD_SECRET_ENV;

/// AES-256-GCM with a 16-byte nonce, matching the stored wire format.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

type HmacSha256 = Hmac<Sha256>;

/// IV length in bytes.
const IV_LEN: usize = 16;

/// GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Development fallback secret used when `FIELD_SECRET` is unset.
const DEV_FIELD_SECRET: &str = "ichibot-dev-field-secret";

/// An encrypted column value together with its lookup hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedField {
    /// Base64-packed ciphertext (`iv ‖ tag ‖ data`).
    pub enc: String,
    /// Deterministic HMAC-SHA256 of the plaintext, hex-encoded.
    pub hash: String,
}

/// Field-level cipher derived from the deployment secret.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Create a cipher from a raw secret. The key is SHA-256 of the secret.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Create a cipher from `FIELD_SECRET`, warning on the dev fallback.
    pub fn from_env() -> Self {
        match std::env::var(FIELD_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => Self::new(&secret),
            _ => {
                warn!("FIELD_SECRET is not set; using development fallback key");
                Self::new(DEV_FIELD_SECRET)
            }
        }
    }

    /// Encrypt a plaintext field into the packed base64 wire format.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let cipher = Aes256Gcm16::new_from_slice(&self.key).expect("key is exactly 32 bytes");
        let iv = Aes256Gcm16::generate_nonce(&mut OsRng);

        // encrypt() appends the 16-byte tag to the ciphertext
        let sealed = cipher
            .encrypt(&iv, plaintext.as_bytes())
            .expect("AES-GCM encryption is infallible for in-memory buffers");
        let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut packed = Vec::with_capacity(IV_LEN + TAG_LEN + data.len());
        packed.extend_from_slice(&iv);
        packed.extend_from_slice(tag);
        packed.extend_from_slice(data);
        Base64::encode_string(&packed)
    }

    /// Decrypt a packed field value.
    ///
    /// Returns the input unchanged when it does not parse as ciphertext, so
    /// legacy plaintext rows keep working.
    pub fn decrypt(&self, value: &str) -> String {
        match self.try_decrypt(value) {
            Some(plaintext) => plaintext,
            None => value.to_string(),
        }
    }

    fn try_decrypt(&self, value: &str) -> Option<String> {
        let packed = Base64::decode_vec(value).ok()?;
        if packed.len() < IV_LEN + TAG_LEN {
            return None;
        }

        let (iv, rest) = packed.split_at(IV_LEN);
        let (tag, data) = rest.split_at(TAG_LEN);

        // Re-assemble ciphertext ‖ tag for the AEAD layer
        let mut sealed = Vec::with_capacity(data.len() + TAG_LEN);
        sealed.extend_from_slice(data);
        sealed.extend_from_slice(tag);

        let cipher = Aes256Gcm16::new_from_slice(&self.key).ok()?;
        let nonce = aes_gcm::Nonce::<U16>::from_slice(iv);
        let plaintext = cipher.decrypt(nonce, sealed.as_slice()).ok()?;
        String::from_utf8(plaintext).ok()
    }

    /// Deterministic lookup hash for equality search on encrypted columns.
    pub fn lookup_hash(&self, plaintext: &str) -> String {
        let mut mac: HmacSha256 =
            Mac::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Encrypt a field and compute its lookup hash in one step.
    pub fn seal(&self, plaintext: &str) -> SealedField {
        SealedField {
            enc: self.encrypt(plaintext),
            hash: self.lookup_hash(plaintext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new("test-secret")
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let c = cipher();
        let plaintext = "Budi Santoso";
        let sealed = c.encrypt(plaintext);

        assert_ne!(sealed, plaintext);
        assert_eq!(c.decrypt(&sealed), plaintext);
    }

    #[test]
    fn decrypt_of_plaintext_returns_input_unchanged() {
        let c = cipher();
        assert_eq!(c.decrypt("legacy plain value"), "legacy plain value");
        assert_eq!(c.decrypt(""), "");
        // Valid base64 but too short to be ciphertext
        assert_eq!(c.decrypt("aGVsbG8="), "aGVsbG8=");
    }

    #[test]
    fn tampered_ciphertext_falls_back_to_input() {
        let c = cipher();
        let sealed = c.encrypt("secret");
        let mut bytes = Base64::decode_vec(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = Base64::encode_string(&bytes);

        assert_eq!(c.decrypt(&tampered), tampered);
    }

    #[test]
    fn ciphertext_is_randomized_per_call() {
        let c = cipher();
        let a = c.encrypt("same input");
        let b = c.encrypt("same input");
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a), c.decrypt(&b));
    }

    #[test]
    fn wrong_key_does_not_decrypt() {
        let sealed = FieldCipher::new("key-a").encrypt("payroll");
        // The wrong key cannot authenticate, so the input comes back as-is
        assert_eq!(FieldCipher::new("key-b").decrypt(&sealed), sealed);
    }

    #[test]
    fn lookup_hash_is_deterministic_and_key_dependent() {
        let a = FieldCipher::new("key-a");
        let b = FieldCipher::new("key-b");

        assert_eq!(a.lookup_hash("Budi"), a.lookup_hash("Budi"));
        assert_ne!(a.lookup_hash("Budi"), a.lookup_hash("Ani"));
        assert_ne!(a.lookup_hash("Budi"), b.lookup_hash("Budi"));
    }

    #[test]
    fn packed_layout_is_iv_tag_data() {
        let c = cipher();
        let sealed = c.encrypt("x");
        let bytes = Base64::decode_vec(&sealed).unwrap();
        // 16-byte IV + 16-byte tag + 1 byte of ciphertext
        assert_eq!(bytes.len(), IV_LEN + TAG_LEN + 1);
    }

    #[test]
    fn seal_produces_matching_hash() {
        let c = cipher();
        let sealed = c.seal("Citra");
        assert_eq!(c.decrypt(&sealed.enc), "Citra");
        assert_eq!(sealed.hash, c.lookup_hash("Citra"));
    }
}
