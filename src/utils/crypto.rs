// Cryptographic utilities for challenges and sealed client-held state

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Fill a fixed-size array with cryptographically secure random bytes
#[must_use]
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Returns
///
/// A base64url-encoded (unpadded) string representing the random bytes
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut nonce = vec![0u8; length];
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Decode base64 text that may use either alphabet, with or without padding.
///
/// Browsers hand back `clientDataJSON` and challenges in whichever variant the
/// client library picked, so the input is folded onto URL-safe/unpadded first.
///
/// # Errors
///
/// Returns an error if the canonicalized text is not valid base64
pub fn decode_base64_any(input: &str) -> Result<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(canonical_base64url(input))
        .context("Invalid base64 data")
}

/// Fold standard base64 onto the URL-safe, unpadded alphabet
#[must_use]
pub fn canonical_base64url(input: &str) -> String {
    input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Arguments
///
/// * `data` - The data to encrypt (must implement Serialize)
/// * `key` - The encryption key (must be 32 bytes for AES-256)
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let json_data = serde_json::to_string(data).context("Failed to serialize data")?;

    let nonce_bytes = random_bytes::<NONCE_SIZE>();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_bytes())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    // nonce || ciphertext
    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails (wrong key or tampered data)
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    let data: T = serde_json::from_slice(&plaintext)
        .context("Failed to deserialize data from decrypted JSON")?;

    Ok(data)
}

/// Derive a proper 32-byte encryption key from input key material
///
/// Keys shorter than 32 bytes are stretched with a simple positional scheme;
/// longer keys are truncated. Configure a full-length secret in production.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    let key_len = std::cmp::min(input_key.len(), ENCRYPTION_KEY_SIZE);
    encryption_key[..key_len].copy_from_slice(&input_key[..key_len]);

    if key_len > 0 && key_len < ENCRYPTION_KEY_SIZE {
        for i in key_len..ENCRYPTION_KEY_SIZE {
            encryption_key[i] =
                encryption_key[i % key_len].wrapping_add(u8::try_from(i % 256).unwrap_or(0));
        }
    }

    encryption_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sealed {
        value: String,
        number: i64,
    }

    #[test]
    fn test_generate_nonce_is_url_safe_and_sized() {
        let nonce = generate_nonce(32);
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(nonce.len(), 43);
        assert!(!nonce.contains('+') && !nonce.contains('/') && !nonce.contains('='));
        assert_ne!(nonce, generate_nonce(32));
    }

    #[test]
    fn test_canonical_base64url_folds_standard_alphabet() {
        assert_eq!(canonical_base64url("ab+/cd=="), "ab-_cd");
        assert_eq!(canonical_base64url("ab-_cd"), "ab-_cd");
    }

    #[test]
    fn test_decode_base64_any_accepts_all_variants() {
        let bytes = [0xfbu8, 0xff, 0xfe, 0x10];
        let standard = general_purpose::STANDARD.encode(bytes);
        let url_safe = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert_eq!(decode_base64_any(&standard).unwrap(), bytes);
        assert_eq!(decode_base64_any(&url_safe).unwrap(), bytes);
        assert!(decode_base64_any("not base64!").is_err());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = derive_encryption_key(b"test-key-for-sealing-state-32-by");
        let data = Sealed {
            value: "hello".to_string(),
            number: 42,
        };
        let sealed = encrypt_data(&data, &key).unwrap();
        let opened: Sealed = decrypt_data(&sealed, &key).unwrap();
        assert_eq!(opened, data);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let key = derive_encryption_key(b"first-key");
        let other = derive_encryption_key(b"second-key");
        let sealed = encrypt_data(&"secret", &key).unwrap();
        assert!(decrypt_data::<String>(&sealed, &other).is_err());
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(encrypt_data(&"x", &[0u8; 16]).is_err());
        assert!(decrypt_data::<String>("abc", &[0u8; 16]).is_err());
    }

    #[test]
    fn test_derive_encryption_key_pads_short_keys() {
        let key = derive_encryption_key(b"short");
        assert_eq!(&key[..5], b"short");
        assert!(key[5..].iter().any(|b| *b != 0));
        assert_eq!(derive_encryption_key(b"short"), key);
    }
}
