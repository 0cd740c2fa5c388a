//! Asset file enciphering for newer game installs.
//!
//! Recent clients store the `dat/` bundle files and the metadata index
//! XOR-enciphered. The transform is symmetric: applying it twice restores
//! the input, so the same function serves for both directions. Bundle keys
//! are derived per file from the bundle's hash name; the metadata index
//! uses the base key digest directly.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Base key mixed into every derived keystream
const BASE_KEY: [u8; 32] = [
    0x9c, 0x41, 0xd2, 0x7e, 0x55, 0x0b, 0xe6, 0x38, 0xa1, 0xc4, 0x12, 0x8f, 0x63, 0xd9, 0x2a, 0x70,
    0x0e, 0xb7, 0x48, 0xf5, 0x21, 0x6c, 0x93, 0x5a, 0xdd, 0x36, 0x84, 0x4f, 0xb0, 0x17, 0xc8, 0x62,
];

/// Errors that can occur during key derivation
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid bundle hash {0:?}")]
    InvalidHash(String),
}

/// Derive the keystream for a single bundle file from its hash name.
///
/// Hash names are lowercase hex as stored in the metadata index; anything
/// that could not have come from the index is rejected.
pub fn derive_bundle_key(bundle_hash: &str) -> Result<[u8; 32], CryptoError> {
    if bundle_hash.is_empty() || !bundle_hash.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CryptoError::InvalidHash(bundle_hash.to_string()));
    }

    let mut hasher = Sha256::new();
    hasher.update(BASE_KEY);
    hasher.update(bundle_hash.as_bytes());
    Ok(hasher.finalize().into())
}

/// Keystream for the metadata index database
pub fn derive_meta_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(BASE_KEY);
    hasher.finalize().into()
}

/// XOR `data` with the repeating 32-byte keystream, in place
fn apply_keystream(data: &mut [u8], key: &[u8; 32]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }
}

/// Encipher or decipher a bundle file's bytes in place
pub fn crypt_bundle(data: &mut [u8], bundle_hash: &str) -> Result<(), CryptoError> {
    let key = derive_bundle_key(bundle_hash)?;
    apply_keystream(data, &key);
    Ok(())
}

/// Encipher or decipher the metadata index bytes in place
pub fn crypt_meta(data: &mut [u8]) {
    apply_keystream(data, &derive_meta_key());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_roundtrip() {
        let original = b"UnityFS\x00payload bytes".to_vec();
        let mut data = original.clone();

        crypt_bundle(&mut data, "ab12cd34").unwrap();
        assert_ne!(data, original);

        crypt_bundle(&mut data, "ab12cd34").unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_keys_differ_per_hash() {
        let a = derive_bundle_key("aa00").unwrap();
        let b = derive_bundle_key("aa01").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, derive_meta_key());
    }

    #[test]
    fn test_rejects_bad_hash() {
        assert!(derive_bundle_key("").is_err());
        assert!(derive_bundle_key("../escape").is_err());
    }

    #[test]
    fn test_meta_roundtrip() {
        let original = b"SQLite format 3\x00".to_vec();
        let mut data = original.clone();
        crypt_meta(&mut data);
        crypt_meta(&mut data);
        assert_eq!(data, original);
    }
}
