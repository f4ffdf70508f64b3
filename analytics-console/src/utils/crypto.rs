//! Role bundle decryption.
//!
//! The backend ships the user's role as AES-CBC ciphertext (hex) with its IV
//! (hex) and a key-material string. The key material is used as raw UTF-8
//! bytes with no derivation step, so its byte length must be a valid AES key
//! size. CBC carries no authentication tag: integrity of the plaintext is
//! unverified and only the JSON parse stands between a tampered bundle and
//! the session.

use crate::models::role::Role;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use thiserror::Error;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// CBC initialization vector length in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// Every decryption failure surfaces as this one value so callers can't be
/// used as a padding or parse oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decryption failed")]
pub struct DecryptError;

/// Where a decryption attempt stopped. Only ever logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Hex,
    IvLength,
    KeyLength,
    Cipher,
    Utf8,
    Json,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Hex => "hex",
            Stage::IvLength => "iv_length",
            Stage::KeyLength => "key_length",
            Stage::Cipher => "cipher",
            Stage::Utf8 => "utf8",
            Stage::Json => "json",
        }
    }
}

pub fn decode_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(input)
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Recovers the [`Role`] from a hex ciphertext, hex IV and key-material string.
pub fn decrypt_role(
    ciphertext_hex: &str,
    iv_hex: &str,
    key_material: &str,
) -> Result<Role, DecryptError> {
    decrypt_stages(ciphertext_hex, iv_hex, key_material).map_err(|stage| {
        tracing::debug!(stage = stage.as_str(), "Role bundle decryption failed");
        DecryptError
    })
}

fn decrypt_stages(ciphertext_hex: &str, iv_hex: &str, key_material: &str) -> Result<Role, Stage> {
    // Both inputs are validated before any cipher is constructed.
    let ciphertext = decode_hex(ciphertext_hex).map_err(|_| Stage::Hex)?;
    let iv = decode_hex(iv_hex).map_err(|_| Stage::Hex)?;
    if iv.len() != IV_LEN {
        return Err(Stage::IvLength);
    }

    let plaintext = decrypt_cbc(key_material.as_bytes(), &iv, &ciphertext)?;
    let text = std::str::from_utf8(&plaintext).map_err(|_| Stage::Utf8)?;
    serde_json::from_str(text).map_err(|_| Stage::Json)
}

fn decrypt_cbc(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Stage> {
    tracing::debug!(cipher = "aes-cbc", "Decrypting role bundle");

    let plaintext = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| Stage::KeyLength)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(|_| Stage::KeyLength)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| Stage::KeyLength)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        _ => return Err(Stage::KeyLength),
    };

    plaintext.map_err(|_| Stage::Cipher)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::role::{Permissions, RoleName};
    use aes::cipher::BlockEncryptMut;
    use proptest::prelude::*;

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    const ZERO_IV: &str = "00000000000000000000000000000000";
    const ADMIN_JSON: &str = r#"{"role":"admin","permissions":{"dashboard":["view"]}}"#;

    fn key_k() -> String {
        "K".repeat(32)
    }

    /// Produces the hex ciphertext the backend would send for `plaintext`.
    pub(crate) fn seal(plaintext: &str, iv_hex: &str, key: &str) -> String {
        let iv = decode_hex(iv_hex).unwrap();
        let ciphertext = match key.len() {
            16 => Aes128CbcEnc::new_from_slices(key.as_bytes(), &iv)
                .unwrap()
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            32 => Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
                .unwrap()
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            other => panic!("unsupported test key length {other}"),
        };
        encode_hex(&ciphertext)
    }

    #[test]
    fn decrypts_admin_role() {
        let ciphertext = seal(ADMIN_JSON, ZERO_IV, &key_k());

        let role = decrypt_role(&ciphertext, ZERO_IV, &key_k()).unwrap();

        let expected = Role {
            id: None,
            role: RoleName::Admin,
            permissions: [("dashboard".to_string(), vec!["view".to_string()])]
                .into_iter()
                .collect::<Permissions>(),
        };
        assert_eq!(role, expected);
        assert_eq!(
            serde_json::to_value(&role).unwrap(),
            serde_json::from_str::<serde_json::Value>(ADMIN_JSON).unwrap()
        );
    }

    #[test]
    fn decrypts_with_128_bit_key() {
        let key = "0123456789abcdef";
        let iv = "0f0e0d0c0b0a09080706050403020100";
        let ciphertext = seal(r#"{"id":3,"role":"agent","permissions":{}}"#, iv, key);

        let role = decrypt_role(&ciphertext, iv, key).unwrap();
        assert_eq!(role.id, Some(3));
        assert_eq!(role.role, RoleName::Agent);
    }

    #[test]
    fn odd_length_hex_is_rejected_before_cipher_work() {
        // Invalid key length too: the hex check must win.
        assert_eq!(decrypt_stages("abc", ZERO_IV, "short"), Err(Stage::Hex));
        assert_eq!(decrypt_stages("abcd", "000", "short"), Err(Stage::Hex));
    }

    #[test]
    fn non_hex_characters_are_rejected_before_cipher_work() {
        assert_eq!(decrypt_stages("zz", ZERO_IV, "short"), Err(Stage::Hex));
        assert_eq!(
            decrypt_stages("00", "0000000000000000000000000000000g", "short"),
            Err(Stage::Hex)
        );
    }

    #[test]
    fn key_material_must_be_an_aes_key_size() {
        let ciphertext = seal(ADMIN_JSON, ZERO_IV, &key_k());
        assert_eq!(decrypt_stages(&ciphertext, ZERO_IV, "K"), Err(Stage::KeyLength));
        assert_eq!(decrypt_role(&ciphertext, ZERO_IV, "K"), Err(DecryptError));
    }

    #[test]
    fn iv_must_be_one_block() {
        let ciphertext = seal(ADMIN_JSON, ZERO_IV, &key_k());
        assert_eq!(
            decrypt_stages(&ciphertext, "0000", &key_k()),
            Err(Stage::IvLength)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let ciphertext = seal(ADMIN_JSON, ZERO_IV, &key_k());
        assert!(decrypt_role(&ciphertext, ZERO_IV, &"J".repeat(32)).is_err());
    }

    #[test]
    fn non_role_plaintext_fails_at_parse() {
        let ciphertext = seal("not json at all", ZERO_IV, &key_k());
        assert_eq!(decrypt_stages(&ciphertext, ZERO_IV, &key_k()), Err(Stage::Json));

        let ciphertext = seal(r#"{"user":"x"}"#, ZERO_IV, &key_k());
        assert_eq!(decrypt_stages(&ciphertext, ZERO_IV, &key_k()), Err(Stage::Json));
    }

    #[test]
    fn error_message_is_opaque() {
        let err = decrypt_role("zz", ZERO_IV, "K").unwrap_err();
        assert_eq!(err.to_string(), "decryption failed");
    }

    proptest! {
        #[test]
        fn hex_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = encode_hex(&bytes);
            prop_assert_eq!(encode_hex(&decode_hex(&encoded).unwrap()), encoded);
        }

        #[test]
        fn lowercase_hex_strings_round_trip(s in "([0-9a-f]{2}){0,64}") {
            prop_assert_eq!(encode_hex(&decode_hex(&s).unwrap()), s);
        }

        #[test]
        fn random_bundles_never_yield_a_role(
            ciphertext in proptest::collection::vec(any::<u8>(), 0..128),
            iv in proptest::collection::vec(any::<u8>(), IV_LEN),
            key in "[a-zA-Z0-9]{32}",
        ) {
            let result = decrypt_role(&encode_hex(&ciphertext), &encode_hex(&iv), &key);
            prop_assert!(result.is_err());
        }

        #[test]
        fn flipped_ciphertext_bits_are_rejected(bit in 0usize..(8 * 64)) {
            let key = key_k();
            let mut bytes = decode_hex(&seal(ADMIN_JSON, ZERO_IV, &key)).unwrap();
            let index = (bit / 8) % bytes.len();
            bytes[index] ^= 1 << (bit % 8);

            prop_assert!(decrypt_role(&encode_hex(&bytes), ZERO_IV, &key).is_err());
        }
    }
}
