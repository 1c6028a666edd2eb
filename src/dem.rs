use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, KeySizeUser};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use generic_array::{typenum::Unsigned, GenericArray};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::secret_box::SecretBox;

type KdfSize = <ChaCha20Poly1305 as KeySizeUser>::KeySize;

/// The symmetric key wrapped by a capsule.
pub(crate) type SymmetricKey = GenericArray<u8, KdfSize>;

const KDF_INFO: &[u8] = b"SYMMETRIC_KEY";

pub(crate) fn kdf(seed: &[u8]) -> SecretBox<SymmetricKey> {
    let hk = Hkdf::<Sha256>::new(None, seed);

    let mut okm = SymmetricKey::default();

    // We can only get an error here if `KdfSize` is too large,
    // and it's fixed at compile time.
    hk.expand(KDF_INFO, &mut okm).unwrap();

    SecretBox::new(okm)
}

/// Errors that can happen during symmetric encryption.
#[derive(Debug, PartialEq)]
pub enum EncryptionError {
    /// Given plaintext is too large for the backend cipher to handle.
    PlaintextTooLarge,
}

impl fmt::Display for EncryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaintextTooLarge => write!(f, "Plaintext is too large to encrypt"),
        }
    }
}

/// Errors that can happen during symmetric decryption.
#[derive(Debug, PartialEq)]
pub enum DecryptionError {
    /// The ciphertext is shorter than the authentication tag.
    CiphertextTooShort,
    /// The authentication tag did not match, so the ciphertext is corrupted
    /// or the key is incorrect.
    AuthenticationFailed,
}

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CiphertextTooShort => write!(f, "The ciphertext must include the tag"),
            Self::AuthenticationFailed => {
                write!(f, "Decryption of ciphertext failed: either someone tampered with the ciphertext or you are using an incorrect decryption key")
            }
        }
    }
}

// The nonce is fixed because a DEM key is derived from a fresh encapsulation
// every time and is never reused across messages.
pub(crate) struct DEM {
    cipher: ChaCha20Poly1305,
}

impl DEM {
    pub fn new(key: &SecretBox<SymmetricKey>) -> Self {
        let cipher = ChaCha20Poly1305::new(key.as_secret());
        Self { cipher }
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Box<[u8]>, EncryptionError> {
        let nonce = Nonce::default();
        self.cipher
            .encrypt(&nonce, data)
            .map(Vec::into_boxed_slice)
            .map_err(|_| EncryptionError::PlaintextTooLarge)
    }

    pub fn decrypt(&self, ciphertext: impl AsRef<[u8]>) -> Result<Box<[u8]>, DecryptionError> {
        let ciphertext = ciphertext.as_ref();
        let tag_size = <<ChaCha20Poly1305 as AeadCore>::TagSize as Unsigned>::to_usize();

        if ciphertext.len() < tag_size {
            return Err(DecryptionError::CiphertextTooShort);
        }

        let nonce = Nonce::default();
        self.cipher
            .decrypt(&nonce, ciphertext)
            .map(Vec::into_boxed_slice)
            .map_err(|_| DecryptionError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {

    use super::{kdf, DecryptionError, DEM};
    use crate::curve::{CurvePoint, CurveScalar};
    use crate::traits::SerializableToArray;

    #[test]
    fn test_kdf_is_deterministic() {
        let point = &CurvePoint::generator() * &CurveScalar::random_nonzero();
        let key = kdf(&point.to_array());
        let key_same = kdf(&point.to_array());
        assert_eq!(key.as_secret(), key_same.as_secret());

        let other_point = &CurvePoint::generator() * &CurveScalar::random_nonzero();
        let key_other = kdf(&other_point.to_array());
        assert_ne!(key.as_secret(), key_other.as_secret());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = kdf(b"some secret seed");
        let dem = DEM::new(&key);

        let plaintext = b"peace at dawn";
        let ciphertext = dem.encrypt(plaintext).unwrap();
        assert_ne!(&ciphertext as &[u8], plaintext);

        let plaintext_back = dem.decrypt(&ciphertext).unwrap();
        assert_eq!(&plaintext_back as &[u8], plaintext);
    }

    #[test]
    fn test_decrypt_rejects_tampered_ciphertext() {
        let key = kdf(b"some secret seed");
        let dem = DEM::new(&key);

        let mut ciphertext = dem.encrypt(b"peace at dawn").unwrap();
        ciphertext[0] ^= 1;
        assert_eq!(
            dem.decrypt(&ciphertext),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_decrypt_rejects_wrong_key() {
        let key = kdf(b"some secret seed");
        let ciphertext = DEM::new(&key).encrypt(b"peace at dawn").unwrap();

        let other_key = kdf(b"some other seed");
        assert_eq!(
            DEM::new(&other_key).decrypt(&ciphertext),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_decrypt_rejects_short_ciphertext() {
        let key = kdf(b"some secret seed");
        let dem = DEM::new(&key);
        assert_eq!(
            dem.decrypt(b"short"),
            Err(DecryptionError::CiphertextTooShort)
        );
    }
}
