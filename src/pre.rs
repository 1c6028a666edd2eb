//! The high-level functional API of the scheme.

use alloc::boxed::Box;
use core::fmt;

use crate::capsule::{Capsule, OpenOriginalError, OpenReencryptedError};
use crate::capsule_frag::CapsuleFrag;
use crate::dem::{DecryptionError, EncryptionError, DEM};
use crate::key_frag::KeyFrag;
use crate::keys::{PublicKey, SecretKey};

/// Errors that can happen when decrypting a ciphertext with the delegating key.
#[derive(Debug, PartialEq)]
pub enum DecryptOriginalError {
    /// The capsule failed its self-consistency check.
    CapsuleNotValid,
    /// The ciphertext failed to decrypt under the decapsulated key.
    DecryptionFailed(DecryptionError),
}

impl fmt::Display for DecryptOriginalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapsuleNotValid => write!(f, "Capsule verification failed"),
            Self::DecryptionFailed(err) => write!(f, "{}", err),
        }
    }
}

/// Errors that can happen during reencryption.
#[derive(Debug, PartialEq)]
pub enum ReencryptionError {
    /// The capsule is not an original capsule,
    /// or its self-consistency check failed.
    CapsuleNotValid,
}

impl fmt::Display for ReencryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapsuleNotValid => write!(f, "Capsule verification failed"),
        }
    }
}

/// Errors that can happen when decrypting a reencrypted ciphertext.
#[derive(Debug, PartialEq)]
pub enum DecryptReencryptedError {
    /// Opening the capsule failed.
    OpenFailed(OpenReencryptedError),
    /// The ciphertext failed to decrypt under the reconstructed key.
    DecryptionFailed(DecryptionError),
}

impl fmt::Display for DecryptReencryptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed(err) => write!(f, "{}", err),
            Self::DecryptionFailed(err) => write!(f, "{}", err),
        }
    }
}

/// Encrypts the plaintext with a fresh symmetric key
/// encapsulated for the given public key.
///
/// Returns the KEM capsule and the ciphertext.
pub fn encrypt(
    delegating_pk: &PublicKey,
    plaintext: &[u8],
) -> Result<(Capsule, Box<[u8]>), EncryptionError> {
    let (capsule, key) = Capsule::from_public_key(delegating_pk);
    let dem = DEM::new(&key);
    let ciphertext = dem.encrypt(plaintext)?;
    Ok((capsule, ciphertext))
}

/// Decrypts the ciphertext using the delegating secret key
/// the capsule was encapsulated for.
pub fn decrypt_original(
    delegating_sk: &SecretKey,
    capsule: &Capsule,
    ciphertext: impl AsRef<[u8]>,
) -> Result<Box<[u8]>, DecryptOriginalError> {
    let key = capsule.open_original(delegating_sk).map_err(|err| match err {
        OpenOriginalError::CapsuleNotValid => DecryptOriginalError::CapsuleNotValid,
    })?;
    let dem = DEM::new(&key);
    dem.decrypt(ciphertext)
        .map_err(DecryptOriginalError::DecryptionFailed)
}

/// Reencrypts a capsule using the given key fragment.
///
/// With `provide_proof` set, the resulting fragment carries
/// a correctness proof binding the given metadata (if any);
/// the receiver will reject proofless fragments during decryption.
pub fn reencrypt(
    capsule: &Capsule,
    kfrag: &KeyFrag,
    metadata: Option<&[u8]>,
    provide_proof: bool,
) -> Result<CapsuleFrag, ReencryptionError> {
    if !capsule.verify_original() {
        return Err(ReencryptionError::CapsuleNotValid);
    }

    CapsuleFrag::from_kfrag(capsule, kfrag, metadata, provide_proof)
        .ok_or(ReencryptionError::CapsuleNotValid)
}

/// Verifies the attached capsule fragments, activates the capsule,
/// and decrypts the ciphertext with the reconstructed key.
///
/// The capsule must have its correctness keys set
/// and at least `threshold` fragments attached.
///
/// The most informative error available is surfaced: a failed correctness
/// check is reported in preference to the decryption failure it would cause.
pub fn decrypt_reencrypted(
    receiving_sk: &SecretKey,
    capsule: &mut Capsule,
    ciphertext: impl AsRef<[u8]>,
) -> Result<Box<[u8]>, DecryptReencryptedError> {
    let key = capsule
        .open_with_attached(receiving_sk)
        .map_err(DecryptReencryptedError::OpenFailed)?;
    let dem = DEM::new(&key);
    dem.decrypt(ciphertext)
        .map_err(DecryptReencryptedError::DecryptionFailed)
}
