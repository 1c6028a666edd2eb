use ecdsa::SignatureSize;
use elliptic_curve::SecretKey as BackendSecretKey;
use generic_array::GenericArray;
use k256::ecdsa::{Signature as BackendSignature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha2::Sha256;
use signature::{DigestSigner, DigestVerifier};

use crate::curve::{CurvePoint, CurveScalar, CurveScalarSize, CurveType};
use crate::secret_box::SecretBox;
use crate::traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};

/// An ECDSA signature over a domain-separated digest.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature(BackendSignature);

impl Signature {
    pub(crate) fn verify_digest(&self, verifying_pk: &PublicKey, digest: Sha256) -> bool {
        let verifying_key =
            match VerifyingKey::from_affine(verifying_pk.to_point().to_affine_point()) {
                Ok(key) => key,
                Err(_) => return false,
            };
        verifying_key.verify_digest(digest, &self.0).is_ok()
    }
}

impl RepresentableAsArray for Signature {
    type Size = SignatureSize<CurveType>;
}

impl SerializableToArray for Signature {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_bytes()
    }
}

impl DeserializableFromArray for Signature {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        BackendSignature::from_bytes(arr)
            .map(Self)
            .map_err(|_| DeserializationError::ConstructionFailure)
    }
}

/// A secret key.
#[derive(Clone)]
pub struct SecretKey(BackendSecretKey<CurveType>);

impl SecretKey {
    /// Generates a secret key using the default RNG and returns it.
    pub fn random() -> Self {
        Self(BackendSecretKey::random(&mut OsRng))
    }

    /// Returns the public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(self)
    }

    /// Returns a reference to the underlying scalar of the secret key.
    pub(crate) fn to_secret_scalar(&self) -> SecretBox<CurveScalar> {
        let nonzero_scalar = self.0.to_nonzero_scalar();
        SecretBox::new(CurveScalar::from_backend_scalar(&nonzero_scalar))
    }
}

impl RepresentableAsArray for SecretKey {
    type Size = CurveScalarSize;
}

impl SerializableToArray for SecretKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_bytes()
    }
}

impl DeserializableFromArray for SecretKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        BackendSecretKey::from_bytes(arr)
            .map(Self)
            .map_err(|_| DeserializationError::ConstructionFailure)
    }
}

/// A public key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PublicKey(CurvePoint);

impl PublicKey {
    /// Computes the public key corresponding to the given secret key.
    pub fn from_secret_key(secret_key: &SecretKey) -> Self {
        let secret_scalar = secret_key.to_secret_scalar();
        Self(&CurvePoint::generator() * secret_scalar.as_secret())
    }

    pub(crate) fn to_point(&self) -> CurvePoint {
        self.0
    }
}

impl RepresentableAsArray for PublicKey {
    type Size = <CurvePoint as RepresentableAsArray>::Size;
}

impl SerializableToArray for PublicKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_array()
    }
}

impl DeserializableFromArray for PublicKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        CurvePoint::from_array(arr).map(Self)
    }
}

/// An object possessing the capability to create ECDSA signatures.
#[derive(Clone)]
pub struct Signer(SecretKey);

impl Signer {
    /// Creates a new signer out of a secret key.
    pub fn new(secret_key: &SecretKey) -> Self {
        Self(secret_key.clone())
    }

    /// Signs the given digest deterministically (RFC 6979).
    pub(crate) fn sign_digest(&self, digest: Sha256) -> Signature {
        let signing_key = SigningKey::from(&(self.0).0);
        Signature(signing_key.sign_digest(digest))
    }

    /// Returns the public key that can be used to verify the signatures
    /// produced by this signer.
    pub fn verifying_key(&self) -> PublicKey {
        self.0.public_key()
    }
}

#[cfg(test)]
mod tests {

    use super::{PublicKey, SecretKey, Signature, Signer};
    use crate::hashing::SignatureDigest;
    use crate::traits::{DeserializableFromArray, SerializableToArray};

    fn make_digest(message: &[u8]) -> SignatureDigest {
        SignatureDigest::new_with_dst(b"TEST_SIGNATURE").chain_bytes(message)
    }

    #[test]
    fn test_secret_key_serialization() {
        let secret_key = SecretKey::random();
        let arr = secret_key.to_array();
        let secret_key_back = SecretKey::from_array(&arr).unwrap();
        assert_eq!(secret_key.public_key(), secret_key_back.public_key());
    }

    #[test]
    fn test_public_key_serialization() {
        let public_key = SecretKey::random().public_key();
        let arr = public_key.to_array();
        let public_key_back = PublicKey::from_array(&arr).unwrap();
        assert_eq!(public_key, public_key_back);
    }

    #[test]
    fn test_sign_and_verify() {
        let secret_key = SecretKey::random();
        let signer = Signer::new(&secret_key);
        let verifying_pk = signer.verifying_key();

        let signature = make_digest(b"peace at dawn").sign(&signer);

        assert!(make_digest(b"peace at dawn").verify(&verifying_pk, &signature));
        assert!(!make_digest(b"war at dusk").verify(&verifying_pk, &signature));

        let other_pk = SecretKey::random().public_key();
        assert!(!make_digest(b"peace at dawn").verify(&other_pk, &signature));
    }

    #[test]
    fn test_signature_serialization() {
        let signer = Signer::new(&SecretKey::random());
        let signature = make_digest(b"peace at dawn").sign(&signer);

        let arr = signature.to_array();
        let signature_back = Signature::from_array(&arr).unwrap();
        assert_eq!(signature, signature_back);

        assert!(make_digest(b"peace at dawn").verify(&signer.verifying_key(), &signature_back));
    }
}
