//! Hashing building blocks: digests reduced to curve scalars,
//! digests for ECDSA signing, and hashing arbitrary data to a curve point.

use digest::Digest;
use generic_array::GenericArray;
use sha2::Sha256;

use crate::curve::{CurvePoint, CurvePointSize, CurveScalar};
use crate::keys::{PublicKey, Signature, Signer};
use crate::traits::SerializableToArray;

type BackendDigest = Sha256;

/// An accumulator hashing a sequence of objects into a curve scalar.
///
/// Every use site supplies its own domain separation tag,
/// so that no two hashes in the protocol can collide.
pub(crate) struct ScalarDigest(BackendDigest);

impl ScalarDigest {
    pub(crate) fn new_with_dst(dst: &[u8]) -> Self {
        Self(BackendDigest::new().chain_update(dst))
    }

    pub(crate) fn chain_bytes(self, bytes: impl AsRef<[u8]>) -> Self {
        Self(self.0.chain_update(bytes.as_ref()))
    }

    pub(crate) fn chain_scalar(self, scalar: &CurveScalar) -> Self {
        self.chain_bytes(scalar.to_array())
    }

    pub(crate) fn chain_point(self, point: &CurvePoint) -> Self {
        self.chain_bytes(point.to_array())
    }

    pub(crate) fn chain_points(self, points: &[CurvePoint]) -> Self {
        let mut digest = self;
        for point in points {
            digest = digest.chain_point(point);
        }
        digest
    }

    pub(crate) fn finalize(self) -> CurveScalar {
        CurveScalar::from_digest_bytes(&self.0.finalize())
    }
}

/// An accumulator hashing a sequence of objects into a digest
/// to be signed or verified with ECDSA.
pub(crate) struct SignatureDigest(BackendDigest);

impl SignatureDigest {
    pub(crate) fn new_with_dst(dst: &[u8]) -> Self {
        Self(BackendDigest::new().chain_update(dst))
    }

    pub(crate) fn chain_bytes(self, bytes: impl AsRef<[u8]>) -> Self {
        Self(self.0.chain_update(bytes.as_ref()))
    }

    pub(crate) fn chain_point(self, point: &CurvePoint) -> Self {
        self.chain_bytes(point.to_array())
    }

    pub(crate) fn chain_pubkey(self, pk: &PublicKey) -> Self {
        self.chain_bytes(pk.to_array())
    }

    pub(crate) fn sign(self, signer: &Signer) -> Signature {
        signer.sign_digest(self.0)
    }

    pub(crate) fn verify(self, verifying_pk: &PublicKey, signature: &Signature) -> bool {
        signature.verify_digest(verifying_pk, self.0)
    }
}

/// Hashes arbitrary data into a valid EC point of the curve,
/// using the try-and-increment method.
/// The label is hashed in length-prefixed, so that distinct labels
/// can never produce colliding inputs.
///
/// WARNING: Do not use when the input data is secret, as this implementation is not
/// in constant time, and hence, it is not safe with respect to timing attacks.
pub(crate) fn unsafe_hash_to_point(data: &[u8], label: &[u8]) -> Option<CurvePoint> {
    let len_data = (data.len() as u32).to_be_bytes();
    let len_label = (label.len() as u32).to_be_bytes();

    // We use an internal 32-bit counter as additional input.
    let mut counter = 0u32;
    while counter < u32::MAX {
        let digest = BackendDigest::new()
            .chain_update(&len_label)
            .chain_update(label)
            .chain_update(&len_data)
            .chain_update(data)
            .chain_update(&counter.to_be_bytes())
            .finalize();

        // A compressed point is a sign byte followed by an x-coordinate.
        let mut arr = GenericArray::<u8, CurvePointSize>::default();
        arr[0] = if digest[0] & 1 == 0 { 2 } else { 3 };
        arr[1..].copy_from_slice(&digest);

        let maybe_point = CurvePoint::from_compressed_array(&arr);
        if maybe_point.is_some() {
            return maybe_point;
        }

        counter += 1;
    }

    // Each iteration succeeds with probability ~1/2,
    // so this can only be reached with probability 2^(-2^32).
    None
}

#[cfg(test)]
mod tests {

    use super::{unsafe_hash_to_point, ScalarDigest};

    #[test]
    fn test_unsafe_hash_to_point() {
        let data = b"abcdefg";
        let label = b"sdasdasd";
        let point = unsafe_hash_to_point(&data[..], &label[..]).unwrap();
        let point_same = unsafe_hash_to_point(&data[..], &label[..]).unwrap();
        assert_eq!(point, point_same);

        let point_other_label = unsafe_hash_to_point(&data[..], b"other-label").unwrap();
        assert_ne!(point, point_other_label);

        let point_other_data = unsafe_hash_to_point(b"abcdefgh", &label[..]).unwrap();
        assert_ne!(point, point_other_data);
    }

    #[test]
    fn test_scalar_digest_is_domain_separated() {
        let scalar = ScalarDigest::new_with_dst(b"dst1").chain_bytes(b"foo").finalize();
        let scalar_same = ScalarDigest::new_with_dst(b"dst1").chain_bytes(b"foo").finalize();
        let scalar_other_dst = ScalarDigest::new_with_dst(b"dst2").chain_bytes(b"foo").finalize();

        assert_eq!(scalar, scalar_same);
        assert_ne!(scalar, scalar_other_dst);
    }
}
