use alloc::boxed::Box;
use alloc::vec::Vec;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use typenum::op;

use crate::curve::{CurvePoint, CurveScalar};
use crate::hashing_ds::{hash_to_polynomial_arg, hash_to_shared_secret, kfrag_signature_digest};
use crate::keys::{PublicKey, SecretKey, Signature, Signer};
use crate::params::Parameters;
use crate::secret_box::SecretBox;
use crate::traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};

/// An identifier of a key fragment, unique within one delegation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KeyFragID(CurveScalar);

impl KeyFragID {
    fn random() -> Self {
        Self(CurveScalar::random_nonzero())
    }
}

impl RepresentableAsArray for KeyFragID {
    type Size = <CurveScalar as RepresentableAsArray>::Size;
}

impl SerializableToArray for KeyFragID {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_array()
    }
}

impl DeserializableFromArray for KeyFragID {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        let scalar = CurveScalar::from_array(arr)?;
        if scalar.is_zero() {
            return Err(DeserializationError::ConstructionFailure);
        }
        Ok(Self(scalar))
    }
}

/// A fragment of the delegator's re-encryption key,
/// used by a proxy to create a [`CapsuleFrag`](`crate::CapsuleFrag`).
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrag {
    pub(crate) id: KeyFragID,
    pub(crate) key: CurveScalar,
    pub(crate) commitment: CurvePoint,
    pub(crate) precursor: CurvePoint,
    pub(crate) signature: Signature,
}

type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;
type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type SignatureSize = <Signature as RepresentableAsArray>::Size;

impl RepresentableAsArray for KeyFrag {
    type Size = op!(ScalarSize + ScalarSize + PointSize + PointSize + SignatureSize);
}

impl SerializableToArray for KeyFrag {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.id
            .to_array()
            .concat(self.key.to_array())
            .concat(self.commitment.to_array())
            .concat(self.precursor.to_array())
            .concat(self.signature.to_array())
    }
}

impl DeserializableFromArray for KeyFrag {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        let (id, rest) = KeyFragID::take(*arr)?;
        let (key, rest) = CurveScalar::take(rest)?;
        let (commitment, rest) = CurvePoint::take(rest)?;
        let (precursor, rest) = CurvePoint::take(rest)?;
        let signature = Signature::take_last(rest)?;
        Ok(Self {
            id,
            key,
            commitment,
            precursor,
            signature,
        })
    }
}

impl KeyFrag {
    /// Verifies the delegator's signature binding this fragment
    /// to the given delegating, receiving, and verifying keys.
    ///
    /// The commitment itself is not checked here; it is bound to the
    /// re-encryption key by the correctness proof of every capsule fragment
    /// produced with this fragment.
    pub fn verify(
        &self,
        verifying_pk: &PublicKey,
        delegating_pk: &PublicKey,
        receiving_pk: &PublicKey,
    ) -> bool {
        kfrag_signature_digest(
            &self.id,
            delegating_pk,
            receiving_pk,
            &self.commitment,
            &self.precursor,
        )
        .verify(verifying_pk, &self.signature)
    }
}

pub(crate) struct KeyFragFactory {
    signer: Signer,
    precursor: CurvePoint,
    shared_secret: SecretBox<CurveScalar>,
    coefficients: SecretBox<Vec<CurveScalar>>,
    delegating_pk: PublicKey,
    receiving_pk: PublicKey,
    params: Parameters,
}

impl KeyFragFactory {
    pub(crate) fn new(
        delegating_sk: &SecretKey,
        receiving_pk: &PublicKey,
        signer: &Signer,
        threshold: usize,
    ) -> Self {
        let g = CurvePoint::generator();

        let delegating_pk = delegating_sk.public_key();
        let receiving_point = receiving_pk.to_point();

        let (shared_secret, precursor) = loop {
            // The precursor point is used as an ephemeral public key in a DH key exchange,
            // and the resulting shared secret is used to derive the share indices.
            let private_precursor = SecretBox::new(CurveScalar::random_nonzero());
            let precursor = &g * private_precursor.as_secret();

            let dh_point = &receiving_point * private_precursor.as_secret();

            let d = hash_to_shared_secret(&precursor, &receiving_point, &dh_point);

            // The shared secret must be invertible for the generating polynomial
            // to be well-defined.
            if !d.is_zero() {
                break (SecretBox::new(d), precursor);
            }
        };

        // The free coefficient hides the delegating key behind the shared secret.
        // `invert()` is guaranteed to succeed because the shared secret is nonzero.
        let inv_d = SecretBox::new(shared_secret.as_secret().invert().unwrap());

        let delegating_scalar = delegating_sk.to_secret_scalar();
        let coefficient0 = delegating_scalar.as_secret() * inv_d.as_secret();

        let mut coefficients = Vec::<CurveScalar>::with_capacity(threshold);
        coefficients.push(coefficient0);
        for _ in 1..threshold {
            coefficients.push(CurveScalar::random_nonzero());
        }

        Self {
            signer: signer.clone(),
            precursor,
            shared_secret,
            coefficients: SecretBox::new(coefficients),
            delegating_pk,
            receiving_pk: *receiving_pk,
            params: Parameters::new(),
        }
    }

    pub(crate) fn make(&self) -> KeyFrag {
        let kfrag_id = KeyFragID::random();

        let share_index = hash_to_polynomial_arg(&kfrag_id, self.shared_secret.as_secret());

        // The re-encryption key share is the result of evaluating
        // the generating polynomial for the share index.
        let rk = poly_eval(self.coefficients.as_secret(), &share_index);

        let commitment = &self.params.u * &rk;

        let signature = kfrag_signature_digest(
            &kfrag_id,
            &self.delegating_pk,
            &self.receiving_pk,
            &commitment,
            &self.precursor,
        )
        .sign(&self.signer);

        KeyFrag {
            id: kfrag_id,
            key: rk,
            commitment,
            precursor: self.precursor,
            signature,
        }
    }
}

// Horner's rule evaluation.
fn poly_eval(coeffs: &[CurveScalar], x: &CurveScalar) -> CurveScalar {
    let mut result = coeffs[coeffs.len() - 1];
    for i in (0..coeffs.len() - 1).rev() {
        result = &(&result * x) + &coeffs[i];
    }
    result
}

/// Creates `num_kfrags` re-encryption key fragments,
/// allowing the holder of `receiving_pk`'s secret key to decrypt ciphertexts
/// encapsulated for `delegating_sk`'s public key.
///
/// `threshold` sets the number of fragments necessary for decryption
/// (that is, fragments created with `threshold > num_kfrags` will be useless).
///
/// `signer` is used to sign the resulting [`KeyFrag`] objects,
/// which can be later verified by the associated public key.
///
/// Panics if `threshold` is zero or greater than `num_kfrags`.
pub fn generate_kfrags(
    delegating_sk: &SecretKey,
    receiving_pk: &PublicKey,
    signer: &Signer,
    threshold: usize,
    num_kfrags: usize,
) -> Box<[KeyFrag]> {
    assert!(threshold != 0, "threshold must be larger than zero");
    assert!(
        threshold <= num_kfrags,
        "threshold must not exceed the number of fragments"
    );

    let factory = KeyFragFactory::new(delegating_sk, receiving_pk, signer, threshold);

    let mut result = Vec::<KeyFrag>::with_capacity(num_kfrags);
    for _ in 0..num_kfrags {
        result.push(factory.make());
    }

    result.into_boxed_slice()
}

#[cfg(test)]
mod tests {

    use alloc::boxed::Box;

    use super::{generate_kfrags, KeyFrag};
    use crate::keys::{PublicKey, SecretKey, Signer};
    use crate::traits::{DeserializableFromArray, RepresentableAsArray, SerializableToArray};

    fn prepare_kfrags() -> (PublicKey, PublicKey, PublicKey, Box<[KeyFrag]>) {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(&SecretKey::random());
        let verifying_pk = signer.verifying_key();

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 2, 3);

        (delegating_pk, receiving_pk, verifying_pk, kfrags)
    }

    #[test]
    fn test_serialize() {
        let (_, _, _, kfrags) = prepare_kfrags();

        assert_eq!(KeyFrag::serialized_size(), 32 + 32 + 33 + 33 + 64);

        let arr = kfrags[0].to_array();
        let kfrag_back = KeyFrag::from_array(&arr).unwrap();
        assert_eq!(kfrags[0], kfrag_back);
    }

    #[test]
    fn test_verify() {
        let (delegating_pk, receiving_pk, verifying_pk, kfrags) = prepare_kfrags();

        for kfrag in kfrags.iter() {
            assert!(kfrag.verify(&verifying_pk, &delegating_pk, &receiving_pk));
        }

        // Mixed up keys do not verify.
        assert!(!kfrags[0].verify(&verifying_pk, &receiving_pk, &delegating_pk));
        assert!(!kfrags[0].verify(&delegating_pk, &delegating_pk, &receiving_pk));
    }

    #[test]
    fn test_verify_rejects_tampered_kfrag() {
        let (delegating_pk, receiving_pk, verifying_pk, kfrags) = prepare_kfrags();

        let mut tampered = kfrags[0].clone();
        tampered.precursor = kfrags[1].commitment;
        assert!(!tampered.verify(&verifying_pk, &delegating_pk, &receiving_pk));
    }

    #[test]
    #[should_panic(expected = "threshold must not exceed the number of fragments")]
    fn test_rejects_threshold_larger_than_num_kfrags() {
        let delegating_sk = SecretKey::random();
        let receiving_pk = SecretKey::random().public_key();
        let signer = Signer::new(&SecretKey::random());
        let _kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 3, 2);
    }
}
