use alloc::boxed::Box;
use alloc::vec::Vec;

use generic_array::GenericArray;
use generic_array::sequence::Concat;
use typenum::{op, Unsigned};

use crate::capsule::Capsule;
use crate::curve::{CurvePoint, CurveScalar};
use crate::hashing_ds::{hash_to_cfrag_verification, kfrag_signature_digest};
use crate::key_frag::{KeyFrag, KeyFragID};
use crate::keys::{PublicKey, Signature};
use crate::params::Parameters;
use crate::secret_box::SecretBox;
use crate::traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};

type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;
type SignatureSize = <Signature as RepresentableAsArray>::Size;

type ProofFixedSize =
    op!(PointSize + PointSize + PointSize + PointSize + ScalarSize + SignatureSize);
type CapsuleFragFixedSize = op!(PointSize + PointSize + ScalarSize + PointSize);

/// A zero-knowledge proof that a capsule fragment was produced
/// by applying the claimed key fragment to the claimed capsule.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleFragProof {
    pub(crate) point_e2: CurvePoint,
    pub(crate) point_v2: CurvePoint,
    pub(crate) kfrag_commitment: CurvePoint,
    pub(crate) kfrag_pok: CurvePoint,
    pub(crate) signature: CurveScalar,
    pub(crate) kfrag_signature: Signature,
    pub(crate) metadata: Option<Box<[u8]>>,
}

impl CapsuleFragProof {
    #[allow(clippy::many_single_char_names)]
    fn from_kfrag_and_cfrag(
        point_e: &CurvePoint,
        point_v: &CurvePoint,
        kfrag: &KeyFrag,
        cfrag_e1: &CurvePoint,
        cfrag_v1: &CurvePoint,
        metadata: Option<&[u8]>,
    ) -> Self {
        let params = Parameters::new();

        let rk = &kfrag.key;
        let t = SecretBox::new(CurveScalar::random_nonzero());

        // Here are the formulaic constituents shared with `verify_correctness`.

        let e = point_e;
        let v = point_v;

        let e1 = cfrag_e1;
        let v1 = cfrag_v1;

        let u = params.u;
        let u1 = kfrag.commitment;

        let e2 = e * t.as_secret();
        let v2 = v * t.as_secret();
        let u2 = &u * t.as_secret();

        let h = hash_to_cfrag_verification(&[*e, *e1, e2, *v, *v1, v2, u, u1, u2], metadata);

        ////////

        let z = t.as_secret() + &(&h * rk);

        Self {
            point_e2: e2,
            point_v2: v2,
            kfrag_commitment: u1,
            kfrag_pok: u2,
            signature: z,
            kfrag_signature: kfrag.signature.clone(),
            metadata: metadata.map(|m| m.to_vec().into_boxed_slice()),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let fixed = self
            .point_e2
            .to_array()
            .concat(self.point_v2.to_array())
            .concat(self.kfrag_commitment.to_array())
            .concat(self.kfrag_pok.to_array())
            .concat(self.signature.to_array())
            .concat(self.kfrag_signature.to_array());

        let metadata_len = self.metadata.as_ref().map_or(0, |m| m.len());
        let mut result = Vec::with_capacity(fixed.len() + 5 + metadata_len);
        result.extend_from_slice(&fixed);
        match &self.metadata {
            Some(metadata) => {
                result.push(1);
                result.extend_from_slice(&(metadata.len() as u32).to_be_bytes());
                result.extend_from_slice(metadata);
            }
            None => result.push(0),
        }
        result
    }

    fn from_bytes(data: &[u8]) -> Result<Self, DeserializationError> {
        let fixed_size = <ProofFixedSize as Unsigned>::to_usize();
        if data.len() < fixed_size + 1 {
            return Err(DeserializationError::SizeMismatch);
        }

        let (fixed, rest) = data.split_at(fixed_size);
        let arr = GenericArray::<u8, ProofFixedSize>::clone_from_slice(fixed);

        let (point_e2, tail) = CurvePoint::take(arr)?;
        let (point_v2, tail) = CurvePoint::take(tail)?;
        let (kfrag_commitment, tail) = CurvePoint::take(tail)?;
        let (kfrag_pok, tail) = CurvePoint::take(tail)?;
        let (signature, tail) = CurveScalar::take(tail)?;
        let kfrag_signature = Signature::take_last(tail)?;

        let metadata = match rest[0] {
            0 => {
                if rest.len() != 1 {
                    return Err(DeserializationError::SizeMismatch);
                }
                None
            }
            1 => {
                if rest.len() < 5 {
                    return Err(DeserializationError::SizeMismatch);
                }
                let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
                if rest.len() != 5 + len {
                    return Err(DeserializationError::SizeMismatch);
                }
                Some(rest[5..].to_vec().into_boxed_slice())
            }
            _ => return Err(DeserializationError::ConstructionFailure),
        };

        Ok(Self {
            point_e2,
            point_v2,
            kfrag_commitment,
            kfrag_pok,
            signature,
            kfrag_signature,
            metadata,
        })
    }
}

/// A reencrypted fragment of an encapsulated symmetric key.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleFrag {
    pub(crate) point_e1: CurvePoint,
    pub(crate) point_v1: CurvePoint,
    pub(crate) kfrag_id: KeyFragID,
    pub(crate) precursor: CurvePoint,
    pub(crate) proof: Option<CapsuleFragProof>,
}

impl CapsuleFrag {
    pub(crate) fn from_kfrag(
        capsule: &Capsule,
        kfrag: &KeyFrag,
        metadata: Option<&[u8]>,
        provide_proof: bool,
    ) -> Option<Self> {
        let (point_e, point_v) = capsule.original_points()?;

        let rk = &kfrag.key;
        let e1 = &point_e * rk;
        let v1 = &point_v * rk;

        let proof = if provide_proof {
            Some(CapsuleFragProof::from_kfrag_and_cfrag(
                &point_e, &point_v, kfrag, &e1, &v1, metadata,
            ))
        } else {
            None
        };

        Some(Self {
            point_e1: e1,
            point_v1: v1,
            kfrag_id: kfrag.id,
            precursor: kfrag.precursor,
            proof,
        })
    }

    /// Returns `true` if the fragment carries a correctness proof.
    pub fn has_proof(&self) -> bool {
        self.proof.is_some()
    }

    /// Returns the correctness proof of this fragment, if there is one.
    pub fn proof(&self) -> Option<&CapsuleFragProof> {
        self.proof.as_ref()
    }

    /// Verifies the correctness proof of this fragment against the capsule
    /// it was supposedly reencrypted from and the keys of the delegation.
    ///
    /// This is a pure predicate: a fragment without a proof,
    /// or with any structural defect, simply does not verify.
    #[allow(clippy::many_single_char_names)]
    pub fn verify_correctness(
        &self,
        capsule: &Capsule,
        delegating_pk: &PublicKey,
        receiving_pk: &PublicKey,
        verifying_pk: &PublicKey,
    ) -> bool {
        let proof = match &self.proof {
            Some(proof) => proof,
            None => return false,
        };

        let (e, v) = match capsule.original_points() {
            Some(points) => points,
            None => return false,
        };

        let params = Parameters::new();

        // Here are the formulaic constituents shared with the proof generation.

        let e1 = self.point_e1;
        let v1 = self.point_v1;

        let u = params.u;
        let u1 = proof.kfrag_commitment;

        let e2 = proof.point_e2;
        let v2 = proof.point_v2;
        let u2 = proof.kfrag_pok;

        let h = hash_to_cfrag_verification(
            &[e, e1, e2, v, v1, v2, u, u1, u2],
            proof.metadata.as_deref(),
        );

        ///////

        // The commitment in the proof is the one the delegator signed,
        // which ties this reencryption to the exact key fragment she authorized.
        let valid_kfrag_signature = kfrag_signature_digest(
            &self.kfrag_id,
            delegating_pk,
            receiving_pk,
            &u1,
            &self.precursor,
        )
        .verify(verifying_pk, &proof.kfrag_signature);

        let z = &proof.signature;
        let correct_reencryption_of_e = &e * z == &e2 + &(&e1 * &h);
        let correct_reencryption_of_v = &v * z == &v2 + &(&v1 * &h);
        let correct_rk_commitment = &u * z == &u2 + &(&u1 * &h);

        valid_kfrag_signature
            & correct_reencryption_of_e
            & correct_reencryption_of_v
            & correct_rk_commitment
    }

    /// Serializes the fragment: the fragment fields,
    /// followed by the correctness proof if there is one.
    pub fn to_bytes(&self) -> Box<[u8]> {
        let fixed = self
            .point_e1
            .to_array()
            .concat(self.point_v1.to_array())
            .concat(self.kfrag_id.to_array())
            .concat(self.precursor.to_array());

        let mut result = Vec::from(fixed.as_slice());
        if let Some(proof) = &self.proof {
            result.extend_from_slice(&proof.to_bytes());
        }
        result.into_boxed_slice()
    }

    /// Restores the fragment from a bytestring produced by
    /// [`to_bytes`](`Self::to_bytes`).
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        let data = data.as_ref();
        let fixed_size = <CapsuleFragFixedSize as Unsigned>::to_usize();
        if data.len() < fixed_size {
            return Err(DeserializationError::SizeMismatch);
        }

        let (fixed, rest) = data.split_at(fixed_size);
        let arr = GenericArray::<u8, CapsuleFragFixedSize>::clone_from_slice(fixed);

        let (point_e1, tail) = CurvePoint::take(arr)?;
        let (point_v1, tail) = CurvePoint::take(tail)?;
        let (kfrag_id, tail) = KeyFragID::take(tail)?;
        let precursor = CurvePoint::take_last(tail)?;

        let proof = if rest.is_empty() {
            None
        } else {
            Some(CapsuleFragProof::from_bytes(rest)?)
        };

        Ok(Self {
            point_e1,
            point_v1,
            kfrag_id,
            precursor,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {

    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use super::CapsuleFrag;
    use crate::capsule::Capsule;
    use crate::curve::{CurvePoint, CurveScalar};
    use crate::key_frag::{generate_kfrags, KeyFrag};
    use crate::keys::{PublicKey, SecretKey, Signer};
    use crate::pre::reencrypt;

    fn random_point() -> CurvePoint {
        &CurvePoint::generator() * &CurveScalar::random_nonzero()
    }

    struct Delegation {
        delegating_pk: PublicKey,
        receiving_pk: PublicKey,
        verifying_pk: PublicKey,
        capsule: Capsule,
        kfrags: Box<[KeyFrag]>,
    }

    fn prepare_delegation() -> Delegation {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(&SecretKey::random());
        let verifying_pk = signer.verifying_key();

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let (capsule, _key) = Capsule::from_public_key(&delegating_pk);
        let kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 2, 3);

        Delegation {
            delegating_pk,
            receiving_pk,
            verifying_pk,
            capsule,
            kfrags,
        }
    }

    #[test]
    fn test_verify_correctness() {
        let delegation = prepare_delegation();
        let metadata = b"An example of metadata";

        let cfrags: Vec<CapsuleFrag> = delegation
            .kfrags
            .iter()
            .map(|kfrag| reencrypt(&delegation.capsule, kfrag, Some(metadata), true).unwrap())
            .collect();

        for cfrag in &cfrags {
            assert!(cfrag.verify_correctness(
                &delegation.capsule,
                &delegation.delegating_pk,
                &delegation.receiving_pk,
                &delegation.verifying_pk,
            ));
        }
    }

    #[test]
    fn test_garbage_points_do_not_verify() {
        let delegation = prepare_delegation();

        let cfrag = reencrypt(&delegation.capsule, &delegation.kfrags[0], None, true).unwrap();

        let mut garbled = cfrag;
        garbled.point_e1 = random_point();
        garbled.point_v1 = random_point();

        assert!(!garbled.verify_correctness(
            &delegation.capsule,
            &delegation.delegating_pk,
            &delegation.receiving_pk,
            &delegation.verifying_pk,
        ));
    }

    #[test]
    fn test_reencryption_of_another_capsule_does_not_verify() {
        let delegation = prepare_delegation();

        let (other_capsule, _key) = Capsule::from_public_key(&delegation.delegating_pk);
        let cfrag = reencrypt(&other_capsule, &delegation.kfrags[0], None, true).unwrap();

        assert!(!cfrag.verify_correctness(
            &delegation.capsule,
            &delegation.delegating_pk,
            &delegation.receiving_pk,
            &delegation.verifying_pk,
        ));
    }

    #[test]
    fn test_mutated_metadata_does_not_verify() {
        let delegation = prepare_delegation();

        let cfrag = reencrypt(
            &delegation.capsule,
            &delegation.kfrags[0],
            Some(b"kept intact"),
            true,
        )
        .unwrap();
        assert!(cfrag.verify_correctness(
            &delegation.capsule,
            &delegation.delegating_pk,
            &delegation.receiving_pk,
            &delegation.verifying_pk,
        ));

        let mut mutated = cfrag;
        mutated.proof.as_mut().unwrap().metadata = Some(b"tampered with".to_vec().into_boxed_slice());

        assert!(!mutated.verify_correctness(
            &delegation.capsule,
            &delegation.delegating_pk,
            &delegation.receiving_pk,
            &delegation.verifying_pk,
        ));
    }

    #[test]
    fn test_no_proof_does_not_verify() {
        let delegation = prepare_delegation();

        let cfrag = reencrypt(&delegation.capsule, &delegation.kfrags[0], None, false).unwrap();
        assert!(!cfrag.has_proof());
        assert!(!cfrag.verify_correctness(
            &delegation.capsule,
            &delegation.delegating_pk,
            &delegation.receiving_pk,
            &delegation.verifying_pk,
        ));
    }

    #[test]
    fn test_serialize() {
        let delegation = prepare_delegation();

        // Without a proof: the four fragment fields.
        let cfrag = reencrypt(&delegation.capsule, &delegation.kfrags[0], None, false).unwrap();
        let cfrag_bytes = cfrag.to_bytes();
        assert_eq!(cfrag_bytes.len(), 33 + 33 + 32 + 33);
        let cfrag_back = CapsuleFrag::from_bytes(&cfrag_bytes).unwrap();
        assert_eq!(cfrag, cfrag_back);

        // With a proof and no metadata: the fixed proof part and a presence byte.
        let cfrag = reencrypt(&delegation.capsule, &delegation.kfrags[0], None, true).unwrap();
        let cfrag_bytes = cfrag.to_bytes();
        assert_eq!(cfrag_bytes.len(), 131 + (33 * 4 + 32 + 64) + 1);
        let cfrag_back = CapsuleFrag::from_bytes(&cfrag_bytes).unwrap();
        assert_eq!(cfrag, cfrag_back);

        // With metadata: a length prefix and the metadata bytes follow.
        let metadata = b"An example of metadata";
        let cfrag = reencrypt(
            &delegation.capsule,
            &delegation.kfrags[0],
            Some(metadata),
            true,
        )
        .unwrap();
        let cfrag_bytes = cfrag.to_bytes();
        assert_eq!(cfrag_bytes.len(), 131 + 228 + 1 + 4 + metadata.len());
        let cfrag_back = CapsuleFrag::from_bytes(&cfrag_bytes).unwrap();
        assert_eq!(cfrag, cfrag_back);
        assert_eq!(
            cfrag_back.proof().unwrap().metadata.as_deref(),
            Some(&metadata[..])
        );

        // Truncated input is rejected.
        assert!(CapsuleFrag::from_bytes(&cfrag_bytes[..cfrag_bytes.len() - 1]).is_err());
    }
}
