use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use typenum::op;

use crate::capsule_frag::CapsuleFrag;
use crate::curve::{CurvePoint, CurveScalar};
use crate::dem::{kdf, SymmetricKey};
use crate::hashing_ds::{hash_capsule_points, hash_to_polynomial_arg, hash_to_shared_secret};
use crate::keys::{PublicKey, SecretKey};
use crate::secret_box::SecretBox;
use crate::traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};

/// Errors that can happen when decapsulating with the delegating key.
#[derive(Debug, PartialEq)]
pub enum OpenOriginalError {
    /// The capsule is not in its original state,
    /// or its self-consistency check failed.
    CapsuleNotValid,
}

impl fmt::Display for OpenOriginalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapsuleNotValid => write!(f, "Capsule verification failed"),
        }
    }
}

/// Errors that can happen when updating the mutable state of a [`Capsule`].
#[derive(Debug, PartialEq)]
pub enum CapsuleUpdateError {
    /// Capsule fragments cannot be attached to an already activated capsule.
    AlreadyActivated,
    /// The correctness key slot already holds a different key.
    ConflictingCorrectnessKey,
}

impl fmt::Display for CapsuleUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActivated => write!(f, "The capsule is already activated"),
            Self::ConflictingCorrectnessKey => {
                write!(f, "A different correctness key was already set")
            }
        }
    }
}

/// Errors that can happen when opening a [`Capsule`]
/// using reencrypted [`CapsuleFrag`] objects.
#[derive(Debug, PartialEq)]
pub enum OpenReencryptedError {
    /// The correctness keys have not been set on the capsule.
    MissingCorrectnessKeys,
    /// No capsule fragments are attached, so there is nothing to reconstruct from.
    NoCapsuleFrags,
    /// Some of the attached capsule fragments were produced without a correctness proof.
    MissingProof,
    /// One or more attached capsule fragments failed the correctness check.
    CorrectnessCheckFailed {
        /// The capsule fragments that failed the check.
        offending: Vec<CapsuleFrag>,
    },
    /// Capsule fragments are mismatched (originated from [`KeyFrag`](crate::KeyFrag)
    /// objects generated by different [`generate_kfrags`](crate::generate_kfrags) calls).
    MismatchedCapsuleFrags,
    /// Some of the attached capsule fragments are repeated.
    RepeatingCapsuleFrags,
    /// Internal validation of the result has failed.
    /// Can be caused by an incorrect (possibly modified) capsule,
    /// a wrong receiving key, or an insufficient number of capsule fragments.
    ValidationFailed,
}

impl fmt::Display for OpenReencryptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCorrectnessKeys => {
                write!(f, "The correctness keys are not set on the capsule")
            }
            Self::NoCapsuleFrags => write!(f, "Empty CapsuleFrag sequence"),
            Self::MissingProof => {
                write!(f, "Some CapsuleFrags do not carry a correctness proof")
            }
            Self::CorrectnessCheckFailed { offending } => {
                write!(
                    f,
                    "{} CapsuleFrag(s) failed the correctness check",
                    offending.len()
                )
            }
            Self::MismatchedCapsuleFrags => write!(f, "CapsuleFrags are not pairwise consistent"),
            Self::RepeatingCapsuleFrags => write!(f, "Some of the CapsuleFrags are repeated"),
            Self::ValidationFailed => write!(f, "Internal validation failed"),
        }
    }
}

/// The immutable part of a capsule, fixed at construction time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum CapsuleHeader {
    /// The original KEM header `(E, V, s)` produced by encapsulation.
    Original {
        point_e: CurvePoint,
        point_v: CurvePoint,
        signature: CurveScalar,
    },
    /// The result of combining capsule fragments.
    Activated(ActivatedPoints),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ActivatedPoints {
    point_e_prime: CurvePoint,
    point_v_prime: CurvePoint,
    precursor: CurvePoint,
}

/// Encapsulated symmetric key used to encrypt the plaintext,
/// together with the mutable state accumulated on the receiving side
/// (correctness keys, attached capsule fragments, activation result).
///
/// Equality and hashing are defined over the construction-time header only,
/// so a capsule keeps working as a lookup key while fragments are attached
/// and after it is activated.
#[derive(Clone, Debug)]
pub struct Capsule {
    header: CapsuleHeader,
    reconstructed: Option<ActivatedPoints>,
    delegating_key: Option<PublicKey>,
    receiving_key: Option<PublicKey>,
    verifying_key: Option<PublicKey>,
    attached_cfrags: Vec<CapsuleFrag>,
}

impl PartialEq for Capsule {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
    }
}

impl Eq for Capsule {}

impl Hash for Capsule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.header {
            CapsuleHeader::Original {
                point_e,
                point_v,
                signature,
            } => {
                state.write_u8(0);
                state.write(&point_e.to_array());
                state.write(&point_v.to_array());
                state.write(&signature.to_array());
            }
            CapsuleHeader::Activated(points) => {
                state.write_u8(1);
                state.write(&points.point_e_prime.to_array());
                state.write(&points.point_v_prime.to_array());
                state.write(&points.precursor.to_array());
            }
        }
    }
}

type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;

impl RepresentableAsArray for Capsule {
    type Size = op!(PointSize + PointSize + ScalarSize);
}

impl SerializableToArray for Capsule {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        // All capsules produced by encapsulation or deserialization
        // carry the original header; the activation result is kept separately
        // and does not travel.
        match &self.header {
            CapsuleHeader::Original {
                point_e,
                point_v,
                signature,
            } => point_e
                .to_array()
                .concat(point_v.to_array())
                .concat(signature.to_array()),
            CapsuleHeader::Activated(_) => {
                panic!("a reconstructed capsule has no canonical byte representation")
            }
        }
    }
}

impl DeserializableFromArray for Capsule {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, DeserializationError> {
        let (point_e, rest) = CurvePoint::take(*arr)?;
        let (point_v, rest) = CurvePoint::take(rest)?;
        let signature = CurveScalar::take_last(rest)?;
        Self::new_verified(&point_e, &point_v, &signature)
            .ok_or(DeserializationError::ConstructionFailure)
    }
}

impl Capsule {
    pub(crate) fn from_original(
        point_e: &CurvePoint,
        point_v: &CurvePoint,
        signature: &CurveScalar,
    ) -> Self {
        Self {
            header: CapsuleHeader::Original {
                point_e: *point_e,
                point_v: *point_v,
                signature: *signature,
            },
            reconstructed: None,
            delegating_key: None,
            receiving_key: None,
            verifying_key: None,
            attached_cfrags: Vec::new(),
        }
    }

    pub(crate) fn from_activated(
        point_e_prime: &CurvePoint,
        point_v_prime: &CurvePoint,
        precursor: &CurvePoint,
    ) -> Self {
        Self {
            header: CapsuleHeader::Activated(ActivatedPoints {
                point_e_prime: *point_e_prime,
                point_v_prime: *point_v_prime,
                precursor: *precursor,
            }),
            reconstructed: None,
            delegating_key: None,
            receiving_key: None,
            verifying_key: None,
            attached_cfrags: Vec::new(),
        }
    }

    fn new_verified(
        point_e: &CurvePoint,
        point_v: &CurvePoint,
        signature: &CurveScalar,
    ) -> Option<Self> {
        let capsule = Self::from_original(point_e, point_v, signature);
        if capsule.verify_original() {
            Some(capsule)
        } else {
            None
        }
    }

    /// Verifies the self-consistency of the original capsule header:
    /// `s * G == V + H(E, V) * E`.
    pub(crate) fn verify_original(&self) -> bool {
        match &self.header {
            CapsuleHeader::Original {
                point_e,
                point_v,
                signature,
            } => {
                let g = CurvePoint::generator();
                let h = hash_capsule_points(point_e, point_v);
                &g * signature == point_v + &(point_e * &h)
            }
            CapsuleHeader::Activated(_) => false,
        }
    }

    pub(crate) fn original_points(&self) -> Option<(CurvePoint, CurvePoint)> {
        match &self.header {
            CapsuleHeader::Original {
                point_e, point_v, ..
            } => Some((*point_e, *point_v)),
            CapsuleHeader::Activated(_) => None,
        }
    }

    fn activated_points(&self) -> Option<ActivatedPoints> {
        match self.header {
            CapsuleHeader::Activated(points) => Some(points),
            CapsuleHeader::Original { .. } => self.reconstructed,
        }
    }

    /// Returns `true` if the capsule has been activated
    /// (or was constructed in the activated state).
    pub fn is_activated(&self) -> bool {
        self.activated_points().is_some()
    }

    /// Returns the capsule fragments attached so far.
    ///
    /// The list is emptied when the capsule activates.
    pub fn attached_cfrags(&self) -> &[CapsuleFrag] {
        &self.attached_cfrags
    }

    fn get_or_set(
        slot: &mut Option<PublicKey>,
        key: &PublicKey,
    ) -> Result<PublicKey, CapsuleUpdateError> {
        match slot {
            None => {
                *slot = Some(*key);
                Ok(*key)
            }
            Some(existing) if existing == key => Ok(*existing),
            Some(_) => Err(CapsuleUpdateError::ConflictingCorrectnessKey),
        }
    }

    /// Sets the delegating correctness key if the slot is empty
    /// and returns the stored key.
    ///
    /// Setting the same key again is a no-op; setting a different one is an error.
    pub fn get_or_set_delegating_key(
        &mut self,
        key: &PublicKey,
    ) -> Result<PublicKey, CapsuleUpdateError> {
        Self::get_or_set(&mut self.delegating_key, key)
    }

    /// Sets the receiving correctness key if the slot is empty
    /// and returns the stored key.
    ///
    /// Setting the same key again is a no-op; setting a different one is an error.
    pub fn get_or_set_receiving_key(
        &mut self,
        key: &PublicKey,
    ) -> Result<PublicKey, CapsuleUpdateError> {
        Self::get_or_set(&mut self.receiving_key, key)
    }

    /// Sets the verifying correctness key if the slot is empty
    /// and returns the stored key.
    ///
    /// Setting the same key again is a no-op; setting a different one is an error.
    pub fn get_or_set_verifying_key(
        &mut self,
        key: &PublicKey,
    ) -> Result<PublicKey, CapsuleUpdateError> {
        Self::get_or_set(&mut self.verifying_key, key)
    }

    /// Sets all three correctness keys required for opening the capsule
    /// with reencrypted fragments.
    pub fn set_correctness_keys(
        &mut self,
        delegating: &PublicKey,
        receiving: &PublicKey,
        verifying: &PublicKey,
    ) -> Result<(), CapsuleUpdateError> {
        self.get_or_set_delegating_key(delegating)?;
        self.get_or_set_receiving_key(receiving)?;
        self.get_or_set_verifying_key(verifying)?;
        Ok(())
    }

    /// Attaches a reencrypted capsule fragment.
    ///
    /// Only possible before activation.
    pub fn attach_cfrag(&mut self, cfrag: &CapsuleFrag) -> Result<(), CapsuleUpdateError> {
        if self.is_activated() {
            return Err(CapsuleUpdateError::AlreadyActivated);
        }
        self.attached_cfrags.push(cfrag.clone());
        Ok(())
    }

    /// Generates a symmetric key and its associated KEM ciphertext.
    pub(crate) fn from_public_key(
        delegating_pk: &PublicKey,
    ) -> (Capsule, SecretBox<SymmetricKey>) {
        let g = CurvePoint::generator();

        let priv_r = SecretBox::new(CurveScalar::random_nonzero());
        let pub_r = &g * priv_r.as_secret();

        let priv_u = SecretBox::new(CurveScalar::random_nonzero());
        let pub_u = &g * priv_u.as_secret();

        let h = hash_capsule_points(&pub_r, &pub_u);

        let s = priv_u.as_secret() + &(priv_r.as_secret() * &h);

        let shared_point = &delegating_pk.to_point() * &(priv_r.as_secret() + priv_u.as_secret());

        let key = kdf(&shared_point.to_array());

        (Self::from_original(&pub_r, &pub_u, &s), key)
    }

    /// Derives the same symmetric key the encapsulation produced.
    pub(crate) fn open_original(
        &self,
        delegating_sk: &SecretKey,
    ) -> Result<SecretBox<SymmetricKey>, OpenOriginalError> {
        if !self.verify_original() {
            return Err(OpenOriginalError::CapsuleNotValid);
        }

        // The header is known to be original here.
        let (point_e, point_v) = match self.original_points() {
            Some(points) => points,
            None => return Err(OpenOriginalError::CapsuleNotValid),
        };

        let secret_scalar = delegating_sk.to_secret_scalar();
        let shared_point = &(&point_e + &point_v) * secret_scalar.as_secret();
        Ok(kdf(&shared_point.to_array()))
    }

    /// Combines the attached capsule fragments
    /// via Shamir's Secret Sharing reconstruction and activates the capsule.
    ///
    /// One-way and idempotent: once activated, further calls are no-ops,
    /// and the attached fragment list is discarded.
    pub(crate) fn reconstruct(
        &mut self,
        receiving_sk: &SecretKey,
    ) -> Result<(), OpenReencryptedError> {
        if self.is_activated() {
            return Ok(());
        }

        if self.attached_cfrags.is_empty() {
            return Err(OpenReencryptedError::NoCapsuleFrags);
        }

        let precursor = self.attached_cfrags[0].precursor;

        if !self
            .attached_cfrags
            .iter()
            .all(|cfrag| cfrag.precursor == precursor)
        {
            return Err(OpenReencryptedError::MismatchedCapsuleFrags);
        }

        let pub_key = receiving_sk.public_key().to_point();
        let secret_scalar = receiving_sk.to_secret_scalar();
        let dh_point = &precursor * secret_scalar.as_secret();

        // The secret value tying the shares to the delegator-receiver pair.
        let d = SecretBox::new(hash_to_shared_secret(&precursor, &pub_key, &dh_point));

        let share_indices: Vec<CurveScalar> = self
            .attached_cfrags
            .iter()
            .map(|cfrag| hash_to_polynomial_arg(&cfrag.kfrag_id, d.as_secret()))
            .collect();

        let mut point_e_prime = CurvePoint::identity();
        let mut point_v_prime = CurvePoint::identity();
        for (i, cfrag) in self.attached_cfrags.iter().enumerate() {
            // There is a minuscule probability that the share indices
            // of two fragments are equal, in which case we'd rather fail gracefully.
            let lambda_i = lambda_coeff(&share_indices, i)
                .ok_or(OpenReencryptedError::RepeatingCapsuleFrags)?;
            point_e_prime = &point_e_prime + &(&cfrag.point_e1 * &lambda_i);
            point_v_prime = &point_v_prime + &(&cfrag.point_v1 * &lambda_i);
        }

        self.reconstructed = Some(ActivatedPoints {
            point_e_prime,
            point_v_prime,
            precursor,
        });
        self.attached_cfrags = Vec::new();

        Ok(())
    }

    /// Derives the symmetric key from an activated capsule.
    pub(crate) fn open_reencrypted(
        &self,
        receiving_sk: &SecretKey,
        delegating_pk: &PublicKey,
    ) -> Result<SecretBox<SymmetricKey>, OpenReencryptedError> {
        let points = self
            .activated_points()
            .ok_or(OpenReencryptedError::NoCapsuleFrags)?;

        let precursor = points.precursor;
        let pub_key = receiving_sk.public_key().to_point();
        let secret_scalar = receiving_sk.to_secret_scalar();
        let dh_point = &precursor * secret_scalar.as_secret();

        let d = SecretBox::new(hash_to_shared_secret(&precursor, &pub_key, &dh_point));

        // The combined points must be consistent with the delegating key;
        // the check fails if the fragments do not match this capsule,
        // or there were not enough of them.
        if let CapsuleHeader::Original {
            point_e,
            point_v,
            signature,
        } = &self.header
        {
            let h = hash_capsule_points(point_e, point_v);
            let inv_d_opt: Option<CurveScalar> = d.as_secret().invert().into();
            let inv_d = inv_d_opt.ok_or(OpenReencryptedError::ValidationFailed)?;

            if &delegating_pk.to_point() * &(signature * &inv_d)
                != &(&points.point_e_prime * &h) + &points.point_v_prime
            {
                return Err(OpenReencryptedError::ValidationFailed);
            }
        }

        let shared_point =
            &(&points.point_e_prime + &points.point_v_prime) * d.as_secret();
        Ok(kdf(&shared_point.to_array()))
    }

    /// Checks the correctness proofs of all attached capsule fragments,
    /// activates the capsule, and derives the symmetric key.
    pub(crate) fn open_with_attached(
        &mut self,
        receiving_sk: &SecretKey,
    ) -> Result<SecretBox<SymmetricKey>, OpenReencryptedError> {
        let delegating_pk = self
            .delegating_key
            .ok_or(OpenReencryptedError::MissingCorrectnessKeys)?;
        let receiving_pk = self
            .receiving_key
            .ok_or(OpenReencryptedError::MissingCorrectnessKeys)?;
        let verifying_pk = self
            .verifying_key
            .ok_or(OpenReencryptedError::MissingCorrectnessKeys)?;

        if !self.is_activated() {
            if self.attached_cfrags.is_empty() {
                return Err(OpenReencryptedError::NoCapsuleFrags);
            }

            if self.attached_cfrags.iter().any(|cfrag| !cfrag.has_proof()) {
                return Err(OpenReencryptedError::MissingProof);
            }

            let mut offending = Vec::new();
            for cfrag in &self.attached_cfrags {
                if !cfrag.verify_correctness(self, &delegating_pk, &receiving_pk, &verifying_pk) {
                    offending.push(cfrag.clone());
                }
            }

            if !offending.is_empty() {
                return Err(OpenReencryptedError::CorrectnessCheckFailed { offending });
            }

            self.reconstruct(receiving_sk)?;
        }

        self.open_reencrypted(receiving_sk, &delegating_pk)
    }
}

fn lambda_coeff(xs: &[CurveScalar], i: usize) -> Option<CurveScalar> {
    let mut res = CurveScalar::one();
    for j in 0..xs.len() {
        if j != i {
            let inv_diff_opt: Option<CurveScalar> = (&xs[j] - &xs[i]).invert().into();
            let inv_diff = inv_diff_opt?;
            res = &(&res * &xs[j]) * &inv_diff;
        }
    }
    Some(res)
}

#[cfg(test)]
mod tests {

    use alloc::vec::Vec;

    use super::{Capsule, CapsuleUpdateError, OpenOriginalError, OpenReencryptedError};
    use crate::capsule_frag::CapsuleFrag;
    use crate::curve::{CurvePoint, CurveScalar};
    use crate::key_frag::generate_kfrags;
    use crate::keys::{SecretKey, Signer};
    use crate::pre::reencrypt;
    use crate::traits::{DeserializableFromArray, SerializableToArray};

    fn random_point() -> CurvePoint {
        &CurvePoint::generator() * &CurveScalar::random_nonzero()
    }

    #[test]
    fn test_serialize() {
        let delegating_pk = SecretKey::random().public_key();
        let (capsule, _key) = Capsule::from_public_key(&delegating_pk);

        let arr = capsule.to_array();
        let capsule_back = Capsule::from_array(&arr).unwrap();
        assert_eq!(capsule, capsule_back);

        // Corrupting the signature scalar makes the self-consistency check fail.
        let mut bad_arr = arr;
        bad_arr[33 + 33] ^= 1;
        assert!(Capsule::from_array(&bad_arr).is_err());
    }

    #[test]
    fn test_capsule_equality() {
        let one_capsule = Capsule::from_original(
            &random_point(),
            &random_point(),
            &CurveScalar::random_nonzero(),
        );
        let another_capsule = Capsule::from_original(
            &random_point(),
            &random_point(),
            &CurveScalar::random_nonzero(),
        );
        assert_ne!(one_capsule, another_capsule);

        let activated_capsule =
            Capsule::from_activated(&random_point(), &random_point(), &random_point());
        assert_ne!(activated_capsule, one_capsule);
    }

    #[test]
    fn test_open_original() {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let (capsule, key) = Capsule::from_public_key(&delegating_pk);
        assert_eq!(key.as_secret().len(), 32);

        let key_back = capsule.open_original(&delegating_sk).unwrap();
        assert_eq!(key.as_secret(), key_back.as_secret());
    }

    #[test]
    fn test_open_original_rejects_invalid_capsule() {
        let delegating_sk = SecretKey::random();
        let capsule = Capsule::from_original(
            &random_point(),
            &random_point(),
            &CurveScalar::random_nonzero(),
        );
        assert_eq!(
            capsule.open_original(&delegating_sk).map(|_| ()),
            Err(OpenOriginalError::CapsuleNotValid)
        );
    }

    #[test]
    fn test_correctness_keys_are_set_once() {
        let delegating_pk = SecretKey::random().public_key();
        let other_pk = SecretKey::random().public_key();
        let (mut capsule, _key) = Capsule::from_public_key(&delegating_pk);

        assert_eq!(
            capsule.get_or_set_delegating_key(&delegating_pk),
            Ok(delegating_pk)
        );
        // Idempotent for the same key.
        assert_eq!(
            capsule.get_or_set_delegating_key(&delegating_pk),
            Ok(delegating_pk)
        );
        // A conflicting key is rejected.
        assert_eq!(
            capsule.get_or_set_delegating_key(&other_pk),
            Err(CapsuleUpdateError::ConflictingCorrectnessKey)
        );
    }

    #[test]
    fn test_open_reencrypted() {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(&SecretKey::random());

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let (capsule, key) = Capsule::from_public_key(&delegating_pk);

        let kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 2, 3);

        let cfrags: Vec<CapsuleFrag> = kfrags
            .iter()
            .map(|kfrag| reencrypt(&capsule, kfrag, None, true).unwrap())
            .collect();

        let mut opened = capsule.clone();
        for cfrag in &cfrags {
            opened.attach_cfrag(cfrag).unwrap();
        }
        opened.reconstruct(&receiving_sk).unwrap();
        assert!(opened.is_activated());
        assert!(opened.attached_cfrags().is_empty());

        let key_back = opened
            .open_reencrypted(&receiving_sk, &delegating_pk)
            .unwrap();
        assert_eq!(key.as_secret(), key_back.as_secret());

        // A second reconstruction is a no-op.
        opened.reconstruct(&receiving_sk).unwrap();
        let key_again = opened
            .open_reencrypted(&receiving_sk, &delegating_pk)
            .unwrap();
        assert_eq!(key.as_secret(), key_again.as_secret());

        // No attached cfrags.
        let mut empty = capsule.clone();
        assert_eq!(
            empty.reconstruct(&receiving_sk),
            Err(OpenReencryptedError::NoCapsuleFrags)
        );

        // Mismatched cfrags: each `generate_kfrags` call uses a new precursor.
        let kfrags2 = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 2, 3);
        let cfrag_other_batch = reencrypt(&capsule, &kfrags2[1], None, true).unwrap();
        let mut mismatched = capsule.clone();
        mismatched.attach_cfrag(&cfrags[0]).unwrap();
        mismatched.attach_cfrag(&cfrag_other_batch).unwrap();
        assert_eq!(
            mismatched.reconstruct(&receiving_sk),
            Err(OpenReencryptedError::MismatchedCapsuleFrags)
        );

        // Fragments reencrypted from a different capsule fail the validation check.
        let (other_capsule, _other_key) = Capsule::from_public_key(&delegating_pk);
        let mut wrong = other_capsule.clone();
        for cfrag in &cfrags {
            wrong.attach_cfrag(cfrag).unwrap();
        }
        wrong.reconstruct(&receiving_sk).unwrap();
        assert_eq!(
            wrong
                .open_reencrypted(&receiving_sk, &delegating_pk)
                .map(|_| ()),
            Err(OpenReencryptedError::ValidationFailed)
        );
    }

    #[test]
    fn test_attach_after_activation_fails() {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(&SecretKey::random());

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let (capsule, _key) = Capsule::from_public_key(&delegating_pk);

        let kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, 1, 2);
        let cfrag = reencrypt(&capsule, &kfrags[0], None, true).unwrap();

        let mut opened = capsule.clone();
        opened.attach_cfrag(&cfrag).unwrap();
        opened.reconstruct(&receiving_sk).unwrap();

        assert_eq!(
            opened.attach_cfrag(&cfrag),
            Err(CapsuleUpdateError::AlreadyActivated)
        );
    }
}
