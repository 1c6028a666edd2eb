//! This module contains hashing sequences with included domain separation tags
//! shared between different parts of the code.

use crate::curve::{CurvePoint, CurveScalar};
use crate::hashing::{ScalarDigest, SignatureDigest};
use crate::key_frag::KeyFragID;
use crate::keys::PublicKey;
use crate::traits::SerializableToArray;

pub(crate) fn hash_capsule_points(capsule_e: &CurvePoint, capsule_v: &CurvePoint) -> CurveScalar {
    ScalarDigest::new_with_dst(b"CAPSULE_POINTS")
        .chain_point(capsule_e)
        .chain_point(capsule_v)
        .finalize()
}

pub(crate) fn hash_to_shared_secret(
    precursor: &CurvePoint,
    pubkey: &CurvePoint,
    dh_point: &CurvePoint,
) -> CurveScalar {
    ScalarDigest::new_with_dst(b"SHARED_SECRET")
        .chain_point(precursor)
        .chain_point(pubkey)
        .chain_point(dh_point)
        .finalize()
}

/// Maps a key fragment ID to its share index
/// (the x in the Shamir's Secret Sharing tuple (x, f(x))).
/// The shared secret is mixed in so that the shares cannot be combined
/// without the receiver's participation.
pub(crate) fn hash_to_polynomial_arg(
    kfrag_id: &KeyFragID,
    shared_secret: &CurveScalar,
) -> CurveScalar {
    ScalarDigest::new_with_dst(b"POLYNOMIAL_ARG")
        .chain_bytes(kfrag_id.to_array())
        .chain_scalar(shared_secret)
        .finalize()
}

pub(crate) fn hash_to_cfrag_verification(
    points: &[CurvePoint],
    metadata: Option<&[u8]>,
) -> CurveScalar {
    let digest = ScalarDigest::new_with_dst(b"CFRAG_VERIFICATION").chain_points(points);

    let digest = match metadata {
        Some(s) => digest.chain_bytes(s),
        None => digest,
    };

    digest.finalize()
}

/// The digest signed by the delegator to authorize one key fragment,
/// and relayed within the capsule fragments it produces.
pub(crate) fn kfrag_signature_digest(
    kfrag_id: &KeyFragID,
    delegating_pk: &PublicKey,
    receiving_pk: &PublicKey,
    commitment: &CurvePoint,
    precursor: &CurvePoint,
) -> SignatureDigest {
    SignatureDigest::new_with_dst(b"KEY_FRAG_SIGNATURE")
        .chain_bytes(kfrag_id.to_array())
        .chain_pubkey(delegating_pk)
        .chain_pubkey(receiving_pk)
        .chain_point(commitment)
        .chain_point(precursor)
}
