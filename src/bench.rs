//! Re-exports private API elements for benchmarks.
//! Only available with the `bench-internals` feature; not a part of the public API.

use crate::capsule::Capsule;
use crate::keys::{PublicKey, SecretKey};

/// Runs the encapsulation, discarding the derived key.
pub fn capsule_from_public_key(delegating_pk: &PublicKey) -> Capsule {
    let (capsule, _key) = Capsule::from_public_key(delegating_pk);
    capsule
}

/// Runs the decapsulation with the delegating key, discarding the result.
pub fn capsule_open_original(capsule: &Capsule, delegating_sk: &SecretKey) {
    let _key = capsule.open_original(delegating_sk).unwrap();
}

/// Checks the attached fragments, activates the capsule, and derives the key,
/// discarding the result.
pub fn capsule_open_reencrypted(capsule: &mut Capsule, receiving_sk: &SecretKey) {
    let _key = capsule.open_with_attached(receiving_sk).unwrap();
}
