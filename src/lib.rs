//! `parasol-pre` is a Rust implementation of an [Umbral][umbral]-family
//! threshold proxy re-encryption scheme.
//!
//! With it, the data owner (the delegator) can delegate decryption rights
//! to a receiver for any ciphertext intended to her,
//! through a re-encryption process performed by a set of semi-trusted proxies.
//! When a threshold of these proxies participate by performing re-encryption,
//! the receiver is able to combine these independent re-encryptions
//! and decrypt the original message using his private key.
//! Every re-encryption carries a proof of its correctness,
//! so a cheating proxy cannot go undetected.
//!
//! # Usage
//!
//! ```
//! use parasol_pre::*;
//!
//! // As in any public-key cryptosystem, users need a pair of public and private keys.
//! // Additionally, users that delegate access to their data (like Alice, in this example)
//! // need a signing keypair.
//!
//! // Key Generation (on Alice's side)
//! let alice_sk = SecretKey::random();
//! let alice_pk = alice_sk.public_key();
//! let signing_sk = SecretKey::random();
//! let signer = Signer::new(&signing_sk);
//! let verifying_pk = signer.verifying_key();
//!
//! // Key Generation (on Bob's side)
//! let bob_sk = SecretKey::random();
//! let bob_pk = bob_sk.public_key();
//!
//! // Now let's encrypt data with Alice's public key.
//! // Invocation of `encrypt()` returns both the capsule and the ciphertext.
//! // Note that anyone with Alice's public key can perform this operation.
//!
//! let plaintext = b"peace at dawn";
//! let (capsule, ciphertext) = encrypt(&alice_pk, plaintext).unwrap();
//!
//! // Since data was encrypted with Alice's public key, Alice can open the capsule
//! // and decrypt the ciphertext with her private key.
//!
//! let plaintext_alice = decrypt_original(&alice_sk, &capsule, &ciphertext).unwrap();
//! assert_eq!(&plaintext_alice as &[u8], plaintext);
//!
//! // When Alice wants to grant Bob access to open her encrypted messages,
//! // she creates re-encryption key fragments, or "kfrags",
//! // which are then sent to `n` proxies.
//!
//! let n = 3; // how many fragments to create
//! let m = 2; // how many should be enough to decrypt
//! let kfrags = generate_kfrags(&alice_sk, &bob_pk, &signer, m, n);
//!
//! // Simulate network transfer
//! let kfrag0 = KeyFrag::from_bytes(&kfrags[0].to_array()).unwrap();
//! let kfrag1 = KeyFrag::from_bytes(&kfrags[1].to_array()).unwrap();
//!
//! // The proxies check that the received kfrags are valid,
//! // and perform the reencryption.
//!
//! // Proxy 0
//! assert!(kfrag0.verify(&verifying_pk, &alice_pk, &bob_pk));
//! let cfrag0 = reencrypt(&capsule, &kfrag0, Some(b"metadata0"), true).unwrap();
//!
//! // Proxy 1
//! assert!(kfrag1.verify(&verifying_pk, &alice_pk, &bob_pk));
//! let cfrag1 = reencrypt(&capsule, &kfrag1, Some(b"metadata1"), true).unwrap();
//!
//! // Simulate network transfer
//! let cfrag0 = CapsuleFrag::from_bytes(&cfrag0.to_bytes()).unwrap();
//! let cfrag1 = CapsuleFrag::from_bytes(&cfrag1.to_bytes()).unwrap();
//!
//! // Finally, Bob prepares his copy of the capsule,
//! // attaches at least `m` received cfrags,
//! // and opens the capsule to decrypt the re-encrypted ciphertext.
//! // The attached cfrags are verified against the keys of the delegation,
//! // so a corrupted one would be reported.
//!
//! let mut bob_capsule = capsule.clone();
//! bob_capsule
//!     .set_correctness_keys(&alice_pk, &bob_pk, &verifying_pk)
//!     .unwrap();
//! bob_capsule.attach_cfrag(&cfrag0).unwrap();
//! bob_capsule.attach_cfrag(&cfrag1).unwrap();
//!
//! let plaintext_bob = decrypt_reencrypted(&bob_sk, &mut bob_capsule, &ciphertext).unwrap();
//! assert_eq!(&plaintext_bob as &[u8], plaintext);
//! ```
//!
//! [umbral]: https://github.com/nucypher/umbral-doc/blob/master/umbral-doc.pdf

#![doc(html_root_url = "https://docs.rs/parasol-pre")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[cfg(feature = "bench-internals")]
pub mod bench; // Re-export some internals for benchmarks.

mod capsule;
mod capsule_frag;
mod curve;
mod dem;
mod hashing;
mod hashing_ds;
mod key_frag;
mod keys;
mod params;
mod pre;
mod secret_box;
mod traits;

pub use capsule::{Capsule, CapsuleUpdateError, OpenOriginalError, OpenReencryptedError};
pub use capsule_frag::{CapsuleFrag, CapsuleFragProof};
pub use dem::{DecryptionError, EncryptionError};
pub use key_frag::{generate_kfrags, KeyFrag};
pub use keys::{PublicKey, SecretKey, Signature, Signer};
pub use params::Parameters;
pub use pre::{
    decrypt_original, decrypt_reencrypted, encrypt, reencrypt, DecryptOriginalError,
    DecryptReencryptedError, ReencryptionError,
};
pub use traits::{
    DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
};
