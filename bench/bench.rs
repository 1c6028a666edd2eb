use criterion::{criterion_group, criterion_main, Criterion};

use parasol_pre::bench::{
    capsule_from_public_key, capsule_open_original, capsule_open_reencrypted,
};
use parasol_pre::{encrypt, generate_kfrags, reencrypt, SecretKey, Signer};

fn bench_capsule_from_public_key(c: &mut Criterion) {
    let delegating_pk = SecretKey::random().public_key();
    c.bench_function("Capsule::from_public_key", |b| {
        b.iter(|| capsule_from_public_key(&delegating_pk))
    });
}

fn bench_capsule_open_original(c: &mut Criterion) {
    let delegating_sk = SecretKey::random();
    let capsule = capsule_from_public_key(&delegating_sk.public_key());
    c.bench_function("Capsule::open_original", |b| {
        b.iter(|| capsule_open_original(&capsule, &delegating_sk))
    });
}

fn bench_capsule_open_reencrypted(c: &mut Criterion) {
    let threshold = 2;
    let num_frags = 3;

    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();

    let signer = Signer::new(&SecretKey::random());

    let receiving_sk = SecretKey::random();
    let receiving_pk = receiving_sk.public_key();

    let (capsule, _ciphertext) = encrypt(&delegating_pk, b"peace at dawn").unwrap();
    let kfrags = generate_kfrags(&delegating_sk, &receiving_pk, &signer, threshold, num_frags);

    let mut prepared = capsule.clone();
    prepared
        .set_correctness_keys(&delegating_pk, &receiving_pk, &signer.verifying_key())
        .unwrap();
    for kfrag in kfrags[0..threshold].iter() {
        let cfrag = reencrypt(&capsule, kfrag, None, true).unwrap();
        prepared.attach_cfrag(&cfrag).unwrap();
    }

    c.bench_function("Capsule::open_reencrypted", |b| {
        b.iter(|| capsule_open_reencrypted(&mut prepared.clone(), &receiving_sk))
    });
}

criterion_group!(
    benches,
    bench_capsule_from_public_key,
    bench_capsule_open_original,
    bench_capsule_open_reencrypted
);
criterion_main!(benches);
