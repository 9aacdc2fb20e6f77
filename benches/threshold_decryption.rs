use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use num_bigint::BigInt;
use rand::rngs::OsRng;

use paillier_threshold::{PartialDecryption, ThresholdKeyGenerator, ThresholdSecretKey};

const KEY_BITS: usize = 512;
const SERVERS: usize = 5;
const THRESHOLD: usize = 3;

fn generate_keys() -> Vec<ThresholdSecretKey> {
    let mut generator = ThresholdKeyGenerator::new(KEY_BITS, SERVERS, THRESHOLD, OsRng)
        .expect("valid parameters");
    generator.generate().expect("key generation")
}

pub fn threshold_decryption_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold decryption");

    let keys = generate_keys();
    let pk = keys[0].public_key();
    let message = BigInt::from(100);
    let ciphertext = pk.encrypt(&message, &mut OsRng).unwrap();
    let shares: Vec<PartialDecryption> = keys
        .iter()
        .map(|key| key.partial_decrypt(&ciphertext).unwrap())
        .collect();

    group.bench_function("encrypt", |bench| {
        bench.iter(|| pk.encrypt(&message, &mut OsRng).unwrap())
    });

    group.bench_function("partial decrypt", |bench| {
        bench.iter(|| keys[0].partial_decrypt(&ciphertext).unwrap())
    });

    group.bench_function("combine partial decryptions", |bench| {
        bench.iter(|| pk.combine_partial_decryptions(&shares).unwrap())
    });

    group.bench_function("partial decryption with proof", |bench| {
        bench.iter(|| {
            keys[0]
                .partial_decryption_with_zkp(&ciphertext, &mut OsRng)
                .unwrap()
        })
    });

    group.bench_function("verify proof", |bench| {
        bench.iter_batched(
            || {
                keys[0]
                    .partial_decryption_with_zkp(&ciphertext, &mut OsRng)
                    .unwrap()
            },
            |proof| proof.verify().unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, threshold_decryption_benches);
criterion_main!(benches);
