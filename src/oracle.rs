//! Fiat-Shamir random oracle, modeled with SHA-256.
//!
//! Challenges are derived by hashing the big-endian unpadded byte encoding
//! of every input, concatenated in the order given. Padding differences
//! break proof interoperability, so this encoding is part of the protocol.

use num_bigint::BigInt;
use num_traits::Zero;
use sha2::{Digest, Sha256};

/// SHA-256 digest over the concatenated big-endian encodings of `values`.
///
/// Zero encodes to the empty string, matching the unpadded convention.
pub fn random_oracle_digest(values: &[&BigInt]) -> [u8; 32] {
    let mut hash = Sha256::new();
    for value in values {
        if !value.is_zero() {
            let (_, bytes) = value.to_bytes_be();
            hash.update(&bytes);
        }
    }
    hash.finalize().into()
}

/// Reduces the oracle digest modulo 2, for consumers that need a
/// bit-valued challenge.
pub fn random_oracle_bit(values: &[&BigInt]) -> bool {
    let digest = random_oracle_digest(values);
    digest[31] & 1 == 1
}
