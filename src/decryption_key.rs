//! Single-key Paillier decryption.
//!
//! The threshold scheme never reassembles this key; it exists for the
//! plain one-party instantiation and as the reference the homomorphic
//! operations are tested against.

use num_bigint::BigInt;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use rug::integer::{IsPrime, Order};
use rug::rand::RandState;
use rug::Integer;
use thiserror::Error;
use zeroize::Zeroize;

use crate::arith::{from_rug, l_function, mod_inverse, PRIME_TEST_ROUNDS};
use crate::pub_key::{Ciphertext, PublicKey};

/// Minimum accepted modulus bit length. Two distinct half-length primes
/// cannot be found below this.
pub const MIN_KEY_PAIR_BIT_LENGTH: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyPairError {
    #[error("key bit length {0} must be an even number of at least 16 bits")]
    InvalidKeyLength(usize),
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),
}

/// Secret key of the single-party Paillier scheme.
///
/// `lambda` is Euler's totient of the modulus and `mu` its inverse modulo
/// `N`. Both are wiped when the key is dropped.
#[derive(Debug, Clone)]
pub struct DecryptionKey {
    pub public_key: PublicKey,
    lambda: BigInt,
    mu: BigInt,
}

impl Zeroize for DecryptionKey {
    fn zeroize(&mut self) {
        self.lambda = BigInt::zero();
        self.mu = BigInt::zero();
    }
}

impl Drop for DecryptionKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl DecryptionKey {
    /// Generates a fresh key pair with a modulus of `bit_length` bits.
    ///
    /// The prime factors have equal bit length, are congruent to 3 mod 4
    /// and are resampled until `gcd(lambda, N) = 1` so that decryption is
    /// well defined.
    pub fn generate_key_pair<R: CryptoRng + RngCore>(
        bit_length: usize,
        rng: &mut R,
    ) -> Result<(DecryptionKey, PublicKey), KeyPairError> {
        if bit_length % 2 == 1 || bit_length < MIN_KEY_PAIR_BIT_LENGTH {
            return Err(KeyPairError::InvalidKeyLength(bit_length));
        }
        let half_length = u32::try_from(bit_length / 2)
            .map_err(|_| KeyPairError::InvalidKeyLength(bit_length))?;

        let mut seed = [0u8; 32];
        rng.try_fill_bytes(&mut seed)
            .map_err(|e| KeyPairError::EntropyFailure(e.to_string()))?;
        let mut rand_state = RandState::new();
        rand_state.seed(&Integer::from_digits(&seed, Order::Msf));

        loop {
            let p = random_blum_prime(half_length, &mut rand_state);
            let q = random_blum_prime(half_length, &mut rand_state);
            if p == q {
                continue;
            }
            let n = from_rug(&Integer::from(&p * &q));
            let lambda =
                from_rug(&Integer::from(&p - 1u32)) * from_rug(&Integer::from(&q - 1u32));
            let mu = match mod_inverse(&lambda, &n) {
                Some(mu) => mu,
                None => continue,
            };
            let public_key = PublicKey::new(n);
            let key = DecryptionKey {
                public_key: public_key.clone(),
                lambda,
                mu,
            };
            return Ok((key, public_key));
        }
    }

    /// Decrypts a ciphertext produced under the embedded public key:
    /// `m = L(c^lambda mod N²) * mu mod N`.
    pub fn decrypt(&self, ct: &Ciphertext) -> BigInt {
        let n = &self.public_key.n;
        let n_squared = self.public_key.n_squared();
        let u = ct.c.modpow(&self.lambda, n_squared);
        (l_function(&u, n) * &self.mu) % n
    }

    /// Recovers the randomness a well-formed ciphertext was produced with.
    ///
    /// Divides out `g^m` to isolate `r^N mod N²`, then inverts the `N`-th
    /// power with the exponent `N⁻¹ mod lambda`. `None` only for
    /// ciphertexts not produced under this key.
    pub fn extract_randomness(&self, ct: &Ciphertext) -> Option<BigInt> {
        let n = &self.public_key.n;
        let n_squared = self.public_key.n_squared();
        let n_inverse = mod_inverse(n, &self.lambda)?;
        let m = self.decrypt(ct);
        let gm = self.public_key.g.modpow(&m, n_squared);
        let z = (&ct.c * mod_inverse(&gm, n_squared)?) % n_squared;
        Some(z.modpow(&n_inverse, n))
    }
}

/// Random prime of exactly `bits` bits congruent to 3 mod 4.
fn random_blum_prime(bits: u32, rand_state: &mut RandState<'_>) -> Integer {
    loop {
        let mut candidate = Integer::from(Integer::random_bits(bits, rand_state));
        candidate.set_bit(bits - 1, true);
        candidate.next_prime_mut();
        if candidate.significant_bits() != bits {
            continue;
        }
        if candidate.mod_u(4) != 3 {
            continue;
        }
        if candidate.is_probably_prime(PRIME_TEST_ROUNDS) == IsPrime::No {
            continue;
        }
        return candidate;
    }
}
