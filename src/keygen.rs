//! Trusted-dealer key generation for the threshold scheme, following
//! [DJN 10] section 5.1.
//!
//! The dealer samples the modulus from two safe primes, derives the CRT
//! secret `d` with `d = 1 mod n` and `d = 0 mod m`, splits `d` with a
//! Shamir polynomial over `Z/(nm)` and publishes one verification key per
//! server. Keys are immutable once issued.

use std::time::Duration;

use num_bigint::BigInt;
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::debug;

use crate::arith::{factorial, mod_inverse};
use crate::functions::{random_qr_generator, FunctionError};
use crate::polynomial::Polynomial;
use crate::pub_key::PublicKey;
use crate::safe_primes::{
    generate_safe_primes, SafePrimeError, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT,
};
use crate::threshold_key::ThresholdPublicKey;
use crate::threshold_share::ThresholdSecretKey;

/// Smallest accepted public-key bit length. Below this, two distinct
/// half-length safe primes cannot be found.
pub const MIN_PUBLIC_KEY_BIT_LENGTH: usize = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyGenError {
    #[error("public key bit length {0} must be an even number of at least 18 bits")]
    InvalidKeyLength(usize),
    #[error("the number of decryption servers must be positive")]
    InvalidServerCount,
    #[error("threshold {threshold} must lie in [1, {servers}]")]
    InvalidThreshold { threshold: usize, servers: usize },
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),
    #[error("safe-prime search did not complete within {0:?}")]
    TimeoutExceeded(Duration),
}

impl From<SafePrimeError> for KeyGenError {
    fn from(error: SafePrimeError) -> Self {
        match error {
            SafePrimeError::InvalidBitLength(bits) => KeyGenError::InvalidKeyLength(bits * 2),
            SafePrimeError::EntropyFailure(message) => KeyGenError::EntropyFailure(message),
            SafePrimeError::TimeoutExceeded(timeout) => KeyGenError::TimeoutExceeded(timeout),
        }
    }
}

impl From<FunctionError> for KeyGenError {
    fn from(error: FunctionError) -> Self {
        KeyGenError::EntropyFailure(error.to_string())
    }
}

/// Dealer that issues the `l` threshold secret keys.
///
/// Construction validates the parameters; `generate` performs the actual
/// sampling and may be called repeatedly for fresh key sets.
pub struct ThresholdKeyGenerator<R: CryptoRng + RngCore> {
    public_key_bit_length: usize,
    decryption_servers: usize,
    threshold: usize,
    prime_concurrency: usize,
    prime_timeout: Duration,
    rng: R,
}

impl<R: CryptoRng + RngCore> ThresholdKeyGenerator<R> {
    /// Creates a generator for `decryption_servers` keys with the given
    /// decryption `threshold`, drawing entropy from `rng`.
    ///
    /// The bit length must be even (an odd-length modulus cannot be the
    /// product of two equal-length primes) and at least 18 bits.
    pub fn new(
        public_key_bit_length: usize,
        decryption_servers: usize,
        threshold: usize,
        rng: R,
    ) -> Result<Self, KeyGenError> {
        if public_key_bit_length % 2 == 1 || public_key_bit_length < MIN_PUBLIC_KEY_BIT_LENGTH {
            return Err(KeyGenError::InvalidKeyLength(public_key_bit_length));
        }
        if decryption_servers == 0 {
            return Err(KeyGenError::InvalidServerCount);
        }
        if threshold == 0 || threshold > decryption_servers {
            return Err(KeyGenError::InvalidThreshold {
                threshold,
                servers: decryption_servers,
            });
        }
        Ok(ThresholdKeyGenerator {
            public_key_bit_length,
            decryption_servers,
            threshold,
            prime_concurrency: DEFAULT_CONCURRENCY,
            prime_timeout: DEFAULT_TIMEOUT,
            rng,
        })
    }

    /// Overrides the safe-prime search knobs (defaults: 4 workers, 120 s).
    pub fn prime_search(mut self, concurrency: usize, timeout: Duration) -> Self {
        self.prime_concurrency = concurrency;
        self.prime_timeout = timeout;
        self
    }

    /// Runs the dealer and returns one secret key per server, all sharing
    /// the same embedded public key.
    ///
    /// Structural rejections (colliding primes, a modular inverse that
    /// fails to exist) are retried internally; only a terminal timeout or
    /// RNG fault surfaces.
    pub fn generate(&mut self) -> Result<Vec<ThresholdSecretKey>, KeyGenError> {
        debug!(
            bit_length = self.public_key_bit_length,
            servers = self.decryption_servers,
            threshold = self.threshold,
            "generating threshold key set"
        );
        let (n, m) = self.sample_modulus()?;
        let n_squared = &n * &n;
        let nm = &n * &m;

        // d = 1 mod n and d = 0 mod m, by CRT. Resampling on a missing
        // inverse is unreachable for safe primes but kept as a guard.
        let d = match crt_secret(&n, &m) {
            Some(d) => d,
            None => return self.generate(),
        };

        let v = random_qr_generator(&n_squared, &mut self.rng)?;
        let polynomial =
            Polynomial::with_constant_term(self.threshold - 1, d, &nm, &mut self.rng)?;

        let delta = factorial(self.decryption_servers);
        let shares: Vec<BigInt> = (1..=self.decryption_servers)
            .map(|id| polynomial.evaluate(&BigInt::from(id)) % &nm)
            .collect();
        let verification_keys: Vec<BigInt> = shares
            .iter()
            .map(|share| v.modpow(&(&delta * share), &n_squared))
            .collect();

        let public = ThresholdPublicKey::new(
            PublicKey::new(n),
            self.decryption_servers,
            self.threshold,
            v,
            verification_keys,
        );
        Ok(shares
            .into_iter()
            .enumerate()
            .map(|(index, share)| ThresholdSecretKey::new(public.clone(), index + 1, share))
            .collect())
    }

    /// Draws the two safe-prime pairs, rejecting the structurally bad
    /// combinations `p = q`, `p = q'` and `p' = q`.
    fn sample_modulus(&mut self) -> Result<(BigInt, BigInt), KeyGenError> {
        let half_length = self.public_key_bit_length / 2;
        loop {
            let (p, p1) =
                generate_safe_primes(half_length, self.prime_concurrency, self.prime_timeout)?;
            let (q, q1) =
                generate_safe_primes(half_length, self.prime_concurrency, self.prime_timeout)?;
            if p == q || p == q1 || p1 == q {
                debug!("safe-prime collision, resampling");
                continue;
            }
            return Ok((&p * &q, &p1 * &q1));
        }
    }
}

/// The unique `d mod nm` with `d = 0 mod m` and `d = 1 mod n`:
/// `d = m * (m⁻¹ mod n)`. `None` when `gcd(n, m) != 1`.
fn crt_secret(n: &BigInt, m: &BigInt) -> Option<BigInt> {
    mod_inverse(m, n).map(|m_inverse| m_inverse * m)
}
