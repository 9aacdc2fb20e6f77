//! Paillier public key, ciphertexts and the homomorphic operations.

use std::sync::OnceLock;

use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arith::{exp_signed, mod_inverse, to_bytes_be_padded, ArithmeticError};
use crate::functions::{random_in_multiplicative_group, FunctionError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PubKeyError {
    #[error("empty ciphertext list")]
    EmptyCiphertextList,
    #[error("plaintext must satisfy 0 <= m < N")]
    PlaintextOutOfRange,
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),
    #[error("entropy source failure: {0}")]
    EntropyFailure(#[from] FunctionError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Public key of the Paillier cryptosystem.
///
/// `g` is pinned to `n + 1`; threshold encryption is only safe for that
/// generator choice ([DJN 10], section 5.1). `n²` is computed lazily and
/// cached; the computation is pure, so concurrent initializations agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    /// The modulus `N = p * q`.
    pub n: BigInt,
    /// The generator, always `N + 1`.
    pub g: BigInt,
    #[serde(skip)]
    n_squared: OnceLock<BigInt>,
}

/// The encryption of a value: a single element of `(Z/N²Z)*`.
///
/// Homomorphic operations keep the wrapped value inside the group. The
/// big-endian byte encoding round-trips bit for bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub c: BigInt,
}

impl Ciphertext {
    /// Big-endian unpadded encoding of the ciphertext value.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.c.to_bytes_be().1
    }

    /// Fixed-width big-endian encoding, zero-padded on the left. `None`
    /// when the value does not fit in `width` bytes. Every ciphertext of a
    /// `k`-bit key fits in `2k / 8` bytes.
    pub fn to_padded_bytes_be(&self, width: usize) -> Option<Vec<u8>> {
        to_bytes_be_padded(&self.c, width)
    }

    /// Rebuilds a ciphertext from its big-endian encoding. Leading zero
    /// bytes are ignored, so padded and unpadded forms decode alike.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Ciphertext {
            c: BigInt::from_bytes_be(Sign::Plus, bytes),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    pub fn new(n: BigInt) -> Self {
        let g = &n + BigInt::one();
        PublicKey {
            n,
            g,
            n_squared: OnceLock::new(),
        }
    }

    /// `N²`, the ciphertext-space modulus. Computed on first use.
    pub fn n_squared(&self) -> &BigInt {
        self.n_squared.get_or_init(|| &self.n * &self.n)
    }

    /// Bit length of the modulus.
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Encrypts `m` with fresh randomness from `rng`.
    ///
    /// The plaintext must satisfy `0 <= m < N`.
    pub fn encrypt<R: CryptoRng + RngCore>(
        &self,
        m: &BigInt,
        rng: &mut R,
    ) -> Result<Ciphertext, PubKeyError> {
        let r = random_in_multiplicative_group(&self.n, rng)?;
        self.encrypt_with_r(m, &r)
    }

    /// Encrypts `m` with the caller-chosen randomness `r`, which must be an
    /// element of `(Z/NZ)*`. Returns `c = g^m * r^N mod N²`.
    pub fn encrypt_with_r(&self, m: &BigInt, r: &BigInt) -> Result<Ciphertext, PubKeyError> {
        if m < &BigInt::zero() || m >= &self.n {
            return Err(PubKeyError::PlaintextOutOfRange);
        }
        let n_squared = self.n_squared();
        let gm = self.g.modpow(m, n_squared);
        let rn = r.modpow(&self.n, n_squared);
        Ok(Ciphertext {
            c: (gm * rn) % n_squared,
        })
    }

    /// A fresh encryption of zero, the neutral element of homomorphic
    /// addition.
    pub fn encrypt_zero<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Ciphertext, PubKeyError> {
        self.encrypt(&BigInt::zero(), rng)
    }

    /// A fresh encryption of one.
    pub fn encrypt_one<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Ciphertext, PubKeyError> {
        self.encrypt(&BigInt::one(), rng)
    }

    /// Homomorphic addition: the product of the ciphertexts modulo `N²`
    /// encrypts the sum of the plaintexts.
    pub fn add(&self, cts: &[Ciphertext]) -> Result<Ciphertext, PubKeyError> {
        if cts.is_empty() {
            return Err(PubKeyError::EmptyCiphertextList);
        }
        let n_squared = self.n_squared();
        let mut accumulator = BigInt::one();
        for (i, ct) in cts.iter().enumerate() {
            self.check_ciphertext(&ct.c, i)?;
            accumulator = (accumulator * &ct.c) % n_squared;
        }
        Ok(Ciphertext { c: accumulator })
    }

    /// Homomorphic subtraction: multiplies the first ciphertext by the
    /// modular inverse of each of the others, which encrypts
    /// `m₀ - m₁ - ... - mₖ mod N`.
    pub fn sub(
        &self,
        minuend: &Ciphertext,
        subtrahends: &[Ciphertext],
    ) -> Result<Ciphertext, PubKeyError> {
        let n_squared = self.n_squared();
        self.check_ciphertext(&minuend.c, 0)?;
        let mut accumulator = minuend.c.clone();
        for (i, ct) in subtrahends.iter().enumerate() {
            self.check_ciphertext(&ct.c, i + 1)?;
            let inverse = mod_inverse(&ct.c, n_squared).ok_or_else(|| {
                PubKeyError::InvalidCiphertext(format!("ciphertext {} is not invertible", i + 1))
            })?;
            accumulator = (accumulator * inverse) % n_squared;
        }
        Ok(Ciphertext { c: accumulator })
    }

    /// Homomorphic multiplication by a constant: `c^k mod N²` encrypts
    /// `k * m mod N`. Negative scalars go through the signed-exponent path.
    pub fn const_mul(&self, ct: &Ciphertext, k: &BigInt) -> Result<Ciphertext, PubKeyError> {
        self.check_ciphertext(&ct.c, 0)?;
        let c = exp_signed(&ct.c, k, self.n_squared())?;
        Ok(Ciphertext { c })
    }

    /// Re-randomizes a ciphertext by folding in a fresh encryption of zero.
    /// The plaintext is unchanged.
    pub fn randomize<R: CryptoRng + RngCore>(
        &self,
        ct: &Ciphertext,
        rng: &mut R,
    ) -> Result<Ciphertext, PubKeyError> {
        let zero = self.encrypt_zero(rng)?;
        self.add(&[ct.clone(), zero])
    }

    fn check_ciphertext(&self, c: &BigInt, position: usize) -> Result<(), PubKeyError> {
        if c <= &BigInt::zero() || c >= self.n_squared() {
            return Err(PubKeyError::InvalidCiphertext(format!(
                "ciphertext {} out of bounds",
                position
            )));
        }
        Ok(())
    }
}
