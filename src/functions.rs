//! Sampling utilities for the multiplicative groups the cryptosystem
//! works in. All functions are generic over a caller-supplied CSPRNG and
//! surface RNG faults instead of panicking.

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),
    #[error("sampling bound must be positive")]
    InvalidBound,
}

/// Uniform random integer in `[0, n)`.
///
/// Rejection sampling over `bitlen(n)`-bit candidates; the expected number
/// of draws is below two because the top byte is masked down to the bound's
/// bit length.
pub fn random_mod<R: CryptoRng + RngCore>(
    n: &BigInt,
    rng: &mut R,
) -> Result<BigInt, FunctionError> {
    if n <= &BigInt::zero() {
        return Err(FunctionError::InvalidBound);
    }
    let bits = n.bits();
    let len = ((bits + 7) / 8) as usize;
    let shift = (len as u64 * 8 - bits) as u32;
    let mut bytes = vec![0u8; len];
    loop {
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| FunctionError::EntropyFailure(e.to_string()))?;
        bytes[0] >>= shift;
        let candidate = BigInt::from_bytes_be(Sign::Plus, &bytes);
        if &candidate < n {
            return Ok(candidate);
        }
    }
}

/// Uniform random element of the multiplicative group `(Z/nZ)*`.
///
/// Resamples until the draw is nonzero and coprime with `n`. For moduli of
/// cryptographic size almost every candidate is accepted, so termination is
/// overwhelmingly likely.
pub fn random_in_multiplicative_group<R: CryptoRng + RngCore>(
    n: &BigInt,
    rng: &mut R,
) -> Result<BigInt, FunctionError> {
    loop {
        let candidate = random_mod(n, rng)?;
        if !candidate.is_zero() && candidate.gcd(n).is_one() {
            return Ok(candidate);
        }
    }
}

/// Random element of the quadratic-residue subgroup of `(Z/nZ)*`,
/// obtained as `r² mod n` for uniform `r` in the multiplicative group.
///
/// When `n` factors into safe primes the result generates the full
/// subgroup of squares with high probability.
pub fn random_qr_generator<R: CryptoRng + RngCore>(
    n: &BigInt,
    rng: &mut R,
) -> Result<BigInt, FunctionError> {
    let r = random_in_multiplicative_group(n, rng)?;
    Ok((&r * &r) % n)
}
