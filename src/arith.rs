//! Big-integer helpers shared by the whole crate: signed modular
//! exponentiation, modular inverses, the Paillier L-function and
//! conversions to `rug` for primality work.

use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, Zero};
use rug::integer::Order;
use rug::Integer;
use thiserror::Error;

/// Miller-Rabin rounds used everywhere a primality decision feeds key material.
pub const PRIME_TEST_ROUNDS: u32 = 40;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("no modular inverse exists: operands are not coprime")]
    NotInvertible,
}

/// Returns `n! = n * (n-1) * ... * 2 * 1`, with `0! = 1`.
pub fn factorial(n: usize) -> BigInt {
    let mut result = BigInt::one();
    for i in 2..=n {
        result *= BigInt::from(i);
    }
    result
}

/// Modular exponentiation `a^b mod c` accepting a signed exponent.
///
/// For `b >= 0` this is ordinary modular exponentiation. For `b < 0` it
/// computes `a^|b| mod c` and returns its multiplicative inverse, failing
/// when that inverse does not exist. Lagrange coefficients are signed, so
/// share combining must go through this function; reducing the exponent
/// before exponentiation would break correctness.
pub fn exp_signed(a: &BigInt, b: &BigInt, c: &BigInt) -> Result<BigInt, ArithmeticError> {
    if b.is_negative() {
        let inverted = a.modpow(&-b, c);
        mod_inverse(&inverted, c).ok_or(ArithmeticError::NotInvertible)
    } else {
        Ok(a.modpow(b, c))
    }
}

/// Multiplicative inverse of `a` modulo `m`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    a.modinv(m)
}

/// The Paillier L-function `L(u) = (u - 1) / n`.
///
/// The division is exact for the inputs decryption produces (`u = 1 mod n`).
pub fn l_function(u: &BigInt, n: &BigInt) -> BigInt {
    exact_div(&(u - BigInt::one()), n)
}

/// Integer division of `a` by `b` for callers that rely on the quotient
/// being exact. Debug builds assert the remainder is zero; release builds
/// truncate like ordinary integer division.
pub fn exact_div(a: &BigInt, b: &BigInt) -> BigInt {
    debug_assert!(
        (a % b).is_zero(),
        "exact division with a nonzero remainder"
    );
    a / b
}

/// Big-endian encoding of a non-negative integer, left-padded with zeros to
/// exactly `width` bytes. Fails when the magnitude does not fit.
pub fn to_bytes_be_padded(value: &BigInt, width: usize) -> Option<Vec<u8>> {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus || bytes.len() > width {
        return None;
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(&bytes);
    Some(padded)
}

/// Probabilistic primality test with `rounds` Miller-Rabin witnesses.
///
/// Negative numbers, zero and one are never prime.
pub fn is_probable_prime(value: &BigInt, rounds: u32) -> bool {
    if value <= &BigInt::one() {
        return false;
    }
    to_rug(value).is_probably_prime(rounds) != rug::integer::IsPrime::No
}

/// Converts a non-negative `BigInt` into a `rug::Integer`.
pub fn to_rug(value: &BigInt) -> Integer {
    let (_, bytes) = value.to_bytes_be();
    Integer::from_digits(&bytes, Order::Msf)
}

/// Converts a non-negative `rug::Integer` back into a `BigInt`.
pub fn from_rug(value: &Integer) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_digits::<u8>(Order::Msf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn factorial_of_small_values() {
        assert_eq!(factorial(0), BigInt::from(1));
        assert_eq!(factorial(1), BigInt::from(1));
        assert_eq!(factorial(5), BigInt::from(120));
        assert_eq!(factorial(6), BigInt::from(720));
    }

    #[test]
    fn exp_signed_positive_exponent() {
        let result = exp_signed(&BigInt::from(720), &BigInt::from(10), &BigInt::from(49)).unwrap();
        assert_eq!(result, BigInt::from(43));
    }

    #[test]
    fn exp_signed_zero_exponent() {
        let result = exp_signed(&BigInt::from(720), &BigInt::zero(), &BigInt::from(49)).unwrap();
        assert_eq!(result, BigInt::from(1));
    }

    #[test]
    fn exp_signed_negative_exponent() {
        let result = exp_signed(&BigInt::from(720), &BigInt::from(-10), &BigInt::from(49)).unwrap();
        assert_eq!(result, BigInt::from(8));
    }

    #[test]
    fn exp_signed_negative_exponent_without_inverse() {
        // 720^2 mod 48 shares the factor 48, so the inverse cannot exist.
        let result = exp_signed(&BigInt::from(720), &BigInt::from(-2), &BigInt::from(48));
        assert_eq!(result, Err(ArithmeticError::NotInvertible));
    }

    #[test]
    fn mod_inverse_round_trips() {
        let a = BigInt::from(3);
        let m = BigInt::from(11);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!((a * inv) % m, BigInt::one());
    }

    #[test]
    fn mod_inverse_rejects_common_factor() {
        assert_eq!(mod_inverse(&BigInt::from(6), &BigInt::from(9)), None);
    }

    #[test]
    fn exact_div_of_signed_operands() {
        assert_eq!(
            exact_div(&BigInt::from(600), &BigInt::from(-3)),
            BigInt::from(-200)
        );
        assert_eq!(
            exact_div(&BigInt::from(-18), &BigInt::from(-2)),
            BigInt::from(9)
        );
    }

    #[test]
    fn l_function_divides_exactly() {
        assert_eq!(
            l_function(&BigInt::from(21), &BigInt::from(3)),
            BigInt::from(6)
        );
    }

    #[test]
    fn padded_bytes_have_requested_width() {
        let encoded = to_bytes_be_padded(&BigInt::from(0x0102), 4).unwrap();
        assert_eq!(encoded, vec![0, 0, 1, 2]);
    }

    #[test]
    fn padded_bytes_reject_overflow_and_negatives() {
        assert_eq!(to_bytes_be_padded(&BigInt::from(0x010203), 2), None);
        assert_eq!(to_bytes_be_padded(&BigInt::from(-1), 4), None);
    }

    #[test]
    fn primality_of_known_values() {
        assert!(is_probable_prime(&BigInt::from(65267), PRIME_TEST_ROUNDS));
        assert!(is_probable_prime(&BigInt::from(2), PRIME_TEST_ROUNDS));
        assert!(!is_probable_prime(&BigInt::from(1), PRIME_TEST_ROUNDS));
        assert!(!is_probable_prime(&BigInt::from(65265), PRIME_TEST_ROUNDS));
        assert!(!is_probable_prime(&BigInt::from(-7), PRIME_TEST_ROUNDS));
    }

    #[test]
    fn rug_conversions_round_trip() {
        let value = BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        assert_eq!(from_rug(&to_rug(&value)), value);
    }
}
