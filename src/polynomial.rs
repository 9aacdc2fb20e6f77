//! The Shamir hiding polynomial used to split the threshold secret.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::functions::{random_mod, FunctionError};

/// Polynomial `f(X) = a₀ + a₁X + ... + a_d X^d` over the integers.
///
/// For secret sharing, `a₀` is the shared secret and the remaining
/// coefficients are uniform in `[0, bound)`; evaluations are taken modulo
/// the sharing modulus by the caller.
pub struct Polynomial {
    coefficients: Vec<BigInt>,
}

impl Polynomial {
    /// Samples a polynomial of the given degree whose constant term is
    /// `constant` and whose other coefficients are uniform in `[0, bound)`.
    pub fn with_constant_term<R: CryptoRng + RngCore>(
        degree: usize,
        constant: BigInt,
        bound: &BigInt,
        rng: &mut R,
    ) -> Result<Self, FunctionError> {
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(constant);
        for _ in 0..degree {
            coefficients.push(random_mod(bound, rng)?);
        }
        Ok(Polynomial { coefficients })
    }

    /// Builds a polynomial from explicit coefficients, constant term first.
    pub fn from_coefficients(coefficients: Vec<BigInt>) -> Self {
        Polynomial { coefficients }
    }

    /// Evaluates `f(x)` over the integers, without any reduction. The
    /// exponentiation of `x` is exact; the caller reduces the result.
    pub fn evaluate(&self, x: &BigInt) -> BigInt {
        let mut result = BigInt::zero();
        let mut x_power = BigInt::one();
        for coefficient in &self.coefficients {
            result += coefficient * &x_power;
            x_power *= x;
        }
        result
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn known_polynomial_evaluates_correctly() {
        let poly = Polynomial::from_coefficients(vec![
            BigInt::from(1),
            BigInt::from(2),
            BigInt::from(3),
        ]);
        assert_eq!(poly.evaluate(&BigInt::zero()), BigInt::from(1));
        assert_eq!(poly.evaluate(&BigInt::from(5)), BigInt::from(86));
    }

    #[test]
    fn constant_term_is_the_secret() {
        let secret = BigInt::from(123456789u64);
        let bound = BigInt::from(1_000_000_007u64);
        let poly =
            Polynomial::with_constant_term(4, secret.clone(), &bound, &mut OsRng).unwrap();
        assert_eq!(poly.evaluate(&BigInt::zero()), secret);
        assert_eq!(poly.degree(), 4);
    }

    #[test]
    fn sampled_coefficients_respect_the_bound() {
        let bound = BigInt::from(97);
        let poly = Polynomial::with_constant_term(6, BigInt::from(5), &bound, &mut OsRng).unwrap();
        for coefficient in &poly.coefficients[1..] {
            assert!(coefficient >= &BigInt::zero());
            assert!(coefficient < &bound);
        }
    }

    #[test]
    fn degree_zero_polynomial_is_constant() {
        let poly = Polynomial::with_constant_term(
            0,
            BigInt::from(42),
            &BigInt::from(1000),
            &mut OsRng,
        )
        .unwrap();
        assert_eq!(poly.evaluate(&BigInt::from(17)), BigInt::from(42));
        assert_eq!(poly.degree(), 0);
    }

    #[test]
    fn evaluation_is_unreduced() {
        let poly = Polynomial::from_coefficients(vec![BigInt::from(0), BigInt::from(1)]);
        let x = BigInt::one() << 100;
        assert_eq!(poly.evaluate(&x), x);
    }
}
