//! Threshold public key: share validation, Lagrange combining and
//! verification of claimed decryptions.

use std::collections::HashSet;

use num_bigint::BigInt;
use num_traits::One;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arith::{exact_div, exp_signed, factorial, l_function, mod_inverse, ArithmeticError};
use crate::decryption_share::PartialDecryption;
use crate::pub_key::{Ciphertext, PubKeyError, PublicKey};
use crate::zk_proof::PartialDecryptionZKP;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombineError {
    #[error("threshold not met: {provided} unique shares supplied, {required} required")]
    ThresholdNotMet { provided: usize, required: usize },
    #[error("two shares were produced by server {0}")]
    DuplicateShare(usize),
    #[error("a share references a different ciphertext than the one being verified")]
    CiphertextMismatch,
    #[error("the combined plaintext does not equal the claimed value")]
    DecryptionMismatch,
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Public key of the threshold scheme.
///
/// `verification_key` (`V`) generates the cyclic group of squares in
/// `Z/N²Z` and anchors the zero-knowledge proofs of share decryption;
/// `verification_keys[i - 1]` holds `vᵢ = V^(delta * sᵢ) mod N²` for
/// server `i` (servers are 1-indexed, the vector is 0-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPublicKey {
    pub public_key: PublicKey,
    /// Total number of decryption servers, `l`.
    pub decryption_servers: usize,
    /// Minimum number of distinct shares needed to decrypt, `w`.
    pub threshold: usize,
    pub verification_key: BigInt,
    pub verification_keys: Vec<BigInt>,
}

impl ThresholdPublicKey {
    pub fn new(
        public_key: PublicKey,
        decryption_servers: usize,
        threshold: usize,
        verification_key: BigInt,
        verification_keys: Vec<BigInt>,
    ) -> Self {
        ThresholdPublicKey {
            public_key,
            decryption_servers,
            threshold,
            verification_key,
            verification_keys,
        }
    }

    /// Encrypts under the embedded Paillier key. The homomorphic
    /// operations are delegated the same way so holders of the threshold
    /// key need not reach into `public_key`.
    pub fn encrypt<R: rand::CryptoRng + rand::RngCore>(
        &self,
        m: &BigInt,
        rng: &mut R,
    ) -> Result<Ciphertext, PubKeyError> {
        self.public_key.encrypt(m, rng)
    }

    /// Homomorphic addition under the embedded Paillier key.
    pub fn add(&self, cts: &[Ciphertext]) -> Result<Ciphertext, PubKeyError> {
        self.public_key.add(cts)
    }

    /// Homomorphic subtraction under the embedded Paillier key.
    pub fn sub(
        &self,
        minuend: &Ciphertext,
        subtrahends: &[Ciphertext],
    ) -> Result<Ciphertext, PubKeyError> {
        self.public_key.sub(minuend, subtrahends)
    }

    /// Homomorphic constant multiplication under the embedded Paillier key.
    pub fn const_mul(&self, ct: &Ciphertext, k: &BigInt) -> Result<Ciphertext, PubKeyError> {
        self.public_key.const_mul(ct, k)
    }

    /// `delta = l!`, the factor keeping Lagrange coefficients integral.
    pub fn delta(&self) -> BigInt {
        factorial(self.decryption_servers)
    }

    /// `(4 * delta²)⁻¹ mod N`, the constant applied in the last combining
    /// step. It exists for every honestly generated key because the prime
    /// factors of `N` exceed `l`.
    pub fn combine_shares_constant(&self) -> Result<BigInt, CombineError> {
        let delta = self.delta();
        let four_delta_squared = BigInt::from(4) * &delta * &delta;
        mod_inverse(&four_delta_squared, &self.public_key.n)
            .ok_or(CombineError::Arithmetic(ArithmeticError::NotInvertible))
    }

    /// Structural gate run before any interpolation arithmetic: enough
    /// shares, and no two from the same server.
    pub fn verify_partial_decryptions(
        &self,
        shares: &[PartialDecryption],
    ) -> Result<(), CombineError> {
        if shares.len() < self.threshold {
            return Err(CombineError::ThresholdNotMet {
                provided: shares.len(),
                required: self.threshold,
            });
        }
        let mut seen = HashSet::new();
        for share in shares {
            if !seen.insert(share.id) {
                return Err(CombineError::DuplicateShare(share.id));
            }
        }
        Ok(())
    }

    /// Merges partial decryptions into the plaintext.
    ///
    /// Interpolates at zero with delta-scaled integer Lagrange
    /// coefficients; the result does not depend on the order of `shares`,
    /// and supplying more than `threshold` shares is fine.
    pub fn combine_partial_decryptions(
        &self,
        shares: &[PartialDecryption],
    ) -> Result<BigInt, CombineError> {
        self.verify_partial_decryptions(shares)?;

        let mut cprime = BigInt::one();
        for share in shares {
            let lambda = self.compute_lambda(share, shares);
            cprime = self.update_cprime(&cprime, &lambda, share)?;
        }
        self.compute_decryption(&cprime)
    }

    /// Validates every proof, silently drops the shares that fail, and
    /// combines the rest. When too many proofs fail, the threshold check
    /// surfaces `ThresholdNotMet`.
    pub fn combine_partial_decryptions_zkp(
        &self,
        shares: &[PartialDecryptionZKP],
    ) -> Result<BigInt, CombineError> {
        let verified: Vec<PartialDecryption> = shares
            .iter()
            .filter(|share| share.verify().is_ok())
            .map(|share| share.share.clone())
            .collect();
        self.combine_partial_decryptions(&verified)
    }

    /// Checks a claimed decryption of `ciphertext` against proof-carrying
    /// shares: every share must reference the same ciphertext, and the
    /// proof-validated combination must equal `claimed`.
    pub fn verify_decryption(
        &self,
        ciphertext: &Ciphertext,
        claimed: &BigInt,
        shares: &[PartialDecryptionZKP],
    ) -> Result<(), CombineError> {
        for share in shares {
            if share.c != ciphertext.c {
                return Err(CombineError::CiphertextMismatch);
            }
        }
        let combined = self.combine_partial_decryptions_zkp(shares)?;
        if &combined != claimed {
            return Err(CombineError::DecryptionMismatch);
        }
        Ok(())
    }

    /// Delta-scaled Lagrange coefficient of `share` at zero.
    ///
    /// Every step divides exactly: each prefix product of `(IDᵢ - IDⱼ)`
    /// divides `delta = l!`.
    fn compute_lambda(&self, share: &PartialDecryption, shares: &[PartialDecryption]) -> BigInt {
        let mut lambda = self.delta();
        for other in shares {
            if other.id != share.id {
                let numerator = &lambda * -BigInt::from(other.id);
                let denominator = BigInt::from(share.id as i64) - BigInt::from(other.id as i64);
                lambda = exact_div(&numerator, &denominator);
            }
        }
        lambda
    }

    /// Folds one share into the running product:
    /// `c' <- c' * cᵢ^(2 * lambda) mod N²`. `lambda` may be negative, so
    /// the exponentiation goes through the signed path.
    fn update_cprime(
        &self,
        cprime: &BigInt,
        lambda: &BigInt,
        share: &PartialDecryption,
    ) -> Result<BigInt, CombineError> {
        let n_squared = self.public_key.n_squared();
        let two_lambda = BigInt::from(2) * lambda;
        let contribution = exp_signed(&share.decryption, &two_lambda, n_squared)?;
        Ok((cprime * contribution) % n_squared)
    }

    /// Last combining step: `m = L(c') * (4 * delta²)⁻¹ mod N`.
    fn compute_decryption(&self, cprime: &BigInt) -> Result<BigInt, CombineError> {
        let n = &self.public_key.n;
        let l = l_function(cprime, n);
        Ok((self.combine_shares_constant()? * l) % n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_key(n: i64, servers: usize, threshold: usize) -> ThresholdPublicKey {
        ThresholdPublicKey::new(
            PublicKey::new(BigInt::from(n)),
            servers,
            threshold,
            BigInt::one(),
            Vec::new(),
        )
    }

    fn share(id: usize, decryption: i64) -> PartialDecryption {
        PartialDecryption {
            id,
            decryption: BigInt::from(decryption),
        }
    }

    #[test]
    fn delta_is_the_factorial_of_the_server_count() {
        let tk = bare_key(101 * 103, 6, 4);
        assert_eq!(tk.delta(), BigInt::from(720));
    }

    #[test]
    fn combine_shares_constant_known_value() {
        let tk = bare_key(101 * 103, 6, 4);
        assert_eq!(tk.combine_shares_constant().unwrap(), BigInt::from(4558));
    }

    #[test]
    fn lambda_for_a_two_server_set() {
        let tk = bare_key(101 * 103, 2, 2);
        let shares = [share(1, 10), share(2, 20)];
        assert_eq!(tk.compute_lambda(&shares[0], &shares), BigInt::from(4));
        assert_eq!(tk.compute_lambda(&shares[1], &shares), BigInt::from(-2));
    }

    #[test]
    fn cprime_update_known_value() {
        let tk = bare_key(99, 0, 1);
        let cprime = tk
            .update_cprime(&BigInt::from(77), &BigInt::from(52), &share(3, 5))
            .unwrap();
        assert_eq!(cprime, BigInt::from(8558));
    }

    #[test]
    fn empty_share_list_fails_the_threshold() {
        let tk = bare_key(101 * 103, 2, 2);
        assert_eq!(
            tk.verify_partial_decryptions(&[]),
            Err(CombineError::ThresholdNotMet {
                provided: 0,
                required: 2
            })
        );
    }

    #[test]
    fn unique_ids_pass_the_structural_gate() {
        let tk = bare_key(101 * 103, 2, 2);
        assert_eq!(
            tk.verify_partial_decryptions(&[share(1, 5), share(2, 7)]),
            Ok(())
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tk = bare_key(101 * 103, 2, 2);
        assert_eq!(
            tk.verify_partial_decryptions(&[share(4, 5), share(4, 7)]),
            Err(CombineError::DuplicateShare(4))
        );
    }

    #[test]
    fn two_server_combination_recovers_the_plaintext() {
        let tk = bare_key(637753, 2, 2);
        let shares = [
            share(1, 384111638639),
            share(2, 235243761043),
        ];
        assert_eq!(
            tk.combine_partial_decryptions(&shares).unwrap(),
            BigInt::from(100)
        );
    }

    #[test]
    fn combination_is_order_independent() {
        let tk = bare_key(637753, 2, 2);
        let forward = [share(1, 384111638639), share(2, 235243761043)];
        let backward = [share(2, 235243761043), share(1, 384111638639)];
        assert_eq!(
            tk.combine_partial_decryptions(&forward).unwrap(),
            tk.combine_partial_decryptions(&backward).unwrap()
        );
    }

    #[test]
    fn too_few_shares_are_rejected_by_combining() {
        let tk = bare_key(637753, 2, 2);
        let shares = [share(1, 384111638639)];
        assert_eq!(
            tk.combine_partial_decryptions(&shares),
            Err(CombineError::ThresholdNotMet {
                provided: 1,
                required: 2
            })
        );
    }
}
