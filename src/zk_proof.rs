//! Non-interactive zero-knowledge proof of correct partial decryption.
//!
//! A Fiat-Shamir-compiled sigma protocol proving that a share
//! `cᵢ = c^(2 * delta * sᵢ)` was produced with the same exponent `sᵢ`
//! that is committed in the published verification key
//! `vᵢ = V^(delta * sᵢ)`: an equality of discrete logs of `cᵢ²` base
//! `c⁴` and of `vᵢ` base `V`.

use num_bigint::{BigInt, Sign};
use num_traits::Pow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arith::exp_signed;
use crate::decryption_share::PartialDecryption;
use crate::oracle::random_oracle_digest;
use crate::threshold_key::ThresholdPublicKey;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("recomputed challenge does not match: proof rejected")]
    ProofRejected,
    #[error("no verification key is published for server {0}")]
    UnknownServer(usize),
}

/// A partial decryption together with the proof that it is correct.
///
/// `c` is the ciphertext value the share was produced from, `e` the
/// Fiat-Shamir challenge and `z` the response. `z = r + e * delta * sᵢ`
/// is carried over the integers without reduction; its magnitude is
/// bounded by roughly `2 * bitlen(N) + 256 + bitlen(delta * sᵢ)` bits and
/// must never be truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDecryptionZKP {
    pub share: PartialDecryption,
    /// The threshold public key the proof verifies against.
    pub key: ThresholdPublicKey,
    /// The original ciphertext value.
    pub c: BigInt,
    /// The challenge.
    pub e: BigInt,
    /// The response.
    pub z: BigInt,
}

impl PartialDecryptionZKP {
    pub fn id(&self) -> usize {
        self.share.id
    }

    /// Recomputes the prover's commitments from the response and accepts
    /// if and only if they hash back to the carried challenge.
    pub fn verify(&self) -> Result<(), ProofError> {
        let c4 = (&self.c).pow(4u32);
        let ci2 = (&self.share.decryption).pow(2u32);
        let a = self.commitment_a(&c4, &ci2)?;
        let b = self.commitment_b()?;
        let digest = random_oracle_digest(&[&a, &b, &c4, &ci2]);
        let expected = BigInt::from_bytes_be(Sign::Plus, &digest);
        if expected == self.e {
            Ok(())
        } else {
            Err(ProofError::ProofRejected)
        }
    }

    /// `a' = (c⁴)^z * (cᵢ²)^(-e) mod N²`.
    fn commitment_a(&self, c4: &BigInt, ci2: &BigInt) -> Result<BigInt, ProofError> {
        let n_squared = self.key.public_key.n_squared();
        let left = c4.modpow(&self.z, n_squared);
        let right =
            exp_signed(ci2, &-&self.e, n_squared).map_err(|_| ProofError::ProofRejected)?;
        Ok((left * right) % n_squared)
    }

    /// `b' = V^z * vᵢ^(-e) mod N²`.
    fn commitment_b(&self) -> Result<BigInt, ProofError> {
        let n_squared = self.key.public_key.n_squared();
        let vi = self
            .key
            .verification_keys
            .get(self.share.id.wrapping_sub(1))
            .ok_or(ProofError::UnknownServer(self.share.id))?;
        let left = self.key.verification_key.modpow(&self.z, n_squared);
        let right = exp_signed(vi, &-&self.e, n_squared).map_err(|_| ProofError::ProofRejected)?;
        Ok((left * right) % n_squared)
    }
}
