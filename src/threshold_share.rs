//! The secret key held by a single decryption server.

use num_bigint::{BigInt, Sign};
use num_traits::{Pow, Zero};
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use zeroize::Zeroize;

use crate::decryption_share::PartialDecryption;
use crate::functions::{random_mod, FunctionError};
use crate::oracle::random_oracle_digest;
use crate::pub_key::{Ciphertext, PubKeyError, PublicKey};
use crate::threshold_key::ThresholdPublicKey;
use crate::zk_proof::PartialDecryptionZKP;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),
    #[error("entropy source failure: {0}")]
    EntropyFailure(#[from] FunctionError),
    #[error("self-test encryption failed: {0}")]
    Encryption(#[from] PubKeyError),
    #[error("the share or its verification key is corrupted")]
    InvalidShare,
}

/// Secret key of one decryption server.
///
/// Embeds a copy of the shared public key; `share` is the evaluation of
/// the hiding polynomial at `id` and is wiped on drop. Producing a partial
/// decryption never mutates the key.
#[derive(Debug, Clone)]
pub struct ThresholdSecretKey {
    pub public: ThresholdPublicKey,
    /// This server's identifier, in `[1, l]`.
    pub id: usize,
    /// The secret share `sᵢ = f(id) mod nm`.
    pub share: BigInt,
}

impl Zeroize for ThresholdSecretKey {
    fn zeroize(&mut self) {
        self.share = BigInt::zero();
    }
}

impl Drop for ThresholdSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ThresholdSecretKey {
    pub fn new(public: ThresholdPublicKey, id: usize, share: BigInt) -> Self {
        ThresholdSecretKey { public, id, share }
    }

    /// Materializes a fresh copy of the shared public key. The returned
    /// verification-key vector is independent of this key's copy, so
    /// callers may mutate it freely.
    pub fn public_key(&self) -> ThresholdPublicKey {
        ThresholdPublicKey::new(
            PublicKey::new(self.public.public_key.n.clone()),
            self.public.decryption_servers,
            self.public.threshold,
            self.public.verification_key.clone(),
            self.public.verification_keys.clone(),
        )
    }

    /// This server's contribution to decrypting `ct`:
    /// `cᵢ = c^(2 * delta * sᵢ) mod N²`. The exponent is carried over the
    /// integers, unreduced.
    pub fn partial_decrypt(&self, ct: &Ciphertext) -> Result<PartialDecryption, ShareError> {
        let n_squared = self.public.public_key.n_squared();
        if ct.c <= BigInt::zero() || &ct.c >= n_squared {
            return Err(ShareError::InvalidCiphertext(
                "ciphertext out of bounds".to_string(),
            ));
        }
        let exponent = BigInt::from(2) * self.public.delta() * &self.share;
        Ok(PartialDecryption {
            id: self.id,
            decryption: ct.c.modpow(&exponent, n_squared),
        })
    }

    /// Partial decryption bundled with a zero-knowledge proof that it was
    /// produced with the committed share.
    ///
    /// The sigma protocol commits with a nonce `r` uniform in `[0, N²)`,
    /// derives the challenge from the random oracle over
    /// `(a, b, c⁴, cᵢ²)` and responds with `z = r + e * delta * sᵢ` over
    /// the integers.
    pub fn partial_decryption_with_zkp<R: CryptoRng + RngCore>(
        &self,
        ct: &Ciphertext,
        rng: &mut R,
    ) -> Result<PartialDecryptionZKP, ShareError> {
        let pd = self.partial_decrypt(ct)?;
        let n_squared = self.public.public_key.n_squared();

        let r = random_mod(n_squared, rng)?;
        let c4 = (&ct.c).pow(4u32);
        let a = c4.modpow(&r, n_squared);
        let b = self.public.verification_key.modpow(&r, n_squared);
        let ci2 = (&pd.decryption).pow(2u32);

        let digest = random_oracle_digest(&[&a, &b, &c4, &ci2]);
        let e = BigInt::from_bytes_be(Sign::Plus, &digest);
        let z = &r + &e * self.public.delta() * &self.share;

        Ok(PartialDecryptionZKP {
            share: pd,
            key: self.public_key(),
            c: ct.c.clone(),
            e,
            z,
        })
    }

    /// Self-test for local corruption of the share or verification key:
    /// encrypts a fresh random message under the shared public key, proves
    /// its own partial decryption and verifies the proof.
    pub fn verify_partial_decryption<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<(), ShareError> {
        let m = random_mod(&self.public.public_key.n, rng)?;
        let ct = self.public.public_key.encrypt(&m, rng)?;
        let proof = self.partial_decryption_with_zkp(&ct, rng)?;
        proof.verify().map_err(|_| ShareError::InvalidShare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::ThresholdKeyGenerator;
    use num_traits::One;
    use rand::rngs::OsRng;

    fn literal_key() -> ThresholdSecretKey {
        ThresholdSecretKey::new(
            ThresholdPublicKey::new(
                PublicKey::new(BigInt::from(10403)),
                10,
                6,
                BigInt::one(),
                Vec::new(),
            ),
            9,
            BigInt::from(862),
        )
    }

    fn generated_keys() -> Vec<ThresholdSecretKey> {
        let mut generator = ThresholdKeyGenerator::new(32, 3, 2, OsRng).unwrap();
        generator.generate().unwrap()
    }

    #[test]
    fn partial_decryption_known_value() {
        let key = literal_key();
        let pd = key
            .partial_decrypt(&Ciphertext {
                c: BigInt::from(56),
            })
            .unwrap();
        assert_eq!(pd.id, 9);
        assert_eq!(pd.decryption, BigInt::from(40644522));
    }

    #[test]
    fn out_of_bounds_ciphertexts_are_rejected() {
        let key = literal_key();
        let too_large = Ciphertext {
            c: key.public.public_key.n_squared() + BigInt::one(),
        };
        assert!(matches!(
            key.partial_decrypt(&too_large),
            Err(ShareError::InvalidCiphertext(_))
        ));
        let negative = Ciphertext {
            c: BigInt::from(-1),
        };
        assert!(matches!(
            key.partial_decrypt(&negative),
            Err(ShareError::InvalidCiphertext(_))
        ));
    }

    #[test]
    fn honest_proof_verifies() {
        let keys = generated_keys();
        let pk = keys[0].public_key();
        let ct = pk.encrypt(&BigInt::from(876), &mut OsRng).unwrap();
        let proof = keys[1].partial_decryption_with_zkp(&ct, &mut OsRng).unwrap();
        assert_eq!(proof.verify(), Ok(()));
        assert_eq!(proof.id(), keys[1].id);
    }

    #[test]
    fn self_test_passes_for_honest_keys() {
        for key in generated_keys() {
            assert_eq!(key.verify_partial_decryption(&mut OsRng), Ok(()));
        }
    }

    #[test]
    fn self_test_detects_a_corrupted_key() {
        let keys = generated_keys();
        let mut corrupted = keys[0].clone();
        corrupted.id += 1;
        assert_eq!(
            corrupted.verify_partial_decryption(&mut OsRng),
            Err(ShareError::InvalidShare)
        );
    }

    #[test]
    fn self_test_detects_a_corrupted_share() {
        let keys = generated_keys();
        let mut corrupted = keys[0].clone();
        corrupted.share += BigInt::one();
        assert_eq!(
            corrupted.verify_partial_decryption(&mut OsRng),
            Err(ShareError::InvalidShare)
        );
    }

    #[test]
    fn public_key_copy_is_defensive() {
        let keys = generated_keys();
        let mut copy = keys[0].public_key();
        let original_first = keys[0].public.verification_keys[0].clone();
        copy.verification_keys[0] += BigInt::one();
        assert_eq!(keys[0].public.verification_keys[0], original_first);
        assert_ne!(copy.verification_keys[0], original_first);
    }

    #[test]
    fn zeroize_wipes_the_share() {
        let key = literal_key();
        let mut copy = key.clone();
        copy.zeroize();
        assert_eq!(copy.share, BigInt::zero());
        assert_eq!(copy.id, key.id);
    }
}
