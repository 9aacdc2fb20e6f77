//! Threshold Paillier cryptosystem.
//!
//! An additively homomorphic public-key encryption scheme whose decryption
//! capability is split across `l` servers so that any `w <= l` of them can
//! jointly recover a plaintext, while fewer than `w` learn nothing. Key
//! generation, encryption, share decryption and share combining follow:
//!
//! [Damgård, Jurik and Nielsen, 2010](https://people.csail.mit.edu/rivest/voting/papers/DamgardJurikNielsen-AGeneralizationOfPailliersPublicKeySystemWithApplicationsToElectronicVoting.pdf),
//! section 5.1, restricted to the s = 1 (mod N²) instantiation.
//!
//! # Example
//! ```no_run
//! use num_bigint::BigInt;
//! use rand::rngs::OsRng;
//! use paillier_threshold::ThresholdKeyGenerator;
//!
//! let mut generator = ThresholdKeyGenerator::new(2048, 5, 3, OsRng).unwrap();
//! let keys = generator.generate().unwrap();
//! let public_key = keys[0].public_key();
//!
//! let ciphertext = public_key.encrypt(&BigInt::from(42), &mut OsRng).unwrap();
//! let shares: Vec<_> = keys
//!     .iter()
//!     .take(3)
//!     .map(|key| key.partial_decrypt(&ciphertext).unwrap())
//!     .collect();
//! let plaintext = public_key.combine_partial_decryptions(&shares).unwrap();
//! assert_eq!(plaintext, BigInt::from(42));
//! ```

pub mod arith;
pub mod decryption_key;
pub mod decryption_share;
pub mod functions;
pub mod keygen;
pub mod oracle;
pub mod polynomial;
pub mod pub_key;
pub mod safe_primes;
pub mod threshold_key;
pub mod threshold_share;
pub mod zk_proof;

pub use decryption_key::DecryptionKey;
pub use decryption_share::PartialDecryption;
pub use keygen::ThresholdKeyGenerator;
pub use pub_key::{Ciphertext, PublicKey};
pub use threshold_key::ThresholdPublicKey;
pub use threshold_share::ThresholdSecretKey;
pub use zk_proof::PartialDecryptionZKP;
