//! The partial decryption a single server contributes.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// One server's contribution to a threshold decryption:
/// `decryption = c^(2 * delta * share) mod N²`, tagged with the server id.
///
/// Server ids start at 1; id 0 is reserved and never issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDecryption {
    pub id: usize,
    pub decryption: BigInt,
}
