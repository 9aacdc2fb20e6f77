//! Concurrent safe-prime search.
//!
//! A safe prime is a prime `p` with `(p - 1) / 2` also prime. Finding one
//! is the only operation in this crate that can block for seconds to
//! minutes, so the search exposes a concurrency factor and a deadline.
//! Worker threads race to find a candidate and terminate promptly once one
//! of them succeeds or the deadline elapses; parallelism is an
//! optimization, correctness does not depend on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use num_bigint::BigInt;
use rand::rngs::OsRng;
use rand::RngCore;
use rug::integer::{IsPrime, Order};
use rug::rand::RandState;
use rug::Integer;
use thiserror::Error;
use tracing::debug;

use crate::arith::{from_rug, PRIME_TEST_ROUNDS};

/// Number of worker threads used when the caller does not choose one.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Search deadline used when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafePrimeError {
    #[error("bit length {0} is too small for a safe-prime search")]
    InvalidBitLength(usize),
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),
    #[error("safe-prime search did not complete within {0:?}")]
    TimeoutExceeded(Duration),
}

/// Searches for a prime `p` of exactly `bit_length` bits with
/// `q = (p - 1) / 2` also prime, and returns `(p, q)`.
///
/// `concurrency` worker threads (at least one) sample candidates
/// independently; the first hit wins. Returns `TimeoutExceeded` when the
/// deadline elapses and `EntropyFailure` when every worker's RNG failed.
/// Workers observe cancellation between candidates, so the call returns
/// promptly in every outcome.
pub fn generate_safe_primes(
    bit_length: usize,
    concurrency: usize,
    timeout: Duration,
) -> Result<(BigInt, BigInt), SafePrimeError> {
    if bit_length < 4 {
        return Err(SafePrimeError::InvalidBitLength(bit_length));
    }
    let bits = u32::try_from(bit_length).map_err(|_| SafePrimeError::InvalidBitLength(bit_length))?;
    let workers = concurrency.max(1);

    debug!(bit_length, workers, ?timeout, "searching for a safe prime");
    let started = Instant::now();
    let deadline = started + timeout;
    let stop = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = mpsc::channel();

    for _ in 0..workers {
        let stop = Arc::clone(&stop);
        let sender = sender.clone();
        thread::spawn(move || search_worker(bits, &stop, &sender));
    }
    drop(sender);

    let mut failures = 0;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok(Ok((p, q))) => {
                stop.store(true, Ordering::Relaxed);
                debug!(elapsed = ?started.elapsed(), "safe prime found");
                return Ok((from_rug(&p), from_rug(&q)));
            }
            Ok(Err(error)) => {
                failures += 1;
                if failures == workers {
                    stop.store(true, Ordering::Relaxed);
                    return Err(error);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                stop.store(true, Ordering::Relaxed);
                return Err(SafePrimeError::TimeoutExceeded(timeout));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(SafePrimeError::EntropyFailure(
                    "all safe-prime workers exited without a result".into(),
                ));
            }
        }
    }
}

/// Candidate loop run by each worker thread.
///
/// Samples a `(bits - 1)`-bit integer with its top bit forced, advances it
/// to the next prime `q`, and accepts when `q` kept its bit length and
/// `p = 2q + 1` is prime. The stop flag is checked once per candidate.
fn search_worker(
    bits: u32,
    stop: &AtomicBool,
    sender: &mpsc::Sender<Result<(Integer, Integer), SafePrimeError>>,
) {
    let mut seed = [0u8; 32];
    if let Err(error) = OsRng.try_fill_bytes(&mut seed) {
        let _ = sender.send(Err(SafePrimeError::EntropyFailure(error.to_string())));
        return;
    }
    let mut rand_state = RandState::new();
    rand_state.seed(&Integer::from_digits(&seed, Order::Msf));

    while !stop.load(Ordering::Relaxed) {
        let mut q = Integer::from(Integer::random_bits(bits - 1, &mut rand_state));
        q.set_bit(bits - 2, true);
        q.next_prime_mut();
        if q.significant_bits() != bits - 1 {
            continue;
        }
        let p = Integer::from(&q * 2u32) + 1u32;
        if p.is_probably_prime(PRIME_TEST_ROUNDS) != IsPrime::No {
            stop.store(true, Ordering::Relaxed);
            let _ = sender.send(Ok((p, q)));
            return;
        }
    }
}
