//! Named random streams
//!
//! Every stochastic input of the network (arrivals, each stage's service times,
//! the discharge decision, and care-area routing) draws from its own generator,
//! so advancing one stream never shifts the values another stream produces.

use crate::types::Stream;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Source of random deviates, one independent sequence per [`Stream`]
///
/// The simulator only talks to this trait, so tests can replace the seeded
/// implementation with scripted values.
pub trait RandomStreams {
    /// Uniform deviate in `[0, 1)` from the given stream
    fn draw_uniform(&mut self, stream: Stream) -> f64;

    /// Exponential deviate with the given mean from the given stream
    ///
    /// Means are checked during configuration validation; an infinite mean
    /// yields `f64::INFINITY`.
    fn draw_exponential(&mut self, stream: Stream, mean: f64) -> f64 {
        let u = self.draw_uniform(stream);
        exponential_from_uniform(u, mean)
    }
}

/// Inverse transform of a uniform `[0, 1)` deviate into an exponential one
pub fn exponential_from_uniform(u: f64, mean: f64) -> f64 {
    if mean.is_infinite() {
        return f64::INFINITY;
    }
    // 1 - u lies in (0, 1], so the log is finite and non-positive.
    // Adding 0.0 turns the -0.0 produced at u == 0 into 0.0.
    mean * -(1.0 - u).ln() + 0.0
}

/// ChaCha8-backed streams derived from one base seed
///
/// Each stream uses the same key with a distinct ChaCha stream number, which
/// gives non-overlapping sequences that are identical on every platform.
#[derive(Debug, Clone)]
pub struct SeededStreams {
    seed: u64,
    generators: [ChaCha8Rng; Stream::ALL.len()],
}

impl SeededStreams {
    /// Create all streams from a base seed
    pub fn new(seed: u64) -> Self {
        debug!(seed, streams = Stream::ALL.len(), "Seeding random streams");
        let generators = Stream::ALL.map(|stream| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(stream.index() as u64);
            rng
        });
        Self { seed, generators }
    }

    /// Base seed these streams were derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomStreams for SeededStreams {
    fn draw_uniform(&mut self, stream: Stream) -> f64 {
        self.generators[stream.index()].gen::<f64>()
    }
}
