//! Chunk runner: one worker, one chunk, one partial result set.

mod pacing;
mod run;
mod summary;

pub use pacing::{seeded_rng, Pacer};
pub use run::{ChunkOutcome, ChunkRunner, RunnerSettings};
pub use summary::{RunSummary, UrlFailure};
