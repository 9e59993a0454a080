//! Finite-order Markov chain engine.
//!
//! This crate trains Markov chains over arbitrary token sequences and samples
//! new sequences from them:
//! - Chain model with START/END padded transition counting
//! - Streaming and multithreaded training
//! - Reproducible weighted random generation with a safety cap
//! - JSON interchange format and compact binary snapshots
//!
//! The engine holds no global state: the model, the token stream and the
//! random source are always passed explicitly.

/// Chains, training and generation.
pub mod model;

/// Serialization of a trained chain.
pub mod codec;

mod error;

pub use error::{ChainError, Result};
pub use model::{ChainModel, Generator, GeneratorConfig, RandomSource, Symbol};
