//! Top-level module for the Markov chain engine.
//!
//! This module provides:
//! - Sentinel-aware symbols (`Symbol`)
//! - Fixed-order chains and their transition tables (`ChainModel`)
//! - Streaming and parallel training (`trainer`)
//! - Weighted random generation (`Generator`)

/// Fixed-order Markov chain (`order >= 1`).
///
/// Handles sequence ingestion, transition counting and merging.
pub mod chain;

/// Generation parameters (safety cap, worker count).
pub mod config;

/// Weighted random walk over a trained chain.
///
/// Exposes single and concurrent sequence generation with an explicit
/// random source.
pub mod generator;

/// Internal representation of a single context and its transitions.
///
/// Only the read-only `Transitions` view is exposed.
mod state;

/// Tokens wrapped with the START/END sentinels.
pub mod symbol;

/// Feeding token sequences into a chain.
pub mod trainer;

pub use chain::ChainModel;
pub use config::GeneratorConfig;
pub use generator::{Generator, RandomSource};
pub use state::Transitions;
pub use symbol::Symbol;
pub use trainer::{train, train_parallel, TrainingSummary};
