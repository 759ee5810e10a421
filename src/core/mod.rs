//! Core restore engine module
//!
//! Provides the single-pass orchestration: resolve, inspect once, walk,
//! mutate per entry.

mod engine;

pub use engine::*;
