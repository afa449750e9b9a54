//! Terminal styling for the qdmr annotator.
//!
//! Provides Ayu-themed color helpers and terminal detection for the CLI's
//! human-readable output.

pub mod styles;
pub mod terminal;
