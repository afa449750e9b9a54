//! Core types for QDMR question decomposition annotation.
//!
//! A decomposition is an ordered list of steps. Each step is a list of
//! tokens, and a token is either a literal word or a back-reference (`#n`)
//! to an earlier step. The [`store::DecompositionStore`] keeps step ids
//! dense across edits, and the [`resolver`] turns the step list into
//! human-readable display strings and machine-readable annotation strings.

pub mod dataset;
pub mod question;
pub mod resolver;
pub mod session;
pub mod step;
pub mod store;
pub mod token;
pub mod vocabulary;
