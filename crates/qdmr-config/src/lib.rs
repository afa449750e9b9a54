//! Configuration management for the qdmr annotator.
//!
//! This crate handles loading and saving `.qdmr/config.yaml` files,
//! discovering `.qdmr/` directories in the filesystem, and providing
//! typed access to configuration values.

pub mod config;
pub mod qdmr_dir;
