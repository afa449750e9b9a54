//! Command handlers, one module per `qdmr` subcommand.

pub mod annotate;
pub mod completion;
pub mod config_cmd;
pub mod init;
pub mod list;
pub mod question;
pub mod render;
pub mod version;
