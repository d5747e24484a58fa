//! Snapgram command-line client
//!
//! Drives the `snapgram-app` workflows against [`local::LocalBackend`], a
//! single-user backend kept on disk.

pub mod commands;
pub mod local;

pub use commands::{build_app, run, Command};
pub use local::{LocalBackend, LocalStoreError};
