//! Snapgram Testkit
//!
//! Shared fixtures for the integration tests of `snapgram-core` and
//! `snapgram-app`:
//!
//! - [`InMemoryBackend`]: scriptable auth, document and media collaborators
//! - [`RecordingUi`]: captures notices and navigation
//! - [`fixtures`]: sample accounts, posts and media files
//! - [`strategies`]: proptest strategies for form input
//!
//! Not published; only used from `tests/` directories.

#![allow(clippy::unwrap_used)]

pub mod backend;
pub mod fixtures;
pub mod strategies;
pub mod ui;

pub use backend::{Call, Gate, InMemoryBackend, Operation, Scripted};
pub use fixtures::{app_with, client_with, init_tracing, test_config, TestHarness};
pub use ui::{RecordingUi, UiEvent};
