//! Snapgram App - Mutation Layer and Form Workflows
//!
//! Headless client core between the forms and the backend facade.
//!
//! - `cache`: `QueryCache`, keyed results plus the invalidation registry
//! - `mutation`: the `Mutation` trait and `MutationHandle` lifecycle
//! - `mutations`: the five Snapgram writes and the keys they invalidate
//! - `form`: explicit per-field form state
//! - `workflows`: sign-up, sign-in, sign-out and post submission
//! - `ui`: notices and navigation as effects
//!
//! # Consistency policy
//!
//! Invalidation is declared per mutation, not derived from what changed, and
//! only follows a successful write. A write that resolves without a result is
//! a failure: nothing is invalidated and the previous cache contents stay.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use snapgram_app::{QueryCache, SnapgramApp, PostFlow};
//!
//! let app = SnapgramApp::new(client, Arc::new(QueryCache::new()));
//! let mut flow = PostFlow::new(&app, PostAction::Create { user_id });
//! flow.form_mut().set("caption", "Atardecer en el muelle");
//! let outcome = flow.submit(&ui).await;
//! ```

pub mod app;
pub mod cache;
pub mod errors;
pub mod form;
pub mod mutation;
pub mod mutations;
pub mod ui;
pub mod workflows;

pub use app::SnapgramApp;
pub use cache::{CacheKey, CacheStats, InvalidationHandler, InvalidationReport, QueryCache, QueryKeys};
pub use errors::{MutationError, QueryError};
pub use form::FormState;
pub use mutation::{Mutation, MutationHandle, MutationState, MutationStatus};
pub use mutations::{CreatePost, CreateUserAccount, SignInAccount, SignOutAccount, UpdatePost};
pub use ui::{notices, Route, Toast, ToastLevel, TracingUi, UiEffects};
pub use workflows::{Failure, PostFlow, SignInFlow, SignOutFlow, SignUpFlow, SubmitOutcome};
