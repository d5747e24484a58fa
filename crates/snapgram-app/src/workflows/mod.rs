//! Form submission workflows
//!
//! Each flow owns its form state and its own mutation handles, the way a form
//! component would. A submission:
//!
//! 1. validates; on violation it stores per-field errors and stops before any
//!    mutation runs
//! 2. invokes the mutation(s)
//! 3. on failure emits exactly one notice and stays put, so the user can retry
//!    with the same input
//! 4. on success navigates
//!
//! A mutation that resolves without a result counts as a failure here too.

pub mod auth;
pub mod post;

pub use auth::{SignInFlow, SignOutFlow, SignUpFlow};
pub use post::PostFlow;

use snapgram_core::ValidationErrors;

use crate::errors::MutationError;
use crate::ui::{Route, Toast, UiEffects};

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(ValidationErrors),
    /// A notice was shown and no navigation happened.
    Failed(Failure),
    /// Succeeded and navigated to the route.
    Navigated(Route),
}

impl SubmitOutcome {
    /// Whether the submission succeeded.
    pub fn is_navigated(&self) -> bool {
        matches!(self, Self::Navigated(_))
    }

    /// Route navigated to, if any.
    pub fn route(&self) -> Option<&Route> {
        match self {
            Self::Navigated(route) => Some(route),
            _ => None,
        }
    }
}

/// The notice shown and, when a mutation failed, why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Notice title shown
    pub notice: &'static str,
    /// `None` when the failure was not a mutation error
    pub error: Option<MutationError>,
}

fn fail(ui: &dyn UiEffects, notice: &'static str, error: Option<MutationError>) -> SubmitOutcome {
    ui.notify(Toast::error(notice));
    SubmitOutcome::Failed(Failure { notice, error })
}

fn navigate(ui: &dyn UiEffects, route: Route) -> SubmitOutcome {
    ui.navigate(route.clone());
    SubmitOutcome::Navigated(route)
}
