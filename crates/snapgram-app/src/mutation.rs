//! Mutation layer
//!
//! Adapts a single facade call into a stateful action with an explicit
//! lifecycle and a declared post-success invalidation rule.
//!
//! ```text
//! Idle ──mutate──▶ Pending ──Some(v)──▶ Success   (invalidate declared keys)
//!                     │
//!                     └────None / Err──▶ Error     (cache untouched)
//! ```
//!
//! The settled state is recorded before the declared keys are invalidated, so
//! invalidation handlers already observe Success.
//!
//! Success and Error end one invocation; calling `mutate` again re-enters
//! Pending and drops the previous result. Only the latest invocation is
//! observable on a handle: if an earlier call settles after a later one
//! started, its result is returned to its own caller but not recorded. The
//! invalidation rule still applies to it, since the write did happen.
//!
//! There is no cancellation. Dropping the future of a pending call leaves the
//! handle Pending until the next invocation.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use snapgram_core::BackendResult;

use crate::cache::{CacheKey, QueryCache};
use crate::errors::MutationError;

/// Lifecycle of a mutation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MutationStatus {
    /// Never invoked, or reset
    #[default]
    Idle,
    /// Latest invocation in flight
    Pending,
    /// Latest invocation returned a value
    Success,
    /// Latest invocation failed
    Error,
}

impl MutationStatus {
    /// `Success` or `Error`.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// A named write wrapping one facade call.
#[async_trait]
pub trait Mutation: Send + Sync + 'static {
    /// Argument of one invocation
    type Input: Send + Sync + 'static;
    /// Value produced on success
    type Output: Clone + Send + Sync + 'static;

    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Keys invalidated after every successful invocation.
    fn invalidates(&self) -> Vec<CacheKey> {
        Vec::new()
    }

    /// Perform the remote write.
    async fn execute(&self, input: &Self::Input) -> BackendResult<Self::Output>;
}

/// Observable state of a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationState<T> {
    /// Lifecycle status
    pub status: MutationStatus,
    /// Output of the last successful invocation
    pub data: Option<T>,
    /// Error of the last failed invocation
    pub error: Option<MutationError>,
    /// Number of invocations started so far
    pub invocation: u64,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
            invocation: 0,
        }
    }
}

/// Independently invocable wrapper around one [`Mutation`].
///
/// Handles are cheap; each consuming flow should own its own so that their
/// statuses do not interfere.
pub struct MutationHandle<M: Mutation> {
    mutation: M,
    cache: Arc<QueryCache>,
    state: Mutex<MutationState<M::Output>>,
}

impl<M: Mutation> std::fmt::Debug for MutationHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MutationHandle")
            .field("mutation", &self.mutation.name())
            .field("status", &state.status)
            .field("invocation", &state.invocation)
            .finish()
    }
}

impl<M: Mutation> MutationHandle<M> {
    /// Idle handle for `mutation` that invalidates `cache`.
    pub fn new(mutation: M, cache: Arc<QueryCache>) -> Self {
        Self {
            mutation,
            cache,
            state: Mutex::new(MutationState::default()),
        }
    }

    /// Name of the wrapped mutation, for logs.
    pub fn name(&self) -> &'static str {
        self.mutation.name()
    }

    /// Run the mutation once.
    ///
    /// A `None` result is an error even though the call did not reject.
    pub async fn mutate(&self, input: M::Input) -> Result<M::Output, MutationError> {
        let invocation = {
            let mut state = self.state.lock();
            state.invocation += 1;
            state.status = MutationStatus::Pending;
            state.data = None;
            state.error = None;
            state.invocation
        };
        tracing::debug!(mutation = self.name(), invocation, "mutation pending");

        let outcome = match self.mutation.execute(&input).await {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(MutationError::NoResult),
            Err(e) => Err(MutationError::Rejected(e)),
        };

        match &outcome {
            Ok(_) => tracing::info!(mutation = self.name(), invocation, "mutation succeeded"),
            Err(e) => {
                tracing::warn!(mutation = self.name(), invocation, error = %e, "mutation failed");
            }
        }

        self.record(invocation, &outcome);

        if outcome.is_ok() {
            for key in self.mutation.invalidates() {
                self.cache.invalidate(&key);
            }
        }

        outcome
    }

    /// Settle `invocation` unless a later one has started.
    fn record(&self, invocation: u64, outcome: &Result<M::Output, MutationError>) {
        let mut state = self.state.lock();
        if state.invocation != invocation {
            tracing::debug!(
                mutation = self.name(),
                invocation,
                current = state.invocation,
                "superseded settlement not recorded"
            );
            return;
        }
        match outcome {
            Ok(output) => {
                state.status = MutationStatus::Success;
                state.data = Some(output.clone());
            }
            Err(e) => {
                state.status = MutationStatus::Error;
                state.error = Some(e.clone());
            }
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> MutationStatus {
        self.state.lock().status
    }

    /// Whether the latest invocation is still in flight.
    pub fn is_pending(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    /// Result of the current invocation, once it succeeded.
    pub fn data(&self) -> Option<M::Output> {
        self.state.lock().data.clone()
    }

    /// Failure of the current invocation, once it failed.
    pub fn error(&self) -> Option<MutationError> {
        self.state.lock().error.clone()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MutationState<M::Output> {
        self.state.lock().clone()
    }

    /// Back to Idle. The invocation counter keeps counting so a pending
    /// call that settles later is treated as superseded.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let invocation = state.invocation + 1;
        *state = MutationState {
            invocation,
            ..MutationState::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKeys;
    use snapgram_core::BackendError;
    use std::collections::VecDeque;

    /// Replays scripted outcomes in order.
    struct Scripted {
        outcomes: Mutex<VecDeque<BackendResult<u32>>>,
        keys: Vec<CacheKey>,
    }

    impl Scripted {
        fn new(outcomes: Vec<BackendResult<u32>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                keys: vec![QueryKeys::GetRecentPosts.key()],
            }
        }
    }

    #[async_trait]
    impl Mutation for Scripted {
        type Input = ();
        type Output = u32;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn invalidates(&self) -> Vec<CacheKey> {
            self.keys.clone()
        }

        async fn execute(&self, _input: &()) -> BackendResult<u32> {
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or(Err(BackendError::internal("script exhausted")))
        }
    }

    fn handle(outcomes: Vec<BackendResult<u32>>) -> (MutationHandle<Scripted>, Arc<QueryCache>) {
        let cache = Arc::new(QueryCache::new());
        (
            MutationHandle::new(Scripted::new(outcomes), Arc::clone(&cache)),
            cache,
        )
    }

    #[tokio::test]
    async fn starts_idle() {
        let (handle, _) = handle(vec![]);
        assert_eq!(handle.status(), MutationStatus::Idle);
        assert_eq!(handle.snapshot(), MutationState::default());
    }

    #[tokio::test]
    async fn success_records_data_and_invalidates_once() {
        let (handle, cache) = handle(vec![Ok(Some(7))]);
        cache.set(QueryKeys::GetRecentPosts.key(), vec![1_u32]);

        assert_eq!(handle.mutate(()).await, Ok(7));
        assert_eq!(handle.status(), MutationStatus::Success);
        assert_eq!(handle.data(), Some(7));
        assert_eq!(handle.error(), None);
        assert_eq!(cache.invalidation_count(&QueryKeys::GetRecentPosts.key()), 1);
        assert!(cache.is_stale(&QueryKeys::GetRecentPosts.key()));
    }

    #[tokio::test]
    async fn none_is_an_error_without_invalidation() {
        let (handle, cache) = handle(vec![Ok(None)]);
        cache.set(QueryKeys::GetRecentPosts.key(), vec![1_u32]);

        assert_eq!(handle.mutate(()).await, Err(MutationError::NoResult));
        assert_eq!(handle.status(), MutationStatus::Error);
        assert_eq!(handle.error(), Some(MutationError::NoResult));
        assert_eq!(cache.invalidation_count(&QueryKeys::GetRecentPosts.key()), 0);
        assert_eq!(
            cache.get::<Vec<u32>>(&QueryKeys::GetRecentPosts.key()),
            Some(vec![1])
        );
    }

    #[tokio::test]
    async fn rejection_is_an_error_without_invalidation() {
        let (handle, cache) = handle(vec![Err(BackendError::network("offline"))]);

        let err = handle.mutate(()).await.unwrap_err();
        assert!(!err.is_silent());
        assert_eq!(handle.status(), MutationStatus::Error);
        assert_eq!(cache.stats().invalidations, 0);
    }

    #[tokio::test]
    async fn reinvoking_replaces_the_previous_result() {
        let (handle, cache) = handle(vec![Ok(Some(1)), Ok(None), Ok(Some(3))]);

        handle.mutate(()).await.unwrap();
        assert_eq!(handle.data(), Some(1));

        handle.mutate(()).await.unwrap_err();
        assert_eq!(handle.data(), None);
        assert_eq!(handle.status(), MutationStatus::Error);

        handle.mutate(()).await.unwrap();
        assert_eq!(handle.data(), Some(3));
        assert_eq!(handle.error(), None);
        assert_eq!(handle.snapshot().invocation, 3);
        assert_eq!(cache.invalidation_count(&QueryKeys::GetRecentPosts.key()), 2);
    }

    #[tokio::test]
    async fn handlers_observe_the_recorded_success() {
        let (handle, cache) = handle(vec![Ok(Some(5))]);
        let handle = Arc::new(handle);
        let seen = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&handle);
        let observed = Arc::clone(&seen);
        cache.on_invalidate(
            QueryKeys::GetRecentPosts.key(),
            Arc::new(move |_: &CacheKey| {
                if let Some(handle) = weak.upgrade() {
                    *observed.lock() = Some((handle.status(), handle.data()));
                }
            }),
        );

        handle.mutate(()).await.unwrap();
        assert_eq!(*seen.lock(), Some((MutationStatus::Success, Some(5))));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let (handle, _) = handle(vec![Ok(Some(1))]);
        handle.mutate(()).await.unwrap();
        handle.reset();
        assert_eq!(handle.status(), MutationStatus::Idle);
        assert_eq!(handle.data(), None);
        assert!(!handle.status().is_settled());
    }
}
