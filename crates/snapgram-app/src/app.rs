//! Application context
//!
//! Bundles the facade with the shared query cache. Mutation handles are minted
//! per consuming flow; reads go through the cache.

use std::sync::Arc;

use snapgram_core::{BackendResult, Post, SnapgramClient, User};

use crate::cache::{QueryCache, QueryKeys};
use crate::errors::QueryError;
use crate::mutation::MutationHandle;
use crate::mutations::{CreatePost, CreateUserAccount, SignInAccount, SignOutAccount, UpdatePost};

/// Client facade and query cache shared by every handle and flow.
#[derive(Debug, Clone)]
pub struct SnapgramApp {
    client: SnapgramClient,
    cache: Arc<QueryCache>,
}

impl SnapgramApp {
    /// Pair a facade with the cache its mutations invalidate.
    pub fn new(client: SnapgramClient, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    /// The remote facade.
    pub fn client(&self) -> &SnapgramClient {
        &self.client
    }

    /// Shared query cache.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Fresh sign-up handle.
    pub fn create_user_account(&self) -> MutationHandle<CreateUserAccount> {
        MutationHandle::new(
            CreateUserAccount::new(self.client.clone()),
            Arc::clone(&self.cache),
        )
    }

    /// Fresh sign-in handle.
    pub fn sign_in_account(&self) -> MutationHandle<SignInAccount> {
        MutationHandle::new(
            SignInAccount::new(self.client.clone()),
            Arc::clone(&self.cache),
        )
    }

    /// Fresh sign-out handle.
    pub fn sign_out_account(&self) -> MutationHandle<SignOutAccount> {
        MutationHandle::new(
            SignOutAccount::new(self.client.clone()),
            Arc::clone(&self.cache),
        )
    }

    /// Fresh post creation handle.
    pub fn create_post(&self) -> MutationHandle<CreatePost> {
        MutationHandle::new(CreatePost::new(self.client.clone()), Arc::clone(&self.cache))
    }

    /// Fresh post update handle.
    pub fn update_post(&self) -> MutationHandle<UpdatePost> {
        MutationHandle::new(UpdatePost::new(self.client.clone()), Arc::clone(&self.cache))
    }

    /// Signed-in user, cached under `getCurrentUser`.
    pub async fn current_user(&self) -> Result<User, QueryError> {
        let client = self.client.clone();
        self.cache
            .fetch(QueryKeys::GetCurrentUser.key(), || async move {
                require(client.current_user().await)
            })
            .await
    }

    /// Whether the current session resolves to a user.
    pub async fn check_auth_user(&self) -> bool {
        match self.current_user().await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session resolved");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "no authenticated user");
                false
            }
        }
    }

    /// Feed, cached under `getRecentPosts`.
    pub async fn recent_posts(&self) -> Result<Vec<Post>, QueryError> {
        let client = self.client.clone();
        self.cache
            .fetch(QueryKeys::GetRecentPosts.key(), || async move {
                require(client.recent_posts().await)
            })
            .await
    }
}

fn require<T>(result: BackendResult<T>) -> Result<T, QueryError> {
    result?.ok_or(QueryError::NoResult)
}
