//! Collaborator effect traits
//!
//! The hosted backend is split into three effects: authentication, document
//! storage and media storage. Every method is one remote round trip and
//! returns a [`BackendResult`]: `Ok(Some(_))` on success, `Ok(None)` when the
//! backend answered without a usable result, `Err(_)` when the call was
//! rejected. Implementations never retry and never validate input.

use async_trait::async_trait;

use crate::errors::BackendResult;
use crate::types::{
    Account, AccountId, Credentials, ImageId, MediaFile, NewUser, Post, PostDocument, PostId,
    Session, StoredMedia, User, UserId, UserProfile,
};

/// Authentication provider.
#[async_trait]
pub trait AuthEffects: Send + Sync {
    /// Create an email/password account.
    async fn create_account(&self, user: &NewUser) -> BackendResult<Account>;

    /// Open a session for `credentials`.
    async fn create_session(&self, credentials: &Credentials) -> BackendResult<Session>;

    /// Close the current session.
    async fn delete_session(&self) -> BackendResult<()>;

    /// Account owning the current session.
    async fn current_account(&self) -> BackendResult<Account>;

    /// Avatar image URL generated from the user's initials.
    fn avatar_url(&self, name: &str) -> String;
}

/// Document database.
#[async_trait]
pub trait DocumentEffects: Send + Sync {
    /// Store the profile document for a new account.
    async fn save_user(&self, profile: &UserProfile) -> BackendResult<User>;

    /// Profile owned by `account_id`.
    async fn find_user_by_account(&self, account_id: &AccountId) -> BackendResult<User>;

    /// Store a new post by `creator_id`.
    async fn create_post(&self, creator_id: &UserId, post: &PostDocument) -> BackendResult<Post>;

    /// Overwrite the fields of an existing post.
    async fn update_post(&self, post_id: &PostId, post: &PostDocument) -> BackendResult<Post>;

    /// Newest first, at most `limit`.
    async fn list_posts(&self, limit: usize) -> BackendResult<Vec<Post>>;
}

/// Object storage for post media.
#[async_trait]
pub trait MediaEffects: Send + Sync {
    /// Store `file` and return where it lives.
    async fn upload(&self, file: &MediaFile) -> BackendResult<StoredMedia>;

    /// Remove stored media.
    async fn delete(&self, image_id: &ImageId) -> BackendResult<()>;
}
