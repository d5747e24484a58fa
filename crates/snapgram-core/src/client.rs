//! Remote client facade
//!
//! One method per remote operation. Each returns `Ok(Some(_))`, a silent
//! failure `Ok(None)`, or a rejection `Err(_)`, exactly as the collaborators
//! report them. The facade never retries, never validates and never touches
//! the query cache.
//!
//! Post writes that upload media clean up after themselves: media uploaded for
//! a write that then fails is deleted, and media replaced by a successful
//! update is deleted.

use std::sync::Arc;

use crate::config::SnapgramConfig;
use crate::effects::{AuthEffects, DocumentEffects, MediaEffects};
use crate::errors::{BackendError, BackendResult};
use crate::types::{
    parse_tags, Credentials, ImageId, NewPost, NewUser, Post, PostDocument, PostUpdate, Session,
    StoredMedia, User, UserProfile,
};

/// Facade over the three backend collaborators.
#[derive(Clone)]
pub struct SnapgramClient {
    auth: Arc<dyn AuthEffects>,
    documents: Arc<dyn DocumentEffects>,
    media: Arc<dyn MediaEffects>,
    recent_posts_limit: usize,
}

impl std::fmt::Debug for SnapgramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapgramClient")
            .field("recent_posts_limit", &self.recent_posts_limit)
            .finish_non_exhaustive()
    }
}

impl SnapgramClient {
    /// Build the facade over the three collaborators.
    pub fn new(
        config: &SnapgramConfig,
        auth: Arc<dyn AuthEffects>,
        documents: Arc<dyn DocumentEffects>,
        media: Arc<dyn MediaEffects>,
    ) -> Self {
        Self {
            auth,
            documents,
            media,
            recent_posts_limit: config.recent_posts_limit,
        }
    }

    /// Create the auth account, then the profile document with an initials
    /// avatar.
    pub async fn create_user_account(&self, user: &NewUser) -> BackendResult<User> {
        let Some(account) = self.auth.create_account(user).await? else {
            tracing::debug!(email = %user.email, "auth provider returned no account");
            return Ok(None);
        };

        let profile = UserProfile {
            account_id: account.id,
            name: account.name,
            username: user.username.clone(),
            email: account.email,
            image_url: self.auth.avatar_url(&user.name),
        };

        self.documents.save_user(&profile).await
    }

    /// Open a session for `credentials`.
    pub async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Session> {
        self.auth.create_session(credentials).await
    }

    /// Close the active session.
    pub async fn sign_out(&self) -> BackendResult<()> {
        self.auth.delete_session().await
    }

    /// Profile of the signed-in user, if the session resolves to one.
    pub async fn current_user(&self) -> BackendResult<User> {
        let Some(account) = self.auth.current_account().await? else {
            return Ok(None);
        };
        self.documents.find_user_by_account(&account.id).await
    }

    /// Upload the first media file and store the post document.
    pub async fn create_post(&self, post: &NewPost) -> BackendResult<Post> {
        let Some(file) = post.files.first() else {
            return Err(BackendError::media_rejected("post has no media file"));
        };

        let Some(media) = self.media.upload(file).await? else {
            return Ok(None);
        };

        let document = PostDocument {
            caption: post.caption.clone(),
            image_id: media.image_id.clone(),
            image_url: media.image_url.clone(),
            location: post.location.clone(),
            tags: parse_tags(&post.tags),
        };

        let result = self.documents.create_post(&post.creator_id, &document).await;
        if !matches!(result, Ok(Some(_))) {
            self.discard_media(&media.image_id).await;
        }
        result
    }

    /// Store new field values. Media is replaced only when the update
    /// carries a file; otherwise the prior `image_id`/`image_url` are kept.
    pub async fn update_post(&self, update: &PostUpdate) -> BackendResult<Post> {
        let replacement = match update.files.first() {
            Some(file) => match self.media.upload(file).await? {
                Some(media) => Some(media),
                None => return Ok(None),
            },
            None => None,
        };

        let StoredMedia {
            image_id,
            image_url,
        } = replacement.clone().unwrap_or_else(|| StoredMedia {
            image_id: update.image_id.clone(),
            image_url: update.image_url.clone(),
        });

        let document = PostDocument {
            caption: update.caption.clone(),
            image_id,
            image_url,
            location: update.location.clone(),
            tags: parse_tags(&update.tags),
        };

        let result = self.documents.update_post(&update.post_id, &document).await;
        match (&result, replacement) {
            (Ok(Some(_)), Some(_)) => self.discard_media(&update.image_id).await,
            (Ok(Some(_)), None) => {}
            (_, Some(media)) => self.discard_media(&media.image_id).await,
            (_, None) => {}
        }
        result
    }

    /// Newest posts, bounded by the configured feed size.
    pub async fn recent_posts(&self) -> BackendResult<Vec<Post>> {
        self.documents.list_posts(self.recent_posts_limit).await
    }

    /// Best-effort media deletion; failures are logged and swallowed.
    async fn discard_media(&self, image_id: &ImageId) {
        match self.media.delete(image_id).await {
            Ok(Some(())) => tracing::debug!(%image_id, "discarded media"),
            Ok(None) => tracing::warn!(%image_id, "media deletion returned no result"),
            Err(e) => tracing::warn!(%image_id, error = %e, "media deletion failed"),
        }
    }
}
