//! File-backed local backend
//!
//! Stores accounts, profiles, posts and the active session in a single JSON
//! document under the configured data directory, and uploaded media as files
//! next to it:
//!
//! ```text
//! <data_dir>/
//! ├── state.json
//! └── media/<image-id><ext>
//! ```
//!
//! Every write is persisted before the call returns. Passwords are stored as
//! BLAKE3 digests.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use snapgram_core::{
    Account, AccountId, AuthEffects, BackendError, BackendResult, Credentials, DocumentEffects,
    ImageId, MediaEffects, MediaFile, MediaPolicy, NewUser, Post, PostDocument, PostId, Session,
    SessionId, SnapgramConfig, StoredMedia, User, UserId, UserProfile,
};

const STATE_FILE: &str = "state.json";
const MEDIA_DIR: &str = "media";
const SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAccount {
    account: Account,
    password_digest: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalState {
    accounts: Vec<StoredAccount>,
    users: Vec<User>,
    posts: Vec<Post>,
    media: BTreeMap<ImageId, PathBuf>,
    session: Option<Session>,
}

/// Errors opening the local store.
#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    /// Data directory or state file could not be accessed
    #[error("failed to prepare data directory {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// State file is not valid JSON
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        /// The state file
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

/// Auth, document and media collaborators over the local filesystem.
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    endpoint: String,
    media_policy: MediaPolicy,
    state: Mutex<LocalState>,
}

impl LocalBackend {
    /// Open or create the store in `config.data_dir`.
    pub fn open(config: &SnapgramConfig) -> Result<Self, LocalStoreError> {
        let root = config.data_dir.clone();
        let media_dir = root.join(MEDIA_DIR);
        fs::create_dir_all(&media_dir).map_err(|source| LocalStoreError::Io {
            path: media_dir.clone(),
            source,
        })?;

        let state_path = root.join(STATE_FILE);
        let state = match fs::read(&state_path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                LocalStoreError::Corrupt {
                    path: state_path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalState::default(),
            Err(source) => {
                return Err(LocalStoreError::Io {
                    path: state_path,
                    source,
                })
            }
        };

        tracing::debug!(root = %root.display(), "opened local store");
        Ok(Self {
            root,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            media_policy: config.media_policy(),
            state: Mutex::new(state),
        })
    }

    /// Apply `change` to a copy of the state and keep it only once the copy
    /// is on disk. A failed change or write leaves memory and disk as they
    /// were.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut LocalState) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(value)
    }

    fn persist(&self, state: &LocalState) -> Result<(), BackendError> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| BackendError::storage(format!("failed to encode state: {e}")))?;
        let path = self.root.join(STATE_FILE);
        fs::write(&path, bytes)
            .map_err(|e| BackendError::storage(format!("failed to write {}: {e}", path.display())))
    }

    fn media_url(&self, image_id: &ImageId) -> String {
        format!("{}/storage/files/{image_id}/view", self.endpoint)
    }
}

fn digest(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl AuthEffects for LocalBackend {
    async fn create_account(&self, user: &NewUser) -> BackendResult<Account> {
        self.commit(|state| {
            if state.accounts.iter().any(|a| a.account.email == user.email) {
                return Err(BackendError::conflict(format!(
                    "an account for {} already exists",
                    user.email
                )));
            }

            let account = Account {
                id: AccountId::new(fresh_id()),
                name: user.name.clone(),
                email: user.email.clone(),
            };
            state.accounts.push(StoredAccount {
                account: account.clone(),
                password_digest: digest(&user.password),
            });
            Ok(Some(account))
        })
    }

    async fn create_session(&self, credentials: &Credentials) -> BackendResult<Session> {
        let expected = digest(&credentials.password);
        self.commit(|state| {
            let Some(account_id) = state
                .accounts
                .iter()
                .find(|a| a.account.email == credentials.email && a.password_digest == expected)
                .map(|a| a.account.id.clone())
            else {
                return Err(BackendError::unauthorized("invalid email or password"));
            };

            let session = Session {
                id: SessionId::new(fresh_id()),
                account_id,
                expires_at: Utc::now() + Duration::days(SESSION_DAYS),
            };
            state.session = Some(session.clone());
            Ok(Some(session))
        })
    }

    async fn delete_session(&self) -> BackendResult<()> {
        self.commit(|state| match state.session.take() {
            Some(_) => Ok(Some(())),
            None => Err(BackendError::unauthorized("no active session")),
        })
    }

    async fn current_account(&self) -> BackendResult<Account> {
        let state = self.state.lock();
        let Some(session) = state.session.as_ref() else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            tracing::debug!(session_id = %session.id, "session expired");
            return Ok(None);
        }
        Ok(state
            .accounts
            .iter()
            .find(|a| a.account.id == session.account_id)
            .map(|a| a.account.clone()))
    }

    fn avatar_url(&self, name: &str) -> String {
        let initials: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        format!("{}/avatars/initials?name={initials}", self.endpoint)
    }
}

#[async_trait]
impl DocumentEffects for LocalBackend {
    async fn save_user(&self, profile: &UserProfile) -> BackendResult<User> {
        let user = User {
            id: UserId::new(fresh_id()),
            account_id: profile.account_id.clone(),
            name: profile.name.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
            image_url: profile.image_url.clone(),
            bio: None,
        };
        self.commit(|state| {
            state.users.push(user.clone());
            Ok(Some(user))
        })
    }

    async fn find_user_by_account(&self, account_id: &AccountId) -> BackendResult<User> {
        Ok(self
            .state
            .lock()
            .users
            .iter()
            .find(|u| &u.account_id == account_id)
            .cloned())
    }

    async fn create_post(&self, creator_id: &UserId, post: &PostDocument) -> BackendResult<Post> {
        let created = Post {
            id: PostId::new(fresh_id()),
            creator_id: creator_id.clone(),
            caption: post.caption.clone(),
            image_id: post.image_id.clone(),
            image_url: post.image_url.clone(),
            location: post.location.clone(),
            tags: post.tags.clone(),
            created_at: Utc::now(),
        };
        self.commit(|state| {
            state.posts.push(created.clone());
            Ok(Some(created))
        })
    }

    async fn update_post(&self, post_id: &PostId, post: &PostDocument) -> BackendResult<Post> {
        self.commit(|state| {
            let Some(stored) = state.posts.iter_mut().find(|p| &p.id == post_id) else {
                return Err(BackendError::not_found(format!("post {post_id}")));
            };
            stored.caption = post.caption.clone();
            stored.image_id = post.image_id.clone();
            stored.image_url = post.image_url.clone();
            stored.location = post.location.clone();
            stored.tags = post.tags.clone();
            Ok(Some(stored.clone()))
        })
    }

    async fn list_posts(&self, limit: usize) -> BackendResult<Vec<Post>> {
        let mut posts = self.state.lock().posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(Some(posts))
    }
}

#[async_trait]
impl MediaEffects for LocalBackend {
    async fn upload(&self, file: &MediaFile) -> BackendResult<StoredMedia> {
        self.media_policy.check(file)?;
        let image_id = ImageId::new(fresh_id());
        let extension = file.extension().unwrap_or_default();
        let path = self
            .root
            .join(MEDIA_DIR)
            .join(format!("{image_id}{extension}"));
        fs::write(&path, &file.bytes)
            .map_err(|e| BackendError::storage(format!("failed to write {}: {e}", path.display())))?;

        let recorded = self.commit(|state| {
            state.media.insert(image_id.clone(), path.clone());
            Ok(())
        });
        if let Err(e) = recorded {
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove unrecorded media");
            }
            return Err(e);
        }

        tracing::debug!(%image_id, bytes = file.bytes.len(), "stored media");
        Ok(Some(StoredMedia {
            image_url: self.media_url(&image_id),
            image_id,
        }))
    }

    async fn delete(&self, image_id: &ImageId) -> BackendResult<()> {
        self.commit(|state| {
            let Some(path) = state.media.remove(image_id) else {
                return Err(BackendError::not_found(format!("media {image_id}")));
            };
            match fs::remove_file(&path) {
                Ok(()) => Ok(Some(())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Some(())),
                Err(e) => Err(BackendError::storage(format!(
                    "failed to remove {}: {e}",
                    path.display()
                ))),
            }
        })
    }
}
