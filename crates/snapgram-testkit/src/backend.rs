//! In-memory backend
//!
//! Implements all three collaborator effects over plain maps. Every call is
//! recorded, and any operation can be scripted to return a silent failure or a
//! rejection, or to wait on a gate, for its next invocation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use snapgram_core::{
    Account, AccountId, AuthEffects, BackendError, BackendResult, Credentials, DocumentEffects,
    ImageId, MediaEffects, MediaFile, MediaPolicy, NewUser, Post, PostDocument, PostId, Session,
    SessionId, StoredMedia, User, UserId, UserProfile,
};

/// Backend operations that can be scripted and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `AuthEffects::create_account`
    CreateAccount,
    /// `AuthEffects::create_session`
    CreateSession,
    /// `AuthEffects::delete_session`
    DeleteSession,
    /// `AuthEffects::current_account`
    CurrentAccount,
    /// `DocumentEffects::save_user`
    SaveUser,
    /// `DocumentEffects::find_user_by_account`
    FindUser,
    /// `DocumentEffects::create_post`
    CreatePost,
    /// `DocumentEffects::update_post`
    UpdatePost,
    /// `DocumentEffects::list_posts`
    ListPosts,
    /// `MediaEffects::upload`
    Upload,
    /// `MediaEffects::delete`
    DeleteMedia,
}

/// Forced result for the next call of an operation.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Resolve with no result.
    NoResult,
    /// Reject with this error.
    Reject(BackendError),
}

/// One recorded call with the arguments that matter to assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Sign-up for this email
    CreateAccount {
        /// Submitted email
        email: String,
    },
    /// Sign-in attempt
    CreateSession {
        /// Submitted email
        email: String,
    },
    /// Sign-out
    DeleteSession,
    /// Session lookup
    CurrentAccount,
    /// Profile document written
    SaveUser(UserProfile),
    /// Profile lookup by account
    FindUser(AccountId),
    /// Post document created
    CreatePost {
        /// Author
        creator_id: UserId,
        /// Fields as sent
        document: PostDocument,
    },
    /// Post document rewritten
    UpdatePost {
        /// Target post
        post_id: PostId,
        /// Fields as sent
        document: PostDocument,
    },
    /// Feed read
    ListPosts {
        /// Requested page size
        limit: usize,
    },
    /// Media upload
    Upload {
        /// Name of the uploaded file
        file_name: String,
    },
    /// Media deletion
    DeleteMedia(ImageId),
}

impl Call {
    /// Operation this call was made through.
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateAccount { .. } => Operation::CreateAccount,
            Self::CreateSession { .. } => Operation::CreateSession,
            Self::DeleteSession => Operation::DeleteSession,
            Self::CurrentAccount => Operation::CurrentAccount,
            Self::SaveUser(_) => Operation::SaveUser,
            Self::FindUser(_) => Operation::FindUser,
            Self::CreatePost { .. } => Operation::CreatePost,
            Self::UpdatePost { .. } => Operation::UpdatePost,
            Self::ListPosts { .. } => Operation::ListPosts,
            Self::Upload { .. } => Operation::Upload,
            Self::DeleteMedia(_) => Operation::DeleteMedia,
        }
    }
}

/// Opens a paused operation.
#[derive(Debug, Clone)]
pub struct Gate(Arc<Notify>);

impl Gate {
    /// Let the paused call proceed.
    pub fn open(&self) {
        self.0.notify_one();
    }
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<(Account, String)>,
    users: Vec<User>,
    posts: Vec<Post>,
    media: HashMap<ImageId, MediaFile>,
    session: Option<Session>,
    scripted: HashMap<Operation, VecDeque<Scripted>>,
    gates: HashMap<Operation, VecDeque<Arc<Notify>>>,
    calls: Vec<Call>,
    next_id: u64,
}

impl State {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Shared in-memory stand-in for auth, documents and media.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    media_policy: MediaPolicy,
}

impl InMemoryBackend {
    /// Empty backend with the default media policy.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next call of `op` resolve with no result.
    pub fn fail_next(&self, op: Operation) {
        self.script(op, Scripted::NoResult);
    }

    /// Make the next call of `op` reject with `error`.
    pub fn reject_next(&self, op: Operation, error: BackendError) {
        self.script(op, Scripted::Reject(error));
    }

    /// Queue `outcome` for the next unscripted call of `op`.
    pub fn script(&self, op: Operation, outcome: Scripted) {
        self.state
            .lock()
            .scripted
            .entry(op)
            .or_default()
            .push_back(outcome);
    }

    /// Hold the next call of `op` until the returned gate is opened.
    pub fn pause_next(&self, op: Operation) -> Gate {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .gates
            .entry(op)
            .or_default()
            .push_back(Arc::clone(&notify));
        Gate(notify)
    }

    /// Every call so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Calls made through `op`.
    pub fn calls_to(&self, op: Operation) -> Vec<Call> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation() == op)
            .cloned()
            .collect()
    }

    /// Number of calls made through `op`.
    pub fn call_count(&self, op: Operation) -> usize {
        self.calls_to(op).len()
    }

    /// Stored posts, insertion order.
    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().posts.clone()
    }

    /// Stored profiles.
    pub fn users(&self) -> Vec<User> {
        self.state.lock().users.clone()
    }

    /// Whether `image_id` is still stored.
    pub fn has_media(&self, image_id: &ImageId) -> bool {
        self.state.lock().media.contains_key(image_id)
    }

    /// Number of stored media files.
    pub fn media_count(&self) -> usize {
        self.state.lock().media.len()
    }

    /// Active session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    /// Insert an existing post together with its stored media.
    pub fn seed_post(&self, post: Post) {
        let mut state = self.state.lock();
        state.media.insert(
            post.image_id.clone(),
            MediaFile::new(format!("{}.png", post.image_id), "image/png", vec![0]),
        );
        state.posts.push(post);
    }

    /// Register an account with a profile without going through the facade.
    pub fn seed_user(&self, user: &NewUser) -> User {
        let mut state = self.state.lock();
        let account = Account {
            id: AccountId::new(state.mint("account")),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        let profile = User {
            id: UserId::new(state.mint("user")),
            account_id: account.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: avatar_url(&user.name),
            bio: None,
        };
        state.accounts.push((account, user.password.clone()));
        state.users.push(profile.clone());
        profile
    }

    /// Record `call`, wait on any gate, then apply a scripted outcome if one
    /// is queued. `None` means proceed normally.
    async fn begin<T>(&self, call: Call) -> Option<BackendResult<T>> {
        let op = call.operation();
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.gates.get_mut(&op).and_then(VecDeque::pop_front)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self
            .state
            .lock()
            .scripted
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        scripted.map(|outcome| match outcome {
            Scripted::NoResult => Ok(None),
            Scripted::Reject(e) => Err(e),
        })
    }
}

fn avatar_url(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    format!("memory://avatars/initials?name={initials}")
}

#[async_trait]
impl AuthEffects for InMemoryBackend {
    async fn create_account(&self, user: &NewUser) -> BackendResult<Account> {
        if let Some(scripted) = self
            .begin(Call::CreateAccount {
                email: user.email.clone(),
            })
            .await
        {
            return scripted;
        }

        let mut state = self.state.lock();
        if state.accounts.iter().any(|(a, _)| a.email == user.email) {
            return Err(BackendError::conflict(format!(
                "account {} already exists",
                user.email
            )));
        }
        let account = Account {
            id: AccountId::new(state.mint("account")),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        state.accounts.push((account.clone(), user.password.clone()));
        Ok(Some(account))
    }

    async fn create_session(&self, credentials: &Credentials) -> BackendResult<Session> {
        if let Some(scripted) = self
            .begin(Call::CreateSession {
                email: credentials.email.clone(),
            })
            .await
        {
            return scripted;
        }

        let mut state = self.state.lock();
        let account_id = state
            .accounts
            .iter()
            .find(|(a, password)| a.email == credentials.email && *password == credentials.password)
            .map(|(a, _)| a.id.clone())
            .ok_or_else(|| BackendError::unauthorized("invalid credentials"))?;

        let session = Session {
            id: SessionId::new(state.mint("session")),
            account_id,
            expires_at: Utc::now() + Duration::days(365),
        };
        state.session = Some(session.clone());
        Ok(Some(session))
    }

    async fn delete_session(&self) -> BackendResult<()> {
        if let Some(scripted) = self.begin(Call::DeleteSession).await {
            return scripted;
        }

        match self.state.lock().session.take() {
            Some(_) => Ok(Some(())),
            None => Err(BackendError::unauthorized("no active session")),
        }
    }

    async fn current_account(&self) -> BackendResult<Account> {
        if let Some(scripted) = self.begin(Call::CurrentAccount).await {
            return scripted;
        }

        let state = self.state.lock();
        let Some(session) = &state.session else {
            return Ok(None);
        };
        Ok(state
            .accounts
            .iter()
            .find(|(a, _)| a.id == session.account_id)
            .map(|(a, _)| a.clone()))
    }

    fn avatar_url(&self, name: &str) -> String {
        avatar_url(name)
    }
}

#[async_trait]
impl DocumentEffects for InMemoryBackend {
    async fn save_user(&self, profile: &UserProfile) -> BackendResult<User> {
        if let Some(scripted) = self.begin(Call::SaveUser(profile.clone())).await {
            return scripted;
        }

        let mut state = self.state.lock();
        let user = User {
            id: UserId::new(state.mint("user")),
            account_id: profile.account_id.clone(),
            name: profile.name.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
            image_url: profile.image_url.clone(),
            bio: None,
        };
        state.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_account(&self, account_id: &AccountId) -> BackendResult<User> {
        if let Some(scripted) = self.begin(Call::FindUser(account_id.clone())).await {
            return scripted;
        }

        Ok(self
            .state
            .lock()
            .users
            .iter()
            .find(|u| &u.account_id == account_id)
            .cloned())
    }

    async fn create_post(&self, creator_id: &UserId, post: &PostDocument) -> BackendResult<Post> {
        if let Some(scripted) = self
            .begin(Call::CreatePost {
                creator_id: creator_id.clone(),
                document: post.clone(),
            })
            .await
        {
            return scripted;
        }

        let mut state = self.state.lock();
        let created = Post {
            id: PostId::new(state.mint("post")),
            creator_id: creator_id.clone(),
            caption: post.caption.clone(),
            image_id: post.image_id.clone(),
            image_url: post.image_url.clone(),
            location: post.location.clone(),
            tags: post.tags.clone(),
            created_at: Utc::now(),
        };
        state.posts.push(created.clone());
        Ok(Some(created))
    }

    async fn update_post(&self, post_id: &PostId, post: &PostDocument) -> BackendResult<Post> {
        if let Some(scripted) = self
            .begin(Call::UpdatePost {
                post_id: post_id.clone(),
                document: post.clone(),
            })
            .await
        {
            return scripted;
        }

        let mut state = self.state.lock();
        let stored = state
            .posts
            .iter_mut()
            .find(|p| &p.id == post_id)
            .ok_or_else(|| BackendError::not_found(format!("post {post_id}")))?;
        stored.caption = post.caption.clone();
        stored.image_id = post.image_id.clone();
        stored.image_url = post.image_url.clone();
        stored.location = post.location.clone();
        stored.tags = post.tags.clone();
        Ok(Some(stored.clone()))
    }

    async fn list_posts(&self, limit: usize) -> BackendResult<Vec<Post>> {
        if let Some(scripted) = self.begin(Call::ListPosts { limit }).await {
            return scripted;
        }

        let mut posts = self.state.lock().posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(Some(posts))
    }
}

#[async_trait]
impl MediaEffects for InMemoryBackend {
    async fn upload(&self, file: &MediaFile) -> BackendResult<StoredMedia> {
        if let Some(scripted) = self
            .begin(Call::Upload {
                file_name: file.file_name.clone(),
            })
            .await
        {
            return scripted;
        }

        self.media_policy.check(file)?;
        let mut state = self.state.lock();
        let image_id = ImageId::new(state.mint("image"));
        let image_url = format!("memory://media/{image_id}");
        state.media.insert(image_id.clone(), file.clone());
        Ok(Some(StoredMedia {
            image_id,
            image_url,
        }))
    }

    async fn delete(&self, image_id: &ImageId) -> BackendResult<()> {
        if let Some(scripted) = self.begin(Call::DeleteMedia(image_id.clone())).await {
            return scripted;
        }

        match self.state.lock().media.remove(image_id) {
            Some(_) => Ok(Some(())),
            None => Err(BackendError::not_found(format!("media {image_id}"))),
        }
    }
}
