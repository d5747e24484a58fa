//! The five Snapgram mutations
//!
//! Each wraps exactly one facade call and declares what it invalidates:
//!
//! | mutation            | invalidates        |
//! |---------------------|--------------------|
//! | create user account | `getUsers`         |
//! | sign in / sign out  | `getCurrentUser`   |
//! | create / update post| `getRecentPosts`   |
//!
//! Inputs are expected to have passed their validation schema already.

use async_trait::async_trait;
use snapgram_core::{
    BackendResult, Credentials, NewPost, NewUser, Post, PostUpdate, Session, SnapgramClient, User,
};

use crate::cache::{CacheKey, QueryKeys};
use crate::mutation::Mutation;

/// Sign-up: account plus profile document.
#[derive(Debug, Clone)]
pub struct CreateUserAccount {
    client: SnapgramClient,
}

impl CreateUserAccount {
    /// Wrap `client`.
    pub fn new(client: SnapgramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mutation for CreateUserAccount {
    type Input = NewUser;
    type Output = User;

    fn name(&self) -> &'static str {
        "create-user-account"
    }

    fn invalidates(&self) -> Vec<CacheKey> {
        vec![QueryKeys::GetUsers.key()]
    }

    async fn execute(&self, input: &NewUser) -> BackendResult<User> {
        self.client.create_user_account(input).await
    }
}

/// Sign-in: open a session.
#[derive(Debug, Clone)]
pub struct SignInAccount {
    client: SnapgramClient,
}

impl SignInAccount {
    /// Wrap `client`.
    pub fn new(client: SnapgramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mutation for SignInAccount {
    type Input = Credentials;
    type Output = Session;

    fn name(&self) -> &'static str {
        "sign-in-account"
    }

    fn invalidates(&self) -> Vec<CacheKey> {
        vec![QueryKeys::GetCurrentUser.key()]
    }

    async fn execute(&self, input: &Credentials) -> BackendResult<Session> {
        self.client.sign_in(input).await
    }
}

/// Sign-out: close the active session.
#[derive(Debug, Clone)]
pub struct SignOutAccount {
    client: SnapgramClient,
}

impl SignOutAccount {
    /// Wrap `client`.
    pub fn new(client: SnapgramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mutation for SignOutAccount {
    type Input = ();
    type Output = ();

    fn name(&self) -> &'static str {
        "sign-out-account"
    }

    fn invalidates(&self) -> Vec<CacheKey> {
        vec![QueryKeys::GetCurrentUser.key()]
    }

    async fn execute(&self, _input: &()) -> BackendResult<()> {
        self.client.sign_out().await
    }
}

/// Publish a post with its media.
#[derive(Debug, Clone)]
pub struct CreatePost {
    client: SnapgramClient,
}

impl CreatePost {
    /// Wrap `client`.
    pub fn new(client: SnapgramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mutation for CreatePost {
    type Input = NewPost;
    type Output = Post;

    fn name(&self) -> &'static str {
        "create-post"
    }

    fn invalidates(&self) -> Vec<CacheKey> {
        vec![QueryKeys::GetRecentPosts.key()]
    }

    async fn execute(&self, input: &NewPost) -> BackendResult<Post> {
        self.client.create_post(input).await
    }
}

/// Edit a post, replacing media only when new files are given.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    client: SnapgramClient,
}

impl UpdatePost {
    /// Wrap `client`.
    pub fn new(client: SnapgramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Mutation for UpdatePost {
    type Input = PostUpdate;
    type Output = Post;

    fn name(&self) -> &'static str {
        "update-post"
    }

    fn invalidates(&self) -> Vec<CacheKey> {
        vec![QueryKeys::GetRecentPosts.key()]
    }

    async fn execute(&self, input: &PostUpdate) -> BackendResult<Post> {
        self.client.update_post(input).await
    }
}
