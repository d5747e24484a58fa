//! Domain types shared by the facade, the mutation layer and the backends.
//!
//! Identifiers are opaque strings minted by the backend. Form-side values
//! (`Credentials`, `NewUser`, `PostFields`) are owned by the caller until they
//! are handed to the facade; stored values (`Account`, `User`, `Post`) come
//! back from the collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a backend-issued identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of an authentication account.
    AccountId
);
string_id!(
    /// Identifier of a user profile document.
    UserId
);
string_id!(
    /// Identifier of a post document.
    PostId
);
string_id!(
    /// Identifier of a stored media file.
    ImageId
);
string_id!(
    /// Identifier of an authenticated session.
    SessionId
);

// ============================================================================
// Auth
// ============================================================================

/// Email/password pair for a single sign-in attempt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Plain text; never logged
    pub password: String,
}

impl Credentials {
    /// Pair an email with a password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up form submission.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Public handle
    pub username: String,
    /// Login email
    pub email: String,
    /// Plain text; never logged
    pub password: String,
}

impl NewUser {
    /// Collect the sign-up fields.
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Credentials used to open a session right after the account exists.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication account as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Backend-issued id
    pub id: AccountId,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
}

/// Established session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend-issued id
    pub id: SessionId,
    /// Account the session belongs to
    pub account_id: AccountId,
    /// After this instant the session no longer resolves
    pub expires_at: DateTime<Utc>,
}

/// Profile document stored alongside each account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-issued id
    pub id: UserId,
    /// Auth account this profile belongs to
    pub account_id: AccountId,
    /// Display name
    pub name: String,
    /// Public handle
    pub username: String,
    /// Login email
    pub email: String,
    /// Avatar
    pub image_url: String,
    /// Free-form profile text
    #[serde(default)]
    pub bio: Option<String>,
}

/// Profile fields written when an account is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning account
    pub account_id: AccountId,
    /// Display name
    pub name: String,
    /// Public handle
    pub username: String,
    /// Login email
    pub email: String,
    /// Initials avatar from the auth collaborator
    pub image_url: String,
}

// ============================================================================
// Media
// ============================================================================

/// A file picked or dropped by the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Name as picked, extension included
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Raw contents
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Wrap picked file contents.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension including the leading dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_ascii_lowercase()))
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Location of an uploaded file in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    /// Stored media id
    pub image_id: ImageId,
    /// Public view URL
    pub image_url: String,
}

// ============================================================================
// Posts
// ============================================================================

/// Post document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Backend-issued id
    pub id: PostId,
    /// Author's profile
    pub creator_id: UserId,
    /// Post text
    pub caption: String,
    /// Stored media id
    pub image_id: ImageId,
    /// Public view URL
    pub image_url: String,
    /// Where it was taken
    pub location: String,
    /// Trimmed, non-empty
    pub tags: Vec<String>,
    /// Creation time, set by the backend
    pub created_at: DateTime<Utc>,
}

/// Raw post form values, before the action is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFields {
    /// Post text
    pub caption: String,
    /// Picked media; only the first is uploaded
    pub files: Vec<MediaFile>,
    /// Where it was taken
    pub location: String,
    /// Comma separated, e.g. `"Arte, Humor, Educativo"`.
    pub tags: String,
}

impl PostFields {
    /// Form defaults when editing `post`: stored values, no new media.
    pub fn from_post(post: &Post) -> Self {
        Self {
            caption: post.caption.clone(),
            files: Vec::new(),
            location: post.location.clone(),
            tags: join_tags(&post.tags),
        }
    }
}

/// Payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Author
    pub creator_id: UserId,
    /// Post text
    pub caption: String,
    /// Picked media
    pub files: Vec<MediaFile>,
    /// Where it was taken
    pub location: String,
    /// Comma separated
    pub tags: String,
}

impl NewPost {
    /// Attach the author to submitted form fields.
    pub fn from_fields(creator_id: UserId, fields: PostFields) -> Self {
        Self {
            creator_id,
            caption: fields.caption,
            files: fields.files,
            location: fields.location,
            tags: fields.tags,
        }
    }
}

/// Payload for updating a post. Carries the prior media so the facade can
/// decide whether stored media must be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    /// Post being edited
    pub post_id: PostId,
    /// Post text
    pub caption: String,
    /// Replacement media, empty to keep the current image
    pub files: Vec<MediaFile>,
    /// Where it was taken
    pub location: String,
    /// Comma separated
    pub tags: String,
    /// Media of the post before this update
    pub image_id: ImageId,
    /// Public view URL
    pub image_url: String,
}

impl PostUpdate {
    /// Update `original` with submitted form fields.
    pub fn from_fields(original: &Post, fields: PostFields) -> Self {
        Self {
            post_id: original.id.clone(),
            caption: fields.caption,
            files: fields.files,
            location: fields.location,
            tags: fields.tags,
            image_id: original.image_id.clone(),
            image_url: original.image_url.clone(),
        }
    }

    /// Whether the update carries replacement media.
    pub fn has_new_media(&self) -> bool {
        !self.files.is_empty()
    }
}

/// Document fields written for a post create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDocument {
    /// Post text
    pub caption: String,
    /// Stored media id
    pub image_id: ImageId,
    /// Public view URL
    pub image_url: String,
    /// Where it was taken
    pub location: String,
    /// Parsed tags
    pub tags: Vec<String>,
}

/// What a post form submission does. An update always carries the original
/// post; a create never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Publish a new post
    Create {
        /// Author of the post
        user_id: UserId,
    },
    /// Edit an existing post
    Update {
        /// Post as it was loaded into the form
        original: Post,
    },
}

impl PostAction {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
        }
    }
}

/// Split the comma separated tags field into stored tags.
///
/// Segments are trimmed and empty segments dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_tags`] for pre-filling the edit form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}
