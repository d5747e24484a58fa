//! Snapgram Core - Domain, Validation and Backend Facade
//!
//! Everything below the mutation layer:
//!
//! - `types`: form payloads (`Credentials`, `NewUser`, `PostFields`) and
//!   stored records (`Account`, `User`, `Post`)
//! - `validation`: static form schemas and the `validate` entry point
//! - `effects`: collaborator traits for auth, documents and media
//! - `client`: `SnapgramClient`, the facade the mutation layer wraps
//! - `config`: `SnapgramConfig` loaded from TOML
//!
//! # Example
//!
//! ```ignore
//! use snapgram_core::{validate, SnapgramClient, SIGN_IN};
//!
//! let credentials = validate(&SIGN_IN, credentials)?.into_inner();
//! let session = client.sign_in(&credentials).await?;
//! ```

pub mod client;
pub mod config;
pub mod effects;
pub mod errors;
pub mod types;
pub mod validation;

pub use client::SnapgramClient;
pub use config::{MediaPolicy, SnapgramConfig};
pub use effects::{AuthEffects, DocumentEffects, MediaEffects};
pub use errors::{BackendError, BackendResult, ConfigError};
pub use types::{
    join_tags, parse_tags, Account, AccountId, Credentials, ImageId, MediaFile, NewPost, NewUser,
    Post, PostAction, PostDocument, PostFields, PostId, PostUpdate, Session, SessionId,
    StoredMedia, User, UserId, UserProfile,
};
pub use validation::{
    validate, Schema, SchemaInput, Validated, ValidationError, ValidationErrors, POST, SIGN_IN,
    SIGN_UP,
};
