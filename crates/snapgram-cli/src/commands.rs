//! Command handlers
//!
//! Each command fills the matching workflow's form from its arguments and
//! submits it, the same way an interactive frontend would.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use snapgram_app::{
    PostFlow, QueryCache, Route, SignInFlow, SignOutFlow, SignUpFlow, SnapgramApp, SubmitOutcome,
    Toast, ToastLevel, UiEffects,
};
use snapgram_core::{
    AuthEffects, DocumentEffects, MediaEffects, MediaFile, PostAction, PostId, SnapgramClient,
    SnapgramConfig,
};

use crate::local::LocalBackend;

/// Snapgram subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    SignUp(SignUpArgs),
    /// Open a session
    SignIn(SignInArgs),
    /// Close the active session
    SignOut,
    /// Publish a post as the signed-in user
    CreatePost(CreatePostArgs),
    /// Edit one of the recent posts
    UpdatePost(UpdatePostArgs),
    /// List recent posts
    Feed,
}

/// Arguments of `sign-up`.
#[derive(Debug, Args)]
pub struct SignUpArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Public handle
    #[arg(long)]
    pub username: String,
    /// Login email
    #[arg(long)]
    pub email: String,
    /// At least 8 characters
    #[arg(long)]
    pub password: String,
}

/// Arguments of `sign-in`.
#[derive(Debug, Args)]
pub struct SignInArgs {
    /// Login email
    #[arg(long)]
    pub email: String,
    /// Account password
    #[arg(long)]
    pub password: String,
}

/// Arguments of `create-post`.
#[derive(Debug, Args)]
pub struct CreatePostArgs {
    /// Post text, 5 to 2200 characters
    #[arg(long)]
    pub caption: String,
    /// Where it was taken
    #[arg(long)]
    pub location: String,
    /// Comma separated
    #[arg(long, default_value = "")]
    pub tags: String,
    /// Image to upload
    #[arg(long)]
    pub file: PathBuf,
}

/// Arguments of `update-post`. Omitted fields keep their stored value.
#[derive(Debug, Args)]
pub struct UpdatePostArgs {
    /// Id of the post to edit
    pub post_id: String,
    /// New caption
    #[arg(long)]
    pub caption: Option<String>,
    /// New location
    #[arg(long)]
    pub location: Option<String>,
    /// New tags, comma separated
    #[arg(long)]
    pub tags: Option<String>,
    /// Replacement image
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Prints notices to stderr and navigation to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleUi;

impl UiEffects for ConsoleUi {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => eprintln!("error: {}", toast.title),
            ToastLevel::Warning => eprintln!("warning: {}", toast.title),
            ToastLevel::Info => eprintln!("{}", toast.title),
        }
    }

    fn navigate(&self, route: Route) {
        println!("-> {route}");
    }
}

/// Wire the local backend into an app context.
pub fn build_app(config: &SnapgramConfig) -> Result<SnapgramApp> {
    let backend = Arc::new(LocalBackend::open(config)?);
    let auth: Arc<dyn AuthEffects> = backend.clone();
    let documents: Arc<dyn DocumentEffects> = backend.clone();
    let media: Arc<dyn MediaEffects> = backend;
    let client = SnapgramClient::new(config, auth, documents, media);
    Ok(SnapgramApp::new(client, Arc::new(QueryCache::new())))
}

/// Execute `command` against the local store in `config.data_dir`.
pub async fn run(command: Command, config: &SnapgramConfig) -> Result<()> {
    let app = build_app(config)?;
    let ui = ConsoleUi;
    let timeout = config.request_timeout();

    match command {
        Command::SignUp(args) => {
            let mut flow = SignUpFlow::new(&app);
            let form = flow.form_mut();
            form.set("name", args.name);
            form.set("username", args.username);
            form.set("email", args.email);
            form.set("password", args.password);
            finish(bounded(timeout, flow.submit(&ui)).await?)
        }
        Command::SignIn(args) => {
            let mut flow = SignInFlow::new(&app);
            flow.form_mut().set("email", args.email);
            flow.form_mut().set("password", args.password);
            finish(bounded(timeout, flow.submit(&ui)).await?)
        }
        Command::SignOut => {
            let flow = SignOutFlow::new(&app);
            finish(bounded(timeout, flow.submit(&ui)).await?)
        }
        Command::CreatePost(args) => {
            let user = app
                .current_user()
                .await
                .context("sign in before posting")?;
            let mut flow = PostFlow::new(&app, PostAction::Create { user_id: user.id });
            flow.form_mut().set("caption", args.caption);
            flow.form_mut().set("location", args.location);
            flow.form_mut().set("tags", args.tags);
            flow.set_files(vec![read_media(&args.file)?]);
            finish(bounded(timeout, flow.submit(&ui)).await?)
        }
        Command::UpdatePost(args) => {
            let post_id = PostId::new(args.post_id);
            let original = app
                .recent_posts()
                .await?
                .into_iter()
                .find(|p| p.id == post_id)
                .ok_or_else(|| anyhow!("post {post_id} is not in the recent feed"))?;

            let mut flow = PostFlow::new(&app, PostAction::Update { original });
            if let Some(caption) = args.caption {
                flow.form_mut().set("caption", caption);
            }
            if let Some(location) = args.location {
                flow.form_mut().set("location", location);
            }
            if let Some(tags) = args.tags {
                flow.form_mut().set("tags", tags);
            }
            if let Some(file) = &args.file {
                flow.set_files(vec![read_media(file)?]);
            }
            finish(bounded(timeout, flow.submit(&ui)).await?)
        }
        Command::Feed => {
            for post in app.recent_posts().await? {
                println!(
                    "{}  {}  {}  [{}]  {}",
                    post.id,
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.location,
                    post.tags.join(", "),
                    post.caption
                );
            }
            Ok(())
        }
    }
}

async fn bounded<F: std::future::Future>(limit: Duration, fut: F) -> Result<F::Output> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| anyhow!("request timed out after {}s", limit.as_secs()))
}

fn finish(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Navigated(_) => Ok(()),
        SubmitOutcome::Invalid(errors) => {
            for error in errors.iter() {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("invalid input")
        }
        SubmitOutcome::Failed(failure) => match failure.error {
            Some(e) => Err(anyhow!(e).context(failure.notice)),
            None => bail!(failure.notice),
        },
    }
}

/// Read an image from disk, guessing its content type from the extension.
pub fn read_media(path: &Path) -> Result<MediaFile> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
        .to_string();
    let file = MediaFile::new(file_name, "application/octet-stream", bytes);
    let content_type = match file.extension().as_deref() {
        Some(".png") => "image/png",
        Some(".jpg" | ".jpeg") => "image/jpeg",
        Some(".svg") => "image/svg+xml",
        _ => "application/octet-stream",
    };
    Ok(MediaFile {
        content_type: content_type.to_string(),
        ..file
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_content_type_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foto.JPG");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        let file = read_media(&path).unwrap();
        assert_eq!(file.file_name, "Foto.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn failed_outcome_carries_the_notice() {
        let outcome = SubmitOutcome::Failed(snapgram_app::Failure {
            notice: snapgram_app::notices::CREATE_POST_FAILED,
            error: Some(snapgram_app::MutationError::NoResult),
        });
        let err = finish(outcome).unwrap_err();
        assert_eq!(err.to_string(), "Creación Fallida");
    }
}
