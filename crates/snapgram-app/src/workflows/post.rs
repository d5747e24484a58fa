//! Post create/edit flow.

use snapgram_core::{
    validate, MediaFile, NewPost, PostAction, PostFields, PostUpdate, POST,
};

use super::{fail, navigate, SubmitOutcome};
use crate::app::SnapgramApp;
use crate::form::FormState;
use crate::mutation::MutationHandle;
use crate::mutations::{CreatePost, UpdatePost};
use crate::ui::{notices, Route, UiEffects};

/// Form for creating a post or editing an existing one.
///
/// Editing pre-fills the text fields from the original post; media is only
/// replaced if the user picks new files.
#[derive(Debug)]
pub struct PostFlow {
    action: PostAction,
    form: FormState,
    files: Vec<MediaFile>,
    create: MutationHandle<CreatePost>,
    update: MutationHandle<UpdatePost>,
}

impl PostFlow {
    /// Form for `action`, pre-filled from the original post on update.
    pub fn new(app: &SnapgramApp, action: PostAction) -> Self {
        let form = match &action {
            PostAction::Create { .. } => FormState::new(&POST),
            PostAction::Update { original } => {
                let PostFields {
                    caption,
                    location,
                    tags,
                    ..
                } = PostFields::from_post(original);
                FormState::with_defaults(
                    &POST,
                    [("caption", caption), ("location", location), ("tags", tags)],
                )
            }
        };

        Self {
            action,
            form,
            files: Vec::new(),
            create: app.create_post(),
            update: app.update_post(),
        }
    }

    /// Create or update.
    pub fn action(&self) -> &PostAction {
        &self.action
    }

    /// Current text fields.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Text fields for editing.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// Replace the picked files.
    pub fn set_files(&mut self, files: Vec<MediaFile>) {
        self.files = files;
    }

    /// Files picked so far.
    pub fn files(&self) -> &[MediaFile] {
        &self.files
    }

    /// Existing media to preview while no new file is picked.
    pub fn media_url(&self) -> Option<&str> {
        match &self.action {
            PostAction::Update { original } if self.files.is_empty() => {
                Some(original.image_url.as_str())
            }
            _ => None,
        }
    }

    /// Handle used for creates.
    pub fn create_handle(&self) -> &MutationHandle<CreatePost> {
        &self.create
    }

    /// Handle used for updates.
    pub fn update_handle(&self) -> &MutationHandle<UpdatePost> {
        &self.update
    }

    /// Either handle is in flight.
    pub fn is_loading(&self) -> bool {
        self.create.is_pending() || self.update.is_pending()
    }

    /// Validate, then create or update the post.
    ///
    /// Create goes home; update opens the post details.
    pub async fn submit(&mut self, ui: &dyn UiEffects) -> SubmitOutcome {
        let fields = PostFields {
            files: self.files.clone(),
            ..self.form.to_post_fields()
        };
        let fields = match validate(&POST, fields) {
            Ok(valid) => valid.into_inner(),
            Err(errors) => {
                tracing::debug!(%errors, action = self.action.label(), "post form rejected");
                self.form.apply_errors(&errors);
                return SubmitOutcome::Invalid(errors);
            }
        };

        match &self.action {
            PostAction::Update { original } => {
                let update = PostUpdate::from_fields(original, fields);
                match self.update.mutate(update).await {
                    Ok(post) => navigate(ui, Route::PostDetails(post.id)),
                    Err(e) => fail(ui, notices::UPDATE_POST_FAILED, Some(e)),
                }
            }
            PostAction::Create { user_id } => {
                let new_post = NewPost::from_fields(user_id.clone(), fields);
                match self.create.mutate(new_post).await {
                    Ok(_) => navigate(ui, Route::Home),
                    Err(e) => fail(ui, notices::CREATE_POST_FAILED, Some(e)),
                }
            }
        }
    }
}
