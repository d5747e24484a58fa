//! Facade behavior against the in-memory backend.

use snapgram_core::{BackendError, NewPost, PostFields, PostUpdate, UserId};
use snapgram_testkit::backend::{Call, InMemoryBackend, Operation};
use snapgram_testkit::fixtures::{png, sample_post, sample_user};
use snapgram_testkit::{client_with, init_tracing};

fn new_post(files: Vec<snapgram_core::MediaFile>) -> NewPost {
    NewPost::from_fields(
        UserId::new("u1"),
        PostFields {
            caption: "Atardecer en el muelle".into(),
            files,
            location: "Valparaíso".into(),
            tags: " mar, viaje ,,".into(),
        },
    )
}

#[tokio::test]
async fn create_user_account_saves_profile_with_avatar() {
    init_tracing();
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);

    let user = client
        .create_user_account(&sample_user())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.username, "anatorres");
    assert_eq!(user.email, "ana@example.com");
    assert!(user.image_url.ends_with("name=AT"));
    assert_eq!(backend.users(), vec![user]);
}

#[tokio::test]
async fn duplicate_account_is_rejected() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);

    client.create_user_account(&sample_user()).await.unwrap();
    let err = client.create_user_account(&sample_user()).await.unwrap_err();

    assert!(matches!(err, BackendError::Conflict { .. }));
    assert_eq!(backend.users().len(), 1);
}

#[tokio::test]
async fn missing_account_skips_profile() {
    let backend = InMemoryBackend::new();
    backend.fail_next(Operation::CreateAccount);
    let client = client_with(&backend);

    assert_eq!(client.create_user_account(&sample_user()).await, Ok(None));
    assert_eq!(backend.call_count(Operation::SaveUser), 0);
}

#[tokio::test]
async fn current_user_follows_the_session() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);
    let user = client
        .create_user_account(&sample_user())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(client.current_user().await, Ok(None));

    client
        .sign_in(&sample_user().credentials())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(client.current_user().await, Ok(Some(user)));

    client.sign_out().await.unwrap().unwrap();
    assert_eq!(client.current_user().await, Ok(None));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);
    client.create_user_account(&sample_user()).await.unwrap();

    let mut credentials = sample_user().credentials();
    credentials.password = "otra-contraseña".into();

    assert!(matches!(
        client.sign_in(&credentials).await,
        Err(BackendError::Unauthorized { .. })
    ));
    assert!(backend.session().is_none());
}

#[tokio::test]
async fn create_post_stores_trimmed_tags() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);

    let post = client
        .create_post(&new_post(vec![png("muelle")]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(post.tags, vec!["mar".to_string(), "viaje".to_string()]);
    assert_eq!(post.creator_id, UserId::new("u1"));
    assert!(backend.has_media(&post.image_id));
}

#[tokio::test]
async fn create_post_without_media_is_rejected_before_upload() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);

    let err = client.create_post(&new_post(Vec::new())).await.unwrap_err();

    assert!(matches!(err, BackendError::MediaRejected { .. }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn unsupported_media_is_rejected() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);
    let gif = snapgram_core::MediaFile::new("anim.gif", "image/gif", vec![1, 2]);

    let err = client.create_post(&new_post(vec![gif])).await.unwrap_err();

    assert!(matches!(err, BackendError::MediaRejected { .. }));
    assert_eq!(backend.call_count(Operation::CreatePost), 0);
}

#[tokio::test]
async fn failed_document_write_discards_uploaded_media() {
    let backend = InMemoryBackend::new();
    backend.fail_next(Operation::CreatePost);
    let client = client_with(&backend);

    assert_eq!(client.create_post(&new_post(vec![png("muelle")])).await, Ok(None));
    assert_eq!(backend.media_count(), 0);
    assert_eq!(backend.call_count(Operation::DeleteMedia), 1);
}

#[tokio::test]
async fn rejected_document_write_discards_uploaded_media() {
    let backend = InMemoryBackend::new();
    backend.reject_next(Operation::CreatePost, BackendError::network("timeout"));
    let client = client_with(&backend);

    let err = client
        .create_post(&new_post(vec![png("muelle")]))
        .await
        .unwrap_err();

    assert_eq!(err, BackendError::network("timeout"));
    assert_eq!(backend.media_count(), 0);
}

#[tokio::test]
async fn media_deletion_failure_does_not_mask_the_write_result() {
    let backend = InMemoryBackend::new();
    backend.fail_next(Operation::CreatePost);
    backend.reject_next(Operation::DeleteMedia, BackendError::storage("bucket offline"));
    let client = client_with(&backend);

    assert_eq!(client.create_post(&new_post(vec![png("muelle")])).await, Ok(None));
}

#[tokio::test]
async fn update_without_files_keeps_existing_media() {
    let backend = InMemoryBackend::new();
    let original = sample_post();
    backend.seed_post(original.clone());
    let client = client_with(&backend);

    let update = PostUpdate::from_fields(
        &original,
        PostFields {
            caption: "Nuevo texto".into(),
            location: "Viña del Mar".into(),
            tags: "mar".into(),
            files: Vec::new(),
        },
    );
    let updated = client.update_post(&update).await.unwrap().unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.image_id, original.image_id);
    assert_eq!(updated.caption, "Nuevo texto");
    assert_eq!(backend.call_count(Operation::Upload), 0);
    assert!(backend.has_media(&original.image_id));
}

#[tokio::test]
async fn update_with_files_replaces_and_deletes_old_media() {
    let backend = InMemoryBackend::new();
    let original = sample_post();
    backend.seed_post(original.clone());
    let client = client_with(&backend);

    let mut fields = PostFields::from_post(&original);
    fields.files = vec![png("nueva")];
    let updated = client
        .update_post(&PostUpdate::from_fields(&original, fields))
        .await
        .unwrap()
        .unwrap();

    assert_ne!(updated.image_id, original.image_id);
    assert!(backend.has_media(&updated.image_id));
    assert!(!backend.has_media(&original.image_id));
}

#[tokio::test]
async fn failed_update_keeps_old_media_and_drops_new() {
    let backend = InMemoryBackend::new();
    let original = sample_post();
    backend.seed_post(original.clone());
    backend.fail_next(Operation::UpdatePost);
    let client = client_with(&backend);

    let mut fields = PostFields::from_post(&original);
    fields.files = vec![png("nueva")];
    let result = client
        .update_post(&PostUpdate::from_fields(&original, fields))
        .await;

    assert_eq!(result, Ok(None));
    assert!(backend.has_media(&original.image_id));
    assert_eq!(backend.media_count(), 1);
    let deleted: Vec<_> = backend
        .calls_to(Operation::DeleteMedia)
        .into_iter()
        .filter_map(|c| match c {
            Call::DeleteMedia(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted.len(), 1);
    assert_ne!(deleted[0], original.image_id);
}

#[tokio::test]
async fn recent_posts_are_newest_first_and_bounded() {
    let backend = InMemoryBackend::new();
    let client = client_with(&backend);
    for i in 0..3 {
        client
            .create_post(&new_post(vec![png(&format!("f{i}"))]))
            .await
            .unwrap();
    }
    backend.seed_post(sample_post());

    let posts = client.recent_posts().await.unwrap().unwrap();

    assert_eq!(posts.len(), 4);
    assert_eq!(posts.last().map(|p| p.id.as_str()), Some("p1"));
    assert_eq!(
        backend.calls_to(Operation::ListPosts),
        vec![Call::ListPosts { limit: 20 }]
    );
}
