//! Sample data and wiring.

use std::sync::{Arc, Once};

use chrono::{TimeZone, Utc};
use snapgram_app::{QueryCache, SnapgramApp};
use snapgram_core::{
    AuthEffects, DocumentEffects, ImageId, MediaEffects, MediaFile, NewUser, Post,
    PostId, SnapgramClient, SnapgramConfig, UserId,
};

use crate::backend::InMemoryBackend;
use crate::ui::RecordingUi;

static TRACING: Once = Once::new();

/// Route test logs through the libtest capture. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Default configuration.
pub fn test_config() -> SnapgramConfig {
    SnapgramConfig::default()
}

/// Facade whose three collaborators are all `backend`.
pub fn client_with(backend: &Arc<InMemoryBackend>) -> SnapgramClient {
    let auth: Arc<dyn AuthEffects> = backend.clone();
    let documents: Arc<dyn DocumentEffects> = backend.clone();
    let media: Arc<dyn MediaEffects> = backend.clone();
    SnapgramClient::new(&test_config(), auth, documents, media)
}

/// App context over [`client_with`] and a fresh cache.
pub fn app_with(backend: &Arc<InMemoryBackend>) -> SnapgramApp {
    SnapgramApp::new(client_with(backend), Arc::new(QueryCache::new()))
}

/// Backend, app context and UI recorder wired together.
pub struct TestHarness {
    /// Shared collaborator stand-in
    pub backend: Arc<InMemoryBackend>,
    /// App context over `backend`
    pub app: SnapgramApp,
    /// Captures notices and navigation
    pub ui: RecordingUi,
}

impl TestHarness {
    /// Fresh harness with tracing routed to the test output.
    pub fn new() -> Self {
        init_tracing();
        let backend = InMemoryBackend::new();
        let app = app_with(&backend);
        Self {
            backend,
            app,
            ui: RecordingUi::new(),
        }
    }

    /// The app's query cache.
    pub fn cache(&self) -> &QueryCache {
        self.app.cache()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Valid sign-up input.
pub fn sample_user() -> NewUser {
    NewUser::new("Ana Torres", "anatorres", "ana@example.com", "contraseña-segura")
}

/// Small PNG named `<name>.png`.
pub fn png(name: &str) -> MediaFile {
    MediaFile::new(format!("{name}.png"), "image/png", vec![0x89, b'P', b'N', b'G'])
}

/// Post `p1` by `u1` with image `i1`.
pub fn sample_post() -> Post {
    Post {
        id: PostId::new("p1"),
        creator_id: UserId::new("u1"),
        caption: "Atardecer en el muelle".into(),
        image_id: ImageId::new("i1"),
        image_url: "memory://media/i1".into(),
        location: "Valparaíso".into(),
        tags: vec!["mar".into(), "viaje".into()],
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap(),
    }
}
