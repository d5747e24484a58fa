//! The CLI's app wiring over a real data directory.

use snapgram_app::{PostFlow, SignInFlow, SignUpFlow, SubmitOutcome};
use snapgram_cli::build_app;
use snapgram_core::{MediaFile, PostAction, SnapgramConfig};

struct SilentUi;

impl snapgram_app::UiEffects for SilentUi {
    fn notify(&self, _toast: snapgram_app::Toast) {}
    fn navigate(&self, _route: snapgram_app::Route) {}
}

fn config(dir: &std::path::Path) -> SnapgramConfig {
    SnapgramConfig {
        data_dir: dir.to_path_buf(),
        ..SnapgramConfig::default()
    }
}

#[tokio::test]
async fn state_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let app = build_app(&config).unwrap();
    let mut sign_up = SignUpFlow::new(&app);
    sign_up.form_mut().set("name", "Ana Torres");
    sign_up.form_mut().set("username", "anatorres");
    sign_up.form_mut().set("email", "ana@example.com");
    sign_up.form_mut().set("password", "password1");
    assert!(sign_up.submit(&SilentUi).await.is_navigated());

    let user = app.current_user().await.unwrap();
    let mut post = PostFlow::new(&app, PostAction::Create { user_id: user.id.clone() });
    post.form_mut().set("caption", "Cerro Alegre");
    post.form_mut().set("location", "Valparaíso");
    post.form_mut().set("tags", "mar, color");
    post.set_files(vec![MediaFile::new("cerro.png", "image/png", vec![1, 2, 3])]);
    assert!(post.submit(&SilentUi).await.is_navigated());

    let reopened = build_app(&config).unwrap();
    assert_eq!(reopened.current_user().await.unwrap(), user);
    let feed = reopened.recent_posts().await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].tags, vec!["mar".to_string(), "color".to_string()]);
    assert!(dir.path().join("state.json").exists());
    assert_eq!(std::fs::read_dir(dir.path().join("media")).unwrap().count(), 1);
}

#[tokio::test]
async fn wrong_password_does_not_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(&config(dir.path())).unwrap();

    let mut sign_up = SignUpFlow::new(&app);
    sign_up.form_mut().set("name", "Al");
    sign_up.form_mut().set("username", "al");
    sign_up.form_mut().set("email", "al@x.com");
    sign_up.form_mut().set("password", "password1");
    sign_up.submit(&SilentUi).await;
    app.sign_out_account().mutate(()).await.unwrap();

    let mut sign_in = SignInFlow::new(&app);
    sign_in.form_mut().set("email", "al@x.com");
    sign_in.form_mut().set("password", "password2");

    assert!(matches!(sign_in.submit(&SilentUi).await, SubmitOutcome::Failed(_)));
    assert!(!app.check_auth_user().await);
}
