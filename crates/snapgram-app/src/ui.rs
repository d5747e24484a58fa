//! UI effects the workflows drive: one-shot notices and navigation.
//!
//! Rendering and routing live outside this crate; frontends implement
//! [`UiEffects`].

use std::fmt;

use serde::{Deserialize, Serialize};
use snapgram_core::PostId;

/// Notice titles shown on failure.
pub mod notices {
    /// Account creation failed.
    pub const SIGN_UP_FAILED: &str = "Fallo al registrarse. Intente de nuevo.";
    /// Session could not be opened.
    pub const SIGN_IN_FAILED: &str = "Inicio de sesión fallido. Intente de nuevo.";
    /// Session opened but did not resolve to a user.
    pub const AUTH_CHECK_FAILED: &str = "Inicio de Sesión Fallido. Intente de Nuevo";
    /// Session could not be closed.
    pub const SIGN_OUT_FAILED: &str = "Cierre de sesión fallido. Intente de nuevo.";
    /// Post creation failed.
    pub const CREATE_POST_FAILED: &str = "Creación Fallida";
    /// Post update failed.
    pub const UPDATE_POST_FAILED: &str = "Actualización Fallida";
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToastLevel {
    /// Neutral
    Info,
    /// Needs attention
    Warning,
    /// Something failed
    Error,
}

/// One-shot user-visible notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Text shown to the user
    pub title: String,
    /// Severity
    pub level: ToastLevel,
}

impl Toast {
    /// Error-level toast.
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: ToastLevel::Error,
        }
    }
}

/// Navigation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Recent posts feed
    Home,
    /// Sign-in form
    SignIn,
    /// One post
    PostDetails(PostId),
}

impl Route {
    /// URL path of the route.
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::SignIn => "/sign-in".to_string(),
            Self::PostDetails(id) => format!("/posts/{id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Side effects a form submission may trigger.
pub trait UiEffects: Send + Sync {
    /// Show a one-shot notice.
    fn notify(&self, toast: Toast);

    /// Move to `route`.
    fn navigate(&self, route: Route);
}

/// Frontend-less sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingUi;

impl UiEffects for TracingUi {
    fn notify(&self, toast: Toast) {
        tracing::info!(title = %toast.title, level = ?toast.level, "notice");
    }

    fn navigate(&self, route: Route) {
        tracing::info!(%route, "navigate");
    }
}
