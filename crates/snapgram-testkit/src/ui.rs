//! Recording UI effects.

use parking_lot::Mutex;
use snapgram_app::{Route, Toast, UiEffects};

/// Something the workflows asked the UI to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A toast was shown
    Notify(Toast),
    /// The router moved
    Navigate(Route),
}

/// Keeps every notice and navigation in order.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    /// Recorder with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, oldest first.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    /// Only the notices.
    pub fn toasts(&self) -> Vec<Toast> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Notify(toast) => Some(toast.clone()),
                UiEvent::Navigate(_) => None,
            })
            .collect()
    }

    /// Titles of the notices shown so far.
    pub fn notices(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.title).collect()
    }

    /// Only the navigations.
    pub fn routes(&self) -> Vec<Route> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Navigate(route) => Some(route.clone()),
                UiEvent::Notify(_) => None,
            })
            .collect()
    }

    /// Most recent navigation.
    pub fn last_route(&self) -> Option<Route> {
        self.routes().pop()
    }
}

impl UiEffects for RecordingUi {
    fn notify(&self, toast: Toast) {
        self.events.lock().push(UiEvent::Notify(toast));
    }

    fn navigate(&self, route: Route) {
        self.events.lock().push(UiEvent::Navigate(route));
    }
}
