use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAIN_SCREEN: &str = "Main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsAction {
    Open,
    Close,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsItem {
    AddTrack,
    Track,
    Filter,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: AnalyticsAction,
    pub screen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<AnalyticsItem>,
}

impl AnalyticsEvent {
    pub fn open(screen: &str) -> Self {
        Self {
            event: AnalyticsAction::Open,
            screen: screen.to_string(),
            item: None,
        }
    }

    pub fn close(screen: &str) -> Self {
        Self {
            event: AnalyticsAction::Close,
            screen: screen.to_string(),
            item: None,
        }
    }

    pub fn click(screen: &str, item: AnalyticsItem) -> Self {
        Self {
            event: AnalyticsAction::Click,
            screen: screen.to_string(),
            item: Some(item),
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn report(&self, event: &AnalyticsEvent);
}

/// Emits each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn report(&self, event: &AnalyticsEvent) {
        info!(
            target: "analytics",
            event = ?event.event,
            screen = %event.screen,
            item = ?event.item,
            "analytics event"
        );
    }
}

/// Keeps every reported event, for embedders that batch or inspect them.
#[derive(Debug, Default)]
pub struct BufferedAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl BufferedAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    pub fn drain(&self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl AnalyticsSink for BufferedAnalytics {
    fn report(&self, event: &AnalyticsEvent) {
        self.events.lock().push(event.clone());
    }
}
