use chrono::{DateTime, Local};

use crate::events::{DetectionEvent, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Monitoring,
    Details,
}

/// The single mutable aggregate for the whole session.
///
/// Owned exclusively by the monitor task; everything else sees read-only
/// clones. All writes go through the transition methods below, which return
/// whether anything changed so the owner knows when to publish a snapshot.
#[derive(Debug, Clone)]
pub struct AppState {
    screen: Screen,
    current_image_index: usize,
    previous_image_index: Option<usize>,
    coordinates: GeoPoint,
    timestamp: DateTime<Local>,
    latest_detection: Option<DetectionEvent>,
    toast_visible: bool,
}

impl AppState {
    /// `coordinates` come from the coordinate generator at startup,
    /// independent of any detection.
    pub fn new(coordinates: GeoPoint, now: DateTime<Local>) -> Self {
        Self {
            screen: Screen::Monitoring,
            current_image_index: 0,
            previous_image_index: None,
            coordinates,
            timestamp: now,
            latest_detection: None,
            toast_visible: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn current_image_index(&self) -> usize {
        self.current_image_index
    }

    pub fn previous_image_index(&self) -> Option<usize> {
        self.previous_image_index
    }

    pub fn coordinates(&self) -> &GeoPoint {
        &self.coordinates
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    pub fn latest_detection(&self) -> Option<&DetectionEvent> {
        self.latest_detection.as_ref()
    }

    pub fn toast_visible(&self) -> bool {
        self.toast_visible
    }

    /// Accept a detection: snapshot the current index into the previous slot,
    /// take over the event's display fields, and raise the toast.
    pub fn publish(&mut self, event: DetectionEvent) {
        self.previous_image_index = Some(self.current_image_index);
        self.current_image_index = event.image_index;
        self.coordinates = event.coordinates.clone();
        self.timestamp = event.timestamp;
        self.latest_detection = Some(event);
        self.toast_visible = true;
    }

    /// Navigate to the detail screen. Entering Details acknowledges the
    /// alert, so the toast drops as part of the same transition.
    pub fn view_details(&mut self) -> bool {
        let changed = self.screen != Screen::Details || self.toast_visible;
        self.screen = Screen::Details;
        self.toast_visible = false;
        changed
    }

    pub fn back(&mut self) -> bool {
        if self.screen == Screen::Monitoring {
            return false;
        }
        self.screen = Screen::Monitoring;
        true
    }

    /// Hide the toast; hiding an already-hidden toast is a no-op.
    pub fn hide_toast(&mut self) -> bool {
        if !self.toast_visible {
            return false;
        }
        self.toast_visible = false;
        true
    }
}
