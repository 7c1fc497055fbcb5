use chrono::{DateTime, Local};

/// A generated geographic point, already rendered for display.
///
/// Both fields carry exactly six fractional digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPoint {
    pub lat: String,
    pub lng: String,
}

/// One synthetic vessel sighting.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    pub image_index: usize,
    pub coordinates: GeoPoint,
    pub timestamp: DateTime<Local>,
}

/// Emitted by the scheduler each time its randomized timer fires.
#[derive(Debug, Clone, Copy)]
pub struct DetectionTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Capture,
    ViewDetails,
    Back,
    CloseToast,
}
