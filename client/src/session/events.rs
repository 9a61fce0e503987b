//! Events delivered to a viewer session

use crate::viewer::ViewerEvent;

/// User interaction with the page controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The overlay checkbox changed
    OverlayToggled(bool),
    /// The "Get segmentation" button was clicked
    SegmentRequested,
}

/// Anything the session event loop reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Viewer(ViewerEvent),
    Ui(UiEvent),
    /// The page is being closed
    Close,
}

impl From<ViewerEvent> for SessionEvent {
    fn from(event: ViewerEvent) -> Self {
        SessionEvent::Viewer(event)
    }
}

impl From<UiEvent> for SessionEvent {
    fn from(event: UiEvent) -> Self {
        SessionEvent::Ui(event)
    }
}

/// Why the session event loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// A full page reload was requested
    Reloaded,
    /// The page was closed or every event sender was dropped
    Closed,
}
