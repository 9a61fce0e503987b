//! SlideView Client Library
//!
//! Session controller for a deep-zoom slide viewer page: tile source
//! resolution, the segmentation mask overlay, and the segmentation job poller.

pub mod config;
pub mod headless;
pub mod overlay;
pub mod page;
pub mod segmentation;
pub mod session;
pub mod slide;
pub mod viewer;

// Re-export commonly used types
pub use config::Config;
pub use overlay::{OverlayController, OverlayState, OverlayToggle};
pub use page::{PageData, Properties, SlideEntry};
pub use segmentation::{
    HttpSegmentationClient, JobEvent, JobIndicator, JobStatus, SegmentationApi,
    SegmentationJobPoller,
};
pub use session::{SessionControls, SessionEvent, SessionExit, UiEvent, ViewerSession};
pub use slide::{SlideDescriptor, TileSource, TileSourceMap, TileSourceResolver};
pub use viewer::{LayerHandle, LoadedLayers, TiledViewer, ViewerEvent};
