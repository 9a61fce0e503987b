pub mod events;
pub mod viewer_session;

pub use events::{SessionEvent, SessionExit, UiEvent};
pub use viewer_session::{SessionControls, SessionError, ViewerSession};
