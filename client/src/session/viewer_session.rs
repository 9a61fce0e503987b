//! Viewer session: the composition root of the page controller

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::overlay::{OverlayController, OverlayToggle};
use crate::page::PageData;
use crate::segmentation::{
    JobError, JobEvent, JobIndicator, SegmentationApi, SegmentationJobPoller, StartOutcome,
};
use crate::slide::{ResolveError, ResolvedSources, SlideDescriptor, TileSourceResolver};
use crate::viewer::{TiledViewer, ViewerEvent};

use super::events::{SessionEvent, SessionExit, UiEvent};

/// Viewer session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to resolve tile sources: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Page controls handed to the session
pub struct SessionControls<T, U> {
    /// Overlay show/hide checkbox
    pub toggle: T,
    /// Segmentation trigger and progress display
    pub job: U,
}

/// One open slide: the viewer, its mask overlay, and the segmentation job.
///
/// The session owns every collaborator and reacts to `SessionEvent`s; nothing is
/// shared outside it.
pub struct ViewerSession<V, T, A, U> {
    viewer: V,
    slide: SlideDescriptor,
    sources: ResolvedSources,
    overlay: OverlayController<T>,
    /// `None` when segmentation is disabled and the trigger is not rendered
    poller: Option<SegmentationJobPoller<A, U>>,
    reload_requested: bool,
}

impl<V, T, A, U> ViewerSession<V, T, A, U>
where
    V: TiledViewer,
    T: OverlayToggle,
    A: SegmentationApi,
    U: JobIndicator,
{
    /// Open the page's slide in the viewer.
    ///
    /// The mask is added as a second tiled image at opacity 0. Resolve failures
    /// are reported through the viewer before being returned.
    pub fn open(
        page: &PageData,
        mut viewer: V,
        controls: SessionControls<T, U>,
        api: A,
        config: &Config,
    ) -> Result<Self, SessionError> {
        let resolver = TileSourceResolver::new(page.tile_sources.clone());
        let sources = match resolver.resolve(&page.slide.url) {
            Ok(sources) => sources,
            Err(e) => {
                error!("Cannot open slide {}: {}", page.slide.url, e);
                viewer.report_error(&e.to_string());
                return Err(e.into());
            }
        };

        info!(
            "Opening slide {} ({} mode)",
            page.slide.url,
            if sources.base.is_inline() { "inline" } else { "remote" }
        );
        viewer.open(&sources.base);
        viewer.add_tiled_image(&sources.mask, 0.0);
        viewer.set_scale_bar(page.slide.pixels_per_meter());

        let overlay = OverlayController::new(page.overlay_capable(), controls.toggle, &config.overlay);

        let poller = if page.segmentation_enabled {
            Some(SegmentationJobPoller::new(
                api,
                controls.job,
                config.segmentation.clone(),
            ))
        } else {
            debug!("Segmentation disabled, no trigger rendered");
            None
        };

        Ok(Self {
            viewer,
            slide: page.slide.clone(),
            sources,
            overlay,
            poller,
            reload_requested: false,
        })
    }

    pub fn slide(&self) -> &SlideDescriptor {
        &self.slide
    }

    pub fn sources(&self) -> &ResolvedSources {
        &self.sources
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn overlay(&self) -> &OverlayController<T> {
        &self.overlay
    }

    pub fn poller(&self) -> Option<&SegmentationJobPoller<A, U>> {
        self.poller.as_ref()
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested
    }

    /// A job timer is scheduled
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| p.has_active_timer())
    }

    pub fn handle_viewer_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Opened(layers) => self.overlay.attach(layers),
            ViewerEvent::LoadFailed(message) => {
                // The viewer shows its own error UI
                warn!("Viewer failed to load {}: {}", self.slide.url, message);
            }
        }
    }

    pub async fn handle_ui_event(&mut self, event: UiEvent) -> Result<(), SessionError> {
        match event {
            UiEvent::OverlayToggled(checked) => {
                self.overlay.set_visible(checked, &mut self.viewer);
            }
            UiEvent::SegmentRequested => {
                let Some(poller) = self.poller.as_mut() else {
                    debug!("Segmentation requested but not available");
                    return Ok(());
                };
                if poller.start().await? == StartOutcome::Ignored {
                    debug!("Segmentation already requested");
                }
            }
        }
        Ok(())
    }

    /// Wait for the next poll tick and apply its result.
    ///
    /// Returns `None` when no job is being polled.
    pub async fn poll_segmentation(&mut self) -> Option<JobEvent> {
        let event = self.poller.as_mut()?.tick().await?;
        self.apply_job_event(&event);
        Some(event)
    }

    /// Drive the session until it reloads or closes.
    ///
    /// UI and viewer events are handled in arrival order; poll ticks are
    /// interleaved with them on the same task.
    pub async fn run(&mut self, events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionExit {
        loop {
            if self.reload_requested {
                return SessionExit::Reloaded;
            }

            let polling = self.is_polling();
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Close) | None => {
                        info!("Session for {} closed", self.slide.url);
                        return SessionExit::Closed;
                    }
                    Some(event) => self.handle_event(event).await,
                },
                _ = async {
                    match self.poller.as_mut() {
                        Some(poller) => poller.wait_tick().await,
                        None => std::future::pending::<()>().await,
                    }
                }, if polling => {
                    let event = match self.poller.as_mut() {
                        Some(poller) => poller.poll_once().await,
                        None => None,
                    };
                    if let Some(event) = event {
                        self.apply_job_event(&event);
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Viewer(event) => self.handle_viewer_event(event),
            SessionEvent::Ui(event) => {
                if let Err(e) = self.handle_ui_event(event).await {
                    warn!("{}", e);
                }
            }
            SessionEvent::Close => {}
        }
    }

    fn apply_job_event(&mut self, event: &JobEvent) {
        match event {
            JobEvent::Completed => {
                self.overlay.set_capable(true, &mut self.viewer);
                self.request_reload();
            }
            JobEvent::Failed { message } => {
                warn!("Segmentation for {} gave up: {}", self.slide.url, message);
            }
            JobEvent::Progress { .. } | JobEvent::PollFailed { .. } => {}
        }
    }

    /// Ask the host to reload the page, at most once per session
    fn request_reload(&mut self) {
        if self.reload_requested {
            return;
        }
        info!("Reloading page to pick up new mask tiles");
        self.reload_requested = true;
        self.viewer.reload_page();
    }
}
