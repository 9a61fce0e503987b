use anyhow::Context;
use slideview::config::Config;
use slideview::headless::{HeadlessIndicator, HeadlessToggle, HeadlessViewer};
use slideview::page::PageData;
use slideview::segmentation::HttpSegmentationClient;
use slideview::session::{
    SessionControls, SessionError, SessionEvent, SessionExit, UiEvent, ViewerSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Map a line typed on stdin to a session event
fn parse_command(line: &str) -> Option<SessionEvent> {
    match line.trim() {
        "segment" => Some(UiEvent::SegmentRequested.into()),
        "show" => Some(UiEvent::OverlayToggled(true).into()),
        "hide" => Some(UiEvent::OverlayToggled(false).into()),
        "quit" | "exit" => Some(SessionEvent::Close),
        _ => None,
    }
}

/// Keep consuming events for a page that could not be opened until the user quits
async fn idle_until_closed(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Close => break,
            event => debug!("Ignoring {:?}: no slide is open", event),
        }
    }
}

fn print_page(page: &PageData) {
    for entry in page.selectable_entries() {
        info!("{}{} -> {}", "  ".repeat(entry.depth), entry.name, entry.url);
    }
    for (key, value) in page.properties.rows() {
        info!("{}: {}", key, value);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slideview=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        "Loaded configuration: server={}, page_data={:?}",
        config.server_url, config.page_data_path
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();

    // Forward stdin commands to the session
    let stdin_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(event) => {
                    if stdin_tx.send(event).is_err() {
                        break;
                    }
                }
                None => warn!("Unknown command {:?} (segment, show, hide, quit)", line),
            }
        }
        let _ = stdin_tx.send(SessionEvent::Close);
    });

    let mut first_open = true;
    loop {
        // Re-read page data on every (re)load so server-side changes are adopted
        let page = match PageData::load(&config.page_data_path) {
            Ok(page) => page,
            Err(e) if !first_open => {
                error!(
                    "Failed to reload page data from {:?}: {}",
                    config.page_data_path, e
                );
                idle_until_closed(&mut rx).await;
                break;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load page data from {:?}", config.page_data_path)
                });
            }
        };
        print_page(&page);

        let api = HttpSegmentationClient::new(
            config.server_url.clone(),
            config.segmentation.request_timeout,
        )?;
        let controls = SessionControls {
            toggle: HeadlessToggle::default(),
            job: HeadlessIndicator {
                trigger_enabled: page.segmentation_enabled,
                ..Default::default()
            },
        };
        let viewer = HeadlessViewer::new(tx.clone());
        let mut session = match ViewerSession::open(&page, viewer, controls, api, &config) {
            Ok(session) => session,
            Err(SessionError::Resolve(e)) => {
                // Already reported through the viewer
                error!("Slide {} not opened: {}", page.slide.url, e);
                idle_until_closed(&mut rx).await;
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if first_open && config.autostart_segmentation {
            tx.send(UiEvent::SegmentRequested.into())?;
        }
        first_open = false;

        match session.run(&mut rx).await {
            SessionExit::Reloaded => info!("Reloading {}", page.slide.url),
            SessionExit::Closed => break,
        }
    }

    Ok(())
}
