mod config;
mod routes;
mod ws;

use std::path::Path;
use std::process;
use std::sync::Arc;

use bridge::{render_page, InboundChannel, PageOptions};
use clap::Parser;
use formats::CommandEncoder;
use runtime::{Metrics, Outbox};
use state::{MapView, DEFAULT_CENTER};
use sync::{MapSession, UiAction};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::routes::{AppState, DRONE_ICON_PATH};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Nothing is constructed until the settings record validates.
    let addr = match args.listen_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!("{err}");
            process::exit(2);
        }
    };
    let settings = match args.raw_settings().parse() {
        Ok(settings) => settings,
        Err(err) => {
            error!("drone settings rejected: {err}");
            process::exit(2);
        }
    };
    info!(?settings, "drone settings accepted");

    let metrics = Metrics::shared();
    let outbox = Outbox::<String>::new(metrics.clone());
    let mut inbound = InboundChannel::new(metrics.clone());
    let encoder = CommandEncoder::new().with_route(args.route);
    let view = MapView::default();
    let mut session = MapSession::new(view, Arc::new(outbox.clone()), metrics.clone(), encoder);

    let drone_icon = find_drone_icon(&args.assets_dir()).await;
    let page = render_page(&PageOptions {
        title: "Waypoint Map".to_string(),
        center: view.center(),
        zoom: view.zoom(),
        home: DEFAULT_CENTER,
        drone_icon_url: drone_icon.as_ref().map(|_| DRONE_ICON_PATH.to_string()),
        acknowledge: args.ack,
    });

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiAction>();
    let state = AppState {
        page: Arc::from(page),
        outbox,
        connector: inbound.connector(),
        ui: ui_tx,
        metrics,
        settings: Arc::new(settings),
        drone_icon,
    };
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            process::exit(1);
        }
    };
    info!("viewer listening on http://{addr}");
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("server stopped: {err}");
        }
    });

    // App loop: sole owner of the session.
    loop {
        tokio::select! {
            Some(action) = ui_rx.recv() => {
                session.apply_ui(action);
            }
            Some(event) = inbound.recv() => {
                session.apply_inbound(event);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    server.abort();
}

async fn find_drone_icon(assets: &Path) -> Option<std::path::PathBuf> {
    let path = assets.join("drone.png");
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Some(path),
        _ => {
            warn!("drone icon not found at {}, map loads without it", path.display());
            None
        }
    }
}
