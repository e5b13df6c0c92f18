//! Browser viewer: the engine runs on a frame timer and every frame is pushed
//! to connected pages over server-sent events.

mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
    time::{self, Instant, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    controls::{command_for_key, Command},
    engine::Engine,
    render::Frame,
    sensors::SensorSource,
    sketch::Sketch,
    world::World,
};

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub sketch: String,
    pub frame: Option<Frame>,
}

/// Body of `POST /api/control`: either a raw key press or a full command.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ControlRequest {
    Key { key: String },
    Command(Command),
}

impl ControlRequest {
    pub fn resolve(self) -> Option<Command> {
        match self {
            ControlRequest::Key { key } => command_for_key(&key),
            ControlRequest::Command(command) => Some(command),
        }
    }
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    latest_frame: Arc<Mutex<Option<Frame>>>,
    commands: mpsc::UnboundedSender<Command>,
    sketch_name: String,
}

pub struct WebServerConfig {
    pub sketch: Sketch,
    pub source: Box<dyn SensorSource>,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        sketch,
        source,
        host,
        port,
    } = config;

    let world = sketch.build_world();
    let engine = sketch.build_engine(source);
    let interval = sketch.frame_interval();

    let (tx, _) = broadcast::channel::<String>(64);
    let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
    let latest_frame: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));

    let frame_loop = tokio::spawn(frame_loop(
        engine,
        world,
        interval,
        command_rx,
        tx.clone(),
        latest_frame.clone(),
    ));

    let state = Arc::new(AppState {
        broadcaster: tx,
        latest_frame,
        commands: command_tx,
        sketch_name: sketch.name.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    info!(
        "sketch '{}' live at http://{}:{} (Ctrl+C to stop)",
        sketch.name, host, port
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    frame_loop.abort();
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/control", post(control))
        .with_state(state)
}

async fn frame_loop(
    mut engine: Engine,
    mut world: World,
    interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    broadcaster: broadcast::Sender<String>,
    latest_frame: Arc<Mutex<Option<Frame>>>,
) {
    let started = Instant::now();
    let mut timer = time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        timer.tick().await;
        while let Ok(command) = commands.try_recv() {
            engine.submit(command);
        }
        let summary = match engine.tick(&mut world, started.elapsed()) {
            Ok(summary) => summary,
            Err(err) => {
                error!("frame loop stopped: {err:?}");
                return;
            }
        };
        match serde_json::to_string(&summary.frame) {
            // No subscribers is fine; the page may not be open yet.
            Ok(payload) => {
                let _ = broadcaster.send(payload);
            }
            Err(err) => warn!("failed to encode frame: {err}"),
        }
        *lock(&latest_frame) = Some(summary.frame);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down viewer");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let frame = lock(&state.latest_frame).clone();
    Json(StateEnvelope {
        sketch: state.sketch_name.clone(),
        frame,
    })
}

async fn control(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ControlRequest>,
) -> StatusCode {
    let Some(command) = request.resolve() else {
        return StatusCode::BAD_REQUEST;
    };
    match state.commands.send(command) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    // Lagging clients skip frames rather than stalling the loop.
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
