mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
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
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    engine::{CycleOutput, Engine},
    scheduler::{run_repeating, CancelHandle, RepeatSettings},
};

pub struct WebServerConfig {
    pub engine: Engine,
    pub repeat: RepeatSettings,
    pub host: String,
    pub port: u16,
}

struct AppState {
    engine: Arc<Mutex<Engine>>,
    repeat: RepeatSettings,
    scenario_name: String,
    broadcaster: broadcast::Sender<String>,
    latest: Arc<Mutex<Option<CycleOutput>>>,
    testing: Mutex<Option<CancelHandle>>,
}

impl AppState {
    fn new(engine: Engine, repeat: RepeatSettings) -> Self {
        let (tx, _) = broadcast::channel::<String>(256);
        Self {
            scenario_name: engine.scenario_name().to_string(),
            engine: Arc::new(Mutex::new(engine)),
            repeat,
            broadcaster: tx,
            latest: Arc::new(Mutex::new(None)),
            testing: Mutex::new(None),
        }
    }

    fn publisher(&self) -> impl FnMut(&CycleOutput) + Send + 'static {
        let latest = self.latest.clone();
        let tx = self.broadcaster.clone();
        move |output: &CycleOutput| publish(&latest, &tx, output)
    }

    fn is_testing(&self) -> bool {
        self.testing.lock().expect("testing lock poisoned").is_some()
    }
}

fn publish(latest: &Mutex<Option<CycleOutput>>, tx: &broadcast::Sender<String>, output: &CycleOutput) {
    *latest.lock().expect("latest cycle lock poisoned") = Some(output.clone());
    match serde_json::to_string(output) {
        Ok(payload) => {
            let _ = tx.send(payload);
        }
        Err(err) => warn!(error = %err, "failed to encode cycle"),
    }
}

#[derive(Serialize)]
struct StateEnvelope {
    scenario: String,
    testing: bool,
    cycle: Option<CycleOutput>,
}

#[derive(Serialize)]
struct TestingStatus {
    testing: bool,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        engine,
        repeat,
        host,
        port,
    } = config;

    let state = Arc::new(AppState::new(engine, repeat));

    let first = run_one(&state).await.context("initial cycle failed")?;
    info!(%first, "initial cycle ready");

    let router = Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/cycle", post(trigger_cycle))
        .route("/api/testing", post(toggle_testing))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    info!("census chart live at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn run_one(state: &Arc<AppState>) -> crate::error::Result<CycleOutput> {
    let engine = state.engine.clone();
    let output = tokio::task::spawn_blocking(move || {
        engine.lock().expect("engine lock poisoned").run_cycle()
    })
    .await??;
    publish(&state.latest, &state.broadcaster, &output);
    Ok(output)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web host");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], assets::STYLES_CSS)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let cycle = state
        .latest
        .lock()
        .expect("latest cycle lock poisoned")
        .clone();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        testing: state.is_testing(),
        cycle,
    })
}

async fn trigger_cycle(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleOutput>, (StatusCode, String)> {
    run_one(&state)
        .await
        .map(Json)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
}

async fn toggle_testing(State(state): State<Arc<AppState>>) -> Json<TestingStatus> {
    let mut slot = state.testing.lock().expect("testing lock poisoned");
    if let Some(handle) = slot.take() {
        handle.cancel();
        info!("cancelled testing");
        return Json(TestingStatus { testing: false });
    }

    let handle = CancelHandle::new();
    *slot = Some(handle.clone());
    drop(slot);

    info!("beginning test run");
    let task_state = state.clone();
    tokio::spawn(async move {
        let result = run_repeating(
            task_state.engine.clone(),
            task_state.repeat.clone(),
            handle.clone(),
            task_state.publisher(),
        )
        .await;
        match result {
            Ok(summary) => info!(cycles = summary.cycles, "testing complete"),
            Err(err) => error!(error = %err, "testing aborted"),
        }
        let mut slot = task_state.testing.lock().expect("testing lock poisoned");
        if slot.as_ref().is_some_and(|current| current.same_as(&handle)) {
            *slot = None;
        }
    });

    Json(TestingStatus { testing: true })
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
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
