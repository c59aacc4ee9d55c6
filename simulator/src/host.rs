use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use irrigation_common::{
    routes::{COMMAND_QUERY_KEY, ROUTE_COMMAND, ROUTE_PING, ROUTE_STATUS},
    CommandReply,
};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

use crate::device::SimulatedDevice;

#[derive(Clone)]
struct AppState {
    device: Arc<Mutex<SimulatedDevice>>,
    reboot_ms: u64,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::var("SIM_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8081);
    let reboot_secs = std::env::var("SIM_REBOOT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(10);
    let device_ip = std::env::var("SIM_DEVICE_IP").unwrap_or_else(|_| "127.0.0.1".to_string());

    let app_state = AppState {
        device: Arc::new(Mutex::new(SimulatedDevice::new(device_ip))),
        reboot_ms: reboot_secs * 1_000,
    };

    spawn_control_loop(app_state.clone());

    let app = Router::new()
        .route(ROUTE_PING, get(handle_ping))
        .route(ROUTE_STATUS, get(handle_status))
        .route(ROUTE_COMMAND, get(handle_command))
        .with_state(app_state);

    let addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind simulator at {addr}"))?;

    info!("device simulator listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_control_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let mut device = app_state.device.lock().await;
            if device.is_available(monotonic_ms()) {
                device.tick(1.0);
            }
        }
    });
}

async fn handle_ping(State(state): State<AppState>) -> axum::response::Response {
    let mut device = state.device.lock().await;
    if !device.is_available(monotonic_ms()) {
        return unavailable();
    }
    (StatusCode::OK, "pong").into_response()
}

async fn handle_status(State(state): State<AppState>) -> axum::response::Response {
    let mut device = state.device.lock().await;
    if !device.is_available(monotonic_ms()) {
        return unavailable();
    }
    let time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    Json(device.status(time)).into_response()
}

async fn handle_command(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let Some(cmd) = params.get(COMMAND_QUERY_KEY) else {
        return message_response(StatusCode::BAD_REQUEST, "Missing 'cmd' parameter");
    };

    let now_ms = monotonic_ms();
    let mut device = state.device.lock().await;
    if !device.is_available(now_ms) {
        return unavailable();
    }

    match device.apply_command(cmd, now_ms, state.reboot_ms) {
        Ok(message) => {
            info!("command {cmd}: {message}");
            message_response(StatusCode::OK, &message)
        }
        Err(message) => {
            warn!("command {cmd} rejected: {message}");
            message_response(StatusCode::BAD_REQUEST, &message)
        }
    }
}

fn unavailable() -> axum::response::Response {
    (StatusCode::SERVICE_UNAVAILABLE, "rebooting").into_response()
}

fn message_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(CommandReply {
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
