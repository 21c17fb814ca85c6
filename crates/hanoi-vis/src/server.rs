//! Axum web server with WebSocket streaming of render instructions.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade, Message}},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hanoi_playback::{
    solve_and_load, Control, Error, Key, PlaybackConfig, PlaybackSession, PlaybackStatus,
    RenderCommand, SequenceStore, SolveRequest, SolveResponse, Solver, Verification,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    store: RwLock<SequenceStore>,
    session: PlaybackSession,
    solver: Arc<dyn Solver>,
    config: PlaybackConfig,
}

/// Visualization server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    /// Create a server around a running session and a solver.
    pub fn new(session: PlaybackSession, solver: Arc<dyn Solver>, config: PlaybackConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                store: RwLock::new(SequenceStore::new()),
                session,
                solver,
                config,
            }),
        }
    }

    /// Solve for `discs` and load the result, as if requested over HTTP.
    pub async fn preload(&self, discs: i64) -> hanoi_playback::Result<()> {
        let state = &self.state;
        solve_and_load(
            state.solver.as_ref(),
            &state.store,
            &state.session,
            discs,
            state.config.discs,
        )
        .await
        .map(|_| ())
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            // Solving
            .route("/api/solve", post(solve_handler))
            .route("/api/solution", post(install_handler))
            .route("/api/solution/verify", get(verify_handler))
            // Playback controls
            .route("/api/playback", get(playback_status_handler))
            .route("/api/playback/next", post(next_handler))
            .route("/api/playback/previous", post(previous_handler))
            .route("/api/playback/toggle", post(toggle_handler))
            .route("/api/playback/reset", post(reset_handler))
            .route("/api/playback/key", post(key_handler))
            // WebSocket for render instructions
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the given address.
    pub async fn serve(self, addr: SocketAddr) -> hanoi_playback::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Visualization server running on http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Error body returned by the API.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match e {
            Error::InvalidRequest(_) | Error::SolverFailure(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            Error::Serialization(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn current_status(state: &AppState) -> ApiResult<Option<PlaybackStatus>> {
    Ok(Json(state.session.status().await?))
}

async fn solve_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SolveRequest>,
) -> ApiResult<Option<PlaybackStatus>> {
    solve_and_load(
        state.solver.as_ref(),
        &state.store,
        &state.session,
        req.discs,
        state.config.discs,
    )
    .await?;
    current_status(&state).await
}

async fn install_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SolveResponse>,
) -> ApiResult<Option<PlaybackStatus>> {
    {
        let mut store = state.store.write().await;
        let solution = store.accept(payload)?;
        state.session.load(solution)?;
    }
    current_status(&state).await
}

async fn verify_handler(State(state): State<Arc<AppState>>) -> ApiResult<Verification> {
    let store = state.store.read().await;
    match store.current() {
        Some(solution) => Ok(Json(solution.verify())),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: "no solution loaded".to_string(),
        }),
    }
}

async fn playback_status_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Option<PlaybackStatus>> {
    current_status(&state).await
}

async fn control(state: &AppState, control: Control) -> ApiResult<Option<PlaybackStatus>> {
    state.session.control(control)?;
    current_status(state).await
}

async fn next_handler(State(state): State<Arc<AppState>>) -> ApiResult<Option<PlaybackStatus>> {
    control(&state, Control::Next).await
}

async fn previous_handler(State(state): State<Arc<AppState>>) -> ApiResult<Option<PlaybackStatus>> {
    control(&state, Control::Previous).await
}

async fn toggle_handler(State(state): State<Arc<AppState>>) -> ApiResult<Option<PlaybackStatus>> {
    control(&state, Control::TogglePlayPause).await
}

async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult<Option<PlaybackStatus>> {
    control(&state, Control::Reset).await
}

#[derive(Deserialize)]
struct KeyRequest {
    key: String,
}

async fn key_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KeyRequest>,
) -> ApiResult<Option<PlaybackStatus>> {
    match Key::from_dom(&req.key) {
        Some(key) => control(&state, key.control()).await,
        None => current_status(&state).await,
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    Key { key: String },
    Next,
    Previous,
    #[serde(alias = "toggle_play_pause")]
    Toggle,
    Reset,
    GetStatus,
}

/// What an incoming command asks of the session.
#[derive(Debug, PartialEq, Eq)]
enum WsAction {
    Control(Control),
    SendStatus,
    Ignore,
}

impl WsCommand {
    fn action(self) -> WsAction {
        let control = match self {
            WsCommand::Key { key } => match Key::from_dom(&key) {
                Some(key) => key.control(),
                None => return WsAction::Ignore,
            },
            WsCommand::Next => Control::Next,
            WsCommand::Previous => Control::Previous,
            WsCommand::Toggle => Control::TogglePlayPause,
            WsCommand::Reset => Control::Reset,
            WsCommand::GetStatus => return WsAction::SendStatus,
        };
        WsAction::Control(control)
    }
}

/// Map a text frame to an action; anything unparseable is ignored.
fn parse_ws_text(text: &str) -> WsAction {
    match serde_json::from_str::<WsCommand>(text) {
        Ok(cmd) => cmd.action(),
        Err(_) => {
            debug!("Ignoring unrecognised message: {}", text);
            WsAction::Ignore
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsResponse {
    Status { status: Option<PlaybackStatus> },
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket client connected");
    let mut renders = state.session.subscribe();

    if !send_frames(&mut socket, status_frames(&state).await).await {
        return;
    }

    loop {
        let frames = tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match parse_ws_text(&text) {
                        WsAction::Control(control) => {
                            if state.session.control(control).is_err() {
                                break;
                            }
                            continue;
                        }
                        WsAction::SendStatus => status_frames(&state).await,
                        WsAction::Ignore => continue,
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    _ => continue,
                }
            }
            render = renders.recv() => render_frames(&state, render).await,
        };
        if !send_frames(&mut socket, frames).await {
            break;
        }
    }
    info!("WebSocket client disconnected");
}

/// Frames for one render stream event. `None` ends the connection.
async fn render_frames(
    state: &AppState,
    render: Result<RenderCommand, broadcast::error::RecvError>,
) -> Option<Vec<String>> {
    match render {
        Ok(command) => Some(encode(&command).into_iter().collect()),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            debug!(skipped, "Render stream lagged, resending status");
            status_frames(state).await
        }
        Err(broadcast::error::RecvError::Closed) => None,
    }
}

/// The full status followed by a complete redraw.
async fn status_frames(state: &AppState) -> Option<Vec<String>> {
    let status = state.session.status().await.ok()?;
    let redraw: Vec<RenderCommand> = status.as_ref().map(PlaybackStatus::commands).unwrap_or_default();

    let mut frames: Vec<String> = encode(&WsResponse::Status { status }).into_iter().collect();
    frames.extend(redraw.iter().filter_map(encode));
    Some(frames)
}

fn encode<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Failed to encode message: {}", e);
            None
        }
    }
}

async fn send_frames(socket: &mut WebSocket, frames: Option<Vec<String>>) -> bool {
    let Some(frames) = frames else {
        return false;
    };
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return false;
        }
    }
    true
}
