//! HTTP + WebSocket API for E.C.H.O.
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /scenarios - Scenario catalog
//! - POST /session/new - Create new session
//! - GET /session/{id} - Get session status
//! - DELETE /session/{id} - End a session
//! - POST /session/{id}/turn - Run one turn
//! - POST /session/{id}/reset - Reset (requires confirm)
//! - POST /session/{id}/scenario - Switch scenario
//! - GET /session/{id}/messages - Message log
//! - GET /session/{id}/decisions - Agent decision log
//! - GET /session/{id}/report - Performance report
//! - POST /session/{id}/voice - Microphone placeholder
//! - WS /ws/{id} - Live tension updates

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::core::{SessionSnapshot, SimConfig, TurnController};
use crate::types::{
    AgentDecision, ChatMessage, PerformanceReport, Scenario, SimError, TensionBand, TurnOutcome,
};

/// One live practice session
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub controller: Arc<TurnController>,
    pub update_tx: broadcast::Sender<TensionUpdate>,
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct TensionUpdate {
    pub turn: u32,
    pub tension: u8,
    pub heart_rate: u16,
    pub band: TensionBand,
    /// Band color for the heart-rate chart
    pub color: &'static str,
    pub history: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complication: Option<String>,
}

impl TensionUpdate {
    fn from_snapshot(snap: &SessionSnapshot, outcome: Option<&TurnOutcome>) -> Self {
        Self {
            turn: snap.turn_count,
            tension: snap.tension,
            heart_rate: snap.heart_rate,
            band: snap.band,
            color: snap.band.hex_color(),
            history: snap.history.clone(),
            reply: outcome.map(|o| o.reply.clone()),
            complication: outcome.and_then(|o| o.complication.clone()),
        }
    }
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub config: SimConfig,
}

impl AppState {
    pub fn new(config: SimConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        })
    }
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub scenario: Option<Scenario>,
    /// Overrides the server's configured credential
    pub api_key: Option<String>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    pub scenario: Scenario,
    pub brief: String,
    pub credential_configured: bool,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    pub turn_in_flight: bool,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    pub scenario: Scenario,
}

#[derive(Debug, Serialize)]
pub struct ScenarioInfo {
    pub key: Scenario,
    pub name: &'static str,
    pub persona: &'static str,
    pub brief: &'static str,
    pub initial_tension: u8,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure a handler can return
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    NotImplemented(String),
    Sim(SimError),
}

impl From<SimError> for ApiError {
    fn from(e: SimError) -> Self {
        ApiError::Sim(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "session not found".to_string()),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotImplemented(m) => (StatusCode::NOT_IMPLEMENTED, m),
            ApiError::Sim(e) => {
                let status = match e {
                    SimError::EmptyInput | SimError::Config(_) => StatusCode::BAD_REQUEST,
                    SimError::MissingCredential => StatusCode::UNAUTHORIZED,
                    SimError::TurnInFlight => StatusCode::CONFLICT,
                    SimError::Network(_) | SimError::Api(_) | SimError::Parse(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    SimError::Storage(_) | SimError::Interrupted(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create the API router
pub fn create_router(config: SimConfig) -> Router {
    router_with_state(AppState::new(config))
}

/// Router over existing state, for callers that need to reach the sessions
pub fn router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scenarios", get(list_scenarios))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(end_session))
        .route("/session/:id/turn", post(submit_turn))
        .route("/session/:id/reset", post(reset_session))
        .route("/session/:id/scenario", post(change_scenario))
        .route("/session/:id/messages", get(get_messages))
        .route("/session/:id/decisions", get(get_decisions))
        .route("/session/:id/report", get(get_report))
        .route("/session/:id/voice", post(voice_input))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

async fn list_scenarios() -> Json<Vec<ScenarioInfo>> {
    Json(
        Scenario::ALL
            .iter()
            .map(|s| ScenarioInfo {
                key: *s,
                name: s.display_name(),
                persona: s.persona(),
                brief: s.brief(),
                initial_tension: s.initial_tension(),
            })
            .collect(),
    )
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<NewSessionRequest>>,
) -> ApiResult<NewSessionResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let scenario = req.scenario.unwrap_or(state.config.scenario);
    let model = match req.api_key.as_deref() {
        Some(key) => state.config.model_for(Some(key)),
        None => state.config.build_model(),
    };
    let credential_configured = model.is_some();

    let session_id = generate_session_id();
    let (tx, _) = broadcast::channel(100);
    let session = Session {
        id: session_id.clone(),
        controller: Arc::new(TurnController::new(
            scenario,
            state.config.prompts.clone(),
            model,
        )),
        update_tx: tx,
    };

    state.sessions.write().await.insert(session_id.clone(), session);
    info!(session = %session_id, scenario = scenario.key(), "session created");

    Ok(Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        scenario,
        brief: scenario.brief().to_string(),
        credential_configured,
    }))
}

/// Look up a session's controller without holding the map lock afterwards
async fn controller(
    state: &AppState,
    id: &str,
) -> Result<(Arc<TurnController>, broadcast::Sender<TensionUpdate>), ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(id).ok_or(ApiError::NotFound)?;
    Ok((session.controller.clone(), session.update_tx.clone()))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionStatusResponse> {
    let (ctl, _) = controller(&state, &id).await?;
    Ok(Json(SessionStatusResponse {
        session_id: id,
        snapshot: ctl.snapshot(),
        turn_in_flight: ctl.is_busy(),
    }))
}

/// Run one turn
///
/// The turn runs detached, so a client hanging up does not leave it half done.
/// A failed turn may already have moved tension, so subscribers hear about it
/// either way.
async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> ApiResult<TurnOutcome> {
    let (ctl, tx) = controller(&state, &id).await?;

    match ctl.submit_detached(&req.text).await {
        Ok(outcome) => {
            let _ = tx.send(TensionUpdate::from_snapshot(&ctl.snapshot(), Some(&outcome)));
            Ok(Json(outcome))
        }
        Err(e) => {
            if e.is_upstream() {
                warn!(session = %id, error = %e, "turn failed");
                let _ = tx.send(TensionUpdate::from_snapshot(&ctl.snapshot(), None));
            }
            Err(e.into())
        }
    }
}

/// End a session; refused while its turn is running
async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get(&id).ok_or(ApiError::NotFound)?;
    if session.controller.is_busy() {
        return Err(SimError::TurnInFlight.into());
    }
    sessions.remove(&id);
    info!(session = %id, "session ended");
    Ok(StatusCode::NO_CONTENT)
}

/// Reset; the client has to confirm explicitly
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ResetRequest>>,
) -> ApiResult<SessionStatusResponse> {
    let (ctl, tx) = controller(&state, &id).await?;
    let req = body.map(|Json(r)| r).unwrap_or_default();
    if !req.confirm {
        return Err(ApiError::BadRequest(
            "Reset the simulation? This will clear all progress. Send {\"confirm\": true}.".to_string(),
        ));
    }

    ctl.reset()?;
    let snapshot = ctl.snapshot();
    let _ = tx.send(TensionUpdate::from_snapshot(&snapshot, None));
    Ok(Json(SessionStatusResponse {
        session_id: id,
        snapshot,
        turn_in_flight: false,
    }))
}

async fn change_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ScenarioRequest>,
) -> ApiResult<SessionStatusResponse> {
    let (ctl, tx) = controller(&state, &id).await?;
    ctl.set_scenario(req.scenario)?;
    let snapshot = ctl.snapshot();
    let _ = tx.send(TensionUpdate::from_snapshot(&snapshot, None));
    Ok(Json(SessionStatusResponse {
        session_id: id,
        snapshot,
        turn_in_flight: false,
    }))
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ChatMessage>> {
    let (ctl, _) = controller(&state, &id).await?;
    Ok(Json(ctl.messages()))
}

async fn get_decisions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<AgentDecision>> {
    let (ctl, _) = controller(&state, &id).await?;
    Ok(Json(ctl.decisions()))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<PerformanceReport> {
    let (ctl, _) = controller(&state, &id).await?;
    ctl.report().map(Json).ok_or(ApiError::NotFound)
}

/// Voice input is not implemented
async fn voice_input(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    controller(&state, &id).await?;
    Err(ApiError::NotImplemented(
        "🎙️ Voice input coming soon! For now, please use text input.".to_string(),
    ))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let (ctl, tx) = controller(&state, &id).await?;
    let rx = tx.subscribe();
    let initial = TensionUpdate::from_snapshot(&ctl.snapshot(), None);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, initial, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(
    mut socket: WebSocket,
    initial: TensionUpdate,
    mut rx: broadcast::Receiver<TensionUpdate>,
) {
    let json = serde_json::to_string(&initial).unwrap_or_default();
    if socket.send(Message::Text(json)).await.is_err() {
        return;
    }
    loop {
        match rx.recv().await {
            Ok(update) => {
                let json = serde_json::to_string(&update).unwrap_or_default();
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "websocket client lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session_{:x}{:04x}", nanos, seq & 0xffff)
}

/// Run the API server
pub async fn run_server(addr: &str, config: SimConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "E.C.H.O. API listening");
    println!("🚑 E.C.H.O. API running on {}", addr);
    println!("  GET  /scenarios              - Scenario catalog");
    println!("  POST /session/new            - Create session");
    println!("  GET  /session/:id            - Get status");
    println!("  DEL  /session/:id            - End session");
    println!("  POST /session/:id/turn       - Send a message");
    println!("  POST /session/:id/reset      - Reset (confirm required)");
    println!("  GET  /session/:id/report     - Performance report");
    println!("  WS   /ws/:id                 - Live tension updates");
    println!("  GET  /health                 - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
