use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, Json, Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use contracts::{
    api::{AdvanceTime, NodeInfo, NonceResponse, Receipt},
    Event, EventFilter, Identity, Revert, Transaction,
};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::{chain::TxFailure, clock::AdvanceError, indexer, node::Node};

pub struct AppModuleCtx {
    pub node: Arc<Node>,
    pub dev_mode: bool,
    pub max_body_size: usize,
}

#[derive(Clone)]
pub(crate) struct RouterCtx {
    pub node: Arc<Node>,
    pub dev_mode: bool,
}

pub fn build_router(ctx: AppModuleCtx) -> Router {
    let state = RouterCtx {
        node: ctx.node,
        dev_mode: ctx.dev_mode,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/_health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/info", get(get_info))
        .route("/v1/account/{account}/nonce", get(get_nonce))
        .route("/v1/tx", post(send_tx))
        .route("/v1/dev/advance_time", post(advance_time))
        .route("/v1/events/ws", get(events_ws))
        .merge(indexer::router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(ctx.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// JSON error body: the revert plus when it happened.
pub(crate) struct AppError(pub StatusCode, pub Revert);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "code": self.1.code,
            "reason": self.1.reason,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));
        (self.0, body).into_response()
    }
}

impl From<TxFailure> for AppError {
    fn from(failure: TxFailure) -> Self {
        match failure {
            TxFailure::Rejected(revert) => AppError(StatusCode::BAD_REQUEST, revert),
            TxFailure::Reverted(revert) => AppError(StatusCode::UNPROCESSABLE_ENTITY, revert),
        }
    }
}

async fn health() -> impl IntoResponse {
    Json("OK")
}

async fn metrics(State(ctx): State<RouterCtx>) -> Result<String, AppError> {
    ctx.node.metrics().render().map_err(|e| {
        AppError(
            StatusCode::INTERNAL_SERVER_ERROR,
            Revert::new("INTERNAL", e.to_string()),
        )
    })
}

// --------------------------------------------------------
//     Routes
// --------------------------------------------------------

async fn get_info(State(ctx): State<RouterCtx>) -> Json<NodeInfo> {
    let node = &ctx.node;
    let (block_height, timestamp) = node
        .read(|state, now| (state.block_height(), now))
        .await;
    Json(NodeInfo {
        id: node.id.clone(),
        chain_id: node.chain_id,
        block_height,
        timestamp,
        dev_mode: ctx.dev_mode,
    })
}

async fn get_nonce(
    Path(account): Path<String>,
    State(ctx): State<RouterCtx>,
) -> Json<NonceResponse> {
    let account = Identity::from(account).normalized();
    let nonce = ctx.node.read(|state, _| state.nonce(&account)).await;
    Json(NonceResponse { account, nonce })
}

async fn send_tx(
    State(ctx): State<RouterCtx>,
    Json(tx): Json<Transaction>,
) -> Result<Json<Receipt>, AppError> {
    debug!("Received tx from {} nonce {}", tx.tx.identity, tx.tx.nonce);
    Ok(Json(ctx.node.submit(tx).await?))
}

async fn advance_time(
    State(ctx): State<RouterCtx>,
    Json(request): Json<AdvanceTime>,
) -> Result<Json<NodeInfo>, AppError> {
    if !ctx.dev_mode {
        return Err(AppError(
            StatusCode::FORBIDDEN,
            Revert::new("DEV_MODE_ONLY", "Time can only be advanced in dev mode"),
        ));
    }
    let now = ctx
        .node
        .clock()
        .advance(request.seconds)
        .map_err(|e| match e {
            AdvanceError::SystemClock => AppError(
                StatusCode::CONFLICT,
                Revert::new("SYSTEM_CLOCK", "Node runs on the system clock"),
            ),
            AdvanceError::Overflow => AppError(
                StatusCode::BAD_REQUEST,
                Revert::new("INVALID_PARAMS", "Time cannot be advanced that far"),
            ),
        })?;
    info!("⏩ Advanced node clock by {}s to {now}", request.seconds);
    Ok(get_info(State(ctx)).await)
}

#[derive(Deserialize, Debug, Default)]
struct EventQuery {
    contract: Option<String>,
    account: Option<String>,
}

async fn events_ws(
    ws: WebSocketUpgrade,
    Query(query): Query<EventQuery>,
    State(ctx): State<RouterCtx>,
) -> impl IntoResponse {
    let filter = EventFilter {
        contract: query.contract.map(Into::into),
        account: query.account.map(|a| Identity::from(a).normalized()),
    };
    let events = ctx.node.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, events, filter))
}

async fn stream_events(
    mut socket: WebSocket,
    mut events: broadcast::Receiver<Event>,
    filter: EventFilter,
) {
    debug!(?filter, "Event subscriber attached");
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if !filter.matches(&event) {
                        continue;
                    }
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Could not encode event: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, {skipped} events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!(?filter, "Event subscriber detached");
}
