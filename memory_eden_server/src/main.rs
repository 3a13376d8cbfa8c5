use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use clap::Parser;
use dashmap::DashMap;
use futures_util::{SinkExt, stream::StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use memory_eden_core::{
    ClientMessage, DifficultyFilter, InMemoryLeaderboard, LeaderboardStore, ServerMessage,
    SystemClock, TableId,
};

mod config;
mod table;

use config::ServerConfig;
use table::{MAX_LEADERBOARD_LIMIT, Table};

// 服务器全局状态
struct AppState {
    tables: DashMap<TableId, Arc<Table>>,
    leaderboard: Arc<dyn LeaderboardStore>,
    config: ServerConfig,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = config.addr;
    let state = SharedState::new(AppState {
        tables: DashMap::new(),
        leaderboard: Arc::new(InMemoryLeaderboard::new()),
        config,
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/tables/{table_id}", get(table_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("服务器正在监听 {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    #[serde(default)]
    difficulty: DifficultyFilter,
    limit: Option<usize>,
}

/// `GET /leaderboard?difficulty=easy&limit=20`
async fn leaderboard_handler(
    Query(query): Query<LeaderboardQuery>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard_limit)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    match state.leaderboard.query_top(query.difficulty, limit) {
        Ok(scores) => Json(scores).into_response(),
        Err(e) => {
            warn!("查询排行榜失败: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// `GET /tables/{table_id}`，查看某张桌子当前（打码后）的状态
async fn table_handler(
    Path(table_id): Path<TableId>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    match state.tables.get(&table_id) {
        Some(table) => Json(table.snapshot()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("桌子 {} 不存在", table_id)).into_response(),
    }
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，桌子和它的延迟任务都通过它向客户端发消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    let table_id = Uuid::new_v4();
    let table = Table::new(
        table_id,
        tx.clone(),
        state.leaderboard.clone(),
        Arc::new(SystemClock),
        state.config.table_config(),
        StdRng::from_os_rng(),
    );
    state.tables.insert(table_id, table.clone());
    info!("新连接，分配桌子 {}（当前 {} 张）", table_id, state.tables.len());

    let _ = tx.send(ServerMessage::Welcome { table_id }).await;
    let _ = tx.send(ServerMessage::GameStateSnapshot(table.snapshot())).await;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => table.handle_message(client_msg).await,
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                    let _ = tx
                        .send(ServerMessage::Error { message: format!("无法解析的消息: {}", e) })
                        .await;
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    table.cancel_pending();
    state.tables.remove(&table_id);
    drop(tx);
    writer.abort();
    info!("桌子 {} 的连接关闭", table_id);
}

// --- 单元测试 ---
