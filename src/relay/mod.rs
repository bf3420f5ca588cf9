//! WebSocket シグナリング中継
//!
//! メッセージ形式: `{ "room": "...", "type": "offer"|"answer"|"candidate", "data": ... }`
//! 同じルームの他のクライアントへそのまま転送する。
//! 解析できないメッセージはログに残して無視する。

pub mod rooms;

pub use rooms::{ClientId, RoomRegistry};

use crate::error::{PoiVisitError, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub room: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(default)]
    pub data: Value,
}

impl SignalMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let message: SignalMessage = serde_json::from_str(text)?;
        if message.room.trim().is_empty() {
            return Err(PoiVisitError::Relay("room が空です".into()));
        }
        Ok(message)
    }
}

/// ルーター（/ws と /health）
pub fn router(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(registry)
}

/// 中継サーバーを起動
pub async fn serve(bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| PoiVisitError::Config(format!("不正なアドレス: {}", bind)))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("中継サーバー起動: ws://{}/ws", addr);

    let registry = Arc::new(RoomRegistry::new());
    axum::serve(listener, router(registry))
        .await
        .map_err(|e| PoiVisitError::Relay(e.to_string()))
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<RoomRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// 1接続の処理（送信タスク + 受信ループ）
async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>) {
    let client = registry.next_client_id();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    log::debug!("クライアント接続: {}", client);

    let sender_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(text)).await {
                log::warn!("送信失敗: {}", e);
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                log::warn!("受信エラー: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                relay_text(&registry, client, &tx, &text).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    let left = registry.leave_all(client).await;
    drop(tx);
    let _ = sender_task.await;
    log::debug!("クライアント切断: {} ({}ルームから退出)", client, left);
}

/// 受信テキストを同じルームへ転送し、転送数を返す
pub async fn relay_text(
    registry: &RoomRegistry,
    client: ClientId,
    tx: &mpsc::UnboundedSender<String>,
    text: &str,
) -> usize {
    let message = match SignalMessage::parse(text) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("不正なメッセージを無視: {}", e);
            return 0;
        }
    };

    registry.join(&message.room, client, tx.clone()).await;
    let delivered = registry.broadcast(&message.room, client, text).await;
    log::debug!(
        "{:?} room={} from={} → {}件",
        message.kind,
        message.room,
        client,
        delivered
    );
    delivered
}
