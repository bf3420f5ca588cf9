//! ルーム管理
//!
//! ルーム名 → (クライアントID → 送信チャネル)。
//! 最初のメッセージを送った時点でそのルームに参加したものとみなす。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

pub type ClientId = u64;

#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, HashMap<ClientId, UnboundedSender<String>>>>,
    next_id: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続ごとの一意なID
    pub fn next_client_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// ルームに参加（新規参加なら true）
    pub async fn join(&self, room: &str, client: ClientId, tx: UnboundedSender<String>) -> bool {
        let mut rooms = self.rooms.lock().await;
        let members = rooms.entry(room.to_string()).or_default();
        if members.contains_key(&client) {
            return false;
        }
        members.insert(client, tx);
        true
    }

    /// 送信者以外の全員に転送し、届いた数を返す
    ///
    /// 送信に失敗したメンバー（切断済み）はその場で外す。
    pub async fn broadcast(&self, room: &str, from: ClientId, text: &str) -> usize {
        let mut rooms = self.rooms.lock().await;
        let Some(members) = rooms.get_mut(room) else {
            return 0;
        };

        let mut delivered = 0;
        members.retain(|id, tx| {
            if *id == from {
                return true;
            }
            if tx.send(text.to_string()).is_ok() {
                delivered += 1;
                true
            } else {
                log::debug!("切断済みのクライアントを除外: {} (room={})", id, room);
                false
            }
        });

        if members.is_empty() {
            rooms.remove(room);
        }
        delivered
    }

    /// 全ルームから退出（空になったルームは削除）し、退出したルーム数を返す
    pub async fn leave_all(&self, client: ClientId) -> usize {
        let mut rooms = self.rooms.lock().await;
        let mut left = 0;
        rooms.retain(|_, members| {
            if members.remove(&client).is_some() {
                left += 1;
            }
            !members.is_empty()
        });
        left
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn member_count(&self, room: &str) -> usize {
        self.rooms
            .lock()
            .await
            .get(room)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        let registry = RoomRegistry::new();
        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        let a = registry.next_client_id();
        let b = registry.next_client_id();

        assert!(registry.join("salon", a, tx_a.clone()).await);
        assert!(!registry.join("salon", a, tx_a).await);
        registry.join("salon", b, tx_b).await;

        assert_eq!(registry.broadcast("salon", a, "offer").await, 1);
        assert_eq!(rx_b.recv().await.as_deref(), Some("offer"));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let (tx_a, _rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        registry.join("r1", 1, tx_a).await;
        registry.join("r2", 2, tx_b).await;

        assert_eq!(registry.broadcast("r1", 1, "hello").await, 0);
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.broadcast("inconnue", 1, "hello").await, 0);
    }

    #[tokio::test]
    async fn test_leave_all_removes_empty_rooms() {
        let registry = RoomRegistry::new();
        let (tx_a, _rx_a) = unbounded_channel();
        let (tx_b, _rx_b) = unbounded_channel();
        registry.join("r1", 1, tx_a.clone()).await;
        registry.join("r2", 1, tx_a).await;
        registry.join("r2", 2, tx_b).await;

        assert_eq!(registry.leave_all(1).await, 2);
        assert_eq!(registry.room_count().await, 1);
        assert_eq!(registry.member_count("r2").await, 1);
        assert_eq!(registry.member_count("r1").await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_prunes_closed_receivers() {
        let registry = RoomRegistry::new();
        let (tx_a, _rx_a) = unbounded_channel();
        let (tx_b, rx_b) = unbounded_channel();
        registry.join("r", 1, tx_a).await;
        registry.join("r", 2, tx_b).await;
        drop(rx_b);

        assert_eq!(registry.broadcast("r", 1, "candidate").await, 0);
        assert_eq!(registry.member_count("r").await, 1);
    }
}
