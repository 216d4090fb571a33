use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use std::sync::atomic::{AtomicU64, Ordering};

/// One session's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

/// Connected web clients: `session_id -> Connection`.
///
/// Owned by the transport; the publisher only takes snapshots.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<u64, Connection>,
    seq: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Register a connection and return its session id.
    pub fn insert(&self, conn: Connection) -> u64 {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(id, conn);
        id
    }

    pub fn remove(&self, session_id: u64) -> Option<Connection> {
        self.sessions.remove(&session_id).map(|(_, conn)| conn)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Clone out every sender so no shard lock is held while sending.
    pub fn snapshot(&self) -> Vec<(u64, Connection)> {
        self.sessions
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }
}
