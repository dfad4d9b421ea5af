//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Connection pool for fanning events out to live WebSocket connections

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use townsquare_common::protocol::ServerEvent;
use uuid::Uuid;

/// Identifier of a live connection
pub type ConnectionId = Uuid;

/// Event queued for delivery. Shared so a broadcast serializes nothing twice.
pub type Outbound = Arc<ServerEvent>;

/// Connection handle for a single live connection
pub struct ConnectionHandle {
    connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(connection_id: ConnectionId, sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            connection_id,
            sender,
        }
    }

    /// Queue an event for this connection
    pub fn send(&self, event: Outbound) -> Result<(), String> {
        self.sender
            .send(event)
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }
}

/// Live connections and their outbound queues.
///
/// Delivery is best-effort: an event for a connection whose writer has gone
/// away is dropped and never retried.
#[derive(Default)]
pub struct ConnectionPool {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, returning its id and outbound queue
    pub async fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<Outbound>) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut connections = self.connections.write().await;
        connections.insert(connection_id, ConnectionHandle::new(connection_id, tx));

        (connection_id, rx)
    }

    /// Unregister a connection. Returns false if it was not registered.
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        connections.remove(&connection_id).is_some()
    }

    /// Send an event to one connection
    pub async fn send(&self, connection_id: ConnectionId, event: ServerEvent) -> Result<(), String> {
        let connections = self.connections.read().await;
        match connections.get(&connection_id) {
            Some(handle) => handle.send(Arc::new(event)),
            None => Err(format!("Connection not found: {}", connection_id)),
        }
    }

    /// Send an event to every connection, returning how many accepted it
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        self.fan_out(None, event).await
    }

    /// Send an event to every connection except `excluded`
    pub async fn broadcast_except(&self, excluded: ConnectionId, event: ServerEvent) -> usize {
        self.fan_out(Some(excluded), event).await
    }

    async fn fan_out(&self, excluded: Option<ConnectionId>, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let connections = self.connections.read().await;
        let mut sent_count = 0;

        for handle in connections.values() {
            if Some(handle.connection_id()) == excluded {
                continue;
            }
            match handle.send(Arc::clone(&event)) {
                Ok(()) => sent_count += 1,
                Err(e) => tracing::debug!(
                    "Dropping {} for connection {}: {}",
                    event.name(),
                    handle.connection_id(),
                    e
                ),
            }
        }

        sent_count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&connection_id)
    }
}
