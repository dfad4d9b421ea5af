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

//! WebSocket transport
//!
//! Each connection gets a writer task pumping its pool queue onto the socket
//! and a reader loop feeding decoded events to the [`EventRouter`] one at a
//! time, so events from one connection are applied in arrival order.
//!
//! [`EventRouter`]: crate::router::EventRouter

use crate::context::ServerContext;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use townsquare_common::protocol::{ClientEvent, ServerEvent};

/// WebSocket upgrade handler
pub async fn handler(ws: WebSocketUpgrade, State(context): State<ServerContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

/// Drive one connection until the peer goes away
pub async fn handle_socket(socket: WebSocket, context: ServerContext) {
    let (connection, mut outbound) = context.pool().register().await;
    tracing::info!("WebSocket connection {} opened", connection);

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                tracing::debug!("Connection {} stopped accepting events: {}", connection, e);
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match decode(text.as_str()) {
                Ok(event) => context.router().handle(connection, event).await,
                Err(e) => tracing::warn!("Ignoring malformed event from {}: {}", connection, e),
            },
            Ok(Message::Binary(data)) => {
                tracing::debug!(
                    "Ignoring {} bytes of binary data from {}",
                    data.len(),
                    connection
                );
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("WebSocket error on {}: {}", connection, e);
                break;
            }
        }
    }

    context.router().disconnect(connection).await;
    writer.abort();
    tracing::info!("WebSocket connection {} closed", connection);
}

/// Decode one text frame
pub fn decode(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Encode one outbound event as a text frame
pub fn encode(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
