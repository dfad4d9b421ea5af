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

//! WebSocket JSON protocol
//!
//! Every frame is a JSON object naming the event and carrying its payload:
//! ```json
//! {
//!   "event": "player_move",
//!   "data": {"position": {"x": 6, "y": 5, "scene": "campus"}, "direction": "right"}
//! }
//! ```
//!
//! Inbound `user_id` fields are accepted for client compatibility only; the
//! server always acts as the identity bound to the connection.

use crate::entity::{Direction, Entity, Item, Meter, Position, Vitals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinGame(JoinGame),
    PlayerMove(PlayerMove),
    InteractItem(InteractItem),
    ChatMessage(ChatMessage),
    UpdateStatus(UpdateStatus),
}

impl ClientEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinGame(_) => "join_game",
            ClientEvent::PlayerMove(_) => "player_move",
            ClientEvent::InteractItem(_) => "interact_item",
            ClientEvent::ChatMessage(_) => "chat_message",
            ClientEvent::UpdateStatus(_) => "update_status",
        }
    }
}

/// Request to enter the shared space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinGame {
    pub token: Option<String>,
    pub nickname: Option<String>,
    pub sprite: Option<String>,
    pub energy: Option<Meter>,
    pub happiness: Option<Meter>,
    pub health: Option<Meter>,
    pub position: Option<Position>,
    pub bag: Option<Vec<Item>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub user_id: Option<String>,
    pub position: Option<Position>,
    pub direction: Option<Direction>,
    pub animation_frame: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractItem {
    pub user_id: Option<String>,
    pub item: ItemDescriptor,
    pub scene: Option<String>,
}

/// A scene item as the client saw it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub name: Option<String>,

    pub interaction: Option<Interaction>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// What happens when a player uses an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub interaction_type: Option<String>,

    /// Signed deltas keyed by vital name
    #[serde(default)]
    pub status_changes: BTreeMap<String, i64>,

    /// Items to put into the bag, in order
    #[serde(default)]
    pub bag_changes: Vec<Item>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: String,
    pub target_id: Option<String>,
}

/// Absolute vitals reported by a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub user_id: Option<String>,
    pub energy: Option<Meter>,
    pub happiness: Option<Meter>,
    pub health: Option<Meter>,
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    GameState(GameState),
    PlayerJoined(Entity),
    PlayerMoved(PlayerMoved),
    InteractionResult(InteractionResult),
    PlayerStatusUpdate(StatusUpdate),
    ChatMessage(ChatEnvelope),
    PlayerDisconnected(PlayerDisconnected),
    AiUpdate(AiSnapshot),
    Error(ErrorMessage),
}

impl ServerEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GameState(_) => "game_state",
            ServerEvent::PlayerJoined(_) => "player_joined",
            ServerEvent::PlayerMoved(_) => "player_moved",
            ServerEvent::InteractionResult(_) => "interaction_result",
            ServerEvent::PlayerStatusUpdate(_) => "player_status_update",
            ServerEvent::ChatMessage(_) => "chat_message",
            ServerEvent::PlayerDisconnected(_) => "player_disconnected",
            ServerEvent::AiUpdate(_) => "ai_update",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorMessage {
            message: message.into(),
        })
    }
}

/// Entities keyed by identity
pub type EntityMap = BTreeMap<String, Entity>;

/// Full copy of the shared state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub players: EntityMap,
    pub ai_characters: EntityMap,
    pub ai_players: EntityMap,
}

/// Snapshot delivered to a player that just joined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub your_id: String,
}

/// State of the autonomous entities after a tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSnapshot {
    pub ai_characters: EntityMap,
    pub ai_players: EntityMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoved {
    pub user_id: String,
    pub position: Position,
    pub direction: Direction,
    pub animation_frame: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResult {
    #[serde(rename = "type")]
    pub interaction_type: Option<String>,
    pub data: Interaction,
    pub item_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub user_id: String,
    #[serde(flatten)]
    pub vitals: Vitals,
}

/// A chat line as delivered to recipients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub from: Option<String>,
    pub from_nickname: String,
    pub to: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDisconnected {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}
