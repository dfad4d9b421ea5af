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

//! Event Router
//!
//! Validates inbound client events, applies them to the [`EntityStore`] and
//! decides who hears about the result. Every event is independent; the only
//! state consulted is the store and the session registry at processing time.
//!
//! | Event           | Requires            | Delivered to                          |
//! |-----------------|---------------------|---------------------------------------|
//! | `join_game`     | valid token         | snapshot to joiner, notice to others  |
//! | `player_move`   | registered          | everyone but the sender               |
//! | `interact_item` | registered, effect  | outcome to sender, vitals to everyone |
//! | `chat_message`  | none                | target and sender, or everyone        |
//! | `update_status` | registered          | everyone                              |
//! | disconnect      | none                | everyone remaining                    |
//!
//! Delivery is at-most-once. Events referencing an identity that is not
//! registered are dropped silently; only authentication failures are reported
//! back to the client.

use crate::auth::Authenticator;
use crate::pool::{ConnectionId, ConnectionPool};
use crate::persistence::SceneStore;
use crate::session::{PlayerAttributes, SessionRegistry};
use crate::world::EntityStore;
use std::sync::Arc;
use townsquare_common::entity::{Position, Vital, Vitals};
use townsquare_common::protocol::{
    ChatEnvelope, ChatMessage, ClientEvent, GameState, InteractItem, InteractionResult, JoinGame,
    PlayerDisconnected, PlayerMove, PlayerMoved, ServerEvent, StatusUpdate, UpdateStatus,
};

/// Nickname shown for chat from a connection that never joined
pub const UNKNOWN_NICKNAME: &str = "Unknown";

pub struct EventRouter {
    store: Arc<EntityStore>,
    sessions: Arc<SessionRegistry>,
    pool: Arc<ConnectionPool>,
    authenticator: Arc<dyn Authenticator>,
    scenes: Arc<dyn SceneStore>,
    default_scene: String,
}

impl EventRouter {
    pub fn new(
        store: Arc<EntityStore>,
        sessions: Arc<SessionRegistry>,
        pool: Arc<ConnectionPool>,
        authenticator: Arc<dyn Authenticator>,
        scenes: Arc<dyn SceneStore>,
        default_scene: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sessions,
            pool,
            authenticator,
            scenes,
            default_scene: default_scene.into(),
        }
    }

    /// Process one inbound event from `connection`
    pub async fn handle(&self, connection: ConnectionId, event: ClientEvent) {
        tracing::trace!("Handling {} from connection {}", event.name(), connection);
        match event {
            ClientEvent::JoinGame(request) => self.join(connection, request).await,
            ClientEvent::PlayerMove(request) => self.player_move(connection, request).await,
            ClientEvent::InteractItem(request) => self.interact_item(connection, request).await,
            ClientEvent::ChatMessage(request) => self.chat(connection, request).await,
            ClientEvent::UpdateStatus(request) => self.update_status(connection, request).await,
        }
    }

    /// Tear down a closed connection and tell the remaining peers
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.pool.unregister(connection).await;

        match self.sessions.unregister(connection).await {
            Some(identity) => {
                tracing::info!("Player {} left (connection {})", identity, connection);
                self.pool
                    .broadcast(ServerEvent::PlayerDisconnected(PlayerDisconnected {
                        user_id: identity,
                    }))
                    .await;
            }
            None => tracing::debug!("Connection {} closed without joining", connection),
        }
    }

    async fn join(&self, connection: ConnectionId, request: JoinGame) {
        let identity = match self
            .authenticator
            .authenticate(request.token.as_deref())
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Rejected join from connection {}: {}", connection, e);
                if let Err(e) = self.pool.send(connection, ServerEvent::error(e.to_string())).await {
                    tracing::debug!("Could not report auth failure: {}", e);
                }
                return;
            }
        };

        let position = match request.position {
            Some(position) => position,
            None => self.spawn_position().await,
        };
        let attributes = PlayerAttributes {
            nickname: request.nickname,
            sprite: request.sprite,
            vitals: Vitals {
                energy: request.energy.unwrap_or_default(),
                happiness: request.happiness.unwrap_or_default(),
                health: request.health.unwrap_or_default(),
            },
            position,
            bag: request.bag.unwrap_or_default(),
        };

        let registration = self.sessions.register(connection, &identity, attributes).await;
        let snapshot = self.store.snapshot().await;
        tracing::info!("Player {} joined (connection {})", identity, connection);

        if let Err(e) = self
            .pool
            .send(
                connection,
                ServerEvent::GameState(GameState {
                    snapshot,
                    your_id: identity.clone(),
                }),
            )
            .await
        {
            tracing::debug!("Could not deliver game state to {}: {}", identity, e);
        }

        if let Some(released) = registration.released {
            self.pool
                .broadcast_except(
                    connection,
                    ServerEvent::PlayerDisconnected(PlayerDisconnected { user_id: released }),
                )
                .await;
        }

        self.pool
            .broadcast_except(connection, ServerEvent::PlayerJoined(registration.entity))
            .await;
    }

    async fn spawn_position(&self) -> Position {
        match self.scenes.load_scene(&self.default_scene).await {
            Ok(scene) => scene.spawn_position(),
            Err(e) => {
                tracing::warn!("Falling back to default spawn: {}", e);
                Position {
                    scene: self.default_scene.clone(),
                    ..Position::default()
                }
            }
        }
    }

    async fn player_move(&self, connection: ConnectionId, request: PlayerMove) {
        let Some(identity) = self.sessions.identity_of(connection).await else {
            tracing::debug!("Ignoring move from unregistered connection {}", connection);
            return;
        };

        let moved = {
            let mut world = self.store.write().await;
            let Some(entity) = world.update_movement(
                &identity,
                request.position,
                request.direction.unwrap_or_default(),
                request.animation_frame.unwrap_or(0),
            ) else {
                return;
            };
            PlayerMoved {
                user_id: entity.identity.clone(),
                position: entity.position.clone(),
                direction: entity.direction,
                animation_frame: entity.animation_frame,
            }
        };

        self.pool
            .broadcast_except(connection, ServerEvent::PlayerMoved(moved))
            .await;
    }

    async fn interact_item(&self, connection: ConnectionId, request: InteractItem) {
        let Some(identity) = self.sessions.identity_of(connection).await else {
            tracing::debug!("Ignoring interaction from unregistered connection {}", connection);
            return;
        };
        let Some(interaction) = request.item.interaction else {
            tracing::debug!("Item {:?} has nothing to interact with", request.item.name);
            return;
        };

        let scene = match request.scene {
            Some(scene) => scene,
            None => match self.store.player(&identity).await {
                Some(player) => player.position.scene,
                None => return,
            },
        };
        if let Err(e) = self.scenes.load_scene(&scene).await {
            tracing::warn!("Ignoring interaction by {} in scene {:?}: {}", identity, scene, e);
            return;
        }

        let vitals = {
            let mut world = self.store.write().await;
            if !world.contains_player(&identity) {
                return;
            }
            for (stat, delta) in &interaction.status_changes {
                if world.apply_vital_delta(&identity, stat, *delta).is_none() {
                    tracing::debug!("Ignoring unknown vital {:?}", stat);
                }
            }
            for item in &interaction.bag_changes {
                if !world.try_add_item(&identity, item.clone()) {
                    tracing::debug!("Bag of {} is full, dropping {}", identity, item);
                }
            }
            world.vitals(&identity).unwrap_or_default()
        };

        let result = InteractionResult {
            interaction_type: interaction.interaction_type.clone(),
            data: interaction,
            item_name: request.item.name,
        };
        if let Err(e) = self
            .pool
            .send(connection, ServerEvent::InteractionResult(result))
            .await
        {
            tracing::debug!("Could not deliver interaction result to {}: {}", identity, e);
        }

        self.pool
            .broadcast(ServerEvent::PlayerStatusUpdate(StatusUpdate {
                user_id: identity,
                vitals,
            }))
            .await;
    }

    async fn chat(&self, connection: ConnectionId, request: ChatMessage) {
        let (from, from_nickname) = match self.sessions.identity_of(connection).await {
            Some(identity) => {
                let nickname = self
                    .store
                    .player(&identity)
                    .await
                    .map(|player| player.nickname)
                    .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string());
                (Some(identity), nickname)
            }
            None => (request.user_id, UNKNOWN_NICKNAME.to_string()),
        };

        let target = request.target_id.filter(|target| !target.is_empty());
        let envelope = ChatEnvelope {
            from,
            from_nickname,
            to: target.clone(),
            message: request.message,
            timestamp: chrono::Utc::now(),
        };

        let Some(target) = target else {
            self.pool.broadcast(ServerEvent::ChatMessage(envelope)).await;
            return;
        };

        // Private messages to someone who is not here vanish, sender included
        let Some(recipient) = self.sessions.connection_of(&target).await else {
            tracing::debug!("Dropping private message to unregistered {}", target);
            return;
        };

        let mut recipients = vec![recipient];
        if recipient != connection {
            recipients.push(connection);
        }
        for recipient in recipients {
            if let Err(e) = self
                .pool
                .send(recipient, ServerEvent::ChatMessage(envelope.clone()))
                .await
            {
                tracing::debug!("Could not deliver chat message: {}", e);
            }
        }
    }

    async fn update_status(&self, connection: ConnectionId, request: UpdateStatus) {
        let Some(identity) = self.sessions.identity_of(connection).await else {
            tracing::debug!("Ignoring status from unregistered connection {}", connection);
            return;
        };

        let vitals = {
            let mut world = self.store.write().await;
            if !world.contains_player(&identity) {
                return;
            }
            let reported = [
                (Vital::Energy, request.energy),
                (Vital::Happiness, request.happiness),
                (Vital::Health, request.health),
            ];
            for (vital, value) in reported {
                if let Some(value) = value {
                    world.set_vital_absolute(&identity, vital.as_str(), i64::from(value.value()));
                }
            }
            world.vitals(&identity).unwrap_or_default()
        };

        self.pool
            .broadcast(ServerEvent::PlayerStatusUpdate(StatusUpdate {
                user_id: identity,
                vitals,
            }))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenAuthenticator, TokenEntry, TokenFile};
    use crate::error::PersistenceError;
    use crate::persistence::MockSceneStore;
    use crate::pool::Outbound;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;
    use townsquare_common::entity::{Direction, Meter};
    use townsquare_common::scene::SceneRecord;

    struct Harness {
        router: EventRouter,
        store: Arc<EntityStore>,
        pool: Arc<ConnectionPool>,
    }

    struct Client {
        id: ConnectionId,
        rx: UnboundedReceiver<Outbound>,
    }

    impl Client {
        fn drain(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push((*event).clone());
            }
            events
        }
    }

    fn scenes() -> MockSceneStore {
        let mut scenes = MockSceneStore::new();
        scenes.expect_load_scene().returning(|name: &str| match name {
            "campus" | "library" => Ok(SceneRecord::default_for(name)),
            other => Err(PersistenceError::InvalidName(other.to_string())),
        });
        scenes
    }

    impl Harness {
        fn new() -> Self {
            let tokens = TokenFile {
                valid_tokens: vec![
                    TokenEntry::new("token-a", "user_a"),
                    TokenEntry::new("token-b", "user_b"),
                    TokenEntry::new("token-c", "user_c"),
                ],
            };
            let store = Arc::new(EntityStore::new(10));
            let sessions = Arc::new(SessionRegistry::new(store.clone()));
            let pool = Arc::new(ConnectionPool::new());
            let router = EventRouter::new(
                store.clone(),
                sessions,
                pool.clone(),
                Arc::new(TokenAuthenticator::new(tokens)),
                Arc::new(scenes()),
                "campus",
            );
            Self {
                router,
                store,
                pool,
            }
        }

        async fn connect(&self) -> Client {
            let (id, rx) = self.pool.register().await;
            Client { id, rx }
        }

        async fn send(&self, client: &Client, event: serde_json::Value) {
            let event: ClientEvent = serde_json::from_value(event).unwrap();
            self.router.handle(client.id, event).await;
        }

        async fn join(&self, token: &str) -> Client {
            let mut client = self.connect().await;
            self.send(&client, json!({"event": "join_game", "data": {"token": token}}))
                .await;
            client.drain();
            client
        }
    }

    #[tokio::test]
    async fn test_join_sends_snapshot_and_notifies_others() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;

        let mut bob = harness.connect().await;
        harness
            .send(
                &bob,
                json!({"event": "join_game", "data": {"token": "token-b", "nickname": "Bob"}}),
            )
            .await;

        match bob.drain().as_slice() {
            [ServerEvent::GameState(state)] => {
                assert_eq!(state.your_id, "user_b");
                assert!(state.snapshot.players.contains_key("user_a"));
                assert!(state.snapshot.players.contains_key("user_b"));
            }
            other => panic!("Unexpected events: {:?}", other),
        }
        match alice.drain().as_slice() {
            [ServerEvent::PlayerJoined(entity)] => {
                assert_eq!(entity.identity, "user_b");
                assert_eq!(entity.nickname, "Bob");
            }
            other => panic!("Unexpected events: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_defaults_spawn_and_clamps_vitals() {
        let harness = Harness::new();
        let client = harness.connect().await;
        harness
            .send(
                &client,
                json!({"event": "join_game", "data": {"token": "token-a", "energy": 150, "health": -3}}),
            )
            .await;

        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.position, Position::new(5, 5, "campus"));
        assert_eq!(player.vitals.energy, Meter::FULL);
        assert_eq!(player.vitals.health, Meter::EMPTY);
        assert_eq!(player.vitals.happiness, Meter::FULL);
    }

    #[tokio::test]
    async fn test_bad_token_reports_error_to_requester_only() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut intruder = harness.connect().await;

        harness
            .send(&intruder, json!({"event": "join_game", "data": {"token": "nope"}}))
            .await;
        assert_eq!(intruder.drain(), vec![ServerEvent::error("Invalid token")]);

        harness
            .send(&intruder, json!({"event": "join_game", "data": {}}))
            .await;
        assert_eq!(intruder.drain(), vec![ServerEvent::error("Token is required")]);

        assert!(alice.drain().is_empty());
        assert_eq!(harness.store.snapshot().await.players.len(), 1);
    }

    #[tokio::test]
    async fn test_move_reaches_everyone_but_sender() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;
        let mut carol = harness.join("token-c").await;
        alice.drain();
        bob.drain();

        harness
            .send(
                &alice,
                json!({"event": "player_move", "data": {
                    "user_id": "user_c",
                    "position": {"x": 6, "y": 5, "scene": "campus"},
                    "direction": "right",
                    "animation_frame": 2
                }}),
            )
            .await;

        assert!(alice.drain().is_empty());
        for client in [&mut bob, &mut carol] {
            match client.drain().as_slice() {
                [ServerEvent::PlayerMoved(moved)] => {
                    assert_eq!(moved.user_id, "user_a");
                    assert_eq!(moved.position, Position::new(6, 5, "campus"));
                    assert_eq!(moved.direction, Direction::Right);
                    assert_eq!(moved.animation_frame, 2);
                }
                other => panic!("Unexpected events: {:?}", other),
            }
        }

        // The payload identity is never trusted
        let carol_entity = harness.store.player("user_c").await.unwrap();
        assert_eq!(carol_entity.position, Position::new(5, 5, "campus"));
    }

    #[tokio::test]
    async fn test_move_from_unregistered_connection_is_dropped() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let stranger = harness.connect().await;

        harness
            .send(
                &stranger,
                json!({"event": "player_move", "data": {
                    "user_id": "user_a",
                    "position": {"x": 1, "y": 1, "scene": "campus"}
                }}),
            )
            .await;

        assert!(alice.drain().is_empty());
        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.position, Position::new(5, 5, "campus"));
    }

    #[tokio::test]
    async fn test_interaction_applies_changes_and_respects_bag_capacity() {
        let harness = Harness::new();
        let mut alice = harness.connect().await;
        let bag: Vec<_> = (0..10).map(|i| json!({"name": format!("pebble{}", i)})).collect();
        harness
            .send(
                &alice,
                json!({"event": "join_game", "data": {"token": "token-a", "energy": 95, "bag": bag}}),
            )
            .await;
        alice.drain();
        let mut bob = harness.join("token-b").await;
        alice.drain();

        harness
            .send(
                &alice,
                json!({"event": "interact_item", "data": {
                    "item": {
                        "name": "Coffee",
                        "interaction": {
                            "type": "consume",
                            "status_changes": {"energy": 10, "happiness": -5, "luck": 3},
                            "bag_changes": [{"name": "cup"}, {"name": "lid"}]
                        }
                    },
                    "scene": "campus"
                }}),
            )
            .await;

        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.vitals.energy, Meter::FULL);
        assert_eq!(player.vitals.happiness, Meter::new(95));
        assert_eq!(player.bag.len(), 10);

        let events = alice.drain();
        assert_eq!(events.len(), 2);
        match &events[0] {
            ServerEvent::InteractionResult(result) => {
                assert_eq!(result.interaction_type.as_deref(), Some("consume"));
                assert_eq!(result.item_name.as_deref(), Some("Coffee"));
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        match &events[1] {
            ServerEvent::PlayerStatusUpdate(update) => {
                assert_eq!(update.user_id, "user_a");
                assert_eq!(update.vitals.energy, Meter::FULL);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(matches!(
            bob.drain().as_slice(),
            [ServerEvent::PlayerStatusUpdate(_)]
        ));
    }

    #[tokio::test]
    async fn test_interaction_fills_bag_in_order() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;

        harness
            .send(
                &alice,
                json!({"event": "interact_item", "data": {
                    "item": {"name": "Shelf", "interaction": {
                        "type": "collect",
                        "bag_changes": [{"name": "book"}, {"name": "map"}]
                    }}
                }}),
            )
            .await;

        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.bag, vec![json!({"name": "book"}), json!({"name": "map"})]);
        assert_eq!(alice.drain().len(), 2);
    }

    #[tokio::test]
    async fn test_interaction_without_spec_or_scene_is_dropped() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;

        harness
            .send(
                &alice,
                json!({"event": "interact_item", "data": {"item": {"name": "Rock"}}}),
            )
            .await;
        harness
            .send(
                &alice,
                json!({"event": "interact_item", "data": {
                    "item": {"name": "Coffee", "interaction": {"status_changes": {"energy": -10}}},
                    "scene": "../secrets"
                }}),
            )
            .await;

        assert!(alice.drain().is_empty());
        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.vitals.energy, Meter::FULL);
    }

    #[tokio::test]
    async fn test_private_chat_reaches_target_and_sender() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;
        let mut carol = harness.join("token-c").await;
        alice.drain();
        bob.drain();

        harness
            .send(
                &alice,
                json!({"event": "chat_message", "data": {"message": "psst", "target_id": "user_b"}}),
            )
            .await;

        for client in [&mut alice, &mut bob] {
            match client.drain().as_slice() {
                [ServerEvent::ChatMessage(envelope)] => {
                    assert_eq!(envelope.from.as_deref(), Some("user_a"));
                    assert_eq!(envelope.to.as_deref(), Some("user_b"));
                    assert_eq!(envelope.message, "psst");
                }
                other => panic!("Unexpected events: {:?}", other),
            }
        }
        assert!(carol.drain().is_empty());
    }

    #[tokio::test]
    async fn test_private_chat_to_absent_player_is_dropped() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;
        alice.drain();

        harness
            .send(
                &alice,
                json!({"event": "chat_message", "data": {"message": "hello?", "target_id": "user_z"}}),
            )
            .await;

        assert!(alice.drain().is_empty());
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_private_chat_to_self_is_delivered_once() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;

        harness
            .send(
                &alice,
                json!({"event": "chat_message", "data": {"message": "note", "target_id": "user_a"}}),
            )
            .await;

        assert_eq!(alice.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_global_chat_from_unregistered_sender() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut stranger = harness.connect().await;

        harness
            .send(
                &stranger,
                json!({"event": "chat_message", "data": {"user_id": "ghost", "message": "boo"}}),
            )
            .await;

        for client in [&mut alice, &mut stranger] {
            match client.drain().as_slice() {
                [ServerEvent::ChatMessage(envelope)] => {
                    assert_eq!(envelope.from.as_deref(), Some("ghost"));
                    assert_eq!(envelope.from_nickname, UNKNOWN_NICKNAME);
                    assert_eq!(envelope.to, None);
                }
                other => panic!("Unexpected events: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_status_sync_clamps_and_broadcasts() {
        let harness = Harness::new();
        let mut alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;
        alice.drain();

        harness
            .send(
                &alice,
                json!({"event": "update_status", "data": {"energy": 150, "health": -5}}),
            )
            .await;

        let player = harness.store.player("user_a").await.unwrap();
        assert_eq!(player.vitals.energy, Meter::FULL);
        assert_eq!(player.vitals.health, Meter::EMPTY);
        assert_eq!(player.vitals.happiness, Meter::FULL);

        for client in [&mut alice, &mut bob] {
            match client.drain().as_slice() {
                [ServerEvent::PlayerStatusUpdate(update)] => {
                    assert_eq!(update.user_id, "user_a");
                    assert_eq!(update.vitals.health, Meter::EMPTY);
                }
                other => panic!("Unexpected events: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_players() {
        let harness = Harness::new();
        let alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;
        let mut stranger = harness.connect().await;

        harness.router.disconnect(alice.id).await;

        assert!(!harness.store.contains_player("user_a").await);
        assert!(!harness.pool.contains(alice.id).await);
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::PlayerDisconnected(PlayerDisconnected {
                user_id: "user_a".to_string()
            })]
        );
        assert_eq!(stranger.drain().len(), 1);

        // Leaving without joining is silent
        harness.router.disconnect(stranger.id).await;
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_with_other_token_releases_old_identity() {
        let harness = Harness::new();
        let alice = harness.join("token-a").await;
        let mut bob = harness.join("token-b").await;

        harness
            .send(&alice, json!({"event": "join_game", "data": {"token": "token-c"}}))
            .await;

        let events = bob.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            ServerEvent::PlayerDisconnected(PlayerDisconnected {
                user_id: "user_a".to_string()
            })
        );
        assert!(matches!(&events[1], ServerEvent::PlayerJoined(entity) if entity.identity == "user_c"));
        assert!(!harness.store.contains_player("user_a").await);
    }
}
