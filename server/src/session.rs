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

//! Session Registry
//!
//! Binds live connections to authenticated player identities, one to one and
//! latest-wins in both directions. Only human players are registered here.
//!
//! Lock order is always entity store first, then the registry's own map, so
//! a join or leave is atomic with respect to the entity it creates or removes.

use crate::pool::ConnectionId;
use crate::world::EntityStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use townsquare_common::entity::{Entity, Item, Position, Vitals};

/// Attributes a joining player starts with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAttributes {
    pub nickname: Option<String>,
    pub sprite: Option<String>,
    pub vitals: Vitals,
    pub position: Position,
    pub bag: Vec<Item>,
}

impl PlayerAttributes {
    fn into_entity(self, identity: &str) -> Entity {
        let mut entity = Entity::human(identity);
        if let Some(nickname) = self.nickname {
            entity.nickname = nickname;
        }
        if let Some(sprite) = self.sprite {
            entity.sprite = sprite;
        }
        entity.vitals = self.vitals;
        entity.position = self.position;
        entity.bag = self.bag;
        entity
    }
}

/// Outcome of a successful join
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// The freshly created player entity
    pub entity: Entity,

    /// Identity this connection held before, now removed from the store
    pub released: Option<String>,
}

#[derive(Debug, Default)]
struct Sessions {
    identities: HashMap<ConnectionId, String>,
    connections: HashMap<String, ConnectionId>,
}

/// Connection ↔ identity bindings for human players
pub struct SessionRegistry {
    store: Arc<EntityStore>,
    sessions: RwLock<Sessions>,
}

impl SessionRegistry {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self {
            store,
            sessions: RwLock::new(Sessions::default()),
        }
    }

    /// Create or overwrite the player entity for `identity` and bind it to
    /// `connection`. A previous entity under the same identity is replaced
    /// entirely and its old connection loses the binding.
    pub async fn register(
        &self,
        connection: ConnectionId,
        identity: &str,
        attributes: PlayerAttributes,
    ) -> Registration {
        let mut world = self.store.write().await;
        let mut sessions = self.sessions.write().await;

        let mut released = None;
        if let Some(previous) = sessions.identities.remove(&connection) {
            if previous != identity {
                sessions.connections.remove(&previous);
                world.remove_player(&previous);
                released = Some(previous);
            }
        }

        if let Some(stale) = sessions.connections.insert(identity.to_string(), connection) {
            if stale != connection {
                tracing::debug!(
                    "Identity {} moved from connection {} to {}",
                    identity,
                    stale,
                    connection
                );
                sessions.identities.remove(&stale);
            }
        }
        sessions.identities.insert(connection, identity.to_string());

        let mut entity = attributes.into_entity(identity);
        entity.bag.truncate(world.bag_size());
        world.insert(entity.clone());

        Registration { entity, released }
    }

    /// Release the identity bound to `connection` and remove its entity.
    ///
    /// Returns `None` without touching anything if the connection never joined.
    pub async fn unregister(&self, connection: ConnectionId) -> Option<String> {
        let mut world = self.store.write().await;
        let mut sessions = self.sessions.write().await;

        let identity = sessions.identities.remove(&connection)?;
        sessions.connections.remove(&identity);
        world.remove_player(&identity);

        Some(identity)
    }

    pub async fn identity_of(&self, connection: ConnectionId) -> Option<String> {
        self.sessions.read().await.identities.get(&connection).cloned()
    }

    pub async fn connection_of(&self, identity: &str) -> Option<ConnectionId> {
        self.sessions.read().await.connections.get(identity).copied()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.identities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use townsquare_common::entity::Meter;
    use uuid::Uuid;

    fn registry() -> (Arc<EntityStore>, SessionRegistry) {
        let store = Arc::new(EntityStore::new(10));
        let registry = SessionRegistry::new(Arc::clone(&store));
        (store, registry)
    }

    #[tokio::test]
    async fn test_register_creates_player() {
        let (store, registry) = registry();
        let connection = Uuid::new_v4();

        let registration = registry
            .register(
                connection,
                "user_001",
                PlayerAttributes {
                    nickname: Some("Ada".to_string()),
                    ..PlayerAttributes::default()
                },
            )
            .await;

        assert_eq!(registration.entity.nickname, "Ada");
        assert!(registration.released.is_none());
        assert!(store.contains_player("user_001").await);
        assert_eq!(registry.identity_of(connection).await.as_deref(), Some("user_001"));
        assert_eq!(registry.connection_of("user_001").await, Some(connection));
    }

    #[tokio::test]
    async fn test_duplicate_login_last_join_wins() {
        let (store, registry) = registry();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let mut tired = PlayerAttributes::default();
        tired.vitals.energy = Meter::new(10);
        registry.register(first, "user_001", tired).await;
        registry
            .register(second, "user_001", PlayerAttributes::default())
            .await;

        assert_eq!(registry.identity_of(first).await, None);
        assert_eq!(registry.connection_of("user_001").await, Some(second));
        assert_eq!(
            store.player("user_001").await.unwrap().vitals.energy,
            Meter::FULL
        );

        // The stale connection leaving must not remove the new session
        assert_eq!(registry.unregister(first).await, None);
        assert!(store.contains_player("user_001").await);
    }

    #[tokio::test]
    async fn test_rejoin_under_new_identity_releases_old() {
        let (store, registry) = registry();
        let connection = Uuid::new_v4();

        registry
            .register(connection, "user_001", PlayerAttributes::default())
            .await;
        let registration = registry
            .register(connection, "user_002", PlayerAttributes::default())
            .await;

        assert_eq!(registration.released.as_deref(), Some("user_001"));
        assert!(!store.contains_player("user_001").await);
        assert!(store.contains_player("user_002").await);
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_removes_entity() {
        let (store, registry) = registry();
        let connection = Uuid::new_v4();

        registry
            .register(connection, "user_001", PlayerAttributes::default())
            .await;

        assert_eq!(registry.unregister(connection).await.as_deref(), Some("user_001"));
        assert!(!store.contains_player("user_001").await);
        assert!(store.snapshot().await.players.is_empty());
        assert_eq!(registry.unregister(connection).await, None);
    }
}
