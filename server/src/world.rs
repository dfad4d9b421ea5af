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

//! Entity Store
//!
//! The authoritative identity → entity mapping for human players, AI
//! characters and AI players. All access goes through a single
//! `tokio::sync::RwLock`, so every read-that-precedes-a-write and every write
//! is serialized between the event router and the autonomous update loop.
//!
//! Mutators never fail on an unknown identity or vital name; they degrade to
//! no-ops which callers treat as "event ignored".

use std::str::FromStr;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use townsquare_common::entity::{Direction, Entity, EntityKind, Item, Meter, Position, Vital, Vitals};
use townsquare_common::protocol::{AiSnapshot, EntityMap, Snapshot};

/// The shared state guarded by [`EntityStore`]
#[derive(Debug, Clone)]
pub struct World {
    players: EntityMap,
    ai_characters: EntityMap,
    ai_players: EntityMap,
    bag_size: usize,
}

impl World {
    pub fn new(bag_size: usize) -> Self {
        Self {
            players: EntityMap::new(),
            ai_characters: EntityMap::new(),
            ai_players: EntityMap::new(),
            bag_size,
        }
    }

    /// Configured inventory capacity
    pub fn bag_size(&self) -> usize {
        self.bag_size
    }

    fn map_for(&mut self, kind: EntityKind) -> &mut EntityMap {
        match kind {
            EntityKind::HumanPlayer => &mut self.players,
            EntityKind::AiCharacter => &mut self.ai_characters,
            EntityKind::AiPlayer => &mut self.ai_players,
        }
    }

    /// Insert or replace an entity. Bags over capacity are truncated.
    pub fn insert(&mut self, mut entity: Entity) -> Option<Entity> {
        entity.bag.truncate(self.bag_size);
        let identity = entity.identity.clone();
        self.map_for(entity.kind).insert(identity, entity)
    }

    /// Remove a human player. AI entities are never removed at runtime.
    pub fn remove_player(&mut self, identity: &str) -> Option<Entity> {
        self.players.remove(identity)
    }

    pub fn contains_player(&self, identity: &str) -> bool {
        self.players.contains_key(identity)
    }

    pub fn player(&self, identity: &str) -> Option<&Entity> {
        self.players.get(identity)
    }

    /// Look up any entity, human players first
    pub fn entity(&self, identity: &str) -> Option<&Entity> {
        self.players
            .get(identity)
            .or_else(|| self.ai_characters.get(identity))
            .or_else(|| self.ai_players.get(identity))
    }

    fn entity_mut(&mut self, identity: &str) -> Option<&mut Entity> {
        if self.players.contains_key(identity) {
            return self.players.get_mut(identity);
        }
        if self.ai_characters.contains_key(identity) {
            return self.ai_characters.get_mut(identity);
        }
        self.ai_players.get_mut(identity)
    }

    pub fn vitals(&self, identity: &str) -> Option<Vitals> {
        self.entity(identity).map(|entity| entity.vitals)
    }

    /// Add `delta` to a vital, clamped to the meter range.
    ///
    /// Returns the new value, or `None` when the identity or the vital name is
    /// unknown; nothing is written in that case.
    pub fn apply_vital_delta(&mut self, identity: &str, stat: &str, delta: i64) -> Option<Meter> {
        let vital = Vital::from_str(stat).ok()?;
        let entity = self.entity_mut(identity)?;
        let meter = entity.vitals.get_mut(vital);
        *meter = meter.offset(delta);
        Some(*meter)
    }

    /// Overwrite a vital with a clamped absolute value
    pub fn set_vital_absolute(
        &mut self,
        identity: &str,
        stat: &str,
        value: i64,
    ) -> Option<Meter> {
        let vital = Vital::from_str(stat).ok()?;
        let entity = self.entity_mut(identity)?;
        let meter = entity.vitals.get_mut(vital);
        *meter = Meter::new(value);
        Some(*meter)
    }

    /// Append an item unless the bag is full or the identity is unknown
    pub fn try_add_item(&mut self, identity: &str, item: Item) -> bool {
        let bag_size = self.bag_size;
        match self.entity_mut(identity) {
            Some(entity) if entity.bag.len() < bag_size => {
                entity.bag.push(item);
                true
            }
            _ => false,
        }
    }

    /// Overwrite position, facing and animation frame of a human player.
    ///
    /// A missing position keeps the current one.
    pub fn update_movement(
        &mut self,
        identity: &str,
        position: Option<Position>,
        direction: Direction,
        animation_frame: u32,
    ) -> Option<&Entity> {
        let entity = self.players.get_mut(identity)?;
        if let Some(position) = position {
            entity.position = position;
        }
        entity.direction = direction;
        entity.animation_frame = animation_frame;
        Some(entity)
    }

    /// Change the cosmetic profile of a human player
    pub fn update_profile(
        &mut self,
        identity: &str,
        nickname: Option<String>,
        sprite: Option<String>,
    ) -> Option<&Entity> {
        let entity = self.players.get_mut(identity)?;
        if let Some(nickname) = nickname {
            entity.nickname = nickname;
        }
        if let Some(sprite) = sprite {
            entity.sprite = sprite;
        }
        Some(entity)
    }

    /// AI characters followed by AI players
    pub fn autonomous_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.ai_characters
            .values_mut()
            .chain(self.ai_players.values_mut())
    }

    pub fn autonomous_count(&self) -> usize {
        self.ai_characters.len() + self.ai_players.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self.players.clone(),
            ai_characters: self.ai_characters.clone(),
            ai_players: self.ai_players.clone(),
        }
    }

    pub fn ai_snapshot(&self) -> AiSnapshot {
        AiSnapshot {
            ai_characters: self.ai_characters.clone(),
            ai_players: self.ai_players.clone(),
        }
    }
}

/// Lock-owning handle to the [`World`], shared by the router and the AI loop.
///
/// Single-step operations lock internally; multi-step events take the guard
/// from [`EntityStore::write`] and hold it for the whole event.
#[derive(Debug)]
pub struct EntityStore {
    world: RwLock<World>,
}

impl EntityStore {
    pub fn new(bag_size: usize) -> Self {
        Self {
            world: RwLock::new(World::new(bag_size)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().await
    }

    pub async fn insert(&self, entity: Entity) -> Option<Entity> {
        self.world.write().await.insert(entity)
    }

    pub async fn apply_vital_delta(&self, identity: &str, stat: &str, delta: i64) -> Option<Meter> {
        self.world.write().await.apply_vital_delta(identity, stat, delta)
    }

    pub async fn set_vital_absolute(&self, identity: &str, stat: &str, value: i64) -> Option<Meter> {
        self.world
            .write()
            .await
            .set_vital_absolute(identity, stat, value)
    }

    pub async fn try_add_item(&self, identity: &str, item: Item) -> bool {
        self.world.write().await.try_add_item(identity, item)
    }

    pub async fn contains_player(&self, identity: &str) -> bool {
        self.world.read().await.contains_player(identity)
    }

    pub async fn player(&self, identity: &str) -> Option<Entity> {
        self.world.read().await.player(identity).cloned()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.world.read().await.snapshot()
    }

    pub async fn ai_snapshot(&self) -> AiSnapshot {
        self.world.read().await.ai_snapshot()
    }
}
