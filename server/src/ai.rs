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

//! Autonomous update loop for AI characters and AI players

use crate::config::WorldConfig;
use crate::persistence::CharacterStore;
use crate::pool::ConnectionPool;
use crate::world::EntityStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use townsquare_common::entity::{Entity, EntityKind, EntityRecord, LOW_ENERGY_RULE};
use townsquare_common::protocol::{AiSnapshot, ServerEvent};

/// Drives recovery, wandering and persistence of autonomous entities
pub struct AiSystem {
    store: Arc<EntityStore>,
    pool: Arc<ConnectionPool>,
    characters: Arc<dyn CharacterStore>,
    writer: mpsc::UnboundedSender<Vec<(String, EntityRecord)>>,
    energy_recovery: i64,
}

impl AiSystem {
    pub fn new(
        store: Arc<EntityStore>,
        pool: Arc<ConnectionPool>,
        characters: Arc<dyn CharacterStore>,
        energy_recovery: i64,
    ) -> Self {
        let writer = spawn_writer(Arc::clone(&characters));
        Self {
            store,
            pool,
            characters,
            writer,
            energy_recovery,
        }
    }

    /// Load the configured roster into the store, returning how many loaded.
    ///
    /// An entity that fails to load is skipped.
    pub async fn load_roster(&self, config: &WorldConfig) -> usize {
        let roster = [
            (&config.ai_characters, EntityKind::AiCharacter),
            (&config.ai_players, EntityKind::AiPlayer),
        ];

        let mut loaded = 0;
        for (names, kind) in roster {
            for name in names {
                match self.characters.load_entity(name, kind).await {
                    Ok(record) => {
                        let mut entity = Entity::from_record(record, kind);
                        entity.identity = name.clone();
                        self.store.insert(entity).await;
                        loaded += 1;
                    }
                    Err(e) => tracing::error!("Failed to load AI entity {}: {}", name, e),
                }
            }
        }

        tracing::info!("Loaded {} AI entities", loaded);
        loaded
    }

    /// Tick forever at `period`. A slow tick delays the next one rather than
    /// letting ticks overlap or burst.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rng = StdRng::from_os_rng();

        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.tick_with(&mut rng).await;
        }
    }

    /// Run a single tick and return the snapshot that was broadcast
    pub async fn tick_with<R: Rng>(&self, rng: &mut R) -> AiSnapshot {
        let (records, snapshot) = {
            let mut world = self.store.write().await;
            let mut records = Vec::new();

            for entity in world.autonomous_mut() {
                if let Some(rule) = entity.rules.get(LOW_ENERGY_RULE) {
                    if i64::from(entity.vitals.energy.value()) < rule.threshold {
                        entity.vitals.energy = entity.vitals.energy.offset(self.energy_recovery);
                    }
                }

                if entity.kind.wanders() {
                    let (dx, dy) = (rng.random_range(-1i64..=1), rng.random_range(-1i64..=1));
                    entity.position.x = entity.position.x.saturating_add(dx);
                    entity.position.y = entity.position.y.saturating_add(dy);
                }

                records.push((entity.identity.clone(), entity.to_record()));
            }

            (records, world.ai_snapshot())
        };

        if self.writer.send(records).is_err() {
            tracing::error!("AI record writer has stopped, tick not persisted");
        }

        let delivered = self
            .pool
            .broadcast(ServerEvent::AiUpdate(snapshot.clone()))
            .await;
        tracing::trace!("AI update delivered to {} connections", delivered);

        snapshot
    }
}

/// Persist batches in the order they were queued, one record at a time
fn spawn_writer(
    characters: Arc<dyn CharacterStore>,
) -> mpsc::UnboundedSender<Vec<(String, EntityRecord)>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<(String, EntityRecord)>>();
    tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            for (name, record) in batch {
                if let Err(e) = characters.persist_entity(&name, &record).await {
                    tracing::error!("Failed to persist {}: {}", name, e);
                }
            }
        }
    });
    tx
}
