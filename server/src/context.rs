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

use crate::auth::Authenticator;
use crate::persistence::SceneStore;
use crate::pool::ConnectionPool;
use crate::router::EventRouter;
use crate::session::SessionRegistry;
use crate::world::EntityStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use townsquare_common::game::GameConfig;

/// Server context containing shared resources
#[derive(Clone)]
pub struct ServerContext {
    /// Authoritative entity state
    store: Arc<EntityStore>,

    /// Connection ↔ identity bindings
    sessions: Arc<SessionRegistry>,

    /// Outbound queues of live connections
    pool: Arc<ConnectionPool>,

    /// Dispatcher for inbound client events
    router: Arc<EventRouter>,

    authenticator: Arc<dyn Authenticator>,

    scenes: Arc<dyn SceneStore>,

    /// Game settings handed to clients at login
    game_config: Arc<GameConfig>,

    /// Directory holding character sprite sheets
    character_assets: PathBuf,
}

impl ServerContext {
    /// Create a new server context
    pub fn new(
        game_config: GameConfig,
        authenticator: Arc<dyn Authenticator>,
        scenes: Arc<dyn SceneStore>,
        default_scene: &str,
        character_assets: impl Into<PathBuf>,
    ) -> Self {
        let store = Arc::new(EntityStore::new(game_config.bag_size));
        let sessions = Arc::new(SessionRegistry::new(Arc::clone(&store)));
        let pool = Arc::new(ConnectionPool::new());
        let router = Arc::new(EventRouter::new(
            Arc::clone(&store),
            Arc::clone(&sessions),
            Arc::clone(&pool),
            Arc::clone(&authenticator),
            Arc::clone(&scenes),
            default_scene,
        ));

        Self {
            store,
            sessions,
            pool,
            router,
            authenticator,
            scenes,
            game_config: Arc::new(game_config),
            character_assets: character_assets.into(),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    pub fn scenes(&self) -> &Arc<dyn SceneStore> {
        &self.scenes
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.game_config
    }

    pub fn character_assets(&self) -> &Path {
        &self.character_assets
    }
}
