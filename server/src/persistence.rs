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

//! Persistence collaborators
//!
//! The engine only needs "load entity by name", "persist entity" and "load
//! scene by name". [`JsonDataStore`] provides them over a data directory of
//! pretty-printed JSON files, writing a well-formed default for anything that
//! does not exist yet:
//!
//! ```text
//! data/
//!   game.json
//!   tokens.json
//!   characters/<name>.json
//!   scenes/<name>.json
//! ```

use crate::auth::TokenFile;
use crate::error::{PersistenceError, PersistenceResult};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use townsquare_common::entity::{EntityKind, EntityRecord};
use townsquare_common::game::GameConfig;
use townsquare_common::scene::SceneRecord;
use uuid::Uuid;

const CHARACTERS_DIR: &str = "characters";
const SCENES_DIR: &str = "scenes";
const GAME_FILE: &str = "game.json";
const TOKENS_FILE: &str = "tokens.json";

/// Load and store AI entity records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Load a record, producing a default one if none exists
    async fn load_entity(&self, name: &str, kind: EntityKind) -> PersistenceResult<EntityRecord>;

    /// Persist a record under `name`
    async fn persist_entity(&self, name: &str, record: &EntityRecord) -> PersistenceResult<()>;
}

/// Look up scenes by name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneStore: Send + Sync {
    async fn load_scene(&self, name: &str) -> PersistenceResult<SceneRecord>;
}

/// JSON file store rooted at a data directory
#[derive(Debug, Clone)]
pub struct JsonDataStore {
    root: PathBuf,
}

impl JsonDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory layout if it is missing
    pub async fn ensure_layout(&self) -> PersistenceResult<()> {
        for dir in [CHARACTERS_DIR, SCENES_DIR] {
            let path = self.root.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| PersistenceError::Io { path, source })?;
        }
        Ok(())
    }

    /// Load `game.json`, writing the defaults on first start
    pub async fn load_game_config(&self) -> PersistenceResult<GameConfig> {
        self.read_or_create(self.root.join(GAME_FILE), GameConfig::default)
            .await
    }

    /// Load `tokens.json`, writing the demo tokens on first start
    pub async fn load_tokens(&self) -> PersistenceResult<TokenFile> {
        self.read_or_create(self.root.join(TOKENS_FILE), TokenFile::demo)
            .await
    }

    /// Path of a named record; the name must be a single path component
    fn record_path(&self, dir: &str, name: &str) -> PersistenceResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(PersistenceError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(dir).join(format!("{}.json", name)))
    }

    async fn read_or_create<T, F>(&self, path: PathBuf, default: F) -> PersistenceResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Json { path, source })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Creating default {}", path.display());
                let value = default();
                self.write_json(&path, &value).await?;
                Ok(value)
            }
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    /// Write through a staging file unique to this call, then rename it into
    /// place. Concurrent writers of one record never share a staging file.
    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistenceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        if let Err(source) = tokio::fs::write(&staging, bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(PersistenceError::Io {
                path: staging,
                source,
            });
        }
        if let Err(source) = tokio::fs::rename(&staging, path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterStore for JsonDataStore {
    async fn load_entity(&self, name: &str, kind: EntityKind) -> PersistenceResult<EntityRecord> {
        let path = self.record_path(CHARACTERS_DIR, name)?;
        self.read_or_create(path, || EntityRecord::default_for(name, kind))
            .await
    }

    async fn persist_entity(&self, name: &str, record: &EntityRecord) -> PersistenceResult<()> {
        let path = self.record_path(CHARACTERS_DIR, name)?;
        self.write_json(&path, record).await
    }
}

#[async_trait]
impl SceneStore for JsonDataStore {
    async fn load_scene(&self, name: &str) -> PersistenceResult<SceneRecord> {
        let path = self.record_path(SCENES_DIR, name)?;
        self.read_or_create(path, || SceneRecord::default_for(name))
            .await
    }
}
