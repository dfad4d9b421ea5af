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

//! Scene records served to clients and consulted by the engine

use crate::entity::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Tile a player may spawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: i64,
    pub y: i64,
}

/// A named zone. Only `name` and `spawn_points` are meaningful to the engine;
/// everything else is passed through to clients untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub name: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_floor_texture")]
    pub floor_texture: String,

    #[serde(default)]
    pub items: Vec<JsonValue>,

    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

fn default_width() -> u32 {
    30
}

fn default_height() -> u32 {
    20
}

fn default_floor_texture() -> String {
    "grass.png".to_string()
}

impl SceneRecord {
    /// Record written for a scene that does not exist yet
    pub fn default_for(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: default_width(),
            height: default_height(),
            floor_texture: default_floor_texture(),
            items: Vec::new(),
            spawn_points: vec![SpawnPoint { x: 5, y: 5 }],
            extra: BTreeMap::new(),
        }
    }

    /// Where a new arrival lands in this scene
    pub fn spawn_position(&self) -> Position {
        match self.spawn_points.first() {
            Some(point) => Position::new(point.x, point.y, self.name.clone()),
            None => Position {
                scene: self.name.clone(),
                ..Position::default()
            },
        }
    }
}
