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

//! Game tunables shared with clients at login

use serde::{Deserialize, Serialize};

/// Contents of `game.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Maximum number of items a bag holds
    #[serde(default = "default_bag_size")]
    pub bag_size: usize,

    #[serde(default = "default_tile_size")]
    pub tile_size: u32,

    #[serde(default = "default_view_width")]
    pub view_width: u32,

    #[serde(default = "default_view_height")]
    pub view_height: u32,

    /// Tiles within which a client may interact with an item
    #[serde(default = "default_interaction_distance")]
    pub interaction_distance: u32,

    #[serde(default = "default_game_speed")]
    pub game_speed: f64,

    #[serde(default = "default_day_length_seconds")]
    pub day_length_seconds: u64,
}

fn default_bag_size() -> usize {
    10
}

fn default_tile_size() -> u32 {
    64
}

fn default_view_width() -> u32 {
    15
}

fn default_view_height() -> u32 {
    11
}

fn default_interaction_distance() -> u32 {
    2
}

fn default_game_speed() -> f64 {
    1.0
}

fn default_day_length_seconds() -> u64 {
    300
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bag_size: default_bag_size(),
            tile_size: default_tile_size(),
            view_width: default_view_width(),
            view_height: default_view_height(),
            interaction_distance: default_interaction_distance(),
            game_speed: default_game_speed(),
            day_length_seconds: default_day_length_seconds(),
        }
    }
}
