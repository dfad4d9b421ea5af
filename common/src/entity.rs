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

//! Entity data model shared by the engine and its clients
//!
//! Human players, AI characters and AI players all share the [`Entity`] shape;
//! the [`EntityKind`] decides which update rules apply to them.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lower bound of every vital
pub const METER_MIN: u8 = 0;

/// Upper bound of every vital
pub const METER_MAX: u8 = 100;

/// A vital value, always within `[METER_MIN, METER_MAX]`.
///
/// Every construction path clamps, including deserialization, so an
/// out-of-range value read from disk or received from a client is never
/// observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "u8")]
pub struct Meter(u8);

impl Meter {
    /// A full meter
    pub const FULL: Meter = Meter(METER_MAX);

    /// An empty meter
    pub const EMPTY: Meter = Meter(METER_MIN);

    /// Clamp an integer into a meter
    pub fn new(value: i64) -> Self {
        Self(value.clamp(METER_MIN as i64, METER_MAX as i64) as u8)
    }

    /// Current value
    pub fn value(self) -> u8 {
        self.0
    }

    /// Apply a signed delta, clamping the result
    pub fn offset(self, delta: i64) -> Self {
        Self::new((self.0 as i64).saturating_add(delta))
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<f64> for Meter {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            return Self::EMPTY;
        }
        Self(value.round().clamp(METER_MIN as f64, METER_MAX as f64) as u8)
    }
}

impl From<Meter> for u8 {
    fn from(meter: Meter) -> Self {
        meter.0
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names of the bounded vitals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    Energy,
    Happiness,
    Health,
}

impl Vital {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vital::Energy => "energy",
            Vital::Happiness => "happiness",
            Vital::Health => "health",
        }
    }
}

impl FromStr for Vital {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "energy" => Ok(Vital::Energy),
            "happiness" => Ok(Vital::Happiness),
            "health" => Ok(Vital::Health),
            other => Err(format!("Unknown vital: {}", other)),
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy, happiness and health of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default)]
    pub energy: Meter,
    #[serde(default)]
    pub happiness: Meter,
    #[serde(default)]
    pub health: Meter,
}

impl Vitals {
    pub fn get(&self, vital: Vital) -> Meter {
        match vital {
            Vital::Energy => self.energy,
            Vital::Happiness => self.happiness,
            Vital::Health => self.health,
        }
    }

    pub fn get_mut(&mut self, vital: Vital) -> &mut Meter {
        match vital {
            Vital::Energy => &mut self.energy,
            Vital::Happiness => &mut self.happiness,
            Vital::Health => &mut self.health,
        }
    }
}

/// Grid position within a named scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub scene: String,
}

impl Position {
    pub fn new(x: i64, y: i64, scene: impl Into<String>) -> Self {
        Self {
            x,
            y,
            scene: scene.into(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(5, 5, DEFAULT_SCENE)
    }
}

/// Scene new players and characters start in
pub const DEFAULT_SCENE: &str = "campus";

/// Sprite used when none is supplied
pub const DEFAULT_SPRITE: &str = "character1.png";

/// Facing direction of a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// Threshold rule consulted by the autonomous update loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub threshold: i64,
    pub action: String,
}

impl BehaviorRule {
    pub fn new(threshold: i64, action: impl Into<String>) -> Self {
        Self {
            threshold,
            action: action.into(),
        }
    }
}

/// Rule consulted for energy recovery
pub const LOW_ENERGY_RULE: &str = "low_energy";

/// Named behavior rules of an AI entity
pub type BehaviorRules = BTreeMap<String, BehaviorRule>;

/// Rules every freshly created AI entity starts with
pub fn default_behavior_rules() -> BehaviorRules {
    let mut rules = BehaviorRules::new();
    rules.insert(LOW_ENERGY_RULE.to_string(), BehaviorRule::new(30, "rest"));
    rules.insert("low_happiness".to_string(), BehaviorRule::new(30, "socialize"));
    rules.insert("low_health".to_string(), BehaviorRule::new(30, "eat"));
    rules
}

/// Which update rules apply to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    HumanPlayer,
    AiCharacter,
    AiPlayer,
}

impl EntityKind {
    /// Whether the autonomous loop moves this entity around
    pub fn wanders(&self) -> bool {
        matches!(self, EntityKind::AiPlayer)
    }
}

/// Opaque item descriptor carried in a bag
pub type Item = JsonValue;

/// Authoritative state of a single player or AI entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "user_id")]
    pub identity: String,

    #[serde(rename = "type")]
    pub kind: EntityKind,

    pub nickname: String,

    pub sprite: String,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    pub animation_frame: u32,

    #[serde(flatten)]
    pub vitals: Vitals,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub bag: Vec<Item>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BehaviorRules,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<JsonValue>,
}

impl Entity {
    /// Create a human player with full vitals at the default position
    pub fn human(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            nickname: default_nickname(&identity),
            identity,
            kind: EntityKind::HumanPlayer,
            sprite: DEFAULT_SPRITE.to_string(),
            direction: Direction::default(),
            animation_frame: 0,
            vitals: Vitals::default(),
            position: Position::default(),
            bag: Vec::new(),
            rules: BehaviorRules::new(),
            memory: Vec::new(),
        }
    }

    /// Build an AI entity from its persisted record
    pub fn from_record(record: EntityRecord, kind: EntityKind) -> Self {
        Self {
            nickname: record.name.clone(),
            identity: record.name,
            kind,
            sprite: record.sprite,
            direction: Direction::default(),
            animation_frame: 0,
            vitals: record.vitals,
            position: record.position,
            bag: record.bag,
            rules: record.rules,
            memory: record.memory,
        }
    }

    /// Persisted form of this entity
    pub fn to_record(&self) -> EntityRecord {
        EntityRecord {
            name: self.identity.clone(),
            kind: self.kind,
            sprite: self.sprite.clone(),
            vitals: self.vitals,
            position: self.position.clone(),
            memory: self.memory.clone(),
            rules: self.rules.clone(),
            bag: self.bag.clone(),
        }
    }
}

/// Nickname shown for a player that did not pick one
pub fn default_nickname(identity: &str) -> String {
    let prefix: String = identity.chars().take(8).collect();
    format!("Player_{}", prefix)
}

/// On-disk shape of an AI entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: EntityKind,

    #[serde(default = "default_sprite")]
    pub sprite: String,

    #[serde(flatten)]
    pub vitals: Vitals,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub memory: Vec<JsonValue>,

    #[serde(default = "default_behavior_rules")]
    pub rules: BehaviorRules,

    #[serde(default)]
    pub bag: Vec<Item>,
}

fn default_sprite() -> String {
    DEFAULT_SPRITE.to_string()
}

impl EntityRecord {
    /// Well-formed record for an entity that has never been persisted
    pub fn default_for(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sprite: default_sprite(),
            vitals: Vitals::default(),
            position: Position::default(),
            memory: Vec::new(),
            rules: default_behavior_rules(),
            bag: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn prop_offset_stays_in_range(start in any::<i64>(), delta in any::<i64>()) {
            let meter = Meter::new(start).offset(delta);
            prop_assert!(meter.value() <= METER_MAX);
        }

        #[test]
        fn prop_float_input_stays_in_range(value in any::<f64>()) {
            prop_assert!(Meter::from(value).value() <= METER_MAX);
        }
    }

    #[test]
    fn test_meter_clamps_on_construction() {
        assert_eq!(Meter::new(-20).value(), 0);
        assert_eq!(Meter::new(250).value(), 100);
        assert_eq!(Meter::new(42).value(), 42);
    }

    #[test]
    fn test_meter_offset_saturates() {
        assert_eq!(Meter::new(90).offset(50).value(), 100);
        assert_eq!(Meter::new(10).offset(-50).value(), 0);
        assert_eq!(Meter::new(10).offset(i64::MIN).value(), 0);
        assert_eq!(Meter::new(10).offset(i64::MAX).value(), 100);
    }

    #[test]
    fn test_meter_deserialize_clamps() {
        let vitals: Vitals =
            serde_json::from_value(json!({"energy": 150, "happiness": -3, "health": 99.6}))
                .unwrap();
        assert_eq!(vitals.energy.value(), 100);
        assert_eq!(vitals.happiness.value(), 0);
        assert_eq!(vitals.health.value(), 100);
    }

    #[test]
    fn test_vital_from_str() {
        assert_eq!("energy".parse::<Vital>(), Ok(Vital::Energy));
        assert_eq!("health".parse::<Vital>(), Ok(Vital::Health));
        assert!("mana".parse::<Vital>().is_err());
    }

    #[test]
    fn test_entity_wire_shape() {
        let entity = Entity::human("user_001");
        let value = serde_json::to_value(&entity).unwrap();

        assert_eq!(value["user_id"], "user_001");
        assert_eq!(value["type"], "human_player");
        assert_eq!(value["nickname"], "Player_user_001");
        assert_eq!(value["energy"], 100);
        assert_eq!(value["direction"], "down");
        assert_eq!(value["position"]["scene"], "campus");
        assert!(value.get("rules").is_none());
    }

    #[test]
    fn test_record_defaults_fill_missing_fields() {
        let record: EntityRecord =
            serde_json::from_value(json!({"name": "chef", "type": "ai_character", "energy": 20}))
                .unwrap();

        assert_eq!(record.vitals.energy.value(), 20);
        assert_eq!(record.vitals.health, Meter::FULL);
        assert_eq!(record.rules[LOW_ENERGY_RULE].threshold, 30);
        assert_eq!(record.sprite, DEFAULT_SPRITE);
    }

    #[test]
    fn test_record_conversion_keeps_state() {
        let mut record = EntityRecord::default_for("alice_ai", EntityKind::AiPlayer);
        record.vitals.energy = Meter::new(12);
        record.bag.push(json!({"name": "apple"}));

        let entity = Entity::from_record(record.clone(), EntityKind::AiPlayer);
        assert_eq!(entity.identity, "alice_ai");
        assert_eq!(entity.to_record(), record);
    }
}
