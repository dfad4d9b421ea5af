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

use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::convert::Infallible;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "server/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "server/.env"
    )]
    pub env_file: Option<String>,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub world: WorldConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Configuration, String> {
        tracing::debug!("Loading configuration from file: {}", path);
        let conf = serde_yaml::from_reader(
            std::fs::File::open(path).map_err(|e| format!("Failed to open config file: {}", e))?,
        )
        .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(conf)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default)]
    pub addr: EnvField<ListenerBinding>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListenerBinding(SocketAddr);

impl ListenerBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for ListenerBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for ListenerBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            5151,
        )))
    }
}

impl std::fmt::Display for ListenerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where records and static assets live on disk
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of the JSON data directory
    #[serde(default)]
    pub directory: EnvField<DataDirectory>,

    /// Directory listed by the character sprite endpoint
    #[serde(default)]
    pub character_assets: EnvField<AssetDirectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDirectory(PathBuf);

impl DataDirectory {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl FromStr for DataDirectory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl Default for DataDirectory {
    fn default() -> Self {
        Self(PathBuf::from("data"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDirectory(PathBuf);

impl AssetDirectory {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl FromStr for AssetDirectory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl Default for AssetDirectory {
    fn default() -> Self {
        Self(PathBuf::from("static/assets/characters"))
    }
}

/// Autonomous update loop and world setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Seconds between autonomous ticks (default: 5)
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,

    /// Energy regained per tick below the low_energy threshold (default: 5)
    #[serde(default = "default_energy_recovery")]
    pub energy_recovery: i64,

    /// Scene new players spawn in when they do not bring a position
    #[serde(default = "default_scene")]
    pub default_scene: String,

    /// AI characters loaded at start
    #[serde(default = "default_ai_characters")]
    pub ai_characters: Vec<String>,

    /// AI players loaded at start
    #[serde(default = "default_ai_players")]
    pub ai_players: Vec<String>,
}

fn default_tick_interval() -> u64 {
    5
}

fn default_energy_recovery() -> i64 {
    5
}

fn default_scene() -> String {
    townsquare_common::entity::DEFAULT_SCENE.to_string()
}

fn default_ai_characters() -> Vec<String> {
    vec!["librarian".into(), "chef".into(), "coach".into()]
}

fn default_ai_players() -> Vec<String> {
    vec!["alice_ai".into(), "bob_ai".into()]
}

impl WorldConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(self.tick_interval.max(1))
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            energy_recovery: default_energy_recovery(),
            default_scene: default_scene(),
            ai_characters: default_ai_characters(),
            ai_players: default_ai_players(),
        }
    }
}
