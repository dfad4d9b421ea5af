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

//! Townsquare Common Types and Protocols
//!
//! This crate defines the types shared between the Townsquare server and its clients:
//! - Entity model (players, AI characters, AI players)
//! - Scene records and game tunables
//! - WebSocket event protocol

pub mod entity;
pub mod game;
pub mod protocol;
pub mod scene;
