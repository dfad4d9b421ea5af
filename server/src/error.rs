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

//! Error types surfaced by the engine's collaborators

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a credential into an identity
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,
}

/// Failure of a load or persist against the data directory
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Invalid record name: {0:?}")]
    InvalidName(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
