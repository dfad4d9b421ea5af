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

//! Token authentication
//!
//! Credentials are opaque bearer tokens listed in `tokens.json`; each maps to
//! exactly one player identity.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Turns a credential into a player identity
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: Option<&str>) -> Result<String, AuthError>;
}

/// Contents of `tokens.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenFile {
    #[serde(default)]
    pub valid_tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TokenEntry {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            created_at: None,
            description: None,
        }
    }
}

impl TokenFile {
    /// Tokens written when no token file exists
    pub fn demo() -> Self {
        let created_at = Some(chrono::Utc::now().to_rfc3339());
        Self {
            valid_tokens: vec![
                TokenEntry {
                    created_at: created_at.clone(),
                    description: Some("Demo token for testing".to_string()),
                    ..TokenEntry::new("demo-token-123", "user_001")
                },
                TokenEntry {
                    created_at,
                    description: Some("Player token".to_string()),
                    ..TokenEntry::new("player-token-456", "user_002")
                },
            ],
        }
    }
}

/// In-memory token → identity table
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new(file: TokenFile) -> Self {
        let tokens = file
            .valid_tokens
            .into_iter()
            .map(|entry| (entry.token, entry.user_id))
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, credential: Option<&str>) -> Result<String, AuthError> {
        let token = credential
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
