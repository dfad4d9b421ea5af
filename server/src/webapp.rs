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

//! HTTP API served next to the WebSocket endpoint

use crate::context::ServerContext;
use crate::error::{AuthError, PersistenceError};
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use townsquare_common::entity::{DEFAULT_SPRITE, Entity, default_nickname};
use townsquare_common::game::GameConfig;
use townsquare_common::scene::SceneRecord;

pub fn router(context: &ServerContext) -> Router {
    Router::new()
        .route("/socket", get(crate::listener::handler))
        .route("/api/login", post(login))
        .route("/api/user/profile", get(get_profile).post(update_profile))
        .route("/api/scenes/{name}", get(get_scene))
        .route("/api/characters/list", get(list_characters))
        .with_state(context.clone())
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
        }),
    )
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user_id: String,
    pub game_config: GameConfig,
}

/// Profile of a player, live if they are in the world
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Live(Entity),
    Default {
        user_id: String,
        nickname: String,
        sprite: String,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub sprite: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CharacterList {
    pub characters: Vec<String>,
}

/// Exchange a token for an identity and the game settings
async fn login(
    State(context): State<ServerContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = request.token.unwrap_or_default();
    match context.authenticator().authenticate(Some(&token)).await {
        Ok(user_id) => {
            tracing::info!("Login for {}", user_id);
            Ok(Json(LoginResponse {
                success: true,
                token,
                user_id,
                game_config: context.game_config().clone(),
            }))
        }
        Err(e @ AuthError::MissingToken) => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ AuthError::InvalidToken) => Err(api_error(StatusCode::UNAUTHORIZED, e.to_string())),
    }
}

async fn bearer_identity(context: &ServerContext, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));
    context
        .authenticator()
        .authenticate(token)
        .await
        .map_err(|_| api_error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn get_profile(
    State(context): State<ServerContext>,
    headers: HeaderMap,
) -> Result<Json<Profile>, ApiError> {
    let user_id = bearer_identity(&context, &headers).await?;
    let profile = match context.store().player(&user_id).await {
        Some(entity) => Profile::Live(entity),
        None => Profile::Default {
            nickname: default_nickname(&user_id),
            sprite: DEFAULT_SPRITE.to_string(),
            user_id,
        },
    };
    Ok(Json(profile))
}

/// Change nickname or sprite of a player that is currently in the world
async fn update_profile(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let user_id = bearer_identity(&context, &headers).await?;
    let mut world = context.store().write().await;
    if world
        .update_profile(&user_id, update.nickname, update.sprite)
        .is_none()
    {
        tracing::debug!("Profile update for absent player {}", user_id);
    }
    Ok(Json(UpdateResponse { success: true }))
}

async fn get_scene(
    State(context): State<ServerContext>,
    Path(name): Path<String>,
) -> Result<Json<SceneRecord>, ApiError> {
    match context.scenes().load_scene(&name).await {
        Ok(scene) => Ok(Json(scene)),
        Err(e @ PersistenceError::InvalidName(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to load scene {}: {}", name, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load scene"))
        }
    }
}

/// Sprite sheets available for player characters
async fn list_characters(State(context): State<ServerContext>) -> Json<CharacterList> {
    let mut characters = Vec::new();
    match tokio::fs::read_dir(context.character_assets()).await {
        Ok(mut entries) => loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.ends_with(".png") {
                        characters.push(name);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to list character assets: {}", e);
                    break;
                }
            }
        },
        Err(e) => tracing::debug!(
            "Character assets unavailable at {}: {}",
            context.character_assets().display(),
            e
        ),
    }
    characters.sort();
    Json(CharacterList { characters })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenAuthenticator, TokenFile};
    use crate::persistence::JsonDataStore;
    use crate::session::PlayerAttributes;
    use axum::http::HeaderValue;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn context(dir: &TempDir) -> ServerContext {
        ServerContext::new(
            GameConfig::default(),
            Arc::new(TokenAuthenticator::new(TokenFile::demo())),
            Arc::new(JsonDataStore::new(dir.path().join("data"))),
            "campus",
            dir.path().join("characters"),
        )
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_login_statuses() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);

        let Json(response) = login(
            State(context.clone()),
            Json(LoginRequest {
                token: Some("demo-token-123".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(response.success);
        assert_eq!(response.user_id, "user_001");
        assert_eq!(response.game_config.bag_size, 10);

        let (status, Json(error)) = login(State(context.clone()), Json(LoginRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, "Token is required");

        let (status, _) = login(
            State(context),
            Json(LoginRequest {
                token: Some("forged".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_default_then_live() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);

        let Json(profile) = get_profile(State(context.clone()), bearer("demo-token-123"))
            .await
            .unwrap();
        match profile {
            Profile::Default { nickname, .. } => assert_eq!(nickname, "Player_user_001"),
            other => panic!("Unexpected profile: {:?}", other),
        }

        context
            .sessions()
            .register(Uuid::new_v4(), "user_001", PlayerAttributes::default())
            .await;
        update_profile(
            State(context.clone()),
            bearer("demo-token-123"),
            Json(ProfileUpdate {
                nickname: Some("Ada".to_string()),
                sprite: None,
            }),
        )
        .await
        .unwrap();

        let Json(profile) = get_profile(State(context.clone()), bearer("demo-token-123"))
            .await
            .unwrap();
        match profile {
            Profile::Live(entity) => assert_eq!(entity.nickname, "Ada"),
            other => panic!("Unexpected profile: {:?}", other),
        }

        let (status, _) = get_profile(State(context), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_scene_lookup() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);

        let Json(scene) = get_scene(State(context.clone()), Path("library".to_string()))
            .await
            .unwrap();
        assert_eq!(scene.name, "library");

        let (status, _) = get_scene(State(context), Path("../etc".to_string()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_character_list_filters_png() {
        let dir = TempDir::new().unwrap();
        let context = context(&dir);

        let Json(list) = list_characters(State(context.clone())).await;
        assert!(list.characters.is_empty());

        let assets = dir.path().join("characters");
        std::fs::create_dir_all(&assets).unwrap();
        for name in ["character2.png", "character1.png", "notes.txt"] {
            std::fs::write(assets.join(name), b"").unwrap();
        }

        let Json(list) = list_characters(State(context)).await;
        assert_eq!(list.characters, vec!["character1.png", "character2.png"]);
    }
}
