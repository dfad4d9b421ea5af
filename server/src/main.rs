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
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use townsquare_server::AiSystem;
use townsquare_server::auth::TokenAuthenticator;
use townsquare_server::config::{Arguments, Configuration};
use townsquare_server::context::ServerContext;
use townsquare_server::persistence::JsonDataStore;
use townsquare_server::webapp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            tracing::debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        tracing::debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // Load configuration from a file with environment variable substitution
    let config: Configuration = Configuration::load(&arguments.config_file)
        .inspect_err(|err| eprintln!("Configuration load error: {}", err))
        .expect("Unable to load configuration file");

    tracing::debug!("Configuration loaded: {:?}", config);
    tracing::info!("Starting Townsquare Server...");

    // Open the data directory, writing defaults for anything missing
    let data = Arc::new(JsonDataStore::new(config.data.directory.as_path()));
    data.ensure_layout().await?;
    let game_config = data.load_game_config().await?;
    let tokens = data.load_tokens().await?;
    tracing::info!(
        "Data directory {} ready ({} tokens)",
        data.root().display(),
        tokens.valid_tokens.len()
    );

    let context = ServerContext::new(
        game_config,
        Arc::new(TokenAuthenticator::new(tokens)),
        data.clone(),
        &config.world.default_scene,
        config.data.character_assets.as_path(),
    );

    // Populate and start the autonomous update loop
    let ai = Arc::new(AiSystem::new(
        context.store().clone(),
        context.pool().clone(),
        data,
        config.world.energy_recovery,
    ));
    ai.load_roster(&config.world).await;
    let period = config.world.tick_duration();
    tokio::spawn(async move {
        ai.run(period).await;
    });
    tracing::info!("AI loop started ({:?} per tick)", period);

    // Get Server Address from configuration
    let listen_addr: SocketAddr = config.listener.addr.to_addr();
    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!(
        "Listening on {} ({}:{})",
        config.listener.addr,
        config.listener.addr.to_ip(),
        config.listener.addr.to_port()
    );

    axum::serve(listener, webapp::router(&context))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
