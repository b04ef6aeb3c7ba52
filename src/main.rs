//! Pokemon Dungeon server binary.
//!
//! Listens on TCP and speaks the dungeon protocol as newline-delimited
//! JSON: one `{"type": ..., "data": ...}` object per line in each
//! direction. Demo accounts come from the config's token table and are
//! seeded with a starter roster on boot.

use pokemon_dungeon::catalog::SpeciesCatalog;
use pokemon_dungeon::config::ServerConfig;
use pokemon_dungeon::dungeon::DungeonTable;
use pokemon_dungeon::gateway::{ConnectionCtx, ProtocolGateway};
use pokemon_dungeon::store::{CreatureStore, MoveProvider, NewCreature};
use pokemon_dungeon::{
    CatalogMoveProvider, ClientMessage, Gender, InMemoryStore, ServerMessage, SessionManager,
    StaticCatalog, StaticTokenVerifier,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// The roster every demo account starts with.
const STARTER_ROSTER: [(u16, u8); 4] = [(25, 15), (4, 15), (7, 17), (1, 20)];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load(Path::new("config/server.toml"));

    let catalog: Arc<dyn SpeciesCatalog> = Arc::new(StaticCatalog::bundled());
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(CatalogMoveProvider::new(catalog.clone()));

    let mut verifier = StaticTokenVerifier::new();
    for entry in &config.tokens {
        verifier = verifier.with_token(&entry.token, &entry.player);
        seed_starter_roster(store.as_ref(), provider.as_ref(), &entry.player).await;
    }

    let sessions = Arc::new(SessionManager::new(
        catalog,
        store.clone(),
        DungeonTable::bundled(),
    ));
    let gateway = ProtocolGateway::new(sessions, Arc::new(verifier), config.pacing());

    let addr = format!("{}:{}", config.server.ip, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, %err, "failed to bind listener");
            return;
        }
    };
    tracing::info!(%addr, "dungeon server listening");

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                tracing::debug!(%peer, "connection accepted");
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    handle_connection(gateway, socket).await;
                });
            }
            Err(err) => {
                tracing::warn!(%err, "accept failed");
            }
        }
    }
}

async fn seed_starter_roster(
    store: &dyn CreatureStore,
    provider: &dyn MoveProvider,
    player_id: &str,
) {
    for (pokedex_id, level) in STARTER_ROSTER {
        let moves = match provider.moves_for(pokedex_id, level).await {
            Ok(moves) => moves,
            Err(err) => {
                tracing::warn!(pokedex_id, %err, "skipping starter, no moveset");
                continue;
            }
        };
        let seed = NewCreature {
            pokedex_id,
            level,
            gender: Gender::Male,
            shiny: false,
            moves,
        };
        if let Err(err) = store.create(player_id, seed).await {
            tracing::warn!(player = player_id, %err, "failed to seed starter");
        }
    }
    tracing::info!(player = player_id, "starter roster seeded");
}

async fn handle_connection(gateway: Arc<ProtocolGateway>, socket: TcpStream) {
    let (read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut ctx = ConnectionCtx::new(tx);
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            inbound = lines.next_line() => {
                let line = match inbound {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                let replies = match serde_json::from_str::<ClientMessage>(&line) {
                    Ok(message) => gateway.handle(&mut ctx, message).await,
                    Err(err) => vec![ServerMessage::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("could not parse message: {}", err),
                    }],
                };
                for reply in replies {
                    if write_message(&mut write_half, &reply).await.is_err() {
                        gateway.disconnect(&ctx).await;
                        return;
                    }
                }
            }
            pushed = rx.recv() => {
                let Some(message) = pushed else { break };
                if write_message(&mut write_half, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    gateway.disconnect(&ctx).await;
}

async fn write_message(
    writer: &mut OwnedWriteHalf,
    message: &ServerMessage,
) -> std::io::Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await
}
