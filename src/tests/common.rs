//! Shared fixtures for the end-to-end gateway scenarios: an in-process
//! gateway wired to seeded stores, driven without any socket.

use crate::auth::StaticTokenVerifier;
use crate::catalog::{SpeciesCatalog, StaticCatalog};
use crate::dungeon::DungeonTable;
use crate::gateway::{ConnectionCtx, PacingConfig, ProtocolGateway};
use crate::moves;
use crate::session::SessionManager;
use crate::store::{InMemoryStore, OwnedCreature, StatBoosts};
use schema::{ClientMessage, Gender, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const TOKEN: &str = "tok-trainer-1";
pub const PLAYER: &str = "trainer-1";

pub struct Harness {
    pub gateway: Arc<ProtocolGateway>,
    pub sessions: Arc<SessionManager>,
    pub ctx: ConnectionCtx,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
    pub team_ids: Vec<String>,
}

/// Build a gateway whose store holds one four-creature team for
/// `PLAYER`, every member at the given level with the given boosts.
pub async fn harness(level: u8, boosts: StatBoosts, pacing: PacingConfig) -> Harness {
    let catalog: Arc<dyn SpeciesCatalog> = Arc::new(StaticCatalog::bundled());
    let store = Arc::new(InMemoryStore::new());

    let mut team_ids = Vec::new();
    for (i, pokedex_id) in [25u16, 4, 7, 1].into_iter().enumerate() {
        let id = format!("team-{}", i);
        store
            .seed(
                PLAYER,
                OwnedCreature {
                    id: id.clone(),
                    pokedex_id,
                    level,
                    gender: Gender::Male,
                    shiny: false,
                    boosts,
                    moves: moves::minion_moveset(level),
                },
            )
            .await;
        team_ids.push(id);
    }

    let sessions = Arc::new(SessionManager::new(
        catalog,
        store,
        DungeonTable::bundled(),
    ));
    let verifier = StaticTokenVerifier::new().with_token(TOKEN, PLAYER);
    let gateway = ProtocolGateway::new(sessions.clone(), Arc::new(verifier), pacing);

    let (tx, rx) = mpsc::unbounded_channel();
    Harness {
        gateway,
        sessions,
        ctx: ConnectionCtx::new(tx),
        rx,
        team_ids,
    }
}

impl Harness {
    pub async fn send(&mut self, message: ClientMessage) -> Vec<ServerMessage> {
        self.gateway.handle(&mut self.ctx, message).await
    }

    /// Authenticate and select the seeded team for the dungeon.
    pub async fn enter_dungeon(&mut self, dungeon_id: u32) {
        let replies = self
            .send(ClientMessage::Authenticate {
                token: TOKEN.to_string(),
            })
            .await;
        assert_eq!(replies[0].kind(), "AUTHENTICATED");

        let replies = self
            .send(ClientMessage::SelectTeam {
                dungeon_id,
                pokemon_ids: self.team_ids.clone(),
            })
            .await;
        assert_eq!(replies[0].kind(), "DUNGEON_READY");
    }

    /// Next pushed event, failing the test if the loop stalls.
    pub async fn next_event(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(10), self.rx.recv())
            .await
            .expect("timed out waiting for a battle event")
            .expect("outbound channel closed")
    }

    /// Skip events until one of the given kind arrives, returning it and
    /// everything skipped along the way.
    pub async fn next_of_kind(&mut self, kind: &str) -> (ServerMessage, Vec<ServerMessage>) {
        let mut skipped = Vec::new();
        loop {
            let event = self.next_event().await;
            if event.kind() == kind {
                return (event, skipped);
            }
            skipped.push(event);
        }
    }
}

pub fn overwhelming_boosts() -> StatBoosts {
    StatBoosts {
        hp: 900,
        attack: 900,
        defense: 900,
        resistance: 0,
    }
}
