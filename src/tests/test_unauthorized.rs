//! Authentication gating at the protocol boundary.

use crate::gateway::PacingConfig;
use crate::store::StatBoosts;
use crate::tests::common::{harness, TOKEN};
use schema::{ClientMessage, ServerMessage};

#[tokio::test]
async fn gameplay_messages_require_authentication() {
    let mut h = harness(15, StatBoosts::default(), PacingConfig::immediate()).await;

    let replies = h
        .send(ClientMessage::SelectTeam {
            dungeon_id: 1,
            pokemon_ids: h.team_ids.clone(),
        })
        .await;
    let ServerMessage::Error { code, .. } = &replies[0] else {
        panic!("expected ERROR, got {:?}", replies[0]);
    };
    assert_eq!(code, "UNAUTHORIZED");
}

#[tokio::test]
async fn bad_tokens_are_rejected() {
    let mut h = harness(15, StatBoosts::default(), PacingConfig::immediate()).await;

    let replies = h
        .send(ClientMessage::Authenticate {
            token: "forged".to_string(),
        })
        .await;
    let ServerMessage::Error { code, .. } = &replies[0] else {
        panic!("expected ERROR, got {:?}", replies[0]);
    };
    assert_eq!(code, "INVALID_TOKEN");

    // The connection can still authenticate properly afterwards.
    let replies = h
        .send(ClientMessage::Authenticate {
            token: TOKEN.to_string(),
        })
        .await;
    assert_eq!(replies[0].kind(), "AUTHENTICATED");
}

#[tokio::test]
async fn validation_errors_leave_state_unchanged() {
    let mut h = harness(15, StatBoosts::default(), PacingConfig::immediate()).await;
    h.send(ClientMessage::Authenticate {
        token: TOKEN.to_string(),
    })
    .await;

    // Wrong team size.
    let replies = h
        .send(ClientMessage::SelectTeam {
            dungeon_id: 1,
            pokemon_ids: h.team_ids[..2].to_vec(),
        })
        .await;
    let ServerMessage::Error { code, .. } = &replies[0] else {
        panic!("expected ERROR, got {:?}", replies[0]);
    };
    assert_eq!(code, "INVALID_TEAM_SIZE");

    // No session was created by the failed attempt.
    let replies = h
        .send(ClientMessage::StartFight {
            selected_pokemon_id: h.team_ids[0].clone(),
        })
        .await;
    let ServerMessage::Error { code, .. } = &replies[0] else {
        panic!("expected ERROR, got {:?}", replies[0]);
    };
    assert_eq!(code, "NO_ACTIVE_SESSION");
}
