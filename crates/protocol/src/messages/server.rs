//! Server -> client messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::{AvatarDefinition, PlayerState};

/// Payload of an inbound `join_game` reply.
///
/// On success the server sends the full player and avatar mappings plus the
/// id it assigned to this client. On failure only `error` is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReply {
    pub success: bool,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub players: Option<HashMap<String, PlayerState>>,
    #[serde(default)]
    pub avatars: Option<HashMap<String, AvatarDefinition>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Inbound messages the client understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    JoinGame(JoinReply),
    /// Partial update: only the named ids change. A `null` entry is a skip
    /// marker for that id, not a deletion.
    PlayersMoved {
        players: HashMap<String, Option<PlayerState>>,
    },
    PlayerJoined {
        player: PlayerState,
        avatar: AvatarDefinition,
    },
    PlayerLeft {
        player_id: String,
    },
}

#[derive(Deserialize)]
struct PlayersMovedPayload {
    #[serde(default)]
    players: HashMap<String, Option<PlayerState>>,
}

#[derive(Deserialize)]
struct PlayerJoinedPayload {
    player: PlayerState,
    avatar: AvatarDefinition,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerLeftPayload {
    player_id: String,
}

impl ServerMessage {
    /// Decode one inbound text frame.
    ///
    /// Returns `Ok(None)` for an unknown `action` tag — unknown messages
    /// are a forward-compatible no-op, not an error. Anything structurally
    /// wrong (non-JSON, missing tag, bad payload) is an error the caller
    /// logs without tearing down the session.
    pub fn decode(text: &str) -> Result<Option<Self>, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingAction)?
            .to_owned();

        let wrap = |source: serde_json::Error| ProtocolError::BadPayload {
            action: action.clone(),
            source,
        };

        let msg = match action.as_str() {
            "join_game" => {
                ServerMessage::JoinGame(serde_json::from_value(value).map_err(wrap)?)
            }
            "players_moved" => {
                let p: PlayersMovedPayload = serde_json::from_value(value).map_err(wrap)?;
                ServerMessage::PlayersMoved { players: p.players }
            }
            "player_joined" => {
                let p: PlayerJoinedPayload = serde_json::from_value(value).map_err(wrap)?;
                ServerMessage::PlayerJoined {
                    player: p.player,
                    avatar: p.avatar,
                }
            }
            "player_left" => {
                let p: PlayerLeftPayload = serde_json::from_value(value).map_err(wrap)?;
                ServerMessage::PlayerLeft {
                    player_id: p.player_id,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Facing;

    #[test]
    fn decodes_successful_join() {
        let text = r#"{
            "action": "join_game",
            "success": true,
            "playerId": "p1",
            "players": {
                "p1": {"id":"p1","x":1000,"y":1000,"facing":"south",
                       "username":"ada","avatar":"default","animationFrame":1}
            },
            "avatars": {
                "default": {"name":"default","frames":{"north":[],"south":["s0"],"east":[]}}
            }
        }"#;
        let Some(ServerMessage::JoinGame(reply)) = ServerMessage::decode(text).unwrap() else {
            panic!("expected join_game");
        };
        assert!(reply.success);
        assert_eq!(reply.player_id.as_deref(), Some("p1"));
        let players = reply.players.unwrap();
        assert_eq!(players["p1"].facing, Facing::South);
        assert_eq!(players["p1"].animation_frame, 1);
        assert_eq!(reply.avatars.unwrap()["default"].frames.south, vec!["s0"]);
    }

    #[test]
    fn decodes_failed_join_without_world_data() {
        let text = r#"{"action":"join_game","success":false,"error":"name taken"}"#;
        let Some(ServerMessage::JoinGame(reply)) = ServerMessage::decode(text).unwrap() else {
            panic!("expected join_game");
        };
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("name taken"));
        assert!(reply.players.is_none());
    }

    #[test]
    fn players_moved_preserves_null_entries_as_skip_markers() {
        let text = r#"{
            "action": "players_moved",
            "players": {
                "p7": null,
                "p2": {"id":"p2","x":5,"y":6,"facing":"east",
                       "username":"bo","avatar":"default"}
            }
        }"#;
        let Some(ServerMessage::PlayersMoved { players }) = ServerMessage::decode(text).unwrap()
        else {
            panic!("expected players_moved");
        };
        assert!(players["p7"].is_none());
        assert_eq!(players["p2"].as_ref().unwrap().x, 5.0);
    }

    #[test]
    fn player_left_uses_camel_case_id() {
        let text = r#"{"action":"player_left","playerId":"p3"}"#;
        assert_eq!(
            ServerMessage::decode(text).unwrap(),
            Some(ServerMessage::PlayerLeft {
                player_id: "p3".into()
            })
        );
    }

    #[test]
    fn unknown_action_is_a_silent_no_op() {
        let text = r#"{"action":"server_gossip","stuff":[1,2,3]}"#;
        assert_eq!(ServerMessage::decode(text).unwrap(), None);
    }

    #[test]
    fn malformed_frames_are_errors_not_panics() {
        assert!(matches!(
            ServerMessage::decode("not json"),
            Err(ProtocolError::MalformedJson(_))
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"kind":"join_game"}"#),
            Err(ProtocolError::MissingAction)
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"action":"player_left"}"#),
            Err(ProtocolError::BadPayload { .. })
        ));
    }
}
