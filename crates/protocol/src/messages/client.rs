//! Client -> server messages.

use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Outbound control messages. These express intent only — the server is
/// authoritative over actual positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request to join the world under a display name.
    JoinGame { username: String },
    /// Start or redirect movement.
    Move { direction: Direction },
    /// Stop moving.
    Stop,
}

impl ClientMessage {
    /// Serialize to the JSON text sent over the channel.
    pub fn encode(&self) -> String {
        // Serialization of these variants cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_game_carries_action_tag_and_username() {
        let text = ClientMessage::JoinGame {
            username: "ada".into(),
        }
        .encode();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["action"], "join_game");
        assert_eq!(value["username"], "ada");
    }

    #[test]
    fn move_and_stop_wire_shapes() {
        let mv = ClientMessage::Move {
            direction: Direction::Right,
        }
        .encode();
        assert_eq!(mv, r#"{"action":"move","direction":"right"}"#);

        let stop = ClientMessage::Stop.encode();
        assert_eq!(stop, r#"{"action":"stop"}"#);
    }
}
