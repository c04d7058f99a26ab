//! Wire types shared between dispatch, rendering and input.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Discrete orientation of a player avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    North,
    South,
    East,
    West,
}

/// Requested movement direction carried by a `move` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Server-authoritative state for one player. Replaced wholesale whenever an
/// inbound message names this player's id — never merged field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    /// Index into the facing's frame sequence. Servers may omit it.
    #[serde(default)]
    pub animation_frame: usize,
    pub username: String,
    /// Key into the avatar-definition mapping.
    pub avatar: String,
}

impl PlayerState {
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Per-facing animation frame sequences. Each entry is an opaque image
/// source identifier (a URL or data URL) delivered by the server.
///
/// West frames are never stored separately: west is always the east
/// sequence mirrored at render time. A `west` key on the wire is accepted
/// and ignored — this is an invariant, not a fallback for missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSet {
    #[serde(default)]
    pub north: Vec<String>,
    #[serde(default)]
    pub south: Vec<String>,
    #[serde(default)]
    pub east: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub west: Vec<String>,
}

impl FrameSet {
    /// Frame sequence for a facing. `West` resolves to the east sequence
    /// regardless of whether explicit west frames were supplied.
    #[inline]
    pub fn sequence(&self, facing: Facing) -> &[String] {
        match facing {
            Facing::North => &self.north,
            Facing::South => &self.south,
            Facing::East | Facing::West => &self.east,
        }
    }

    /// All stored sequences, for cache warm-up. Explicit west frames are
    /// excluded since nothing ever draws them.
    pub fn stored_sequences(&self) -> impl Iterator<Item = &[String]> {
        [&self.north, &self.south, &self.east]
            .into_iter()
            .map(Vec::as_slice)
    }
}

/// A named avatar asset as delivered inside `join_game` / `player_joined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarDefinition {
    pub name: String,
    pub frames: FrameSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(tag: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("data:{tag}-{i}")).collect()
    }

    #[test]
    fn west_always_resolves_to_east_sequence() {
        let mut set = FrameSet {
            north: frames("n", 3),
            south: frames("s", 3),
            east: frames("e", 3),
            west: Vec::new(),
        };
        assert_eq!(set.sequence(Facing::West), set.east.as_slice());

        // Even an explicit west sequence is ignored.
        set.west = frames("w", 3);
        assert_eq!(set.sequence(Facing::West), set.east.as_slice());
        assert_eq!(set.sequence(Facing::East), set.east.as_slice());
    }

    #[test]
    fn stored_sequences_skip_explicit_west() {
        let set = FrameSet {
            north: frames("n", 1),
            south: frames("s", 1),
            east: frames("e", 1),
            west: frames("w", 1),
        };
        let all: Vec<&str> = set
            .stored_sequences()
            .flatten()
            .map(String::as_str)
            .collect();
        assert_eq!(all, vec!["data:n-0", "data:s-0", "data:e-0"]);
    }

    #[test]
    fn player_state_animation_frame_defaults_to_zero() {
        let json = r#"{
            "id": "p1", "x": 10.0, "y": 20.0,
            "facing": "south", "username": "ada", "avatar": "default"
        }"#;
        let state: PlayerState = serde_json::from_str(json).unwrap();
        assert_eq!(state.animation_frame, 0);
        assert_eq!(state.facing, Facing::South);
        assert_eq!(state.position(), glam::Vec2::new(10.0, 20.0));
    }

    #[test]
    fn direction_wire_form_is_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"up\"");
        assert_eq!(
            serde_json::from_str::<Direction>("\"left\"").unwrap(),
            Direction::Left
        );
    }
}
