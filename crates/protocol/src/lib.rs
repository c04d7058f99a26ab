//! Shared protocol crate for the plaza client.
//!
//! This crate contains:
//! - Wire types (player state, avatar definitions, facing/direction enums)
//! - The JSON message envelope (`action`-tagged objects in both directions)
//! - Shared error types

mod error;
pub mod messages;
mod types;

pub use error::ProtocolError;
pub use messages::{ClientMessage, JoinReply, ServerMessage};
pub use types::{AvatarDefinition, Direction, Facing, FrameSet, PlayerState};

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;
