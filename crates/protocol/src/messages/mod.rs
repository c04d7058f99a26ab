//! Message definitions for the plaza wire protocol.
//!
//! Every frame is one JSON object with a top-level `action` string that
//! discriminates the message type. This module contains both
//! client->server and server->client message types.

mod client;
mod server;

pub use client::*;
pub use server::*;
