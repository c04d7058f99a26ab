// Game state - world state store, message dispatch, client orchestration
use glam::Vec2;
use protocol::{AvatarDefinition, PlayerState, ServerMessage};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, window};

use crate::camera::Camera;
use crate::console_log;
use crate::input::{Input, Intent};
use crate::network::Connection;
use crate::render::Renderer;

/// Result of applying one inbound message to the world.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Rendered state is out of date; one redraw is owed for this message.
    pub dirty: bool,
    /// New avatar definitions arrived; the frame cache should warm them up.
    pub avatars_changed: bool,
    /// The server removed the local player. Treated as a forced disconnect.
    pub session_lost: bool,
    /// The server rejected our join. No state was mutated.
    pub join_error: Option<String>,
}

/// Single source of truth for rendering: player states, avatar definitions
/// and the local player's id. Mutated only by `apply`, on the sequential
/// message-dispatch path; the renderer reads it and never writes.
pub struct World {
    pub players: HashMap<String, PlayerState>,
    pub avatars: HashMap<String, AvatarDefinition>,
    pub my_id: Option<String>,
}

impl World {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            avatars: HashMap::new(),
            my_id: None,
        }
    }

    pub fn local_player(&self) -> Option<&PlayerState> {
        self.players.get(self.my_id.as_ref()?)
    }

    /// Drop all session state. Called when the channel closes; the next
    /// successful join repopulates everything.
    pub fn clear(&mut self) {
        self.players.clear();
        self.avatars.clear();
        self.my_id = None;
    }

    /// Apply one server message. Entries named by a message are replaced
    /// wholesale; ids a message does not mention are left untouched.
    pub fn apply(&mut self, msg: ServerMessage) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        match msg {
            ServerMessage::JoinGame(reply) => {
                if !reply.success {
                    outcome.join_error =
                        Some(reply.error.unwrap_or_else(|| "join rejected".to_owned()));
                    return outcome;
                }
                self.my_id = reply.player_id;
                self.players = reply.players.unwrap_or_default();
                self.avatars = reply.avatars.unwrap_or_default();
                outcome.avatars_changed = true;
                outcome.dirty = true;
            }
            ServerMessage::PlayersMoved { players } => {
                for (id, state) in players {
                    // Null entries are skip markers, not deletions.
                    if let Some(state) = state {
                        self.players.insert(id, state);
                    }
                }
                // One redraw for the whole batch, not one per id.
                outcome.dirty = true;
            }
            ServerMessage::PlayerJoined { player, avatar } => {
                self.players.insert(player.id.clone(), player);
                self.avatars.insert(avatar.name.clone(), avatar);
                outcome.avatars_changed = true;
                outcome.dirty = true;
            }
            ServerMessage::PlayerLeft { player_id } => {
                if self.my_id.as_deref() == Some(player_id.as_str()) {
                    // A well-behaved server never does this. Rather than
                    // keep rendering a ghost local player, tear the
                    // session down and let the reconnect path rejoin.
                    outcome.session_lost = true;
                } else {
                    self.players.remove(&player_id);
                }
                outcome.dirty = true;
            }
        }
        outcome
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// The main game client: owns the connection, renderer, camera and world
/// state, constructed explicitly from its canvas and transport dependencies
/// and driven by the animation-frame loop.
#[wasm_bindgen]
pub struct GameClient {
    connection: Rc<RefCell<Connection>>,
    renderer: Renderer,
    camera: Camera,
    world: World,
    username: String,

    input_state: Rc<RefCell<Input>>, // Shared with keyboard event handlers
    intent_queue: Rc<RefCell<Vec<Intent>>>,

    // Message queue - WebSocket handler pushes here, game loop processes
    message_queue: Rc<RefCell<Vec<String>>>,

    // WebSocket / resize event flags (to avoid borrow conflicts in handlers)
    ws_open_flag: Rc<Cell<bool>>,
    ws_close_flag: Rc<Cell<bool>>,
    resize_flag: Rc<Cell<bool>>,

    // Dirty flag consumed by the render pass; mutations between animation
    // frames coalesce into a single redraw.
    dirty: bool,
    world_was_ready: bool,
}

#[wasm_bindgen]
impl GameClient {
    pub fn new(canvas_id: &str, server_url: &str, username: &str) -> Result<GameClient, JsValue> {
        let window = window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        // Size the canvas to the window up front; resizes are reactive.
        canvas.set_width(window.inner_width()?.as_f64().unwrap_or(800.0) as u32);
        canvas.set_height(window.inner_height()?.as_f64().unwrap_or(600.0) as u32);

        let renderer = Renderer::new(canvas)?;
        let connection = Connection::new(server_url)?;

        Ok(Self {
            connection: Rc::new(RefCell::new(connection)),
            renderer,
            camera: Camera::new(),
            world: World::new(),
            username: username.to_string(),
            input_state: Rc::new(RefCell::new(Input::new())),
            intent_queue: Rc::new(RefCell::new(Vec::new())),
            message_queue: Rc::new(RefCell::new(Vec::new())),
            ws_open_flag: Rc::new(Cell::new(false)),
            ws_close_flag: Rc::new(Cell::new(false)),
            resize_flag: Rc::new(Cell::new(false)),
            dirty: false,
            world_was_ready: false,
        })
    }

    /// True once a join has succeeded on the current connection.
    pub fn is_joined(&self) -> bool {
        self.world.my_id.is_some()
    }

    pub fn player_count(&self) -> usize {
        self.world.players.len()
    }

    pub fn websocket(&self) -> web_sys::WebSocket {
        self.connection.borrow().websocket().clone()
    }
}

// Non-WASM methods (not exposed to JS)
impl GameClient {
    /// Get the message queue (for the WebSocket handler to push frames)
    pub(crate) fn message_queue(&self) -> Rc<RefCell<Vec<String>>> {
        self.message_queue.clone()
    }

    /// Get the input state (for keyboard event handlers)
    pub(crate) fn input_state(&self) -> Rc<RefCell<Input>> {
        self.input_state.clone()
    }

    /// Get the intent queue (keyboard handlers push, game loop drains)
    pub(crate) fn intent_queue(&self) -> Rc<RefCell<Vec<Intent>>> {
        self.intent_queue.clone()
    }

    pub(crate) fn ws_open_flag(&self) -> Rc<Cell<bool>> {
        self.ws_open_flag.clone()
    }

    pub(crate) fn ws_close_flag(&self) -> Rc<Cell<bool>> {
        self.ws_close_flag.clone()
    }

    pub(crate) fn resize_flag(&self) -> Rc<Cell<bool>> {
        self.resize_flag.clone()
    }

    pub(crate) fn reconnect(&mut self) -> Result<web_sys::WebSocket, JsValue> {
        self.connection.borrow_mut().reconnect()
    }

    fn handle_ws_open(&self) {
        console_log!("connected, joining as {:?}", self.username);
        if let Err(e) = self.connection.borrow().send_join(&self.username) {
            web_sys::console::error_1(&format!("Failed to send join: {:?}", e).into());
        }
    }

    fn handle_disconnect(&mut self) {
        console_log!("disconnected, clearing world state");
        self.world.clear();
        self.camera.viewport = Vec2::ZERO;
        self.dirty = true;
    }

    fn handle_message(&mut self, text: &str) {
        let msg = match ServerMessage::decode(text) {
            Ok(Some(msg)) => msg,
            // Unknown action tags are a forward-compatible no-op.
            Ok(None) => return,
            Err(e) => {
                // One bad frame must never terminate the session.
                web_sys::console::error_1(&format!("Bad server message: {e}").into());
                return;
            }
        };

        let outcome = self.world.apply(msg);
        if let Some(error) = outcome.join_error {
            web_sys::console::error_1(&format!("Join rejected by server: {error}").into());
        }
        if outcome.avatars_changed {
            // Populate the decoded-image cache on first reference so draw
            // passes stay synchronous with their state snapshot.
            for avatar in self.world.avatars.values() {
                self.renderer.ensure_avatar(avatar);
            }
        }
        if outcome.session_lost {
            web_sys::console::warn_1(
                &"Server removed the local player; dropping connection".into(),
            );
            self.connection.borrow().close();
        }
        self.dirty |= outcome.dirty;
    }

    /// Main update method called once per animation frame.
    pub fn update(&mut self) -> Result<(), JsValue> {
        if self.ws_open_flag.get() {
            self.ws_open_flag.set(false);
            self.handle_ws_open();
        }

        if self.ws_close_flag.get() {
            self.ws_close_flag.set(false);
            self.handle_disconnect();
        }

        if self.resize_flag.get() {
            self.resize_flag.set(false);
            self.renderer.resize_to_window()?;
            self.dirty = true;
        }

        // Process all queued inbound frames sequentially.
        let frames: Vec<String> = self.message_queue.borrow_mut().drain(..).collect();
        for text in frames {
            self.handle_message(&text);
        }

        // Forward movement intents; dropped (not queued) when the channel
        // is not open.
        let intents: Vec<Intent> = self.intent_queue.borrow_mut().drain(..).collect();
        if !intents.is_empty() {
            let conn = self.connection.borrow();
            if conn.is_open() {
                for intent in intents {
                    let sent = match intent {
                        Intent::Move(direction) => conn.send_move(direction),
                        Intent::Stop => conn.send_stop(),
                    };
                    if let Err(e) = sent {
                        web_sys::console::error_1(
                            &format!("Failed to send intent: {:?}", e).into(),
                        );
                    }
                }
            }
        }

        // The world background finishing its one-time load owes a redraw.
        if self.renderer.world_ready() && !self.world_was_ready {
            self.world_was_ready = true;
            self.dirty = true;
        }

        // Avatar frames still decoding: re-arm the flag so each avatar
        // appears on the first frame after its image becomes resident.
        if self.renderer.has_loading_frames() {
            self.dirty = true;
        }

        // Drawing is deferred until the world image is resident.
        if self.dirty && self.renderer.world_ready() {
            self.render();
            self.dirty = false;
        }

        Ok(())
    }

    fn render(&mut self) {
        let canvas_size = self.renderer.canvas_size();
        let world_size = self.renderer.world_size();
        if let Some(me) = self.world.local_player() {
            self.camera.recompute(me.position(), canvas_size, world_size);
        }

        self.renderer.clear("#000");
        self.renderer.draw_world(self.camera.viewport);

        // Stable draw order so overlapping avatars don't flicker.
        let mut ids: Vec<&String> = self.world.players.keys().collect();
        ids.sort();
        for id in ids {
            let player = &self.world.players[id];
            if let Some(avatar) = self.world.avatars.get(&player.avatar) {
                self.renderer.draw_avatar(player, avatar, &self.camera);
            }
        }
    }
}
