// WebSocket connection and outbound message sending
use protocol::{ClientMessage, Direction};
use wasm_bindgen::prelude::*;
use web_sys::WebSocket;

pub struct Connection {
    ws: WebSocket,
    url: String,
}

impl Connection {
    pub fn new(url: &str) -> Result<Self, JsValue> {
        // Construct WebSocket URL with proper protocol
        let ws_url = if url.starts_with("ws://") || url.starts_with("wss://") {
            url.to_string()
        } else {
            // Check if we're on HTTPS
            let is_https = web_sys::window()
                .and_then(|w| w.location().protocol().ok())
                .map(|p| p == "https:")
                .unwrap_or(false);

            format!("ws{}://{}", if is_https { "s" } else { "" }, url)
        };

        web_sys::console::log_1(&format!("Connecting to: {}", ws_url).into());
        let ws = WebSocket::new(&ws_url)?;

        Ok(Self { ws, url: ws_url })
    }

    pub fn websocket(&self) -> &WebSocket {
        &self.ws
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.ws.ready_state() == WebSocket::OPEN
    }

    pub fn close(&self) {
        let _ = self.ws.close();
    }

    pub fn reconnect(&mut self) -> Result<WebSocket, JsValue> {
        // Clean up old websocket
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();

        web_sys::console::log_1(&format!("Reconnecting to: {}", self.url).into());
        let ws = WebSocket::new(&self.url)?;
        self.ws = ws;
        Ok(self.ws.clone())
    }

    fn send(&self, msg: &ClientMessage) -> Result<(), JsValue> {
        if !self.is_open() {
            return Err(JsValue::from_str("WebSocket not ready"));
        }
        self.ws.send_with_str(&msg.encode())
    }

    /// Request to join the world under a display name.
    pub fn send_join(&self, username: &str) -> Result<(), JsValue> {
        self.send(&ClientMessage::JoinGame {
            username: username.to_string(),
        })
    }

    /// Movement intent. The server remains authoritative over position.
    pub fn send_move(&self, direction: Direction) -> Result<(), JsValue> {
        self.send(&ClientMessage::Move { direction })
    }

    /// Stop intent, sent once when the last held key is released.
    pub fn send_stop(&self) -> Result<(), JsValue> {
        self.send(&ClientMessage::Stop)
    }
}
