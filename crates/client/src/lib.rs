// WASM client entry point for plaza
// Browser-rendered multiplayer world viewer/controller: receives
// authoritative state over a WebSocket and renders a scrolling viewport
// centered on the local player.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, KeyboardEvent, MessageEvent, WebSocket, window};

// Module structure - each module handles a specific concern
mod camera; // Viewport math, world-bound clamping
mod game; // World state store, message dispatch, client context
mod input; // Keyboard event handling, move/stop intents
mod network; // WebSocket connection, outbound messages
mod render; // Canvas rendering, avatar frames, image cache
mod utils; // Console logging helper

// Re-export the main entry point
pub use game::GameClient;

use input::Input;

/// Delay between reconnect attempts. Fixed - no backoff growth, no retry
/// cap; the client retries indefinitely.
const RECONNECT_DELAY_MS: i32 = 2000;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Create and return a GameClient that JS can interact with
#[wasm_bindgen]
pub struct GameClientWrapper {
    client: Rc<RefCell<GameClient>>,
}

#[wasm_bindgen]
impl GameClientWrapper {
    /// Create a new game client bound to a canvas, server and username.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        server_url: &str,
        username: &str,
    ) -> Result<GameClientWrapper, JsValue> {
        init();

        let client = GameClient::new(canvas_id, server_url, username)?;
        let client_rc = Rc::new(RefCell::new(client));

        // Setup WebSocket message handler
        setup_websocket_handler(client_rc.clone())?;

        // Setup animation loop
        setup_animation_loop(client_rc.clone())?;

        // Setup keyboard handlers
        setup_input_handlers(client_rc.clone())?;

        // Setup canvas resize handler
        setup_resize_handler(client_rc.clone())?;

        Ok(GameClientWrapper { client: client_rc })
    }

    /// True once the server accepted our join on the current connection.
    pub fn is_joined(&self) -> bool {
        self.client.borrow().is_joined()
    }

    /// Number of players currently in the world state.
    pub fn player_count(&self) -> usize {
        self.client.borrow().player_count()
    }

    /// Get the underlying WebSocket for connection status checks
    pub fn websocket(&self) -> web_sys::WebSocket {
        self.client.borrow().websocket()
    }
}

struct ReconnectState {
    scheduled: bool,
}

fn attach_websocket_handlers(
    client: Rc<RefCell<GameClient>>,
    ws: WebSocket,
    reconnect_state: Rc<RefCell<ReconnectState>>,
) -> Result<(), JsValue> {
    // Get shared resources that don't require borrowing client
    let message_queue = client.borrow().message_queue();
    let ws_open_flag = client.borrow().ws_open_flag();

    let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Some(text) = event.data().as_string() {
            // Push frame to queue - game loop will process it
            message_queue.borrow_mut().push(text);
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    // onopen - set flag and clear the reconnect guard
    let onopen_state = reconnect_state.clone();
    let onopen = Closure::wrap(Box::new(move |_event: JsValue| {
        web_sys::console::log_1(&"WebSocket connected".into());
        // Set flag for game loop to process
        ws_open_flag.set(true);
        if let Ok(mut state) = onopen_state.try_borrow_mut() {
            state.scheduled = false;
        }
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    // onerror
    let onerror = Closure::wrap(Box::new(move |e: JsValue| {
        web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    // onclose - schedule reconnect after the fixed delay
    let client_weak: Weak<RefCell<GameClient>> = Rc::downgrade(&client);
    let ws_close_flag = client.borrow().ws_close_flag();
    let onclose_state = reconnect_state.clone();
    let onclose = Closure::wrap(Box::new(move |event: CloseEvent| {
        web_sys::console::log_1(&format!("WebSocket closed: {}", event.code()).into());

        // Set flag for game loop to process disconnect
        ws_close_flag.set(true);

        {
            let mut state = onclose_state.borrow_mut();
            if state.scheduled {
                return;
            }
            state.scheduled = true;
        }

        if let Some(window) = web_sys::window() {
            let attempt_client = client_weak.clone();
            let attempt_state = onclose_state.clone();
            let callback = Closure::wrap(Box::new(move || {
                if let Some(client_rc) = attempt_client.upgrade() {
                    // Use try_borrow_mut to avoid panic if client is borrowed elsewhere
                    match client_rc.try_borrow_mut() {
                        Ok(mut client) => match client.reconnect() {
                            Ok(new_ws) => {
                                drop(client); // Release borrow before attaching handlers
                                let new_reconnect_state =
                                    Rc::new(RefCell::new(ReconnectState { scheduled: false }));
                                if let Err(e) = attach_websocket_handlers(
                                    client_rc.clone(),
                                    new_ws,
                                    new_reconnect_state,
                                ) {
                                    web_sys::console::error_1(
                                        &format!("Failed to attach handlers: {:?}", e).into(),
                                    );
                                }
                            }
                            Err(e) => {
                                web_sys::console::error_1(
                                    &format!("Reconnect failed: {:?}", e).into(),
                                );
                                // Clear the guard so the next close retries
                                if let Ok(mut state) = attempt_state.try_borrow_mut() {
                                    state.scheduled = false;
                                }
                            }
                        },
                        Err(_) => {
                            web_sys::console::log_1(&"Reconnect deferred: client busy".into());
                            if let Ok(mut state) = attempt_state.try_borrow_mut() {
                                state.scheduled = false;
                            }
                        }
                    }
                }
            }) as Box<dyn FnMut()>);
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                RECONNECT_DELAY_MS,
            );
            callback.forget();
        }
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    Ok(())
}

fn setup_websocket_handler(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let ws = client.borrow().websocket().clone();
    let reconnect_state = Rc::new(RefCell::new(ReconnectState { scheduled: false }));
    attach_websocket_handlers(client, ws, reconnect_state)
}

fn setup_animation_loop(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;

    // Create animation frame closure
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let client_clone = client.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        // Update and render - safe to borrow_mut since WebSocket only queues
        if let Err(e) = client_clone.borrow_mut().update() {
            web_sys::console::error_1(&format!("Update error: {:?}", e).into());
        }

        // Request next frame
        if let Some(win) = web_sys::window() {
            win.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref())
                .ok();
        }
    }) as Box<dyn FnMut()>));

    // Start the loop
    window.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref())?;

    Ok(())
}

fn setup_input_handlers(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    // Shared input state and intent queue; intents are produced on key
    // transitions only and drained by the game loop.
    let input_state = client.borrow().input_state();
    let intent_queue = client.borrow().intent_queue();

    // Keydown handler
    {
        let input = input_state.clone();
        let intents = intent_queue.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            if !Input::is_mapped(&key) {
                return;
            }
            // Arrow keys scroll the page by default
            event.prevent_default();
            if let Some(intent) = input.borrow_mut().key_down(&key) {
                intents.borrow_mut().push(intent);
            }
        }) as Box<dyn FnMut(_)>);

        document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Keyup handler
    {
        let input = input_state.clone();
        let intents = intent_queue.clone();
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            if !Input::is_mapped(&key) {
                return;
            }
            event.prevent_default();
            if let Some(intent) = input.borrow_mut().key_up(&key) {
                intents.borrow_mut().push(intent);
            }
        }) as Box<dyn FnMut(_)>);

        document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

/// Flag a resize; the game loop resizes the canvas, recomputes the viewport
/// and redraws on its next pass.
fn setup_resize_handler(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let win = window().ok_or("No window")?;
    let resize_flag = client.borrow().resize_flag();

    let closure = Closure::wrap(Box::new(move || {
        resize_flag.set(true);
    }) as Box<dyn FnMut()>);

    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}
