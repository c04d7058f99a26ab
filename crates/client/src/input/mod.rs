// Keyboard input handling - held-key tracking and move/stop intent emission
use protocol::Direction;

/// An outbound control intent produced by a key transition. Intents are
/// emitted on state transitions only, never once per frame, and the caller
/// drops them when the channel is not open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Stop,
}

/// Tracks currently-held arrow keys in press order and resolves them to a
/// single movement direction. The most recently pressed key wins; releasing
/// it falls back to the most recently pressed key still held.
pub struct Input {
    held: Vec<Direction>,
}

impl Input {
    pub fn new() -> Self {
        Self { held: Vec::new() }
    }

    fn map_key(key: &str) -> Option<Direction> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    /// True when the key maps to a movement direction. Used by the DOM
    /// handlers to decide whether to suppress default browser behavior.
    pub fn is_mapped(key: &str) -> bool {
        Self::map_key(key).is_some()
    }

    /// The direction movement currently resolves to, if any key is held.
    pub fn current_direction(&self) -> Option<Direction> {
        self.held.last().copied()
    }

    /// Handle a key-down event. A newly held mapped key becomes the current
    /// direction and emits a move intent immediately, even when a move for
    /// another direction is already outstanding. Auto-repeat (the key is
    /// already in the held set) and unmapped keys produce nothing.
    pub fn key_down(&mut self, key: &str) -> Option<Intent> {
        let direction = Self::map_key(key)?;
        if self.held.contains(&direction) {
            return None;
        }
        self.held.push(direction);
        Some(Intent::Move(direction))
    }

    /// Handle a key-up event. Releasing the last held key emits exactly one
    /// stop intent; otherwise the most recently pressed remaining key takes
    /// over and a fresh move intent is emitted for it.
    pub fn key_up(&mut self, key: &str) -> Option<Intent> {
        let direction = Self::map_key(key)?;
        let before = self.held.len();
        self.held.retain(|&d| d != direction);
        if self.held.len() == before {
            // Key-up for a key we never saw go down; nothing to do.
            return None;
        }
        match self.held.last() {
            Some(&remaining) => Some(Intent::Move(remaining)),
            None => Some(Intent::Stop),
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_emits_move_and_repeat_is_silent() {
        let mut input = Input::new();
        assert_eq!(input.key_down("ArrowUp"), Some(Intent::Move(Direction::Up)));
        // Browser auto-repeat delivers keydown again while held.
        assert_eq!(input.key_down("ArrowUp"), None);
        assert_eq!(input.current_direction(), Some(Direction::Up));
    }

    #[test]
    fn releasing_overlap_falls_back_to_most_recent_remaining() {
        let mut input = Input::new();
        input.key_down("ArrowUp");
        assert_eq!(
            input.key_down("ArrowLeft"),
            Some(Intent::Move(Direction::Left))
        );
        // Up then Left, release Left: resolves back to Up, not stop.
        assert_eq!(input.key_up("ArrowLeft"), Some(Intent::Move(Direction::Up)));
        assert_eq!(input.current_direction(), Some(Direction::Up));
    }

    #[test]
    fn second_press_redirects_without_intervening_stop() {
        let mut input = Input::new();
        input.key_down("ArrowUp");
        let intent = input.key_down("ArrowRight");
        assert_eq!(intent, Some(Intent::Move(Direction::Right)));
    }

    #[test]
    fn releasing_only_key_stops_exactly_once() {
        let mut input = Input::new();
        input.key_down("ArrowDown");
        assert_eq!(input.key_up("ArrowDown"), Some(Intent::Stop));
        // A stray repeat key-up must not emit a second stop.
        assert_eq!(input.key_up("ArrowDown"), None);
        assert_eq!(input.current_direction(), None);
    }

    #[test]
    fn unmapped_keys_have_no_side_effects() {
        let mut input = Input::new();
        assert_eq!(input.key_down("w"), None);
        assert_eq!(input.key_down("Enter"), None);
        assert_eq!(input.key_up("Escape"), None);
        assert_eq!(input.current_direction(), None);
    }
}
