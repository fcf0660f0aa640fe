/// Keyboard and mouse state with one frame of history

use glam::Vec2;
use rustc_hash::FxHashSet;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Current and previous-frame input state
///
/// Platform events update the current state; `update` (run last in every
/// rendered frame) copies it to the previous state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: FxHashSet<KeyCode>,
    previous_keys: FxHashSet<KeyCode>,
    buttons: FxHashSet<MouseButton>,
    previous_buttons: FxHashSet<MouseButton>,
    mouse_position: Vec2,
    previous_mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn process_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn process_mouse_move(&mut self, x: f32, y: f32) {
        self.mouse_position = Vec2::new(x, y);
    }

    /// Current state becomes the previous state
    pub fn update(&mut self) {
        self.previous_keys.clone_from(&self.keys);
        self.previous_buttons.clone_from(&self.buttons);
        self.previous_mouse_position = self.mouse_position;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn was_key_down(&self, key: KeyCode) -> bool {
        self.previous_keys.contains(&key)
    }

    /// Down this frame, up the previous one
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.is_key_down(key) && !self.was_key_down(key)
    }

    /// Up this frame, down the previous one
    pub fn key_released(&self, key: KeyCode) -> bool {
        !self.is_key_down(key) && self.was_key_down(key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn was_button_down(&self, button: MouseButton) -> bool {
        self.previous_buttons.contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement since the previous frame
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_position - self.previous_mouse_position
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
