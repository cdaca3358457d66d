//! Pointer and keyboard state for the demo host.
//!
//! Tracks the pointer in normalized device coordinates (origin at the window
//! center, Y up) and which keys went down this frame. Coordinates are not
//! clamped: a pointer dragged outside the window reports values beyond ±1.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    pointer_ndc: Vec2,
    window_size: (u32, u32),
}

impl Input {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Default::default()
        }
    }

    /// Check if a key was pressed this frame (auto-repeat ignored).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key is currently held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Pointer position in normalized device coordinates.
    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }

    /// Clear per-frame state. Call after the frame has consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Record a cursor position in physical pixels.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.pointer_ndc = Vec2::new(
                (x / w as f32) * 2.0 - 1.0,
                1.0 - (y / h as f32) * 2.0, // Y flipped
            );
        }
    }

    fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_event(code, event.state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_center_is_origin() {
        let mut input = Input::new(800, 600);
        input.cursor_moved(400.0, 300.0);
        assert!(input.pointer_ndc().length() < 1e-6);
    }

    #[test]
    fn test_pointer_y_is_up() {
        let mut input = Input::new(800, 600);
        input.cursor_moved(800.0, 0.0);
        assert_eq!(input.pointer_ndc(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_pointer_outside_window_is_not_clamped() {
        let mut input = Input::new(100, 100);
        input.cursor_moved(150.0, -50.0);
        assert_eq!(input.pointer_ndc(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_zero_size_window_keeps_last_pointer() {
        let mut input = Input::new(100, 100);
        input.cursor_moved(75.0, 50.0);
        input.set_window_size(0, 0);
        input.cursor_moved(0.0, 0.0);
        assert_eq!(input.pointer_ndc(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_key_press_fires_once() {
        let mut input = Input::new(100, 100);
        input.key_event(KeyCode::ArrowUp, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::ArrowUp));
        input.end_frame();

        // Auto-repeat while held
        input.key_event(KeyCode::ArrowUp, ElementState::Pressed);
        assert!(!input.key_pressed(KeyCode::ArrowUp));
        assert!(input.key_held(KeyCode::ArrowUp));

        input.key_event(KeyCode::ArrowUp, ElementState::Released);
        assert!(!input.key_held(KeyCode::ArrowUp));
    }
}
