//! Per-frame input handed to the scene.

use glam::Vec2;

/// What the host knows about the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameContext {
    /// Seconds since the scene started. Non-decreasing.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    /// Pointer in normalized device coordinates, Y up. Not clamped.
    pub pointer: Vec2,
    /// Frames rendered so far.
    pub frame: u64,
}

impl FrameContext {
    pub fn new(time: f32, delta_time: f32, pointer: Vec2, frame: u64) -> Self {
        Self {
            time,
            delta_time,
            pointer,
            frame,
        }
    }

    /// A context at `time` with the pointer centered.
    pub fn at(time: f32) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }
}
