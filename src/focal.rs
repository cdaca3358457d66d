//! The pointer-following focal mesh.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::instances::Instance;

/// Fraction of the remaining distance closed each frame.
pub const SMOOTHING: f32 = 0.1;

/// Drives the orientation of a single stationary instance.
///
/// Spin around Z tracks elapsed time; the X and Y angles ease toward the
/// pointer, mapped so the full NDC range covers `[-PI, PI]`. The pointer is
/// not clamped, so positions outside the window overshoot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalController {
    instance: Instance,
}

impl FocalController {
    pub fn new(position: Vec3) -> Self {
        Self {
            instance: Instance::at(position),
        }
    }

    pub fn update(&mut self, pointer: Vec2, elapsed: f32) {
        let rotation = &mut self.instance.rotation;
        rotation.z = elapsed;
        rotation.y = lerp(rotation.y, pointer.x * PI, SMOOTHING);
        rotation.x = lerp(rotation.x, pointer.y * PI, SMOOTHING);
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
