//! The drifting instance field.
//!
//! A fixed set of mesh instances rises slowly and spins. Any instance that
//! climbs past the top of the band is dropped back to the bottom, so the
//! field never empties and never grows.
//!
//! The animator is frame-locked: each [`advance`](InstanceField::advance)
//! moves every instance by exactly one step regardless of frame time.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One placed copy of the shared mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: f32,
}

impl Instance {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }

    /// Object-to-world transform.
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.model_matrix().to_cols_array_2d(),
        }
    }
}

/// Per-instance vertex data: the model matrix as four columns.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame motion shared by every instance in a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMotion {
    /// Upward step per frame.
    pub velocity_y: f32,
    /// Top of the band. Positions above it wrap.
    pub y_max: f32,
    /// Where wrapped instances reappear.
    pub y_min: f32,
    /// Rotation step per frame, radians per axis.
    pub spin: Vec3,
}

impl Default for FieldMotion {
    fn default() -> Self {
        Self {
            velocity_y: 0.02,
            y_max: 19.0,
            y_min: -18.0,
            spin: Vec3::new(0.06, 0.06, 0.02),
        }
    }
}

/// Initial positions of the background field.
pub fn default_layout() -> Vec<Vec3> {
    vec![
        Vec3::new(-4.0, 20.0, -12.0),
        Vec3::new(-10.0, 12.0, -8.0),
        Vec3::new(-11.0, -12.0, -23.0),
        Vec3::new(-16.0, -6.0, -10.0),
        Vec3::new(12.0, -2.0, -6.0),
        Vec3::new(13.0, 4.0, -12.0),
        Vec3::new(14.0, -2.0, -23.0),
        Vec3::new(8.0, 10.0, -20.0),
    ]
}

/// A fixed-size set of instances that drift upward and wrap.
#[derive(Debug, Clone)]
pub struct InstanceField {
    instances: Vec<Instance>,
    motion: FieldMotion,
}

impl InstanceField {
    /// Place one unrotated, unit-scale instance at each layout position.
    pub fn new(layout: &[Vec3], motion: FieldMotion) -> Self {
        Self {
            instances: layout.iter().copied().map(Instance::at).collect(),
            motion,
        }
    }

    /// Move every instance one step.
    ///
    /// Rotation grows without bound. An instance whose height exceeds
    /// `y_max` is placed at `y_min` exactly; the overshoot is discarded.
    pub fn advance(&mut self) {
        let motion = self.motion;
        for instance in &mut self.instances {
            instance.position.y += motion.velocity_y;
            if instance.position.y > motion.y_max {
                instance.position.y = motion.y_min;
            }
            instance.rotation += motion.spin;
        }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn motion(&self) -> &FieldMotion {
        &self.motion
    }

    /// Append every model matrix to `out`.
    ///
    /// `out` is not cleared, so a caller can put other instances first and
    /// reuse the same vector each frame.
    pub fn write_transforms(&self, out: &mut Vec<InstanceRaw>) {
        out.extend(self.instances.iter().map(Instance::to_raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_instance_wraps_on_first_step() {
        let mut field = InstanceField::new(&default_layout(), FieldMotion::default());
        field.advance();
        let first = field.instances()[0];
        assert_eq!(first.position, Vec3::new(-4.0, -18.0, -12.0));
        assert_eq!(first.rotation, Vec3::new(0.06, 0.06, 0.02));
    }

    #[test]
    fn test_instance_below_top_rises() {
        let mut field = InstanceField::new(&default_layout(), FieldMotion::default());
        field.advance();
        let second = field.instances()[1];
        assert!((second.position.y - 12.02).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_lands_exactly_on_y_min() {
        let motion = FieldMotion {
            velocity_y: 0.75,
            y_max: 1.0,
            y_min: -1.0,
            spin: Vec3::ZERO,
        };
        let mut field = InstanceField::new(&[Vec3::new(0.0, 0.5, 0.0)], motion);
        field.advance();
        assert_eq!(field.instances()[0].position.y, -1.0);
    }

    #[test]
    fn test_height_equal_to_y_max_does_not_wrap() {
        let motion = FieldMotion {
            velocity_y: 1.0,
            y_max: 2.0,
            y_min: -2.0,
            spin: Vec3::ZERO,
        };
        let mut field = InstanceField::new(&[Vec3::new(0.0, 1.0, 0.0)], motion);
        field.advance();
        assert_eq!(field.instances()[0].position.y, 2.0);
    }

    #[test]
    fn test_below_band_instance_rises_into_band() {
        let motion = FieldMotion {
            velocity_y: 1.0,
            y_max: 2.0,
            y_min: -2.0,
            spin: Vec3::ZERO,
        };
        let mut field = InstanceField::new(&[Vec3::new(0.0, -5.0, 0.0)], motion);
        field.advance();
        // Not clamped: heights below the band are only reached by rising.
        assert_eq!(field.instances()[0].position.y, -4.0);
        for _ in 0..20 {
            field.advance();
        }
        let y = field.instances()[0].position.y;
        assert!((-2.0..=2.0).contains(&y));
    }

    #[test]
    fn test_rotation_accumulates_identically() {
        let motion = FieldMotion::default();
        let mut field = InstanceField::new(&default_layout(), motion);
        for _ in 0..100 {
            field.advance();
        }
        let expected = field.instances()[0].rotation;
        assert!((expected.x - 100.0 * 0.06).abs() < 1e-3);
        assert!(field.instances().iter().all(|i| i.rotation == expected));
    }

    #[test]
    fn test_count_never_changes() {
        let mut field = InstanceField::new(&default_layout(), FieldMotion::default());
        for _ in 0..5000 {
            field.advance();
        }
        assert_eq!(field.len(), 8);
    }

    #[test]
    fn test_write_transforms_appends_and_reuses() {
        let field = InstanceField::new(&default_layout(), FieldMotion::default());
        let mut out = Vec::with_capacity(16);
        let ptr = out.as_ptr();
        for _ in 0..3 {
            out.clear();
            field.write_transforms(&mut out);
        }
        assert_eq!(out.len(), 8);
        assert_eq!(out.as_ptr(), ptr);
        assert_eq!(out[0].model[3], [-4.0, 20.0, -12.0, 1.0]);
    }

    #[test]
    fn test_model_matrix_applies_scale() {
        let mut instance = Instance::at(Vec3::ZERO);
        instance.scale = 2.0;
        let p = instance.model_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }
}
