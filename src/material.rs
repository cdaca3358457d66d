//! The noise-displaced physical material.
//!
//! [`DistortMaterial`] decorates the base surface program from [`crate::pbr`]
//! with a vertex-stage displacement. The base program's lighting is left
//! alone; the material only contributes [`ShaderPatch`]es and a small uniform
//! block of its own:
//!
//! | Group | Binding | Resource |
//! |-------|---------|----------|
//! | 2 | 0 | [`DistortUniforms`] (time, radius, distort) |
//!
//! Every vertex is moved along its object-space direction by
//! `position * (snoise(position / 2 + time / 50 * 5) * distort² + radius)`,
//! and the displaced position is what the base program projects and lights.
//!
//! ```ignore
//! let mut material = DistortMaterial::new(pending.resolve()?);
//! material.set_time(clock.elapsed());
//! queue.write_buffer(&distort_buffer, 0, material.uniform_bytes());
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::{SceneError, ShaderError};
use crate::pbr::SURFACE_PROGRAM;
use crate::shader::{compose, ComposedProgram, InsertionPoint, ShaderPatch};
use crate::shader_utils::{COLOR_WGSL, NOISE_WGSL};
use crate::textures::TextureHandle;

/// Surface parameter block (group 1, binding 0). Matches `Surface` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub reflectivity: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub bump_scale: f32,
    pub _pad: [f32; 2],
}

/// Displacement parameter block (group 2, binding 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DistortUniforms {
    /// Seconds since the scene started.
    pub time: f32,
    /// Base scale applied to every vertex.
    pub radius: f32,
    /// Displacement amplitude; applied squared.
    pub distort: f32,
    pub _pad: f32,
}

/// Physical surface parameters.
///
/// Values are passed to the GPU as given. Nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    /// Linear RGB base color.
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub reflectivity: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub bump_scale: f32,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            roughness: 1.0,
            metalness: 0.0,
            reflectivity: 0.5,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            bump_scale: 1.0,
        }
    }
}

/// Textures the material samples. Both handles belong to the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialTextures {
    pub bump_map: TextureHandle,
    pub env_map: TextureHandle,
}

/// Texture dependencies that may still be loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingTextures {
    pub bump_map: Option<TextureHandle>,
    pub env_map: Option<TextureHandle>,
}

impl PendingTextures {
    /// All dependencies, or the first one still missing.
    pub fn resolve(&self) -> Result<MaterialTextures, SceneError> {
        Ok(MaterialTextures {
            bump_map: self.bump_map.ok_or(SceneError::AssetNotReady("bump map"))?,
            env_map: self.env_map.ok_or(SceneError::AssetNotReady("environment map"))?,
        })
    }
}

const DISTORT_DECLARATIONS: &str = r#"
struct DistortUniforms {
    time: f32,
    radius: f32,
    distort: f32,
    _pad: f32,
};

@group(2) @binding(0)
var<uniform> distort_params: DistortUniforms;
"#;

const DISTORT_DISPLACE: &str = r#"
    let update_time = distort_params.time / 50.0;
    let n = snoise(position / 2.0 + update_time * 5.0);
    transformed = position * (n * distort_params.distort * distort_params.distort + distort_params.radius);
"#;

const NOISE_TINT: &str = r#"
    tint = hsv_to_rgb(fract(n * distort_params.distort * 0.3 + update_time), 0.2, 1.0);
"#;

/// A physical material whose vertices are displaced by animated noise.
#[derive(Debug, Clone)]
pub struct DistortMaterial {
    surface: SurfaceParams,
    uniforms: DistortUniforms,
    textures: MaterialTextures,
    noise_tint: bool,
}

impl DistortMaterial {
    /// Create a material from resolved textures, with unit radius and no
    /// distortion.
    pub fn new(textures: MaterialTextures) -> Self {
        Self {
            surface: SurfaceParams::default(),
            uniforms: DistortUniforms {
                time: 0.0,
                radius: 1.0,
                distort: 0.0,
                _pad: 0.0,
            },
            textures,
            noise_tint: false,
        }
    }

    /// Enable the per-vertex noise tint. Changes the composed program.
    pub fn with_noise_tint(mut self, enabled: bool) -> Self {
        self.noise_tint = enabled;
        self
    }

    pub fn noise_tint(&self) -> bool {
        self.noise_tint
    }

    // --- Surface parameters ---

    pub fn surface(&self) -> &SurfaceParams {
        &self.surface
    }

    pub fn set_surface(&mut self, surface: SurfaceParams) {
        self.surface = surface;
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.surface.color = color;
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.surface.roughness = roughness;
    }

    pub fn set_metalness(&mut self, metalness: f32) {
        self.surface.metalness = metalness;
    }

    pub fn set_reflectivity(&mut self, reflectivity: f32) {
        self.surface.reflectivity = reflectivity;
    }

    pub fn set_clearcoat(&mut self, clearcoat: f32) {
        self.surface.clearcoat = clearcoat;
    }

    pub fn set_clearcoat_roughness(&mut self, clearcoat_roughness: f32) {
        self.surface.clearcoat_roughness = clearcoat_roughness;
    }

    pub fn set_bump_scale(&mut self, bump_scale: f32) {
        self.surface.bump_scale = bump_scale;
    }

    pub fn textures(&self) -> &MaterialTextures {
        &self.textures
    }

    pub fn set_bump_map(&mut self, handle: TextureHandle) {
        self.textures.bump_map = handle;
    }

    pub fn set_env_map(&mut self, handle: TextureHandle) {
        self.textures.env_map = handle;
    }

    // --- Displacement uniforms ---

    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.uniforms.time = time;
    }

    pub fn radius(&self) -> f32 {
        self.uniforms.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.uniforms.radius = radius;
    }

    pub fn distort(&self) -> f32 {
        self.uniforms.distort
    }

    pub fn set_distort(&mut self, distort: f32) {
        self.uniforms.distort = distort;
    }

    /// CPU mirror of the displacement block.
    pub fn uniforms(&self) -> &DistortUniforms {
        &self.uniforms
    }

    /// Bytes of the displacement block, ready for `Queue::write_buffer`.
    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    /// The surface block in its GPU layout.
    pub fn surface_uniforms(&self) -> SurfaceUniforms {
        let s = &self.surface;
        SurfaceUniforms {
            color: s.color.extend(1.0).to_array(),
            roughness: s.roughness,
            metalness: s.metalness,
            reflectivity: s.reflectivity,
            clearcoat: s.clearcoat,
            clearcoat_roughness: s.clearcoat_roughness,
            bump_scale: s.bump_scale,
            _pad: [0.0; 2],
        }
    }

    // --- Program ---

    /// Name the composed program is registered under.
    pub fn program_name(&self) -> &'static str {
        if self.noise_tint {
            "distort_tinted"
        } else {
            "distort"
        }
    }

    /// Patches applied to the base surface program, in order.
    pub fn patches(&self) -> Vec<ShaderPatch> {
        let mut patches = vec![
            ShaderPatch::new(
                "distort_uniforms",
                InsertionPoint::Declarations,
                format!("{DISTORT_DECLARATIONS}{NOISE_WGSL}"),
            ),
            ShaderPatch::new("distort_displace", InsertionPoint::BeginVertex, DISTORT_DISPLACE),
        ];
        if self.noise_tint {
            patches.push(ShaderPatch::new(
                "noise_tint_library",
                InsertionPoint::Declarations,
                COLOR_WGSL,
            ));
            patches.push(ShaderPatch::new("noise_tint", InsertionPoint::BeginVertex, NOISE_TINT));
        }
        patches
    }

    /// Compose the base surface program with this material's patches.
    pub fn program(&self) -> Result<ComposedProgram, ShaderError> {
        compose(&SURFACE_PROGRAM, &self.patches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> DistortMaterial {
        DistortMaterial::new(MaterialTextures {
            bump_map: TextureHandle(0),
            env_map: TextureHandle(1),
        })
    }

    #[test]
    fn test_uniform_block_sizes() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 48);
        assert_eq!(std::mem::size_of::<DistortUniforms>(), 16);
    }

    #[test]
    fn test_set_time_is_idempotent() {
        let mut m = material();
        m.set_time(4.25);
        m.set_time(4.25);
        assert_eq!(m.time(), 4.25);
        assert_eq!(m.uniforms().time, 4.25);
    }

    #[test]
    fn test_setters_write_in_place() {
        let mut m = material();
        let before = m.uniform_bytes().as_ptr();
        m.set_radius(0.7);
        m.set_distort(0.4);
        assert_eq!(m.uniform_bytes().as_ptr(), before);
        assert_eq!(*m.uniforms(), DistortUniforms { time: 0.0, radius: 0.7, distort: 0.4, _pad: 0.0 });
        assert_eq!(m.uniform_bytes(), bytemuck::bytes_of(m.uniforms()));
    }

    #[test]
    fn test_values_are_not_clamped() {
        let mut m = material();
        m.set_roughness(3.0);
        m.set_distort(-2.0);
        assert_eq!(m.surface().roughness, 3.0);
        assert_eq!(m.distort(), -2.0);
        assert_eq!(m.surface_uniforms().roughness, 3.0);
    }

    #[test]
    fn test_texture_setters() {
        let mut m = material();
        m.set_bump_map(TextureHandle(5));
        m.set_env_map(TextureHandle(9));
        assert_eq!(m.textures().bump_map, TextureHandle(5));
        assert_eq!(m.textures().env_map, TextureHandle(9));
    }

    #[test]
    fn test_pending_textures_report_missing() {
        let pending = PendingTextures {
            bump_map: Some(TextureHandle(0)),
            env_map: None,
        };
        assert!(matches!(pending.resolve(), Err(SceneError::AssetNotReady("environment map"))));
        assert!(matches!(
            PendingTextures::default().resolve(),
            Err(SceneError::AssetNotReady("bump map"))
        ));
    }

    #[test]
    fn test_program_validates() {
        let program = material().program().unwrap();
        program.validate().expect("distort program should validate");
        let names: Vec<_> = program.spans().iter().map(|s| s.patch).collect();
        assert_eq!(names, vec!["distort_uniforms", "distort_displace"]);
    }

    #[test]
    fn test_tinted_program_validates() {
        let m = material().with_noise_tint(true);
        assert_eq!(m.program_name(), "distort_tinted");
        let program = m.program().unwrap();
        program.validate().expect("tinted program should validate");
        assert!(program.source().contains("hsv_to_rgb(fract("));
    }

    #[test]
    fn test_tint_is_off_by_default() {
        let m = material();
        assert!(!m.noise_tint());
        assert!(m.patches().iter().all(|p| p.name != "noise_tint"));
    }
}
