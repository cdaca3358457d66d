//! # Distort
//!
//! A noise-displaced physical material and a drifting field of instances,
//! rendered with wgpu.
//!
//! The material is built by composition: a base metal/roughness program with
//! named insertion points, plus shader patches that displace every vertex
//! along its object-space direction by animated simplex noise. The instance
//! field moves a fixed set of meshes upward each frame and wraps them back to
//! the bottom of a band, and one focal mesh turns to follow the pointer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use distort::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     distort::run(SceneConfig::default())
//! }
//! ```
//!
//! ## Without a window
//!
//! The scene itself owns no GPU state, so it can be driven from tests or
//! tools with any [`AssetLoader`]:
//!
//! ```ignore
//! let pending = MaterialAssets::load(&mut loader, &config.assets)?;
//! let mut scene = Scene::new(config, &pending)?;
//! scene.frame(&FrameContext::at(0.016));
//! let bytes = scene.material().uniform_bytes();
//! ```
//!
//! ## Shader patches
//!
//! | Patch | Point | Effect |
//! |-------|-------|--------|
//! | `distort_uniforms` | `declarations` | displacement uniforms and simplex noise |
//! | `distort_displace` | `begin_vertex` | `transformed = position * (n * distort² + radius)` |
//! | `noise_tint` | `begin_vertex` | optional pale per-vertex tint |

mod app;
pub mod config;
pub mod error;
pub mod focal;
pub mod frame;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod instances;
pub mod material;
pub mod noise;
pub mod pbr;
pub mod scene;
pub mod shader;
pub mod shader_utils;
pub mod textures;
pub mod time;

pub use app::run;
pub use bytemuck;
pub use config::{ControlKey, ControlValue, MaterialControls, Rgb, SceneConfig};
pub use error::{ConfigError, ControlError, GpuError, RunError, SceneError, ShaderError, TextureError};
pub use focal::FocalController;
pub use frame::FrameContext;
pub use geometry::Icosphere;
pub use glam::{Vec2, Vec3, Vec4};
pub use instances::{FieldMotion, Instance, InstanceField, InstanceRaw};
pub use material::{DistortMaterial, MaterialTextures, PendingTextures, SurfaceParams};
pub use scene::Scene;
pub use shader::{compose, ComposedProgram, InsertionPoint, ProgramRegistry, ShaderPatch};
pub use textures::{AssetConfig, AssetLoader, EnvironmentSource, MaterialAssets, TextureHandle};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use distort::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ControlKey, MaterialControls, Rgb, SceneConfig};
    pub use crate::error::{RunError, SceneError};
    pub use crate::frame::FrameContext;
    pub use crate::instances::{FieldMotion, InstanceField};
    pub use crate::material::DistortMaterial;
    pub use crate::scene::Scene;
    pub use crate::textures::{AssetLoader, MaterialAssets, TextureHandle};
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
}
