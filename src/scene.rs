//! The demo scene: one focal mesh plus a drifting field, all sharing a
//! single displacement material.
//!
//! The scene owns no GPU state. Each frame it updates the material and the
//! instance transforms in place; the renderer copies both to persistent
//! buffers and issues one instanced draw.
//!
//! ```ignore
//! let mut scene = Scene::new(config, &pending)?;
//! loop {
//!     scene.frame(&FrameContext::new(elapsed, delta, pointer, frame));
//!     renderer.render(&scene)?;
//! }
//! ```

use crate::config::{MaterialControls, SceneConfig};
use crate::error::SceneError;
use crate::focal::FocalController;
use crate::frame::FrameContext;
use crate::instances::{InstanceField, InstanceRaw};
use crate::material::{DistortMaterial, PendingTextures};
use crate::shader::{ComposedProgram, ProgramRegistry};

pub struct Scene {
    config: SceneConfig,
    controls: MaterialControls,
    material: DistortMaterial,
    programs: ProgramRegistry,
    program: ComposedProgram,
    field: InstanceField,
    focal: FocalController,
    /// Focal instance first, then the field.
    transforms: Vec<InstanceRaw>,
}

impl Scene {
    /// Build the scene once its textures have resolved.
    ///
    /// Fails with [`SceneError::AssetNotReady`] while a texture is still
    /// missing, and with [`SceneError::Shader`] if the material program does
    /// not build.
    pub fn new(config: SceneConfig, textures: &PendingTextures) -> Result<Self, SceneError> {
        let textures = textures.resolve()?;

        let mut material = DistortMaterial::new(textures).with_noise_tint(config.noise_tint);
        config.material.apply(&mut material);

        let mut programs = ProgramRegistry::new();
        let program = programs.register(material.program_name(), material.program()?)?.clone();

        let field = InstanceField::new(&config.layout, config.motion);
        let focal = FocalController::new(config.focal_position);

        let mut transforms = Vec::with_capacity(field.len() + 1);
        transforms.push(focal.instance().to_raw());
        field.write_transforms(&mut transforms);

        log::info!(
            "Scene ready: {} field instances, program '{}'",
            field.len(),
            program.name()
        );

        Ok(Self {
            controls: config.material,
            config,
            material,
            programs,
            program,
            field,
            focal,
            transforms,
        })
    }

    /// Advance one frame.
    ///
    /// Order: material time, control values, field motion, focal
    /// orientation, then the transform list.
    pub fn frame(&mut self, ctx: &FrameContext) {
        self.material.set_time(ctx.time);
        self.apply_controls();
        self.field.advance();
        self.focal.update(ctx.pointer, ctx.time);

        self.transforms.clear();
        self.transforms.push(self.focal.instance().to_raw());
        self.field.write_transforms(&mut self.transforms);
    }

    /// Push the current control values into the material without advancing
    /// time or motion. The host calls this instead of [`Scene::frame`] while
    /// paused so edits still reach the next uniform sync.
    pub fn apply_controls(&mut self) {
        self.controls.apply(&mut self.material);
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn material(&self) -> &DistortMaterial {
        &self.material
    }

    /// The composed program registered for the material.
    pub fn program(&self) -> &ComposedProgram {
        &self.program
    }

    pub fn programs(&self) -> &ProgramRegistry {
        &self.programs
    }

    pub fn field(&self) -> &InstanceField {
        &self.field
    }

    pub fn focal(&self) -> &FocalController {
        &self.focal
    }

    /// Model matrices for every instance, focal first.
    pub fn transforms(&self) -> &[InstanceRaw] {
        &self.transforms
    }

    pub fn instance_count(&self) -> u32 {
        self.transforms.len() as u32
    }

    pub fn controls(&self) -> &MaterialControls {
        &self.controls
    }

    /// Edit the tunables. Changes reach the material on the next frame.
    pub fn controls_mut(&mut self) -> &mut MaterialControls {
        &mut self.controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlKey;
    use crate::textures::TextureHandle;
    use glam::{Vec2, Vec3};

    fn ready() -> PendingTextures {
        PendingTextures {
            bump_map: Some(TextureHandle(0)),
            env_map: Some(TextureHandle(1)),
        }
    }

    #[test]
    fn test_construction_defers_until_textures_resolve() {
        let pending = PendingTextures {
            bump_map: Some(TextureHandle(0)),
            env_map: None,
        };
        let err = Scene::new(SceneConfig::default(), &pending).err();
        assert!(matches!(err, Some(SceneError::AssetNotReady("environment map"))));
    }

    #[test]
    fn test_new_registers_program() {
        let scene = Scene::new(SceneConfig::default(), &ready()).unwrap();
        assert_eq!(scene.programs().len(), 1);
        assert!(scene.programs().get("distort").is_some());
        assert_eq!(scene.instance_count(), 9);
        assert_eq!(scene.material().distort(), 0.4);
    }

    #[test]
    fn test_frame_syncs_time_and_controls() {
        let mut scene = Scene::new(SceneConfig::default(), &ready()).unwrap();
        scene.controls_mut().set(ControlKey::Distort, 0.9f32).unwrap();
        // Not applied until the next frame
        assert_eq!(scene.material().distort(), 0.4);

        scene.frame(&FrameContext::at(2.5));
        assert_eq!(scene.material().time(), 2.5);
        assert_eq!(scene.material().distort(), 0.9);
    }

    #[test]
    fn test_controls_apply_while_paused() {
        let mut scene = Scene::new(SceneConfig::default(), &ready()).unwrap();
        scene.frame(&FrameContext::at(1.0));
        let field_before = scene.field().instances().to_vec();
        let transforms_before = scene.transforms().to_vec();

        scene.controls_mut().nudge(ControlKey::Distort, 0.05).unwrap();
        scene.apply_controls();

        assert!((scene.material().distort() - 0.45).abs() < 1e-6);
        assert_eq!(scene.material().time(), 1.0);
        assert_eq!(scene.field().instances(), field_before.as_slice());
        assert_eq!(scene.transforms(), transforms_before.as_slice());
    }

    #[test]
    fn test_frame_moves_field_and_focal() {
        let mut scene = Scene::new(SceneConfig::default(), &ready()).unwrap();
        scene.frame(&FrameContext::new(1.0, 0.016, Vec2::new(1.0, 0.0), 1));

        assert_eq!(scene.field().instances()[0].position, Vec3::new(-4.0, -18.0, -12.0));
        assert_eq!(scene.focal().instance().rotation.z, 1.0);
        assert_eq!(scene.transforms().len(), 9);
        assert_eq!(scene.transforms()[0], scene.focal().instance().to_raw());
        assert_eq!(scene.transforms()[1], scene.field().instances()[0].to_raw());
    }

    #[test]
    fn test_noise_tint_registers_tinted_program() {
        let config = SceneConfig {
            noise_tint: true,
            ..Default::default()
        };
        let scene = Scene::new(config, &ready()).unwrap();
        assert!(scene.programs().get("distort_tinted").is_some());
        assert!(scene.program().source().contains("// patch: noise_tint"));
    }
}
