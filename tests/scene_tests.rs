//! Integration tests for the scene, the instance field and the material
//! program, driven through the public API without a GPU.

use std::path::{Path, PathBuf};

use distort::noise;
use distort::prelude::*;
use distort::{compose, EnvironmentSource, InsertionPoint, ShaderError, ShaderPatch, TextureError};
use rand::{Rng, SeedableRng};

/// Loader that hands out handles without touching the filesystem.
#[derive(Default)]
struct FakeLoader {
    next: u32,
    disposed: Vec<TextureHandle>,
}

impl AssetLoader for FakeLoader {
    fn load_texture(&mut self, _path: &Path) -> Result<TextureHandle, TextureError> {
        self.next += 1;
        Ok(TextureHandle(self.next))
    }

    fn load_cube(&mut self, _faces: &[PathBuf; 6]) -> Result<TextureHandle, TextureError> {
        self.next += 1;
        Ok(TextureHandle(self.next))
    }

    fn equirect_to_cube(&mut self, _source: TextureHandle, _face_size: u32) -> Result<TextureHandle, TextureError> {
        self.next += 1;
        Ok(TextureHandle(self.next))
    }

    fn dispose(&mut self, handle: TextureHandle) -> Result<(), TextureError> {
        self.disposed.push(handle);
        Ok(())
    }
}

fn scene(config: SceneConfig) -> Scene {
    let mut loader = FakeLoader::default();
    let pending = MaterialAssets::load(&mut loader, &config.assets).unwrap();
    Scene::new(config, &pending).unwrap()
}

// ============================================================================
// Instance field
// ============================================================================

#[test]
fn test_first_frame_wraps_top_instance() {
    let mut scene = scene(SceneConfig::default());
    scene.frame(&FrameContext::at(0.016));

    let first = scene.field().instances()[0];
    assert_eq!(first.position, Vec3::new(-4.0, -18.0, -12.0));
    assert_eq!(first.rotation, Vec3::new(0.06, 0.06, 0.02));
}

#[test]
fn test_wraparound_property() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let y_min = rng.gen_range(-30.0..0.0f32);
        let y_max = rng.gen_range(1.0..30.0f32);
        let motion = FieldMotion {
            velocity_y: rng.gen_range(0.001..2.0),
            y_max,
            y_min,
            spin: Vec3::ZERO,
        };
        let layout: Vec<Vec3> = (0..10)
            .map(|_| Vec3::new(0.0, rng.gen_range(y_min..y_max), 0.0))
            .collect();

        let mut field = InstanceField::new(&layout, motion);
        for _ in 0..200 {
            let before: Vec<f32> = field.instances().iter().map(|i| i.position.y).collect();
            field.advance();
            for (prev, inst) in before.iter().zip(field.instances()) {
                let y = inst.position.y;
                assert!(y >= y_min && y <= y_max, "y {y} outside [{y_min}, {y_max}]");
                if prev + motion.velocity_y > y_max {
                    assert_eq!(y, y_min);
                }
            }
        }
    }
}

#[test]
fn test_rotation_after_many_frames() {
    let mut scene = scene(SceneConfig::default());
    for n in 1..=120 {
        scene.frame(&FrameContext::at(n as f32 / 60.0));
    }
    let rotations: Vec<Vec3> = scene.field().instances().iter().map(|i| i.rotation).collect();
    assert!((rotations[0].x - 120.0 * 0.06).abs() < 1e-3);
    assert!(rotations.iter().all(|r| *r == rotations[0]));
}

// ============================================================================
// Focal mesh
// ============================================================================

#[test]
fn test_focal_follows_pointer() {
    let mut scene = scene(SceneConfig::default());
    for n in 0..100 {
        scene.frame(&FrameContext::new(n as f32, 0.016, Vec2::new(0.25, -0.5), n));
    }
    let r = scene.focal().instance().rotation;
    assert!((r.y - 0.25 * std::f32::consts::PI).abs() < 1e-3);
    assert!((r.x + 0.5 * std::f32::consts::PI).abs() < 1e-3);
    assert_eq!(r.z, 99.0);
    assert_eq!(scene.focal().instance().position, Vec3::ZERO);
}

// ============================================================================
// Material program
// ============================================================================

#[test]
fn test_scene_program_validates() {
    let scene = scene(SceneConfig::default());
    let module = scene.program().validate().expect("scene program should validate");
    let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert!(entry_points.contains(&"vs_main"));
    assert!(entry_points.contains(&"fs_main"));
}

#[test]
fn test_broken_patch_is_reported_by_name() {
    let material = scene(SceneConfig::default()).material().clone();
    let mut patches = material.patches();
    patches.push(ShaderPatch::new(
        "typo",
        InsertionPoint::BeginVertex,
        "    transformed = transformd * 2.0;",
    ));
    let program = compose(&distort::pbr::SURFACE_PROGRAM, &patches).unwrap();
    match program.validate() {
        Err(ShaderError::InvalidPatch { patch, .. }) => assert_eq!(patch, "typo"),
        other => panic!("expected InvalidPatch, got {other:?}"),
    }
}

#[test]
fn test_uniform_sync_follows_controls() {
    let mut scene = scene(SceneConfig::default());
    scene.controls_mut().set(ControlKey::Radius, 0.5f32).unwrap();
    scene.frame(&FrameContext::at(10.0));

    let u = scene.material().uniforms();
    assert_eq!((u.time, u.radius, u.distort), (10.0, 0.5, 0.4));
    assert_eq!(scene.material().uniform_bytes().len(), 16);
}

#[test]
fn test_displacement_is_pure() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let p = Vec3::new(rng.gen(), rng.gen(), rng.gen()).normalize_or_zero();
        let t = rng.gen_range(0.0..1000.0);
        assert_eq!(noise::displace(p, t, 1.0, 0.4), noise::displace(p, t, 1.0, 0.4));
    }
}

// ============================================================================
// Assets and configuration
// ============================================================================

#[test]
fn test_equirect_environment_disposes_source() {
    let mut config = SceneConfig::default();
    config.assets.environment = EnvironmentSource::Equirect {
        path: PathBuf::from("sky.jpg"),
        face_size: 256,
    };
    let mut loader = FakeLoader::default();
    let pending = MaterialAssets::load(&mut loader, &config.assets).unwrap();

    assert_eq!(loader.disposed.len(), 1);
    assert_ne!(Some(loader.disposed[0]), pending.env_map);
    assert!(Scene::new(config, &pending).is_ok());
}

#[test]
fn test_preset_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("distort-preset-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("preset.json");

    let mut config = SceneConfig::default();
    config.material.distort = 0.75;
    config.noise_tint = true;
    config.save(&path).unwrap();

    let loaded = SceneConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_preset_is_an_error() {
    assert!(SceneConfig::load("/definitely/not/here.json").is_err());
}
