//! Scene configuration and the tunable-control surface.
//!
//! [`SceneConfig`] describes everything the demo scene needs: camera, fog,
//! instance layout and motion, material controls and asset paths. Its
//! [`Default`] is the stock scene, and presets can be stored as JSON:
//!
//! ```json
//! {
//!   "material": { "distort": 0.8, "color": "#202040" },
//!   "motion": { "velocity_y": 0.05 }
//! }
//! ```
//!
//! Missing fields fall back to their defaults.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ControlError};
use crate::instances::{default_layout, FieldMotion};
use crate::material::DistortMaterial;
use crate::textures::AssetConfig;

/// An sRGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Linear-light components in [0, 1].
    pub fn to_linear(self) -> Vec3 {
        fn channel(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Vec3::new(channel(self.0), channel(self.1), channel(self.2))
    }
}

impl FromStr for Rgb {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ControlError::InvalidColor(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::from_hex)
            .map_err(|_| ControlError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ControlError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Names of the material's tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Color,
    Roughness,
    Metalness,
    Reflectivity,
    Clearcoat,
    ClearcoatRoughness,
    BumpScale,
    Radius,
    Distort,
}

impl ControlKey {
    pub const ALL: [ControlKey; 9] = [
        ControlKey::Color,
        ControlKey::Roughness,
        ControlKey::Metalness,
        ControlKey::Reflectivity,
        ControlKey::Clearcoat,
        ControlKey::ClearcoatRoughness,
        ControlKey::BumpScale,
        ControlKey::Radius,
        ControlKey::Distort,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControlKey::Color => "color",
            ControlKey::Roughness => "roughness",
            ControlKey::Metalness => "metalness",
            ControlKey::Reflectivity => "reflectivity",
            ControlKey::Clearcoat => "clearcoat",
            ControlKey::ClearcoatRoughness => "clearcoatRoughness",
            ControlKey::BumpScale => "bumpScale",
            ControlKey::Radius => "radius",
            ControlKey::Distort => "distort",
        }
    }
}

impl FromStr for ControlKey {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ControlError::UnknownKey(s.to_string()))
    }
}

/// A value for one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Scalar(f32),
    Color(Rgb),
}

impl From<f32> for ControlValue {
    fn from(v: f32) -> Self {
        ControlValue::Scalar(v)
    }
}

impl From<Rgb> for ControlValue {
    fn from(c: Rgb) -> Self {
        ControlValue::Color(c)
    }
}

/// Current values of every material tunable.
///
/// Changes take effect when the scene next calls [`apply`](Self::apply),
/// once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialControls {
    pub color: Rgb,
    pub roughness: f32,
    pub metalness: f32,
    pub reflectivity: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub bump_scale: f32,
    pub radius: f32,
    pub distort: f32,
}

impl Default for MaterialControls {
    fn default() -> Self {
        Self {
            color: Rgb::from_hex(0x010101),
            roughness: 0.1,
            metalness: 1.0,
            reflectivity: 0.5,
            clearcoat: 1.0,
            clearcoat_roughness: 1.0,
            bump_scale: 0.0032,
            radius: 1.0,
            distort: 0.4,
        }
    }
}

impl MaterialControls {
    /// Set one control by key.
    pub fn set(&mut self, key: ControlKey, value: impl Into<ControlValue>) -> Result<(), ControlError> {
        match value.into() {
            ControlValue::Color(c) if key == ControlKey::Color => self.color = c,
            ControlValue::Scalar(v) => *self.scalar_mut(key)? = v,
            ControlValue::Color(_) => {
                return Err(ControlError::TypeMismatch {
                    key: key.name(),
                    expected: "scalar",
                })
            }
        }
        Ok(())
    }

    /// Set one control by its string name, as a UI or preset would.
    pub fn set_named(&mut self, key: &str, value: impl Into<ControlValue>) -> Result<(), ControlError> {
        self.set(key.parse()?, value)
    }

    pub fn get(&self, key: ControlKey) -> ControlValue {
        match key {
            ControlKey::Color => ControlValue::Color(self.color),
            ControlKey::Roughness => ControlValue::Scalar(self.roughness),
            ControlKey::Metalness => ControlValue::Scalar(self.metalness),
            ControlKey::Reflectivity => ControlValue::Scalar(self.reflectivity),
            ControlKey::Clearcoat => ControlValue::Scalar(self.clearcoat),
            ControlKey::ClearcoatRoughness => ControlValue::Scalar(self.clearcoat_roughness),
            ControlKey::BumpScale => ControlValue::Scalar(self.bump_scale),
            ControlKey::Radius => ControlValue::Scalar(self.radius),
            ControlKey::Distort => ControlValue::Scalar(self.distort),
        }
    }

    /// Add `delta` to a scalar control and return the new value.
    pub fn nudge(&mut self, key: ControlKey, delta: f32) -> Result<f32, ControlError> {
        let slot = self.scalar_mut(key)?;
        *slot += delta;
        Ok(*slot)
    }

    fn scalar_mut(&mut self, key: ControlKey) -> Result<&mut f32, ControlError> {
        Ok(match key {
            ControlKey::Roughness => &mut self.roughness,
            ControlKey::Metalness => &mut self.metalness,
            ControlKey::Reflectivity => &mut self.reflectivity,
            ControlKey::Clearcoat => &mut self.clearcoat,
            ControlKey::ClearcoatRoughness => &mut self.clearcoat_roughness,
            ControlKey::BumpScale => &mut self.bump_scale,
            ControlKey::Radius => &mut self.radius,
            ControlKey::Distort => &mut self.distort,
            ControlKey::Color => {
                return Err(ControlError::TypeMismatch {
                    key: key.name(),
                    expected: "color",
                })
            }
        })
    }

    /// Copy every control into the material.
    pub fn apply(&self, material: &mut DistortMaterial) {
        material.set_color(self.color.to_linear());
        material.set_roughness(self.roughness);
        material.set_metalness(self.metalness);
        material.set_reflectivity(self.reflectivity);
        material.set_clearcoat(self.clearcoat);
        material.set_clearcoat_roughness(self.clearcoat_roughness);
        material.set_bump_scale(self.bump_scale);
        material.set_radius(self.radius);
        material.set_distort(self.distort);
    }
}

/// Perspective camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: Rgb::from_hex(0x161616),
            near: 8.0,
            far: 30.0,
        }
    }
}

/// Complete scene configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub background: Rgb,
    pub fog: FogConfig,
    pub motion: FieldMotion,
    /// Initial positions of the drifting field.
    pub layout: Vec<Vec3>,
    /// Where the pointer-following mesh sits.
    pub focal_position: Vec3,
    /// Icosphere radius shared by every instance.
    pub mesh_radius: f32,
    /// Icosphere subdivision level.
    pub mesh_detail: u32,
    pub material: MaterialControls,
    /// Enable the per-vertex noise tint.
    pub noise_tint: bool,
    pub assets: AssetConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            background: Rgb::from_hex(0x050505),
            fog: FogConfig::default(),
            motion: FieldMotion::default(),
            layout: default_layout(),
            focal_position: Vec3::ZERO,
            mesh_radius: 1.0,
            mesh_detail: 4,
            material: MaterialControls::default(),
            noise_tint: false,
            assets: AssetConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialTextures;
    use crate::textures::TextureHandle;

    #[test]
    fn test_rgb_round_trips_through_hex() {
        let c: Rgb = "#1a2B3c".parse().unwrap();
        assert_eq!(c, Rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_string(), "#1a2b3c");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_rgb_rejects_signed_digits() {
        assert!("+abcde".parse::<Rgb>().is_err());
        assert!("#+abcde".parse::<Rgb>().is_err());
        assert!("#-12345".parse::<Rgb>().is_err());
        assert_eq!("ABCDEF".parse::<Rgb>().unwrap(), Rgb(0xab, 0xcd, 0xef));
    }

    #[test]
    fn test_to_linear_endpoints() {
        assert_eq!(Rgb(0, 0, 0).to_linear(), Vec3::ZERO);
        assert!((Rgb(255, 255, 255).to_linear() - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn test_control_keys_parse_by_name() {
        for key in ControlKey::ALL {
            assert_eq!(key.name().parse::<ControlKey>().unwrap(), key);
        }
        assert!(matches!("wobble".parse::<ControlKey>(), Err(ControlError::UnknownKey(_))));
    }

    #[test]
    fn test_set_and_get() {
        let mut controls = MaterialControls::default();
        controls.set_named("distort", 0.9f32).unwrap();
        controls.set(ControlKey::Color, Rgb(10, 20, 30)).unwrap();
        assert_eq!(controls.get(ControlKey::Distort), ControlValue::Scalar(0.9));
        assert_eq!(controls.get(ControlKey::Color), ControlValue::Color(Rgb(10, 20, 30)));
    }

    #[test]
    fn test_set_rejects_wrong_kind() {
        let mut controls = MaterialControls::default();
        assert!(controls.set(ControlKey::Color, 1.0f32).is_err());
        assert!(controls.set(ControlKey::Radius, Rgb(0, 0, 0)).is_err());
        assert!(controls.nudge(ControlKey::Color, 0.1).is_err());
        assert_eq!(controls, MaterialControls::default());
    }

    #[test]
    fn test_apply_reaches_material() {
        let mut material = DistortMaterial::new(MaterialTextures {
            bump_map: TextureHandle(0),
            env_map: TextureHandle(1),
        });
        let mut controls = MaterialControls::default();
        controls.nudge(ControlKey::Radius, -0.25).unwrap();
        controls.apply(&mut material);

        assert_eq!(material.radius(), 0.75);
        assert_eq!(material.distort(), 0.4);
        assert_eq!(material.surface().metalness, 1.0);
        assert_eq!(material.surface().bump_scale, 0.0032);
    }

    #[test]
    fn test_partial_preset_uses_defaults() {
        let json = r##"{
            "material": { "distort": 0.8, "clearcoatRoughness": 0.2, "color": "#202040" },
            "motion": { "velocity_y": 0.05 }
        }"##;
        let config: SceneConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.material.distort, 0.8);
        assert_eq!(config.material.clearcoat_roughness, 0.2);
        assert_eq!(config.material.color, Rgb(0x20, 0x20, 0x40));
        assert_eq!(config.material.roughness, 0.1);
        assert_eq!(config.motion.velocity_y, 0.05);
        assert_eq!(config.motion.y_max, 19.0);
        assert_eq!(config.layout.len(), 8);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SceneConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_color_in_preset_is_an_error() {
        let json = r#"{ "background": "black" }"#;
        assert!(serde_json::from_str::<SceneConfig>(json).is_err());
    }
}
