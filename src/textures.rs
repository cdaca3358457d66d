//! Texture sources and the asset loader boundary.
//!
//! The material borrows two textures: a 2D bump map and an environment cube
//! map. Both come from an [`AssetLoader`], which owns the GPU resources and
//! hands out plain [`TextureHandle`]s.
//!
//! Environment maps can be given as six cube faces or as one
//! equirectangular panorama. A panorama is loaded as an intermediate 2D
//! texture, converted, and the intermediate is disposed straight away:
//!
//! ```ignore
//! let pending = MaterialAssets::load(&mut loader, &config.assets)?;
//! let mut material = DistortMaterial::new(pending.resolve()?);
//! config.material.apply(&mut material);
//! ```
//!
//! # Supported Formats
//!
//! - PNG
//! - JPEG

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::TextureError;
use crate::material::PendingTextures;

/// Opaque reference to a texture owned by an [`AssetLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
}

impl TextureData {
    /// Create texture data from raw RGBA bytes.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not `width * height * 4` bytes long.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "RGBA data size mismatch"
        );
        Self { data, width, height }
    }

    /// Decode an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::ImageLoad {
                path: path.display().to_string(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
        })
    }

    /// A single-pixel texture.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
        }
    }

    /// Pixel at `(x, y)`, clamped to the edges.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let i = ((y * self.width + x) * 4) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Half-resolution copy (box filter), used to build mip chains.
    pub fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let mut sum = [0u32; 4];
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let p = self.pixel(x * 2 + dx, y * 2 + dy);
                    for c in 0..4 {
                        sum[c] += p[c] as u32;
                    }
                }
                data.extend(sum.iter().map(|s| ((s + 2) / 4) as u8));
            }
        }
        Self { data, width, height }
    }

    /// Full mip chain, level 0 first.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let mut levels = vec![self.clone()];
        while let Some(last) = levels.last() {
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        levels
    }
}

/// Cube faces in upload order (matches the GPU's array layer order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// World direction through face coordinates `u, v` in [-1, 1].
    pub fn direction(&self, u: f32, v: f32) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, -v, -u),
            CubeFace::NegativeX => Vec3::new(-1.0, -v, u),
            CubeFace::PositiveY => Vec3::new(u, 1.0, v),
            CubeFace::NegativeY => Vec3::new(u, -1.0, -v),
            CubeFace::PositiveZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegativeZ => Vec3::new(-u, -v, -1.0),
        }
        .normalize()
    }
}

/// Resample an equirectangular panorama into six square cube faces.
///
/// Fails with [`TextureError::InvalidFaceSize`] when `face_size` is zero.
pub fn equirect_to_cube_faces(source: &TextureData, face_size: u32) -> Result<[TextureData; 6], TextureError> {
    if face_size == 0 {
        return Err(TextureError::InvalidFaceSize(face_size));
    }
    Ok(CubeFace::ALL.map(|face| {
        let mut data = Vec::with_capacity((face_size * face_size * 4) as usize);
        for y in 0..face_size {
            for x in 0..face_size {
                let u = 2.0 * (x as f32 + 0.5) / face_size as f32 - 1.0;
                let v = 2.0 * (y as f32 + 0.5) / face_size as f32 - 1.0;
                let dir = face.direction(u, v);
                let lon = dir.z.atan2(dir.x);
                let lat = dir.y.clamp(-1.0, 1.0).acos();
                let sx = ((lon / (2.0 * PI) + 0.5) * source.width as f32) as u32;
                let sy = (lat / PI * source.height as f32) as u32;
                data.extend_from_slice(&source.pixel(sx, sy));
            }
        }
        TextureData {
            data,
            width: face_size,
            height: face_size,
        }
    }))
}

/// Where the environment map comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentSource {
    /// Six images in `+X, -X, +Y, -Y, +Z, -Z` order, relative to `dir`.
    Cube { dir: PathBuf, faces: [String; 6] },
    /// One equirectangular panorama converted to a cube of `face_size`.
    Equirect { path: PathBuf, face_size: u32 },
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        EnvironmentSource::Cube {
            dir: PathBuf::from("cube"),
            faces: ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"].map(String::from),
        }
    }
}

/// Asset paths used by the material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory every other path is relative to.
    pub root: PathBuf,
    pub bump_map: PathBuf,
    pub environment: EnvironmentSource,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            bump_map: PathBuf::from("bump.jpg"),
            environment: EnvironmentSource::default(),
        }
    }
}

/// Loads textures and owns their GPU resources.
pub trait AssetLoader {
    /// Load a 2D texture.
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, TextureError>;

    /// Load six square faces as one cube map.
    fn load_cube(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, TextureError>;

    /// Convert a loaded equirectangular 2D texture into a new cube map.
    fn equirect_to_cube(&mut self, source: TextureHandle, face_size: u32) -> Result<TextureHandle, TextureError>;

    /// Release a texture. Later use of the handle is an error.
    fn dispose(&mut self, handle: TextureHandle) -> Result<(), TextureError>;
}

/// Loads the textures a displacement material depends on.
pub struct MaterialAssets;

impl MaterialAssets {
    /// Load the bump map and the environment map described by `config`.
    pub fn load<L: AssetLoader>(loader: &mut L, config: &AssetConfig) -> Result<PendingTextures, TextureError> {
        let mut pending = PendingTextures::default();

        let bump_path = config.root.join(&config.bump_map);
        pending.bump_map = Some(loader.load_texture(&bump_path)?);
        log::info!("Loaded bump map {}", bump_path.display());

        let env = match &config.environment {
            EnvironmentSource::Cube { dir, faces } => {
                let base = config.root.join(dir);
                let paths = faces.clone().map(|f| base.join(f));
                loader.load_cube(&paths)?
            }
            EnvironmentSource::Equirect { path, face_size } => {
                if *face_size == 0 {
                    return Err(TextureError::InvalidFaceSize(*face_size));
                }
                let source = loader.load_texture(&config.root.join(path))?;
                let converted = loader.equirect_to_cube(source, *face_size);
                // The panorama is only an intermediate; release it even if
                // conversion failed.
                loader.dispose(source)?;
                log::info!("Disposed equirectangular source {:?}", source);
                converted?
            }
        };
        pending.env_map = Some(env);
        log::info!("Loaded environment map {:?}", env);

        Ok(pending)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory loader that records what happened to each handle.
    #[derive(Default)]
    pub(crate) struct RecordingLoader {
        pub next: u32,
        pub live: Vec<TextureHandle>,
        pub disposed: Vec<TextureHandle>,
        pub loaded_paths: Vec<PathBuf>,
    }

    impl RecordingLoader {
        fn issue(&mut self) -> TextureHandle {
            let handle = TextureHandle(self.next);
            self.next += 1;
            self.live.push(handle);
            handle
        }
    }

    impl AssetLoader for RecordingLoader {
        fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, TextureError> {
            self.loaded_paths.push(path.to_path_buf());
            Ok(self.issue())
        }

        fn load_cube(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, TextureError> {
            self.loaded_paths.extend(faces.iter().cloned());
            Ok(self.issue())
        }

        fn equirect_to_cube(&mut self, source: TextureHandle, _face_size: u32) -> Result<TextureHandle, TextureError> {
            if !self.live.contains(&source) {
                return Err(TextureError::UnknownHandle(source.0));
            }
            Ok(self.issue())
        }

        fn dispose(&mut self, handle: TextureHandle) -> Result<(), TextureError> {
            let idx = self
                .live
                .iter()
                .position(|h| *h == handle)
                .ok_or(TextureError::UnknownHandle(handle.0))?;
            self.live.remove(idx);
            self.disposed.push(handle);
            Ok(())
        }
    }

    #[test]
    fn test_cube_source_loads_six_faces() {
        let mut loader = RecordingLoader::default();
        let pending = MaterialAssets::load(&mut loader, &AssetConfig::default()).unwrap();

        assert!(pending.bump_map.is_some());
        assert!(pending.env_map.is_some());
        assert_eq!(loader.loaded_paths.len(), 7);
        assert_eq!(loader.loaded_paths[1], PathBuf::from("assets/cube/px.png"));
        assert_eq!(loader.loaded_paths[6], PathBuf::from("assets/cube/nz.png"));
        assert!(loader.disposed.is_empty());
    }

    #[test]
    fn test_equirect_source_disposes_intermediate() {
        let mut loader = RecordingLoader::default();
        let config = AssetConfig {
            environment: EnvironmentSource::Equirect {
                path: PathBuf::from("studio.png"),
                face_size: 64,
            },
            ..Default::default()
        };
        let pending = MaterialAssets::load(&mut loader, &config).unwrap();
        let env = pending.env_map.unwrap();

        assert_eq!(loader.disposed.len(), 1);
        assert_ne!(loader.disposed[0], env);
        assert!(loader.live.contains(&env));
        // Bump map and converted cube stay alive.
        assert_eq!(loader.live.len(), 2);
    }

    #[test]
    fn test_downsample_averages() {
        let tex = TextureData::from_rgba(
            vec![
                0, 0, 0, 255, 255, 255, 255, 255, //
                255, 255, 255, 255, 0, 0, 0, 255,
            ],
            2,
            2,
        );
        let half = tex.downsample();
        assert_eq!((half.width, half.height), (1, 1));
        assert_eq!(half.data, vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_mip_chain_ends_at_one_pixel() {
        let tex = TextureData::from_rgba(vec![10; 8 * 4 * 4], 8, 4);
        let chain = tex.mip_chain();
        let sizes: Vec<_> = chain.iter().map(|t| (t.width, t.height)).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_equirect_conversion_samples_poles() {
        // Top half white, bottom half black.
        let (w, h) = (16u32, 8u32);
        let mut data = Vec::new();
        for y in 0..h {
            for _ in 0..w {
                let v = if y < h / 2 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let faces = equirect_to_cube_faces(&TextureData::from_rgba(data, w, h), 4).unwrap();

        let up = &faces[2];
        let down = &faces[3];
        assert!(up.data.chunks(4).all(|p| p[0] == 255));
        assert!(down.data.chunks(4).all(|p| p[0] == 0));
        assert!(faces.iter().all(|f| f.width == 4 && f.height == 4));
    }

    #[test]
    fn test_zero_face_size_is_rejected() {
        let source = TextureData::from_rgba(vec![200; 4 * 4 * 4], 4, 4);
        assert!(matches!(
            equirect_to_cube_faces(&source, 0),
            Err(TextureError::InvalidFaceSize(0))
        ));

        let mut loader = RecordingLoader::default();
        let config = AssetConfig {
            environment: EnvironmentSource::Equirect {
                path: PathBuf::from("studio.png"),
                face_size: 0,
            },
            ..Default::default()
        };
        let err = MaterialAssets::load(&mut loader, &config).err();
        assert!(matches!(err, Some(TextureError::InvalidFaceSize(0))));
        // Rejected before the panorama was loaded, so nothing leaks.
        assert_eq!(loader.loaded_paths.len(), 1);
        assert!(loader.disposed.is_empty());
    }

    #[test]
    fn test_one_texel_faces_build_mips() {
        let source = TextureData::from_rgba(vec![90; 4 * 2 * 4], 4, 2);
        let faces = equirect_to_cube_faces(&source, 1).unwrap();
        assert!(faces.iter().all(|f| f.mip_chain().len() == 1));
    }

    #[test]
    fn test_cube_face_directions_point_outward() {
        assert!(CubeFace::PositiveX.direction(0.0, 0.0).abs_diff_eq(Vec3::X, 1e-6));
        assert!(CubeFace::NegativeY.direction(0.0, 0.0).abs_diff_eq(-Vec3::Y, 1e-6));
        assert!(CubeFace::NegativeZ.direction(0.0, 0.0).abs_diff_eq(-Vec3::Z, 1e-6));
    }
}
