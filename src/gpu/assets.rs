//! wgpu-backed [`AssetLoader`].
//!
//! Images are decoded with `image`, mipmapped on the CPU and uploaded with
//! `Queue::write_texture`. 2D textures keep their decoded pixels so they can
//! later be converted to cube maps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::TextureError;
use crate::textures::{equirect_to_cube_faces, AssetLoader, TextureData, TextureHandle};

struct Slot {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    /// Level-0 pixels of 2D textures.
    pixels: Option<TextureData>,
}

/// Owns every texture the scene loads.
pub struct GpuAssets {
    device: wgpu::Device,
    queue: wgpu::Queue,
    slots: HashMap<u32, Slot>,
    next_handle: u32,
}

impl GpuAssets {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            slots: HashMap::new(),
            next_handle: 0,
        }
    }

    /// View for binding a loaded texture.
    pub fn view(&self, handle: TextureHandle) -> Result<&wgpu::TextureView, TextureError> {
        self.slots
            .get(&handle.0)
            .map(|slot| &slot.view)
            .ok_or(TextureError::UnknownHandle(handle.0))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, slot: Slot) -> TextureHandle {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.slots.insert(handle.0, slot);
        handle
    }

    /// Upload `layers` (one mip chain each) into a new texture.
    fn upload(&self, label: &str, layers: &[Vec<TextureData>], format: wgpu::TextureFormat) -> wgpu::Texture {
        let base = &layers[0][0];
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: base.width,
                height: base.height,
                depth_or_array_layers: layers.len() as u32,
            },
            mip_level_count: layers[0].len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, chain) in layers.iter().enumerate() {
            for (level, mip) in chain.iter().enumerate() {
                self.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: level as u32,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: layer as u32,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    &mip.data,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(4 * mip.width),
                        rows_per_image: Some(mip.height),
                    },
                    wgpu::Extent3d {
                        width: mip.width,
                        height: mip.height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        texture
    }

    fn insert_cube(&mut self, label: &str, faces: &[TextureData; 6]) -> TextureHandle {
        let chains: Vec<_> = faces.iter().map(TextureData::mip_chain).collect();
        let texture = self.upload(label, &chains, wgpu::TextureFormat::Rgba8UnormSrgb);
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        self.insert(Slot {
            texture,
            view,
            pixels: None,
        })
    }
}

impl AssetLoader for GpuAssets {
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, TextureError> {
        let data = TextureData::from_file(path)?;
        let label = path.display().to_string();
        // Height data, so no sRGB decode.
        let texture = self.upload(&label, &[data.mip_chain()], wgpu::TextureFormat::Rgba8Unorm);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Uploaded {} ({}x{})", label, data.width, data.height);
        Ok(self.insert(Slot {
            texture,
            view,
            pixels: Some(data),
        }))
    }

    fn load_cube(&mut self, faces: &[PathBuf; 6]) -> Result<TextureHandle, TextureError> {
        let [px, nx, py, ny, pz, nz] = faces.each_ref().map(TextureData::from_file);
        let decoded = [px?, nx?, py?, ny?, pz?, nz?];

        let expected = decoded[0].width;
        for (data, path) in decoded.iter().zip(faces) {
            if data.width != expected || data.height != expected {
                return Err(TextureError::CubeFaceSize {
                    path: path.display().to_string(),
                    width: data.width,
                    height: data.height,
                    expected,
                });
            }
        }

        Ok(self.insert_cube("Environment Cube", &decoded))
    }

    fn equirect_to_cube(&mut self, source: TextureHandle, face_size: u32) -> Result<TextureHandle, TextureError> {
        let slot = self
            .slots
            .get(&source.0)
            .ok_or(TextureError::UnknownHandle(source.0))?;
        let pixels = slot.pixels.as_ref().ok_or(TextureError::NoSourcePixels(source.0))?;
        let faces = equirect_to_cube_faces(pixels, face_size)?;
        Ok(self.insert_cube("Environment Cube (equirect)", &faces))
    }

    fn dispose(&mut self, handle: TextureHandle) -> Result<(), TextureError> {
        let slot = self
            .slots
            .remove(&handle.0)
            .ok_or(TextureError::UnknownHandle(handle.0))?;
        slot.texture.destroy();
        Ok(())
    }
}
