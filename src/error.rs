//! Error types for Distort.
//!
//! This module provides error types for texture loading, shader composition,
//! scene construction and the windowed host.

use thiserror::Error;

use crate::shader::InsertionPoint;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The driver rejected a shader module that passed naga validation.
    #[error("GPU rejected shader module '{label}': {message}")]
    ShaderModule { label: String, message: String },
    /// A texture the pipeline binds is missing.
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode an image file.
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// Failed to read file from disk.
    #[error("Failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// The handle was never issued or has already been disposed.
    #[error("Unknown or disposed texture handle {0}")]
    UnknownHandle(u32),
    /// Cube map faces must be square and share one size.
    #[error("Cube map face '{path}' is {width}x{height}, expected {expected}x{expected}")]
    CubeFaceSize {
        path: String,
        width: u32,
        height: u32,
        expected: u32,
    },
    /// Conversion to a cube map needs the decoded source pixels.
    #[error("Texture handle {0} has no CPU-side pixels to convert")]
    NoSourcePixels(u32),
    /// Cube faces converted from a panorama need at least one texel.
    #[error("Cube face size must be at least 1, got {0}")]
    InvalidFaceSize(u32),
}

/// Errors raised while composing or validating a material program.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A patch targets an insertion point the base program does not declare.
    #[error("Shader patch '{patch}' targets missing insertion point {point:?}")]
    MissingInsertionPoint {
        patch: &'static str,
        point: InsertionPoint,
    },
    /// The composed program failed to parse or validate inside a patch.
    #[error("Shader patch '{patch}' failed to build:\n{message}")]
    InvalidPatch { patch: &'static str, message: String },
    /// The composed program failed outside any injected patch.
    #[error("Base program '{program}' failed to build:\n{message}")]
    InvalidBase { program: &'static str, message: String },
    /// A program with the same name is already registered.
    #[error("A material program named '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Errors that can occur while loading a scene configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read scene config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a valid scene configuration.
    #[error("Invalid scene config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort scene construction.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A texture dependency has not resolved yet.
    #[error("Asset '{0}' is not ready; material construction deferred")]
    AssetNotReady(&'static str),
    /// The material program could not be built.
    #[error(transparent)]
    Shader(#[from] ShaderError),
    /// An asset failed to load.
    #[error(transparent)]
    Texture(#[from] TextureError),
    /// The scene configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur when running the windowed demo.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Scene construction failed.
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Errors raised by the tunable-control surface.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The key is not one of the material's tunables.
    #[error("Unknown material control '{0}'")]
    UnknownKey(String),
    /// The value kind does not match the control.
    #[error("Control '{key}' expects a {expected} value")]
    TypeMismatch { key: &'static str, expected: &'static str },
    /// A color string is not `#rrggbb`.
    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
}
