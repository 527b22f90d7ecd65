use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the resource registry.
///
/// Lookups never produce these; a missing tag is reported as `None`.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} has {channels} channels, only RGB and RGBA are supported")]
    UnsupportedChannels { path: PathBuf, channels: u8 },

    #[error("{count} textures registered but only {max} texture slots are available")]
    TooManyTextures { count: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal start-up errors. Any of these ends the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to prepare scene: {0}")]
    Scene(#[from] RegistryError),
}
