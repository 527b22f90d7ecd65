//! Tag-addressed textures and materials.
//!
//! Textures are kept in registration order: the slot of a texture is its
//! index in that order, and `bind_all_textures` binds slot `i` to texture
//! unit `i`. Lookups are linear and case-sensitive; when a tag is registered
//! twice the first entry always wins.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::model::Material;

/// Number of texture units the shader samples from.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Opaque reference to a texture owned by a [`TextureBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Pixel data ready for upload, rows ordered bottom-up.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl DecodedImage {
    /// Decode an image file and flip it vertically so that row 0 is the
    /// bottom of the picture (texture-space origin).
    ///
    /// Only 3- and 4-channel images are accepted.
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let img = image::open(path).map_err(|source| RegistryError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let channels = img.color().channel_count();
        let (width, height) = (img.width(), img.height());
        let img = img.flipv();
        let (format, pixels) = match channels {
            3 => (PixelFormat::Rgb8, img.into_rgb8().into_raw()),
            4 => (PixelFormat::Rgba8, img.into_rgba8().into_raw()),
            _ => {
                return Err(RegistryError::UnsupportedChannels {
                    path: path.to_path_buf(),
                    channels,
                })
            }
        };

        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Pixels expanded to RGBA8 (RGB gets an opaque alpha channel).
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba8 => self.pixels.clone(),
            PixelFormat::Rgb8 => self
                .pixels
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
                .collect(),
        }
    }
}

/// GPU side of the registry: texture creation, unit binding and deletion.
pub trait TextureBackend {
    /// Upload pixel data with repeat wrapping, linear filtering and mipmaps.
    fn upload(&mut self, image: &DecodedImage, label: &str) -> TextureHandle;

    /// Bind `handles[i]` to texture unit `i`. Never called with more than
    /// [`MAX_TEXTURE_SLOTS`] handles.
    fn bind(&mut self, handles: &[TextureHandle]);

    /// Delete the texture behind `handle`.
    fn release(&mut self, handle: TextureHandle);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureEntry {
    pub tag: String,
    pub handle: TextureHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    pub tag: String,
    pub material: Material,
}

pub struct ResourceRegistry<B: TextureBackend> {
    backend: B,
    textures: Vec<TextureEntry>,
    materials: Vec<MaterialEntry>,
}

impl<B: TextureBackend> ResourceRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            textures: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Decode `path` and register it under `tag`. Returns the new slot.
    ///
    /// A decode failure registers nothing; it is logged and returned so the
    /// caller can carry on without that texture.
    pub fn register_texture(&mut self, path: impl AsRef<Path>, tag: impl Into<String>) -> Result<usize, RegistryError> {
        let path = path.as_ref();
        let tag = tag.into();
        match DecodedImage::open(path) {
            Ok(image) => {
                info!(
                    path = %path.display(),
                    width = image.width,
                    height = image.height,
                    channels = image.format.channels(),
                    "loaded texture image"
                );
                Ok(self.register_decoded_texture(&image, tag))
            }
            Err(err) => {
                warn!(tag = %tag, "{}", err);
                Err(err)
            }
        }
    }

    /// Register already decoded pixel data under `tag`. Returns the new slot.
    pub fn register_decoded_texture(&mut self, image: &DecodedImage, tag: impl Into<String>) -> usize {
        let tag = tag.into();
        let handle = self.backend.upload(image, &tag);
        self.textures.push(TextureEntry { tag, handle });
        self.textures.len() - 1
    }

    /// Bind every registered texture to the unit equal to its slot.
    pub fn bind_all_textures(&mut self) -> Result<(), RegistryError> {
        if self.textures.len() > MAX_TEXTURE_SLOTS {
            return Err(RegistryError::TooManyTextures {
                count: self.textures.len(),
                max: MAX_TEXTURE_SLOTS,
            });
        }
        let handles: Vec<TextureHandle> = self.textures.iter().map(|t| t.handle).collect();
        self.backend.bind(&handles);
        debug!(count = handles.len(), "bound textures");
        Ok(())
    }

    pub fn find_texture_slot(&self, tag: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.tag == tag)
    }

    pub fn find_texture_handle(&self, tag: &str) -> Option<TextureHandle> {
        self.textures.iter().find(|t| t.tag == tag).map(|t| t.handle)
    }

    pub fn textures(&self) -> &[TextureEntry] {
        &self.textures
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Delete every texture. All later texture lookups return `None`.
    pub fn release_all(&mut self) {
        for entry in self.textures.drain(..) {
            self.backend.release(entry.handle);
        }
    }

    pub fn register_material(&mut self, tag: impl Into<String>, material: Material) {
        self.materials.push(MaterialEntry {
            tag: tag.into(),
            material,
        });
    }

    /// Copy of the first material registered under `tag`.
    pub fn find_material(&self, tag: &str) -> Option<Material> {
        self.materials.iter().find(|m| m.tag == tag).map(|m| m.material)
    }

    pub fn materials(&self) -> &[MaterialEntry] {
        &self.materials
    }
}
