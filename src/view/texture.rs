//! wgpu storage for registry textures.
//!
//! Every texture is uploaded as `Rgba8UnormSrgb` with a full mip chain built on
//! the CPU. The shader sees [`MAX_TEXTURE_SLOTS`] texture bindings plus one
//! shared repeat/linear sampler; unused slots point at a 1x1 white texture.

use std::collections::HashMap;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, warn};

use crate::model::{DecodedImage, TextureBackend, TextureHandle, MAX_TEXTURE_SLOTS};

pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// Binding index of the sampler in the texture bind group.
pub const SAMPLER_BINDING: u32 = MAX_TEXTURE_SLOTS as u32;

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Number of mip levels down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Successively halved copies of `base`, base level first.
pub fn build_mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let prev = &chain[chain.len() - 1];
        let (w, h) = ((prev.width() / 2).max(1), (prev.height() / 2).max(1));
        let next = imageops::resize(prev, w, h, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

pub struct WgpuTextureBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: HashMap<TextureHandle, GpuTexture>,
    next_handle: u32,
    bound: Vec<TextureHandle>,
    fallback: GpuTexture,
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl WgpuTextureBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let layout = create_bind_group_layout(&device);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let fallback = create_texture(&device, &queue, vec![white], "fallback_white");

        let bind_group = build_bind_group(&device, &layout, &sampler, &[&fallback.view; MAX_TEXTURE_SLOTS]);

        Self {
            device,
            queue,
            textures: HashMap::new(),
            next_handle: 1,
            bound: Vec::new(),
            fallback,
            sampler,
            layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn rebuild_bind_group(&mut self) {
        let views: [&wgpu::TextureView; MAX_TEXTURE_SLOTS] = std::array::from_fn(|slot| {
            self.bound
                .get(slot)
                .and_then(|handle| self.textures.get(handle))
                .map(|tex| &tex.view)
                .unwrap_or(&self.fallback.view)
        });
        self.bind_group = build_bind_group(&self.device, &self.layout, &self.sampler, &views);
    }
}

impl TextureBackend for WgpuTextureBackend {
    fn upload(&mut self, image: &DecodedImage, label: &str) -> TextureHandle {
        let base = RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
            .unwrap_or_else(|| {
                warn!(label, "pixel buffer does not match image size, using blank texture");
                RgbaImage::new(image.width.max(1), image.height.max(1))
            });
        let texture = create_texture(&self.device, &self.queue, build_mip_chain(base), label);

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(handle, texture);
        debug!(label, handle = handle.0, "texture uploaded");
        handle
    }

    fn bind(&mut self, handles: &[TextureHandle]) {
        for handle in handles {
            if !self.textures.contains_key(handle) {
                warn!(handle = handle.0, "binding unknown texture, slot falls back to white");
            }
        }
        self.bound = handles.iter().take(MAX_TEXTURE_SLOTS).copied().collect();
        self.rebuild_bind_group();
    }

    fn release(&mut self, handle: TextureHandle) {
        if let Some(tex) = self.textures.remove(&handle) {
            tex.texture.destroy();
            if self.bound.contains(&handle) {
                self.rebuild_bind_group();
            }
        }
    }
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mips: Vec<RgbaImage>,
    label: &str,
) -> GpuTexture {
    let (width, height) = mips.first().map(|m| m.dimensions()).unwrap_or((1, 1));
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: mips.len().max(1) as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (level, mip) in mips.iter().enumerate() {
        let (w, h) = mip.dimensions();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            mip.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture_bind_group_layout"),
        entries: &entries,
    })
}

fn build_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    views: &[&wgpu::TextureView; MAX_TEXTURE_SLOTS],
) -> wgpu::BindGroup {
    let mut entries: Vec<wgpu::BindGroupEntry> = views
        .iter()
        .enumerate()
        .map(|(slot, view)| wgpu::BindGroupEntry {
            binding: slot as u32,
            resource: wgpu::BindingResource::TextureView(*view),
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: SAMPLER_BINDING,
        resource: wgpu::BindingResource::Sampler(sampler),
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bind_group"),
        layout,
        entries: &entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 64), 9);
        assert_eq!(mip_level_count(300, 1), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn test_mip_chain_halves_to_one_pixel() {
        let base = RgbaImage::from_pixel(8, 2, image::Rgba([10, 20, 30, 255]));
        let chain = build_mip_chain(base);
        let sizes: Vec<_> = chain.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        // a flat colour stays flat
        assert_eq!(chain[3].get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }
}
