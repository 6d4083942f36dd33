//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources,
//! with constructors for block-compressed DDS images and the neutral white
//! texture drawn in place of unresolved ones.

use anyhow::*;
use wgpu::util::DeviceExt;

use crate::resources::dds::{DdsTexture, full_mip_chain, level_size};

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Create a 1x1 opaque white texture.
    ///
    /// Objects whose texture handle is [`NO_TEXTURE`](crate::context::NO_TEXTURE)
    /// are drawn with this so the shader never has to branch on a missing binding.
    pub fn create_white(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fallback white"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &[255, 255, 255, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Upload a decoded DDS image with all of its mip levels.
    ///
    /// Fails when the device lacks BC compression support or when the base
    /// level is not a whole number of 4x4 blocks, which wgpu requires.
    pub fn from_dds(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dds: &DdsTexture,
        label: &str,
    ) -> Result<Self> {
        if !device
            .features()
            .contains(wgpu::Features::TEXTURE_COMPRESSION_BC)
        {
            bail!("device does not support BC texture compression ({label})");
        }
        if dds.width % 4 != 0 || dds.height % 4 != 0 {
            bail!(
                "{label}: {}x{} is not a multiple of the 4x4 block size",
                dds.width,
                dds.height
            );
        }
        let format = dds.format.to_wgpu();
        let size = wgpu::Extent3d {
            width: dds.width,
            height: dds.height,
            depth_or_array_layers: 1,
        };
        // wgpu allows at most the full chain
        let mip_level_count = (dds.levels.len() as u32).min(full_mip_chain(dds.width, dds.height));
        if mip_level_count == 0 {
            bail!("{label}: no mip levels");
        }
        for (idx, level) in dds.levels.iter().take(mip_level_count as usize).enumerate() {
            if level_size(level.width, level.height, dds.format) != Some(level.data.len()) {
                bail!(
                    "{label}: mip level {idx} ({}x{}) holds {} bytes",
                    level.width,
                    level.height,
                    level.data.len()
                );
            }
        }
        // create_texture_with_data expects every mip level back to back, largest first
        let data: Vec<u8> = dds
            .levels
            .iter()
            .take(mip_level_count as usize)
            .flat_map(|level| level.data.iter().copied())
            .collect();

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
