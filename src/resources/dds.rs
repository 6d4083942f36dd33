//! DDS container decoding.
//!
//! Only the block-compressed DXT1/DXT3/DXT5 variants are understood. The
//! decoder slices the payload into mip levels without decompressing them;
//! the GPU samples the blocks directly.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
pub const HEADER_SIZE: usize = 124;

const HEIGHT_OFFSET: u64 = 8;
const WIDTH_OFFSET: u64 = 12;
const LINEAR_SIZE_OFFSET: u64 = 16;
const MIP_COUNT_OFFSET: u64 = 24;
const FOURCC_OFFSET: u64 = 80;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("not a DDS file (magic {0:?})")]
    BadMagic([u8; 4]),
    #[error("DDS header truncated: {0} bytes")]
    TruncatedHeader(usize),
    #[error("unsupported DDS format {0:?}")]
    UnsupportedFormat(String),
    #[error("DDS has zero width or height")]
    EmptyImage,
    #[error("DDS level {width}x{height} is too large to address")]
    TooLarge { width: u32, height: u32 },
    #[error("DDS payload too short for mip level {level}: need {needed} bytes, {available} left")]
    TruncatedLevel {
        level: u32,
        needed: usize,
        available: usize,
    },
}

/// The three supported block-compressed encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockFormat {
    /// `DXT1`, 8 bytes per 4x4 block.
    Bc1,
    /// `DXT3`, 16 bytes per 4x4 block.
    Bc2,
    /// `DXT5`, 16 bytes per 4x4 block.
    Bc3,
}

impl BlockFormat {
    pub fn from_four_cc(code: [u8; 4]) -> Option<Self> {
        match &code {
            b"DXT1" => Some(Self::Bc1),
            b"DXT3" => Some(Self::Bc2),
            b"DXT5" => Some(Self::Bc3),
            _ => None,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc2 | Self::Bc3 => 16,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::Bc1 => wgpu::TextureFormat::Bc1RgbaUnormSrgb,
            Self::Bc2 => wgpu::TextureFormat::Bc2RgbaUnormSrgb,
            Self::Bc3 => wgpu::TextureFormat::Bc3RgbaUnormSrgb,
        }
    }
}

/// Byte size of one level: `ceil(w/4) * ceil(h/4) * block_size`, `None` on overflow.
pub fn level_size(width: u32, height: u32, format: BlockFormat) -> Option<usize> {
    let blocks_wide = width.div_ceil(4) as usize;
    let blocks_high = height.div_ceil(4) as usize;
    blocks_wide
        .checked_mul(blocks_high)?
        .checked_mul(format.block_size())
}

/// Number of levels in a complete mip chain down to 1x1.
pub fn full_mip_chain(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[derive(Clone, Debug, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A decoded DDS file, largest mip level first.
#[derive(Clone, Debug, PartialEq)]
pub struct DdsTexture {
    pub width: u32,
    pub height: u32,
    pub linear_size: u32,
    pub mip_count: u32,
    pub format: BlockFormat,
    pub levels: Vec<MipLevel>,
}

impl DdsTexture {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let mut magic = [0u8; 4];
        if bytes.len() < 4 {
            magic[..bytes.len()].copy_from_slice(bytes);
            return Err(TextureError::BadMagic(magic));
        }
        magic.copy_from_slice(&bytes[..4]);
        if &magic != DDS_MAGIC {
            return Err(TextureError::BadMagic(magic));
        }
        let header = bytes
            .get(4..4 + HEADER_SIZE)
            .ok_or(TextureError::TruncatedHeader(bytes.len() - 4))?;

        let height = read_u32_at(header, HEIGHT_OFFSET);
        let width = read_u32_at(header, WIDTH_OFFSET);
        let linear_size = read_u32_at(header, LINEAR_SIZE_OFFSET);
        let mip_count = read_u32_at(header, MIP_COUNT_OFFSET);
        let mut four_cc = [0u8; 4];
        four_cc.copy_from_slice(&header[FOURCC_OFFSET as usize..FOURCC_OFFSET as usize + 4]);

        let format = BlockFormat::from_four_cc(four_cc).ok_or_else(|| {
            TextureError::UnsupportedFormat(String::from_utf8_lossy(&four_cc).into_owned())
        })?;
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyImage);
        }

        let payload = &bytes[4 + HEADER_SIZE..];
        // writers leave the count at zero when the file has no mip chain
        let full_chain = full_mip_chain(width, height);
        let declared = mip_count.max(1);
        if declared > full_chain {
            log::warn!(
                "DDS declares {declared} mip levels, a {width}x{height} image has at most {full_chain}"
            );
        }
        let declared = declared.min(full_chain);
        let mut levels = Vec::with_capacity(declared as usize);
        let (mut w, mut h) = (width, height);
        let mut offset = 0usize;
        let mut level = 0;
        while level < declared && (w != 0 || h != 0) {
            let size = level_size(w, h, format).ok_or(TextureError::TooLarge {
                width: w,
                height: h,
            })?;
            let available = payload.len() - offset;
            if size > available {
                if levels.is_empty() {
                    return Err(TextureError::TruncatedLevel {
                        level,
                        needed: size,
                        available,
                    });
                }
                log::warn!(
                    "DDS mip chain cut short at level {level}: need {size} bytes, {available} left; keeping {} levels",
                    levels.len()
                );
                break;
            }
            levels.push(MipLevel {
                width: w,
                height: h,
                data: payload[offset..offset + size].to_vec(),
            });
            offset += size;
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            level += 1;
        }

        Ok(Self {
            width,
            height,
            linear_size,
            mip_count,
            format,
            levels,
        })
    }
}

fn read_u32_at(header: &[u8], offset: u64) -> u32 {
    let mut cursor = Cursor::new(header);
    cursor.set_position(offset);
    // the header slice is always HEADER_SIZE long, every offset is in range
    cursor.read_u32::<LittleEndian>().unwrap_or(0)
}
