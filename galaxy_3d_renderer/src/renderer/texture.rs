/// Texture descriptors, flags and default texture slots

use bitflags::bitflags;

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Simple 2D texture
    Type2D,
    /// Array of 2D layers
    Type2DArray,
    /// Cube map (6 layers)
    Cube,
    /// Array of cube maps (6 layers each)
    CubeArray,
}

bitflags! {
    /// Texture creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// Alpha channel carries transparency
        const HAS_TRANSPARENCY = 1 << 0;
        /// Contents may be written after creation (render targets, streamed data)
        const IS_WRITEABLE = 1 << 1;
        /// Wraps an existing backend image (e.g. a swapchain image)
        const IS_WRAPPED = 1 << 2;
        /// Depth attachment
        const DEPTH = 1 << 3;
        /// Stencil attachment (combined with DEPTH for depth-stencil)
        const STENCIL = 1 << 4;
        /// Usable as a colour render target
        const RENDER_TARGET = 1 << 5;
    }
}

/// Descriptor of a texture, as handed to the backend at creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel (1 to 4)
    pub channels: u8,
    /// Number of mip levels (1 = no mipmaps)
    pub mip_levels: u32,
    /// Number of array layers (6 for a cube map)
    pub array_size: u16,
    pub flags: TextureFlags,
}

impl TextureDesc {
    /// Size in bytes of one layer at mip 0
    pub fn layer_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.channels as u64
    }

    /// Size in bytes of all layers at mip 0
    pub fn size(&self) -> u64 {
        self.layer_size() * self.array_size as u64
    }

    /// Largest mip chain possible for a `width` x `height` image
    pub fn max_mip_levels(width: u32, height: u32) -> u32 {
        32 - width.max(height).max(1).leading_zeros()
    }

    /// Whether the texture is a depth and/or stencil attachment
    pub fn is_depth(&self) -> bool {
        self.flags.intersects(TextureFlags::DEPTH | TextureFlags::STENCIL)
    }
}

// ===== DEFAULT TEXTURES =====

/// Slots of the default texture table
///
/// Materials fall back to these when a map is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultTexture {
    /// Magenta/white checkerboard, makes missing textures obvious
    Default,
    /// White base colour
    Base,
    /// Black specular
    Specular,
    /// Flat tangent-space normal
    Normal,
    /// Metallic/roughness/ambient-occlusion
    Mra,
    /// Black emissive
    Emissive,
    /// Flat water normal
    WaterNormal,
    /// White cube map
    Cube,
}

impl DefaultTexture {
    /// Number of default texture slots
    pub const COUNT: usize = 8;

    /// Every slot, in table order
    pub const ALL: [DefaultTexture; Self::COUNT] = [
        DefaultTexture::Default,
        DefaultTexture::Base,
        DefaultTexture::Specular,
        DefaultTexture::Normal,
        DefaultTexture::Mra,
        DefaultTexture::Emissive,
        DefaultTexture::WaterNormal,
        DefaultTexture::Cube,
    ];

    /// Position in the default texture table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Registered texture name
    pub fn name(self) -> &'static str {
        match self {
            DefaultTexture::Default => "__default_texture__",
            DefaultTexture::Base => "__default_base__",
            DefaultTexture::Specular => "__default_specular__",
            DefaultTexture::Normal => "__default_normal__",
            DefaultTexture::Mra => "__default_mra__",
            DefaultTexture::Emissive => "__default_emissive__",
            DefaultTexture::WaterNormal => "__default_water_normal__",
            DefaultTexture::Cube => "__default_cube__",
        }
    }

    /// Descriptor and RGBA pixel data of the built-in texture for this slot
    pub fn built_in(self) -> (TextureDesc, Vec<u8>) {
        const DIM: u32 = 16;

        let (texture_type, array_size) = match self {
            DefaultTexture::Cube => (TextureType::Cube, 6u16),
            _ => (TextureType::Type2D, 1u16),
        };
        let desc = TextureDesc {
            texture_type,
            width: DIM,
            height: DIM,
            channels: 4,
            mip_levels: 1,
            array_size,
            flags: TextureFlags::empty(),
        };

        let fill = |rgba: [u8; 4]| -> Vec<u8> {
            rgba.iter().copied().cycle().take(desc.size() as usize).collect()
        };

        let pixels = match self {
            DefaultTexture::Default => {
                let mut pixels = Vec::with_capacity(desc.size() as usize);
                for y in 0..DIM {
                    for x in 0..DIM {
                        if (x + y) % 2 == 0 {
                            pixels.extend_from_slice(&[255, 0, 255, 255]);
                        } else {
                            pixels.extend_from_slice(&[255, 255, 255, 255]);
                        }
                    }
                }
                pixels
            }
            DefaultTexture::Base | DefaultTexture::Cube => fill([255, 255, 255, 255]),
            DefaultTexture::Specular | DefaultTexture::Emissive => fill([0, 0, 0, 255]),
            DefaultTexture::Normal | DefaultTexture::WaterNormal => fill([128, 128, 255, 255]),
            DefaultTexture::Mra => fill([0, 128, 255, 255]),
        };

        (desc, pixels)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
