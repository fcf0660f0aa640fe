/// Sampler descriptors and the generic sampler table

/// Minification/magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Addressing mode outside the [0, 1] texture coordinate range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRepeat {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Sampler creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub filter_min: TextureFilter,
    pub filter_mag: TextureFilter,
    pub repeat_u: TextureRepeat,
    pub repeat_v: TextureRepeat,
    pub repeat_w: TextureRepeat,
    /// Anisotropy level (0 disables anisotropic filtering)
    pub anisotropy: f32,
    /// Number of mip levels the sampler may read (0 = all)
    pub mip_levels: u32,
}

impl SamplerDesc {
    /// Same filter and repeat mode on every axis
    pub fn uniform(filter: TextureFilter, repeat: TextureRepeat, anisotropy: f32) -> Self {
        Self {
            filter_min: filter,
            filter_mag: filter,
            repeat_u: repeat,
            repeat_v: repeat,
            repeat_w: repeat,
            anisotropy,
            mip_levels: 0,
        }
    }
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self::uniform(TextureFilter::Linear, TextureRepeat::Repeat, 0.0)
    }
}

// ===== GENERIC SAMPLERS =====

/// Fixed set of samplers created at renderer startup
///
/// Every combination of {Nearest, Linear} x {Repeat, MirroredRepeat,
/// ClampToEdge, ClampToBorder} x {anisotropic, no anisotropy}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericSampler {
    LinearRepeat,
    LinearRepeatMirrored,
    LinearClamp,
    LinearClampBorder,
    NearestRepeat,
    NearestRepeatMirrored,
    NearestClamp,
    NearestClampBorder,
    LinearRepeatNoAniso,
    LinearRepeatMirroredNoAniso,
    LinearClampNoAniso,
    LinearClampBorderNoAniso,
    NearestRepeatNoAniso,
    NearestRepeatMirroredNoAniso,
    NearestClampNoAniso,
    NearestClampBorderNoAniso,
}

impl GenericSampler {
    pub const COUNT: usize = 16;

    /// Every generic sampler, in table order
    pub const ALL: [GenericSampler; Self::COUNT] = [
        GenericSampler::LinearRepeat,
        GenericSampler::LinearRepeatMirrored,
        GenericSampler::LinearClamp,
        GenericSampler::LinearClampBorder,
        GenericSampler::NearestRepeat,
        GenericSampler::NearestRepeatMirrored,
        GenericSampler::NearestClamp,
        GenericSampler::NearestClampBorder,
        GenericSampler::LinearRepeatNoAniso,
        GenericSampler::LinearRepeatMirroredNoAniso,
        GenericSampler::LinearClampNoAniso,
        GenericSampler::LinearClampBorderNoAniso,
        GenericSampler::NearestRepeatNoAniso,
        GenericSampler::NearestRepeatMirroredNoAniso,
        GenericSampler::NearestClampNoAniso,
        GenericSampler::NearestClampBorderNoAniso,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Debug name of the sampler
    pub fn name(self) -> &'static str {
        match self {
            GenericSampler::LinearRepeat => "__generic_linear_repeat__",
            GenericSampler::LinearRepeatMirrored => "__generic_linear_repeat_mirrored__",
            GenericSampler::LinearClamp => "__generic_linear_clamp__",
            GenericSampler::LinearClampBorder => "__generic_linear_clamp_border__",
            GenericSampler::NearestRepeat => "__generic_nearest_repeat__",
            GenericSampler::NearestRepeatMirrored => "__generic_nearest_repeat_mirrored__",
            GenericSampler::NearestClamp => "__generic_nearest_clamp__",
            GenericSampler::NearestClampBorder => "__generic_nearest_clamp_border__",
            GenericSampler::LinearRepeatNoAniso => "__generic_linear_repeat_no_aniso__",
            GenericSampler::LinearRepeatMirroredNoAniso => "__generic_linear_repeat_mirrored_no_aniso__",
            GenericSampler::LinearClampNoAniso => "__generic_linear_clamp_no_aniso__",
            GenericSampler::LinearClampBorderNoAniso => "__generic_linear_clamp_border_no_aniso__",
            GenericSampler::NearestRepeatNoAniso => "__generic_nearest_repeat_no_aniso__",
            GenericSampler::NearestRepeatMirroredNoAniso => "__generic_nearest_repeat_mirrored_no_aniso__",
            GenericSampler::NearestClampNoAniso => "__generic_nearest_clamp_no_aniso__",
            GenericSampler::NearestClampBorderNoAniso => "__generic_nearest_clamp_border_no_aniso__",
        }
    }

    pub fn filter(self) -> TextureFilter {
        if self.index() % 8 < 4 { TextureFilter::Linear } else { TextureFilter::Nearest }
    }

    pub fn repeat(self) -> TextureRepeat {
        match self.index() % 4 {
            0 => TextureRepeat::Repeat,
            1 => TextureRepeat::MirroredRepeat,
            2 => TextureRepeat::ClampToEdge,
            _ => TextureRepeat::ClampToBorder,
        }
    }

    pub fn is_anisotropic(self) -> bool {
        self.index() < 8
    }

    /// Descriptor of this sampler given the backend's maximum anisotropy
    ///
    /// A backend reporting 0 gets anisotropy 0 for every variant.
    pub fn desc(self, max_anisotropy: f32) -> SamplerDesc {
        let anisotropy = if self.is_anisotropic() { max_anisotropy.max(0.0) } else { 0.0 };
        SamplerDesc::uniform(self.filter(), self.repeat(), anisotropy)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
