/// Shader configuration: stages, uniforms and update frequencies

use bitflags::bitflags;
use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::renderer::state::CullMode;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Geometry shader
    Geometry,
    /// Fragment/Pixel shader
    Fragment,
    /// Compute shader
    Compute,
}

/// One pre-compiled stage of a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageConfig {
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
    /// Compiled bytecode, opaque to the frontend
    pub code: Vec<u8>,
}

/// How often a uniform changes, which decides where it is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderUpdateFrequency {
    /// Once per frame (camera, lights)
    PerFrame,
    /// Once per group of draws sharing a material
    PerGroup,
    /// Once per draw (model matrix)
    PerDraw,
}

impl ShaderUpdateFrequency {
    pub const ALL: [ShaderUpdateFrequency; 3] = [
        ShaderUpdateFrequency::PerFrame,
        ShaderUpdateFrequency::PerGroup,
        ShaderUpdateFrequency::PerDraw,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A uniform declared by a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderUniform {
    pub name: String,
    pub frequency: ShaderUpdateFrequency,
    /// Size in bytes of the value `shader_uniform_set` expects
    pub size: u32,
}

impl ShaderUniform {
    pub fn new(name: &str, frequency: ShaderUpdateFrequency, size: u32) -> Self {
        Self { name: name.to_string(), frequency, size }
    }
}

bitflags! {
    /// Fixed-function state baked into a shader pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderFlags: u32 {
        const DEPTH_TEST = 1 << 0;
        const DEPTH_WRITE = 1 << 1;
        const STENCIL_TEST = 1 << 2;
        const STENCIL_WRITE = 1 << 3;
        const COLOUR_READ = 1 << 4;
        const COLOUR_WRITE = 1 << 5;
        const WIREFRAME = 1 << 6;
    }
}

/// Everything needed to create a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderConfig {
    pub name: String,
    pub stages: Vec<ShaderStageConfig>,
    pub uniforms: Vec<ShaderUniform>,
    pub flags: ShaderFlags,
    pub cull_mode: CullMode,
    /// Maximum number of live per-group resource sets
    pub max_groups: u32,
    /// Maximum number of live per-draw resource sets
    pub max_per_draw: u32,
}

impl ShaderConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stages: Vec::new(),
            uniforms: Vec::new(),
            flags: ShaderFlags::DEPTH_TEST | ShaderFlags::DEPTH_WRITE | ShaderFlags::COLOUR_WRITE,
            cull_mode: CullMode::Back,
            max_groups: 1024,
            max_per_draw: 4096,
        }
    }

    /// Append a stage (builder style)
    pub fn with_stage(mut self, stage: ShaderStage, code: Vec<u8>) -> Self {
        self.stages.push(ShaderStageConfig { stage, entry_point: "main".to_string(), code });
        self
    }

    /// Append a uniform (builder style)
    pub fn with_uniform(mut self, name: &str, frequency: ShaderUpdateFrequency, size: u32) -> Self {
        self.uniforms.push(ShaderUniform::new(name, frequency, size));
        self
    }

    /// Index of the uniform called `name`
    pub fn uniform_index(&self, name: &str) -> Option<u16> {
        self.uniforms.iter().position(|u| u.name == name).map(|i| i as u16)
    }

    /// Check the configuration is usable before it reaches a backend
    pub fn validate(&self) -> Galaxy3dResult<()> {
        if self.stages.is_empty() {
            return Err(Galaxy3dError::InvalidArgument(format!("Shader '{}' has no stage", self.name)));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.code.is_empty() {
                return Err(Galaxy3dError::InvalidArgument(format!(
                    "Shader '{}' stage {:?} has no code", self.name, stage.stage
                )));
            }
            if self.stages[..i].iter().any(|s| s.stage == stage.stage) {
                return Err(Galaxy3dError::InvalidArgument(format!(
                    "Shader '{}' declares stage {:?} twice", self.name, stage.stage
                )));
            }
        }
        for (i, uniform) in self.uniforms.iter().enumerate() {
            if uniform.size == 0 {
                return Err(Galaxy3dError::InvalidArgument(format!(
                    "Shader '{}' uniform '{}' has size 0", self.name, uniform.name
                )));
            }
            if self.uniforms[..i].iter().any(|u| u.name == uniform.name) {
                return Err(Galaxy3dError::InvalidArgument(format!(
                    "Shader '{}' declares uniform '{}' twice", self.name, uniform.name
                )));
            }
        }
        if self.uniforms.len() >= u16::MAX as usize {
            return Err(Galaxy3dError::InvalidArgument(format!("Shader '{}' has too many uniforms", self.name)));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
