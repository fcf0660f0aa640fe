/// Shader - resource sets and uniform storage of a headless shader
///
/// Stage code is kept as opaque bytes. Uniform values are staged per
/// (frequency, resource set) and become visible on `apply`.

use rustc_hash::{FxHashMap, FxHashSet};

use galaxy_3d_renderer::galaxy3d::Galaxy3dResult;
use galaxy_3d_renderer::galaxy3d::render::{ShaderConfig, ShaderUpdateFrequency};
use galaxy_3d_renderer::engine_bail;

use crate::SOURCE;

/// (frequency index, resource set id, uniform index)
type UniformSlot = (usize, u32, u16);

/// Headless shader
#[derive(Debug)]
pub(crate) struct Shader {
    pub(crate) config: ShaderConfig,
    next_set: u32,
    live: [FxHashSet<u32>; 3],
    bound: [u32; 3],
    staged: FxHashMap<UniformSlot, Vec<u8>>,
    applied: FxHashMap<UniformSlot, Vec<u8>>,
}

impl Shader {
    pub(crate) fn new(config: &ShaderConfig) -> Self {
        let mut live: [FxHashSet<u32>; 3] = Default::default();
        // Set 0 of the per-frame frequency belongs to the shader itself
        live[ShaderUpdateFrequency::PerFrame.index()].insert(0);
        Self {
            config: config.clone(),
            next_set: 1,
            live,
            bound: [0; 3],
            staged: FxHashMap::default(),
            applied: FxHashMap::default(),
        }
    }

    pub(crate) fn acquire(&mut self, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<u32> {
        if frequency == ShaderUpdateFrequency::PerFrame {
            engine_bail!(SOURCE, "Shader '{}': per-frame resource sets cannot be acquired", self.config.name);
        }
        let id = self.next_set;
        self.next_set += 1;
        self.live[frequency.index()].insert(id);
        Ok(id)
    }

    pub(crate) fn release(&mut self, frequency: ShaderUpdateFrequency, id: u32) {
        let index = frequency.index();
        if frequency == ShaderUpdateFrequency::PerFrame || !self.live[index].remove(&id) {
            return;
        }
        self.staged.retain(|slot, _| !(slot.0 == index && slot.1 == id));
        self.applied.retain(|slot, _| !(slot.0 == index && slot.1 == id));
    }

    pub(crate) fn bind(&mut self, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()> {
        if !self.live[frequency.index()].contains(&id) {
            engine_bail!(SOURCE,
                "Shader '{}': {:?} resource set {} is not live", self.config.name, frequency, id);
        }
        self.bound[frequency.index()] = id;
        Ok(())
    }

    pub(crate) fn uniform_set(&mut self, frequency: ShaderUpdateFrequency, uniform_index: u16, data: &[u8]) -> Galaxy3dResult<()> {
        let Some(uniform) = self.config.uniforms.get(uniform_index as usize) else {
            engine_bail!(SOURCE, "Shader '{}' has no uniform {}", self.config.name, uniform_index);
        };
        if uniform.frequency != frequency || uniform.size as usize != data.len() {
            engine_bail!(SOURCE,
                "Shader '{}': uniform '{}' is {:?}/{} bytes, got {:?}/{} bytes",
                self.config.name, uniform.name, uniform.frequency, uniform.size, frequency, data.len());
        }

        let slot = (frequency.index(), self.bound[frequency.index()], uniform_index);
        self.staged.insert(slot, data.to_vec());
        Ok(())
    }

    /// Publish the staged uniforms of the bound set; returns how many were applied
    pub(crate) fn apply(&mut self, frequency: ShaderUpdateFrequency) -> usize {
        let (index, set) = (frequency.index(), self.bound[frequency.index()]);
        let slots: Vec<UniformSlot> = self.staged.keys()
            .filter(|slot| slot.0 == index && slot.1 == set)
            .copied()
            .collect();
        for slot in &slots {
            if let Some(value) = self.staged.remove(slot) {
                self.applied.insert(*slot, value);
            }
        }
        slots.len()
    }

    /// Last applied value of a uniform in a resource set
    pub(crate) fn applied_uniform(&self, frequency: ShaderUpdateFrequency, set: u32, uniform_index: u16) -> Option<&[u8]> {
        self.applied.get(&(frequency.index(), set, uniform_index)).map(Vec::as_slice)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_shader_tests.rs"]
mod tests;
