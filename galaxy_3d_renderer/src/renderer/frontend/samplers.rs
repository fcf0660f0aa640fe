/// Sampler operations of the frontend

use super::{RendererFrontend, SamplerRecord, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::handle::SamplerHandle;
use crate::renderer::sampler::{GenericSampler, SamplerDesc};

impl RendererFrontend {
    /// Create a sampler
    pub fn sampler_acquire(&mut self, name: &str, desc: SamplerDesc) -> Galaxy3dResult<SamplerHandle> {
        if desc.anisotropy < 0.0 {
            crate::engine_bail_arg!(SOURCE, "Sampler '{}' has negative anisotropy {}", name, desc.anisotropy);
        }
        if let Err(error) = self.samplers.can_insert(name) {
            crate::engine_error!(SOURCE, "Cannot create sampler '{}': {}", name, error);
            return Err(error);
        }

        let backend = self.backend.sampler_create(name, &desc)?;
        self.samplers.insert(name, SamplerRecord { desc, backend })
    }

    /// Release a sampler and reset the caller's handle to INVALID (no-op when already INVALID)
    pub fn sampler_release(&mut self, handle: &mut SamplerHandle) {
        if !handle.is_valid() {
            return;
        }
        let handle = handle.take();
        match self.samplers.remove(handle) {
            Some(record) => self.backend.sampler_destroy(record.backend),
            None => crate::engine_warn!(SOURCE, "Release of {} which is not a live sampler", handle),
        }
    }

    /// Recreate a sampler with new parameters; the handle stays the same
    pub fn sampler_refresh(&mut self, handle: SamplerHandle, desc: SamplerDesc) -> Galaxy3dResult<()> {
        let Some(record) = self.samplers.get_mut(handle) else {
            crate::engine_bail_resource!(SOURCE, "{} is not a live sampler", handle);
        };
        self.backend.sampler_refresh(record.backend, &desc)?;
        record.desc = desc;
        Ok(())
    }

    pub fn sampler_info(&self, handle: SamplerHandle) -> Galaxy3dResult<&SamplerDesc> {
        match self.samplers.get(handle) {
            Some(record) => Ok(&record.desc),
            None => {
                crate::engine_bail_resource!(SOURCE, "{} is not a live sampler", handle);
            }
        }
    }

    pub fn sampler_handle_get(&self, name: &str) -> Option<SamplerHandle> {
        self.samplers.lookup(name)
    }

    /// Handle of one of the samplers created at startup
    pub fn generic_sampler_get(&self, sampler: GenericSampler) -> SamplerHandle {
        self.generic_samplers[sampler.index()]
    }

    pub(super) fn create_generic_samplers(&mut self) -> Galaxy3dResult<()> {
        let max_anisotropy = self.backend.max_anisotropy_get();
        if max_anisotropy <= 0.0 {
            crate::engine_warn!(SOURCE, "Backend has no anisotropic filtering, anisotropic samplers degrade to 0");
        }

        for sampler in GenericSampler::ALL {
            let handle = self.sampler_acquire(sampler.name(), sampler.desc(max_anisotropy))?;
            self.generic_samplers[sampler.index()] = handle;
        }
        Ok(())
    }
}
