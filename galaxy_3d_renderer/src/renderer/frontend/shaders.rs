/// Shader operations of the frontend
///
/// Uniform writes go to the resource set bound for the uniform's update
/// frequency. Per-frame uniforms always use set 0; per-group and per-draw
/// sets are acquired from the shader and bound with `shader_bind`.

use rustc_hash::FxHashSet;

use super::{RendererFrontend, ShaderRecord, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::handle::{HandleTable, ShaderHandle};
use crate::renderer::shader::{ShaderConfig, ShaderUpdateFrequency};

fn record(shaders: &HandleTable<ShaderHandle, ShaderRecord>, handle: ShaderHandle) -> Galaxy3dResult<&ShaderRecord> {
    match shaders.get(handle) {
        Some(record) => Ok(record),
        None => {
            crate::engine_bail_resource!(SOURCE, "{} is not a live shader", handle);
        }
    }
}

fn record_mut(shaders: &mut HandleTable<ShaderHandle, ShaderRecord>, handle: ShaderHandle) -> Galaxy3dResult<&mut ShaderRecord> {
    match shaders.get_mut(handle) {
        Some(record) => Ok(record),
        None => {
            crate::engine_bail_resource!(SOURCE, "{} is not a live shader", handle);
        }
    }
}

impl ShaderRecord {
    fn live_ids(&mut self, frequency: ShaderUpdateFrequency) -> Option<&mut FxHashSet<u32>> {
        match frequency {
            ShaderUpdateFrequency::PerFrame => None,
            ShaderUpdateFrequency::PerGroup => Some(&mut self.groups),
            ShaderUpdateFrequency::PerDraw => Some(&mut self.draws),
        }
    }

    fn limit(&self, frequency: ShaderUpdateFrequency) -> u32 {
        match frequency {
            ShaderUpdateFrequency::PerFrame => 1,
            ShaderUpdateFrequency::PerGroup => self.config.max_groups,
            ShaderUpdateFrequency::PerDraw => self.config.max_per_draw,
        }
    }
}

impl RendererFrontend {
    /// Create a shader from pre-compiled stages
    pub fn shader_create(&mut self, config: ShaderConfig) -> Galaxy3dResult<ShaderHandle> {
        if let Err(error) = config.validate().and_then(|_| self.shaders.can_insert(&config.name)) {
            crate::engine_error!(SOURCE, "Cannot create shader '{}': {}", config.name, error);
            return Err(error);
        }

        let backend = self.backend.shader_create(&config)?;
        let name = config.name.clone();
        let handle = self.shaders.insert(&name, ShaderRecord {
            config,
            backend,
            bound: [Some(0), None, None],
            groups: FxHashSet::default(),
            draws: FxHashSet::default(),
        })?;
        crate::engine_debug!(SOURCE, "Shader '{}' created as {}", name, handle);
        Ok(handle)
    }

    /// Destroy a shader and reset the caller's handle (no-op when already INVALID)
    pub fn shader_destroy(&mut self, handle: &mut ShaderHandle) {
        if !handle.is_valid() {
            return;
        }
        let handle = handle.take();
        match self.shaders.remove(handle) {
            Some(record) => self.backend.shader_destroy(record.backend),
            None => crate::engine_warn!(SOURCE, "Destroy of {} which is not a live shader", handle),
        }
    }

    /// Rebuild a shader's pipelines, optionally from new stage code
    ///
    /// Uniform layout changes are refused: live resource sets depend on it.
    pub fn shader_reload(&mut self, handle: ShaderHandle, config: Option<ShaderConfig>) -> Galaxy3dResult<()> {
        let backend = &mut self.backend;
        let record = record_mut(&mut self.shaders, handle)?;

        match config {
            None => backend.shader_reload(record.backend, &record.config),
            Some(config) => {
                if let Err(error) = config.validate() {
                    crate::engine_error!(SOURCE, "Cannot reload shader '{}': {}", record.config.name, error);
                    return Err(error);
                }
                if config.name != record.config.name || config.uniforms != record.config.uniforms {
                    crate::engine_bail_arg!(SOURCE,
                        "Reload of shader '{}' cannot change its name or uniforms", record.config.name);
                }
                backend.shader_reload(record.backend, &config)?;
                record.config = config;
                Ok(())
            }
        }
    }

    /// Bind the shader's pipeline for subsequent draws
    pub fn shader_use(&mut self, handle: ShaderHandle) -> Galaxy3dResult<()> {
        let backend = record(&self.shaders, handle)?.backend;
        self.backend.shader_use(backend)
    }

    /// Index of the uniform called `name`
    pub fn shader_uniform_index(&self, handle: ShaderHandle, name: &str) -> Galaxy3dResult<u16> {
        let record = record(&self.shaders, handle)?;
        match record.config.uniform_index(name) {
            Some(index) => Ok(index),
            None => {
                crate::engine_bail_arg!(SOURCE, "Shader '{}' has no uniform '{}'", record.config.name, name);
            }
        }
    }

    pub fn shader_handle_get(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.lookup(name)
    }

    pub fn shader_config(&self, handle: ShaderHandle) -> Galaxy3dResult<&ShaderConfig> {
        Ok(&record(&self.shaders, handle)?.config)
    }

    pub fn shader_per_group_acquire(&mut self, handle: ShaderHandle) -> Galaxy3dResult<u32> {
        self.shader_resources_acquire(handle, ShaderUpdateFrequency::PerGroup)
    }

    pub fn shader_per_group_release(&mut self, handle: ShaderHandle, group_id: u32) -> Galaxy3dResult<()> {
        self.shader_resources_release(handle, ShaderUpdateFrequency::PerGroup, group_id)
    }

    pub fn shader_per_draw_acquire(&mut self, handle: ShaderHandle) -> Galaxy3dResult<u32> {
        self.shader_resources_acquire(handle, ShaderUpdateFrequency::PerDraw)
    }

    pub fn shader_per_draw_release(&mut self, handle: ShaderHandle, draw_id: u32) -> Galaxy3dResult<()> {
        self.shader_resources_release(handle, ShaderUpdateFrequency::PerDraw, draw_id)
    }

    fn shader_resources_acquire(&mut self, handle: ShaderHandle, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<u32> {
        let backend = &mut self.backend;
        let record = record_mut(&mut self.shaders, handle)?;
        let limit = record.limit(frequency);
        let resource = record.backend;
        let Some(live) = record.live_ids(frequency) else {
            crate::engine_bail_arg!(SOURCE, "Per-frame resources are owned by the shader itself");
        };
        if live.len() as u32 >= limit {
            crate::engine_bail_arg!(SOURCE,
                "{} has reached its limit of {} {:?} resource sets", handle, limit, frequency);
        }

        let id = backend.shader_resources_acquire(resource, frequency)?;
        live.insert(id);
        Ok(id)
    }

    fn shader_resources_release(&mut self, handle: ShaderHandle, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()> {
        let backend = &mut self.backend;
        let record = record_mut(&mut self.shaders, handle)?;
        let resource = record.backend;
        let removed = record.live_ids(frequency).is_some_and(|live| live.remove(&id));
        if !removed {
            crate::engine_bail_arg!(SOURCE, "{:?} resource set {} is not live on {}", frequency, id, handle);
        }

        if record.bound[frequency.index()] == Some(id) {
            record.bound[frequency.index()] = None;
        }
        backend.shader_resources_release(resource, frequency, id);
        Ok(())
    }

    /// Direct uniform writes at `frequency` to resource set `id`
    ///
    /// Per-frame binds always use set 0.
    pub fn shader_bind(&mut self, handle: ShaderHandle, frequency: ShaderUpdateFrequency, id: u32) -> Galaxy3dResult<()> {
        let backend = &mut self.backend;
        let record = record_mut(&mut self.shaders, handle)?;
        let resource = record.backend;

        let id = match record.live_ids(frequency) {
            None => 0,
            Some(live) if live.contains(&id) => id,
            Some(_) => {
                crate::engine_bail_arg!(SOURCE, "{:?} resource set {} is not live on {}", frequency, id, handle);
            }
        };

        backend.shader_bind(resource, frequency, id)?;
        record.bound[frequency.index()] = Some(id);
        Ok(())
    }

    /// Stage a uniform value; `data` must match the declared uniform size
    pub fn shader_uniform_set(&mut self, handle: ShaderHandle, uniform_index: u16, data: &[u8]) -> Galaxy3dResult<()> {
        let record = record(&self.shaders, handle)?;
        let Some(uniform) = record.config.uniforms.get(uniform_index as usize) else {
            crate::engine_bail_arg!(SOURCE,
                "Shader '{}' has no uniform at index {}", record.config.name, uniform_index);
        };
        if data.len() != uniform.size as usize {
            crate::engine_bail_arg!(SOURCE,
                "Uniform '{}' of shader '{}' is {} bytes, got {}",
                uniform.name, record.config.name, uniform.size, data.len());
        }
        if record.bound[uniform.frequency.index()].is_none() {
            crate::engine_bail_arg!(SOURCE,
                "Uniform '{}' of shader '{}' set with no {:?} resource set bound",
                uniform.name, record.config.name, uniform.frequency);
        }

        let (resource, frequency) = (record.backend, uniform.frequency);
        self.backend.shader_uniform_set(resource, frequency, uniform_index, data)
    }

    /// Upload and bind every staged uniform of `frequency`
    pub fn shader_apply(&mut self, handle: ShaderHandle, frequency: ShaderUpdateFrequency) -> Galaxy3dResult<()> {
        let record = record(&self.shaders, handle)?;
        if record.bound[frequency.index()].is_none() {
            crate::engine_bail_arg!(SOURCE,
                "Apply of {:?} uniforms of shader '{}' with no resource set bound", frequency, record.config.name);
        }
        let resource = record.backend;
        self.backend.shader_apply(resource, frequency)
    }
}
