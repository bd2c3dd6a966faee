use std::sync::Arc;

use sparkle_assets::{AssetKind, NormalizedPayload, Registry, Resource};
use sparkle_test_utils::GraphicsDriver;

use crate::error::GpuResult;
use crate::handle::GpuHandle;
use crate::manager::ResourceManager;
use crate::resource::ResourceId;
use crate::state_cache::{BindingSlot, RenderStateCache, SlotState};

/// Configuration for a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Texture units managed by the state cache. Clamped to what the driver
    /// reports.
    pub texture_units: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { texture_units: 16 }
    }
}

impl RenderConfig {
    pub fn with_texture_units(mut self, texture_units: u32) -> Self {
        self.texture_units = texture_units;
        self
    }
}

/// Render-thread owner of the resource manager and the state cache.
///
/// Create it on the thread that owns the graphics context; every call that
/// reaches the driver checks that it is still on that thread.
///
/// # Example
///
/// ```ignore
/// let mut ctx = RenderContext::new(driver, RenderConfig::default());
/// let logo = ctx.acquire_named(&registry, "images/logo")?;
/// let unit = ctx.bind_texture(&logo)?;
/// ```
pub struct RenderContext {
    manager: ResourceManager,
    state: RenderStateCache,
    config: RenderConfig,
}

impl RenderContext {
    pub fn new(driver: Arc<dyn GraphicsDriver>, config: RenderConfig) -> Self {
        let manager = ResourceManager::new(driver);
        let state = RenderStateCache::new(manager.clone(), config.texture_units);
        tracing::info!(
            "Render context created with {} texture units",
            state.texture_units()
        );
        Self {
            manager,
            state,
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }

    pub fn state(&self) -> &RenderStateCache {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderStateCache {
        &mut self.state
    }

    pub fn acquire(&self, resource: &Resource<'_>) -> GpuResult<GpuHandle> {
        self.manager.acquire(resource)
    }

    /// Look `identifier` up in `registry` and materialize it.
    pub fn acquire_named(&self, registry: &Registry, identifier: &str) -> GpuResult<GpuHandle> {
        let resource = registry.lookup(identifier)?;
        self.manager.acquire(&resource)
    }

    pub fn acquire_raw(&self, kind: AssetKind, payload: &NormalizedPayload) -> GpuResult<GpuHandle> {
        self.manager.acquire_raw(kind, payload)
    }

    pub fn acquire_program(&self, shaders: &[&GpuHandle]) -> GpuResult<GpuHandle> {
        self.manager.acquire_program(shaders)
    }

    pub fn release(&self, handle: GpuHandle) -> GpuResult<()> {
        self.manager.release(handle)
    }

    pub fn bind(&mut self, slot: BindingSlot, handle: &GpuHandle) -> GpuResult<bool> {
        self.state.bind(slot, handle)
    }

    pub fn unbind(&mut self, slot: BindingSlot) -> GpuResult<bool> {
        self.state.unbind(slot)
    }

    pub fn bind_texture(&mut self, handle: &GpuHandle) -> GpuResult<u32> {
        self.state.bind_texture(handle)
    }

    pub fn current_binding(&self, slot: BindingSlot) -> Option<ResourceId> {
        self.state.current_binding(slot)
    }

    pub fn slot_state(&self, slot: BindingSlot) -> SlotState {
        self.state.slot_state(slot)
    }

    pub fn invalidate_all(&mut self) {
        self.state.invalidate_all();
    }

    /// Drain releases queued from other threads. Call once per frame.
    pub fn maintain(&self) -> GpuResult<usize> {
        self.manager.maintain()
    }

    /// The driver lost its context: forget every resource and binding.
    pub fn handle_context_lost(&mut self) -> GpuResult<()> {
        self.manager.handle_context_lost()?;
        self.state.invalidate_all();
        Ok(())
    }
}
