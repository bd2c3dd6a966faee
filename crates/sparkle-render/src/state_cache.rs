//! Render state cache.
//!
//! Tracks what the driver has bound at each binding point and drops bind
//! calls that would not change it. Every bind must go through the cache;
//! after anything else touches driver state, call
//! [`invalidate_all`](RenderStateCache::invalidate_all).

use std::fmt;
use std::sync::Arc;

use sparkle_core::alloc::HashMap;
use sparkle_core::profiling::profile_function;
use sparkle_test_utils::{BindTarget, BufferUsage, GraphicsDriver};

use crate::error::{GpuError, GpuResult};
use crate::handle::GpuHandle;
use crate::manager::{BindInfo, ResourceManager};
use crate::resource::{ResourceId, ResourceKind};
use crate::thread::RenderThread;

/// Uniform buffer binding points tracked per context.
pub const UNIFORM_BUFFER_UNITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Texture,
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    Program,
}

impl BindingKind {
    fn accepts(self, info: &BindInfo) -> bool {
        match self {
            BindingKind::Texture => info.kind == ResourceKind::Texture,
            BindingKind::Program => info.kind == ResourceKind::Program,
            BindingKind::VertexBuffer => {
                info.kind == ResourceKind::Buffer && info.usage.contains(BufferUsage::VERTEX)
            }
            BindingKind::IndexBuffer => {
                info.kind == ResourceKind::Buffer && info.usage.contains(BufferUsage::INDEX)
            }
            BindingKind::UniformBuffer => {
                info.kind == ResourceKind::Buffer && info.usage.contains(BufferUsage::UNIFORM)
            }
        }
    }
}

/// A binding point: kind plus unit index for multi-unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingSlot {
    pub kind: BindingKind,
    pub unit: u32,
}

impl BindingSlot {
    pub const fn texture(unit: u32) -> Self {
        Self {
            kind: BindingKind::Texture,
            unit,
        }
    }

    pub const fn uniform_buffer(unit: u32) -> Self {
        Self {
            kind: BindingKind::UniformBuffer,
            unit,
        }
    }

    pub const fn vertex_buffer() -> Self {
        Self {
            kind: BindingKind::VertexBuffer,
            unit: 0,
        }
    }

    pub const fn index_buffer() -> Self {
        Self {
            kind: BindingKind::IndexBuffer,
            unit: 0,
        }
    }

    pub const fn program() -> Self {
        Self {
            kind: BindingKind::Program,
            unit: 0,
        }
    }

    pub fn target(&self) -> BindTarget {
        match self.kind {
            BindingKind::Texture => BindTarget::Texture(self.unit),
            BindingKind::VertexBuffer => BindTarget::VertexBuffer,
            BindingKind::IndexBuffer => BindTarget::IndexBuffer,
            BindingKind::UniformBuffer => BindTarget::UniformBuffer(self.unit),
            BindingKind::Program => BindTarget::Program,
        }
    }
}

impl fmt::Display for BindingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BindingKind::Texture => write!(f, "texture unit {}", self.unit),
            BindingKind::UniformBuffer => write!(f, "uniform buffer unit {}", self.unit),
            BindingKind::VertexBuffer => f.write_str("vertex buffer"),
            BindingKind::IndexBuffer => f.write_str("index buffer"),
            BindingKind::Program => f.write_str("program"),
        }
    }
}

/// What the cache believes is bound at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Not confirmed since creation or the last invalidation.
    #[default]
    Unknown,
    /// Known to have nothing bound.
    Empty,
    Bound(ResourceId),
}

/// Driver binds issued versus elided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindStats {
    pub issued: u64,
    pub elided: u64,
}

/// Cache of bound driver state, owned by the render thread.
pub struct RenderStateCache {
    manager: ResourceManager,
    driver: Arc<dyn GraphicsDriver>,
    thread: RenderThread,
    texture_units: u32,
    /// Absent slots are [`SlotState::Unknown`].
    slots: HashMap<BindingSlot, SlotState>,
    /// Tick of the last use of each texture unit, for LRU replacement.
    unit_last_used: Vec<u64>,
    tick: u64,
    epoch: u32,
    stats: BindStats,
}

impl RenderStateCache {
    pub(crate) fn new(manager: ResourceManager, texture_units: u32) -> Self {
        let driver = Arc::clone(manager.driver());
        let texture_units = texture_units.min(driver.max_texture_units());
        let epoch = manager.epoch();
        Self {
            thread: manager.render_thread(),
            manager,
            driver,
            texture_units,
            slots: HashMap::new(),
            unit_last_used: vec![0; texture_units as usize],
            tick: 0,
            epoch,
            stats: BindStats::default(),
        }
    }

    pub fn texture_units(&self) -> u32 {
        self.texture_units
    }

    /// Bind `handle` at `slot`. Returns whether a driver call was issued.
    pub fn bind(&mut self, slot: BindingSlot, handle: &GpuHandle) -> GpuResult<bool> {
        profile_function!();
        self.thread.check()?;
        self.check_slot(slot)?;
        self.sync_epoch();

        let id = handle.id();
        let info = self.manager.bind_info(handle)?;
        if !slot.kind.accepts(&info) {
            return Err(GpuError::IncompatibleBinding {
                slot,
                kind: info.kind,
            });
        }

        self.touch(slot);
        if self.slots.get(&slot) == Some(&SlotState::Bound(id)) {
            self.stats.elided += 1;
            tracing::trace!("Elided bind of {} to {}", id, slot);
            return Ok(false);
        }

        self.driver.bind(slot.target(), Some(info.object));
        self.slots.insert(slot, SlotState::Bound(id));
        self.stats.issued += 1;
        Ok(true)
    }

    /// Clear `slot`. Returns whether a driver call was issued.
    pub fn unbind(&mut self, slot: BindingSlot) -> GpuResult<bool> {
        self.thread.check()?;
        self.check_slot(slot)?;
        self.sync_epoch();

        if self.slots.get(&slot) == Some(&SlotState::Empty) {
            self.stats.elided += 1;
            tracing::trace!("Elided unbind of {}", slot);
            return Ok(false);
        }
        self.driver.bind(slot.target(), None);
        self.slots.insert(slot, SlotState::Empty);
        self.stats.issued += 1;
        Ok(true)
    }

    /// Bind a texture to some unit and return the unit.
    ///
    /// Picks, in order: a unit already holding the texture, the lowest unit
    /// that is unknown or empty, the least recently used unit.
    pub fn bind_texture(&mut self, handle: &GpuHandle) -> GpuResult<u32> {
        self.thread.check()?;
        self.sync_epoch();
        let id = handle.id();

        let unit = (0..self.texture_units)
            .find(|&unit| self.state_of(BindingSlot::texture(unit)) == SlotState::Bound(id))
            .or_else(|| {
                (0..self.texture_units)
                    .find(|&unit| !matches!(self.state_of(BindingSlot::texture(unit)), SlotState::Bound(_)))
            })
            .or_else(|| self.least_recently_used_unit())
            .ok_or(GpuError::InvalidSlot {
                slot: BindingSlot::texture(0),
                available: self.texture_units,
            })?;

        self.bind(BindingSlot::texture(unit), handle)?;
        Ok(unit)
    }

    /// What the cache believes is bound at `slot`.
    ///
    /// Slots holding a resource that has since been destroyed read as
    /// unknown.
    pub fn slot_state(&self, slot: BindingSlot) -> SlotState {
        if self.manager.epoch() != self.epoch {
            return SlotState::Unknown;
        }
        self.state_of(slot)
    }

    /// The resource bound at `slot`, if known.
    pub fn current_binding(&self, slot: BindingSlot) -> Option<ResourceId> {
        match self.slot_state(slot) {
            SlotState::Bound(id) => Some(id),
            _ => None,
        }
    }

    /// Forget everything; the next bind of every slot reaches the driver.
    pub fn invalidate_all(&mut self) {
        tracing::debug!("Invalidating {} cached bindings", self.slots.len());
        self.slots.clear();
    }

    pub fn stats(&self) -> BindStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BindStats::default();
    }

    fn state_of(&self, slot: BindingSlot) -> SlotState {
        match self.slots.get(&slot).copied().unwrap_or_default() {
            SlotState::Bound(id) if !self.manager.is_live(id) => SlotState::Unknown,
            state => state,
        }
    }

    fn check_slot(&self, slot: BindingSlot) -> GpuResult<()> {
        let available = match slot.kind {
            BindingKind::Texture => self.texture_units,
            BindingKind::UniformBuffer => UNIFORM_BUFFER_UNITS,
            _ => 1,
        };
        if slot.unit >= available {
            return Err(GpuError::InvalidSlot { slot, available });
        }
        Ok(())
    }

    fn sync_epoch(&mut self) {
        let epoch = self.manager.epoch();
        if epoch != self.epoch {
            tracing::warn!("Context epoch changed ({} -> {}), dropping cached bindings", self.epoch, epoch);
            self.epoch = epoch;
            self.invalidate_all();
        }
    }

    fn touch(&mut self, slot: BindingSlot) {
        if slot.kind == BindingKind::Texture {
            self.tick += 1;
            if let Some(last) = self.unit_last_used.get_mut(slot.unit as usize) {
                *last = self.tick;
            }
        }
    }

    fn least_recently_used_unit(&self) -> Option<u32> {
        self.unit_last_used
            .iter()
            .enumerate()
            .min_by_key(|&(_, &tick)| tick)
            .map(|(unit, _)| unit as u32)
    }
}

impl fmt::Debug for RenderStateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStateCache")
            .field("texture_units", &self.texture_units)
            .field("known_slots", &self.slots.len())
            .field("stats", &self.stats)
            .finish()
    }
}
