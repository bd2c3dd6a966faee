//! GPU resource manager.
//!
//! Materializes registry resources and runtime payloads into driver objects,
//! deduplicated by content hash and reference counted through [`GpuHandle`].
//!
//! ```text
//! acquire(resource) --hit--> ref_count += 1, no driver call
//!                   --miss-> create, upload, configure, ref_count = 1
//! drop(handle)      -------> ref_count -= 1, destroy at zero
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use sparkle_assets::payload::font_parts;
use sparkle_assets::{AssetKind, AssetMetadata, ContentHash, NormalizedPayload, Resource};
use sparkle_core::alloc::HashMap;
use sparkle_core::alloc::sparse_set::SparseSet;
use sparkle_core::profiling::profile_function;
use sparkle_core::{PixelFormat, ShaderStage};
use sparkle_test_utils::{
    BufferDesc, BufferUsage, DriverError, DriverId, GraphicsDriver, SamplerParams, TextureDesc,
};

use crate::error::{GpuError, GpuResult};
use crate::handle::GpuHandle;
use crate::resource::{ManagerStats, ResourceId, ResourceInfo, ResourceKind};
use crate::thread::RenderThread;

/// Usage flags for buffers built from mesh payloads.
pub const MESH_BUFFER_USAGE: BufferUsage = BufferUsage::VERTEX
    .union(BufferUsage::INDEX)
    .union(BufferUsage::COPY_DST);

/// Usage flags for buffers built from raw payloads.
pub const RAW_BUFFER_USAGE: BufferUsage = MESH_BUFFER_USAGE.union(BufferUsage::UNIFORM);

#[derive(Debug, Clone)]
pub(crate) enum ResourceDetail {
    Texture(TextureDesc),
    Buffer(BufferDesc),
    Shader(ShaderStage),
    /// A linked program holds one reference on each member shader.
    Program { shaders: Vec<ResourceId> },
}

struct Entry {
    kind: ResourceKind,
    content_hash: ContentHash,
    object: DriverId,
    ref_count: u32,
    /// References given up through `GpuHandle::into_raw`; a subset of `ref_count`.
    raw_refs: u32,
    detail: ResourceDetail,
}

/// What the state cache needs to bind a resource.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BindInfo {
    pub object: DriverId,
    pub kind: ResourceKind,
    pub usage: BufferUsage,
}

struct ManagerState {
    entries: SparseSet<Entry>,
    by_hash: HashMap<ContentHash, ResourceId>,
    epoch: u32,
    stats: ManagerStats,
}

pub(crate) struct Shared {
    driver: Arc<dyn GraphicsDriver>,
    thread: RenderThread,
    state: Mutex<ManagerState>,
    /// Releases from handles dropped off the render thread.
    deferred: Mutex<Vec<ResourceId>>,
}

impl Shared {
    /// Release path for [`GpuHandle`]'s `Drop`.
    pub(crate) fn release_dropped(&self, id: ResourceId) {
        if !self.thread.is_current() {
            tracing::warn!("GPU handle {} dropped off the render thread; release deferred", id);
            self.deferred.lock().push(id);
            return;
        }
        let mut state = self.state.lock();
        self.drain_deferred(&mut state);
        match self.release_locked(&mut state, id) {
            Ok(()) => {}
            // Expected for handles that outlived a context loss.
            Err(GpuError::StaleHandle { .. }) => {
                tracing::trace!("Dropped handle {} from a lost context", id)
            }
            Err(err) => tracing::warn!("Releasing dropped handle {} failed: {}", id, err),
        }
    }

    /// Record that a handle's reference now lives on as a raw id.
    pub(crate) fn detach_raw(&self, id: ResourceId) {
        let mut state = self.state.lock();
        if id.epoch != state.epoch {
            return;
        }
        if let Some(entry) = state.entries.try_get_mut(id.slot) {
            entry.raw_refs += 1;
        }
    }

    fn drain_deferred(&self, state: &mut ManagerState) -> usize {
        let queued = std::mem::take(&mut *self.deferred.lock());
        let mut released = 0;
        for id in queued {
            match self.release_locked(state, id) {
                Ok(()) => released += 1,
                Err(GpuError::StaleHandle { .. }) => {}
                Err(err) => tracing::warn!("Deferred release of {} failed: {}", id, err),
            }
        }
        released
    }

    fn release_locked(&self, state: &mut ManagerState, id: ResourceId) -> GpuResult<()> {
        if id.epoch != state.epoch {
            return Err(GpuError::StaleHandle { id });
        }
        if !state.entries.contains(id.slot) {
            return Err(GpuError::NotAcquired { id });
        }

        // Destroying a program gives up its references on member shaders.
        let mut worklist = vec![id];
        while let Some(id) = worklist.pop() {
            let Some(entry) = state.entries.try_get_mut(id.slot) else {
                continue;
            };
            entry.ref_count -= 1;
            if entry.ref_count > 0 {
                continue;
            }
            let Some(entry) = state.entries.try_remove(id.slot) else {
                continue;
            };
            state.by_hash.remove(&entry.content_hash);
            self.destroy_object(entry.kind, entry.object);
            state.stats.destroyed += 1;
            tracing::debug!("Destroyed {} {} ({})", entry.kind, entry.object, entry.content_hash);
            if let ResourceDetail::Program { shaders } = entry.detail {
                worklist.extend(shaders);
            }
        }
        Ok(())
    }

    fn destroy_object(&self, kind: ResourceKind, object: DriverId) {
        match kind {
            ResourceKind::Texture => self.driver.destroy_texture(object),
            ResourceKind::Buffer => self.driver.destroy_buffer(object),
            ResourceKind::Shader => self.driver.destroy_shader(object),
            ResourceKind::Program => self.driver.destroy_program(object),
        }
    }

    /// Clean up after a failed creation step. After context loss the object
    /// is already gone.
    fn discard(&self, kind: ResourceKind, object: DriverId, cause: &DriverError) {
        if *cause != DriverError::ContextLost {
            self.destroy_object(kind, object);
        }
    }

    fn lose_context(&self, state: &mut ManagerState) {
        let dropped = state.entries.len();
        state.entries.clear();
        state.by_hash.clear();
        state.epoch = state.epoch.wrapping_add(1);
        self.deferred.lock().clear();
        tracing::error!(
            "Graphics context lost: forgot {} GPU resources, now at epoch {}",
            dropped,
            state.epoch
        );
    }
}

/// Owns every driver object created from assets.
///
/// Cloning is cheap; clones share the same cache. All methods that touch the
/// driver must run on the thread that created the manager and return
/// [`GpuError::WrongThread`] elsewhere.
///
/// # Example
///
/// ```ignore
/// let manager = ResourceManager::new(driver);
/// let logo = manager.acquire(&registry.lookup("images/logo")?)?;
/// let again = manager.acquire(&registry.lookup("images/logo")?)?; // cache hit
/// assert_eq!(logo.id(), again.id());
/// ```
#[derive(Clone)]
pub struct ResourceManager {
    shared: Arc<Shared>,
}

impl ResourceManager {
    /// Create a manager owned by the calling thread.
    pub fn new(driver: Arc<dyn GraphicsDriver>) -> Self {
        Self {
            shared: Arc::new(Shared {
                driver,
                thread: RenderThread::current(),
                state: Mutex::new(ManagerState {
                    entries: SparseSet::new(),
                    by_hash: HashMap::new(),
                    epoch: 0,
                    stats: ManagerStats::default(),
                }),
                deferred: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn driver(&self) -> &Arc<dyn GraphicsDriver> {
        &self.shared.driver
    }

    pub fn render_thread(&self) -> RenderThread {
        self.shared.thread
    }

    /// Materialize a registry resource, reusing its stored content hash.
    pub fn acquire(&self, resource: &Resource<'_>) -> GpuResult<GpuHandle> {
        self.acquire_bytes(resource.content_hash(), &resource.metadata(), resource.data())
    }

    /// Materialize a payload produced at run time.
    ///
    /// The payload may be decoded on any thread; only this call has to run on
    /// the render thread.
    pub fn acquire_raw(&self, kind: AssetKind, payload: &NormalizedPayload) -> GpuResult<GpuHandle> {
        if payload.kind() != kind {
            return Err(GpuError::InvalidPayload {
                reason: format!("declared {} but payload is {}", kind, payload.kind()),
            });
        }
        payload.validate().map_err(|e| GpuError::InvalidPayload {
            reason: e.message().to_string(),
        })?;
        self.acquire_bytes(ContentHash::of_payload(payload), &payload.metadata, &payload.bytes)
    }

    fn acquire_bytes(&self, hash: ContentHash, metadata: &AssetMetadata, bytes: &[u8]) -> GpuResult<GpuHandle> {
        profile_function!();
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        self.shared.drain_deferred(&mut state);

        if let Some(handle) = self.reuse(&mut state, hash) {
            return Ok(handle);
        }

        let kind = ResourceKind::for_asset(metadata.kind());
        let (object, detail) = match self.create(metadata, bytes) {
            Ok(created) => created,
            Err(err) => {
                if matches!(err, GpuError::ContextLost) {
                    self.shared.lose_context(&mut state);
                }
                tracing::debug!("Creating {} for {} failed: {}", kind, hash, err);
                return Err(err);
            }
        };
        Ok(self.insert(&mut state, kind, hash, object, detail))
    }

    /// Link shader resources into a program.
    ///
    /// Programs are cached by the ordered list of member hashes. The program
    /// keeps its shaders alive until it is destroyed.
    pub fn acquire_program(&self, shaders: &[&GpuHandle]) -> GpuResult<GpuHandle> {
        profile_function!();
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        self.shared.drain_deferred(&mut state);

        let mut members = Vec::with_capacity(shaders.len());
        let mut objects = Vec::with_capacity(shaders.len());
        let mut hashes = Vec::with_capacity(shaders.len());
        for handle in shaders {
            let entry = self.live_entry(&state, handle)?;
            if entry.kind != ResourceKind::Shader {
                return Err(GpuError::WrongKind {
                    expected: ResourceKind::Shader,
                    found: entry.kind,
                });
            }
            members.push(handle.id());
            objects.push(entry.object);
            hashes.push(entry.content_hash);
        }

        let hash = ContentHash::combine(AssetKind::Shader, &hashes);
        if let Some(handle) = self.reuse(&mut state, hash) {
            return Ok(handle);
        }

        let driver = &self.shared.driver;
        let program = match driver.create_program() {
            Ok(program) => program,
            Err(err) => return Err(self.creation_failed(&mut state, err)),
        };
        if let Err(err) = driver.link_program(program, &objects) {
            self.shared.discard(ResourceKind::Program, program, &err);
            return Err(match err {
                DriverError::LinkFailed { log } => {
                    tracing::warn!("Program link failed: {}", log);
                    GpuError::ShaderLinkError { log }
                }
                other => self.creation_failed(&mut state, other),
            });
        }

        for member in &members {
            if let Some(entry) = state.entries.try_get_mut(member.slot) {
                entry.ref_count += 1;
            }
        }
        Ok(self.insert(
            &mut state,
            ResourceKind::Program,
            hash,
            program,
            ResourceDetail::Program { shaders: members },
        ))
    }

    /// Another reference to the same resource. No driver call.
    pub fn retain(&self, handle: &GpuHandle) -> GpuResult<GpuHandle> {
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        self.live_entry(&state, handle)?;
        let entry = state
            .entries
            .try_get_mut(handle.id().slot)
            .ok_or(GpuError::NotAcquired { id: handle.id() })?;
        entry.ref_count += 1;
        Ok(GpuHandle::new(
            handle.id(),
            entry.kind,
            entry.content_hash,
            Arc::clone(&self.shared),
        ))
    }

    /// Release a handle explicitly.
    ///
    /// From the wrong thread this returns `WrongThread`; the handle is still
    /// consumed and its release deferred to the render thread.
    pub fn release(&self, handle: GpuHandle) -> GpuResult<()> {
        self.shared.thread.check()?;
        if !handle.belongs_to(&self.shared) {
            let id = handle.id();
            return Err(GpuError::NotAcquired { id });
        }
        let id = handle.disarm();
        let mut state = self.shared.state.lock();
        self.shared.drain_deferred(&mut state);
        self.shared.release_locked(&mut state, id)
    }

    /// Release a reference previously given up through [`GpuHandle::into_raw`].
    ///
    /// Returns `NotAcquired` once every raw reference to `id` has been
    /// returned; references held by live handles are never taken.
    pub fn release_raw(&self, id: ResourceId) -> GpuResult<()> {
        profile_function!();
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        self.shared.drain_deferred(&mut state);
        if id.epoch != state.epoch {
            return Err(GpuError::StaleHandle { id });
        }
        let entry = state
            .entries
            .try_get_mut(id.slot)
            .ok_or(GpuError::NotAcquired { id })?;
        if entry.raw_refs == 0 {
            return Err(GpuError::NotAcquired { id });
        }
        entry.raw_refs -= 1;
        self.shared.release_locked(&mut state, id)
    }

    /// Process releases queued by handles dropped on other threads.
    ///
    /// Returns how many references were released.
    pub fn maintain(&self) -> GpuResult<usize> {
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        Ok(self.shared.drain_deferred(&mut state))
    }

    /// Forget every resource without calling the driver.
    ///
    /// Outstanding handles become stale; owners must acquire again.
    pub fn handle_context_lost(&self) -> GpuResult<()> {
        self.shared.thread.check()?;
        let mut state = self.shared.state.lock();
        self.shared.lose_context(&mut state);
        Ok(())
    }

    /// Incremented by every context loss.
    pub fn epoch(&self) -> u32 {
        self.shared.state.lock().epoch
    }

    pub fn info(&self, id: ResourceId) -> Option<ResourceInfo> {
        let state = self.shared.state.lock();
        if id.epoch != state.epoch {
            return None;
        }
        state.entries.try_get(id.slot).map(|entry| ResourceInfo {
            kind: entry.kind,
            content_hash: entry.content_hash,
            ref_count: entry.ref_count,
        })
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.info(id).is_some()
    }

    /// Whether a live resource exists for this content hash.
    pub fn is_cached(&self, hash: ContentHash) -> bool {
        self.shared.state.lock().by_hash.contains_key(&hash)
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ManagerStats {
        self.shared.state.lock().stats
    }

    pub(crate) fn bind_info(&self, handle: &GpuHandle) -> GpuResult<BindInfo> {
        let state = self.shared.state.lock();
        let entry = self.live_entry(&state, handle)?;
        let usage = match &entry.detail {
            ResourceDetail::Buffer(desc) => desc.usage,
            _ => BufferUsage::empty(),
        };
        Ok(BindInfo {
            object: entry.object,
            kind: entry.kind,
            usage,
        })
    }

    fn live_entry<'a>(&self, state: &'a ManagerState, handle: &GpuHandle) -> GpuResult<&'a Entry> {
        let id = handle.id();
        if !handle.belongs_to(&self.shared) {
            return Err(GpuError::NotAcquired { id });
        }
        if id.epoch != state.epoch {
            return Err(GpuError::StaleHandle { id });
        }
        state
            .entries
            .try_get(id.slot)
            .ok_or(GpuError::NotAcquired { id })
    }

    fn reuse(&self, state: &mut ManagerState, hash: ContentHash) -> Option<GpuHandle> {
        let id = *state.by_hash.get(&hash)?;
        let entry = state.entries.try_get_mut(id.slot)?;
        entry.ref_count += 1;
        let kind = entry.kind;
        state.stats.reused += 1;
        tracing::trace!("Reusing {} {} for {}", kind, id, hash);
        Some(GpuHandle::new(id, kind, hash, Arc::clone(&self.shared)))
    }

    fn insert(
        &self,
        state: &mut ManagerState,
        kind: ResourceKind,
        hash: ContentHash,
        object: DriverId,
        detail: ResourceDetail,
    ) -> GpuHandle {
        let slot = state.entries.push(Entry {
            kind,
            content_hash: hash,
            object,
            ref_count: 1,
            raw_refs: 0,
            detail,
        });
        let id = ResourceId {
            slot,
            epoch: state.epoch,
        };
        state.by_hash.insert(hash, id);
        state.stats.created += 1;
        tracing::debug!("Created {} {} as {} ({})", kind, object, id, hash);
        GpuHandle::new(id, kind, hash, Arc::clone(&self.shared))
    }

    fn creation_failed(&self, state: &mut ManagerState, err: DriverError) -> GpuError {
        let err = GpuError::from(err);
        if matches!(err, GpuError::ContextLost) {
            self.shared.lose_context(state);
        }
        err
    }

    /// Run the kind-specific creation sequence. On error nothing is left alive.
    fn create(&self, metadata: &AssetMetadata, bytes: &[u8]) -> GpuResult<(DriverId, ResourceDetail)> {
        match *metadata {
            AssetMetadata::Image { width, height, format } => self.create_texture(
                TextureDesc { width, height, format },
                bytes,
                SamplerParams::default(),
            ),
            AssetMetadata::Font {
                atlas_width,
                atlas_height,
                ..
            } => {
                let (atlas, _) = font_parts(metadata, bytes).ok_or_else(|| GpuError::InvalidPayload {
                    reason: "font payload does not match its metadata".to_string(),
                })?;
                let desc = TextureDesc {
                    width: atlas_width,
                    height: atlas_height,
                    format: PixelFormat::R8,
                };
                self.create_texture(desc, atlas, SamplerParams::clamped())
            }
            AssetMetadata::Shader { stage } => self.create_shader(stage, bytes),
            AssetMetadata::Mesh { .. } => self.create_buffer(bytes, MESH_BUFFER_USAGE),
            AssetMetadata::Raw => self.create_buffer(bytes, RAW_BUFFER_USAGE),
        }
    }

    fn create_texture(
        &self,
        desc: TextureDesc,
        pixels: &[u8],
        params: SamplerParams,
    ) -> GpuResult<(DriverId, ResourceDetail)> {
        let driver = &self.shared.driver;
        let texture = driver.create_texture(&desc)?;
        let configured = driver
            .upload_texture(texture, &desc, pixels)
            .and_then(|()| driver.set_texture_params(texture, &params));
        if let Err(err) = configured {
            self.shared.discard(ResourceKind::Texture, texture, &err);
            return Err(err.into());
        }
        Ok((texture, ResourceDetail::Texture(desc)))
    }

    fn create_buffer(&self, data: &[u8], usage: BufferUsage) -> GpuResult<(DriverId, ResourceDetail)> {
        let driver = &self.shared.driver;
        let desc = BufferDesc {
            size: data.len() as u64,
            usage,
        };
        if data.is_empty() {
            return Err(GpuError::InvalidPayload {
                reason: "buffer payload is empty".to_string(),
            });
        }
        let buffer = driver.create_buffer(&desc)?;
        if let Err(err) = driver.upload_buffer(buffer, 0, data) {
            self.shared.discard(ResourceKind::Buffer, buffer, &err);
            return Err(err.into());
        }
        Ok((buffer, ResourceDetail::Buffer(desc)))
    }

    fn create_shader(&self, stage: ShaderStage, source: &[u8]) -> GpuResult<(DriverId, ResourceDetail)> {
        let source = std::str::from_utf8(source).map_err(|_| GpuError::InvalidPayload {
            reason: "shader source is not valid UTF-8".to_string(),
        })?;
        let driver = &self.shared.driver;
        let shader = driver.create_shader(stage)?;
        if let Err(err) = driver.compile_shader(shader, source) {
            self.shared.discard(ResourceKind::Shader, shader, &err);
            return Err(match err {
                DriverError::CompileFailed { log } => {
                    tracing::warn!("{} shader failed to compile: {}", stage, log);
                    GpuError::ShaderCompileError { stage, log }
                }
                other => other.into(),
            });
        }
        Ok((shader, ResourceDetail::Shader(stage)))
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ResourceManager")
            .field("live", &state.entries.len())
            .field("epoch", &state.epoch)
            .field("stats", &state.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkle_test_utils::{DriverCall, MockDriver};

    fn setup() -> (Arc<MockDriver>, ResourceManager) {
        let mock = Arc::new(MockDriver::new());
        let manager = ResourceManager::new(mock.clone());
        (mock, manager)
    }

    fn pixels(value: u8) -> NormalizedPayload {
        NormalizedPayload::new(
            AssetMetadata::Image {
                width: 2,
                height: 2,
                format: PixelFormat::Rgba8,
            },
            vec![value; 16],
        )
    }

    #[test]
    fn test_texture_creation_sequence() {
        let (mock, manager) = setup();
        let handle = manager.acquire_raw(AssetKind::Image, &pixels(1)).unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], DriverCall::CreateTexture { width: 2, height: 2, .. }));
        assert!(matches!(calls[1], DriverCall::UploadTexture { bytes: 16, .. }));
        assert!(matches!(calls[2], DriverCall::SetTextureParams { .. }));
        assert_eq!(handle.kind(), ResourceKind::Texture);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_cache_hit_makes_no_driver_call() {
        let (mock, manager) = setup();
        let first = manager.acquire_raw(AssetKind::Image, &pixels(1)).unwrap();
        let calls = mock.call_count();
        let second = manager.acquire_raw(AssetKind::Image, &pixels(1)).unwrap();

        assert_eq!(mock.call_count(), calls);
        assert_eq!(first.id(), second.id());
        assert_eq!(manager.info(first.id()).unwrap().ref_count, 2);
        assert_eq!(manager.stats().reused, 1);
    }

    #[test]
    fn test_failed_upload_leaves_nothing_behind() {
        let (mock, manager) = setup();
        mock.fail_next(
            sparkle_test_utils::FailPoint::UploadTexture,
            DriverError::OutOfMemory { requested: 16 },
        );

        let payload = pixels(1);
        let err = manager.acquire_raw(AssetKind::Image, &payload).unwrap_err();
        assert!(matches!(err, GpuError::Driver { .. }));
        assert!(manager.is_empty());
        assert!(!manager.is_cached(ContentHash::of_payload(&payload)));
        assert_eq!(mock.live_object_count(), 0);
    }

    #[test]
    fn test_declared_kind_must_match() {
        let (_mock, manager) = setup();
        let err = manager.acquire_raw(AssetKind::Mesh, &pixels(1)).unwrap_err();
        assert!(matches!(err, GpuError::InvalidPayload { .. }));
    }

    #[test]
    fn test_raw_payload_becomes_uniform_capable_buffer() {
        let (mock, manager) = setup();
        let handle = manager
            .acquire_raw(AssetKind::Raw, &NormalizedPayload::raw(vec![0; 64]))
            .unwrap();

        let info = manager.bind_info(&handle).unwrap();
        assert_eq!(info.kind, ResourceKind::Buffer);
        assert!(info.usage.contains(BufferUsage::UNIFORM));
        assert!(matches!(
            mock.calls()[0],
            DriverCall::CreateBuffer { size: 64, .. }
        ));
    }

    #[test]
    fn test_empty_buffer_payload_is_rejected() {
        let (mock, manager) = setup();
        let err = manager
            .acquire_raw(AssetKind::Raw, &NormalizedPayload::raw(Vec::new()))
            .unwrap_err();

        assert!(matches!(err, GpuError::InvalidPayload { .. }));
        assert_eq!(mock.call_count(), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_bind_info_rejects_foreign_handle() {
        let (_mock, manager) = setup();
        let (_other_mock, other) = setup();
        let own = manager.acquire_raw(AssetKind::Image, &pixels(1)).unwrap();
        let foreign = other.acquire_raw(AssetKind::Image, &pixels(1)).unwrap();

        assert_eq!(foreign.id(), own.id());
        assert!(matches!(
            manager.bind_info(&foreign),
            Err(GpuError::NotAcquired { .. })
        ));
    }
}
