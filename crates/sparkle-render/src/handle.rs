//! Reference-counted handles to live GPU resources.

use std::fmt;
use std::sync::Arc;

use sparkle_assets::ContentHash;

use crate::manager::Shared;
use crate::resource::{ResourceId, ResourceKind};

/// One counted reference to a GPU resource.
///
/// Dropping the handle releases the reference; the driver object is destroyed
/// when the last reference goes. A handle dropped off the render thread is
/// queued and released on the render thread's next manager call.
///
/// Handles never expose the driver's object id. Use
/// [`ResourceManager::retain`](crate::ResourceManager::retain) for another
/// reference and [`into_raw`](Self::into_raw) to store the reference as a
/// plain [`ResourceId`].
pub struct GpuHandle {
    id: ResourceId,
    kind: ResourceKind,
    content_hash: ContentHash,
    shared: Arc<Shared>,
    armed: bool,
}

impl GpuHandle {
    pub(crate) fn new(id: ResourceId, kind: ResourceKind, content_hash: ContentHash, shared: Arc<Shared>) -> Self {
        Self {
            id,
            kind,
            content_hash,
            shared,
            armed: true,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Give up the handle without releasing its reference.
    ///
    /// The reference must later be returned through
    /// [`ResourceManager::release_raw`](crate::ResourceManager::release_raw).
    pub fn into_raw(self) -> ResourceId {
        let shared = Arc::clone(&self.shared);
        let id = self.disarm();
        shared.detach_raw(id);
        id
    }

    /// Consume the handle without touching its reference.
    pub(crate) fn disarm(mut self) -> ResourceId {
        self.armed = false;
        self.id
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }
}

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("content_hash", &self.content_hash)
            .finish()
    }
}

impl Drop for GpuHandle {
    fn drop(&mut self) {
        if self.armed {
            self.shared.release_dropped(self.id);
        }
    }
}
