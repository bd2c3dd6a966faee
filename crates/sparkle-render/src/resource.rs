//! Identifiers and descriptions of live GPU resources.

use std::fmt;

use sparkle_assets::{AssetKind, ContentHash};
use sparkle_core::alloc::sparse_set::IndexSlot;

/// Identifies a live resource inside a [`ResourceManager`](crate::ResourceManager).
///
/// Combines a generational slot with the context epoch, so ids from before a
/// context loss are recognised as stale rather than aliasing new resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub(crate) slot: IndexSlot,
    pub(crate) epoch: u32,
}

impl ResourceId {
    pub fn index(&self) -> u32 {
        self.slot.index()
    }

    pub fn generation(&self) -> u32 {
        self.slot.generation()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}@{}", self.index(), self.generation(), self.epoch)
    }
}

/// The driver object class backing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Buffer,
    Shader,
    Program,
}

impl ResourceKind {
    /// What an asset of `kind` materializes into.
    pub fn for_asset(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Image | AssetKind::Font => ResourceKind::Texture,
            AssetKind::Mesh | AssetKind::Raw => ResourceKind::Buffer,
            AssetKind::Shader => ResourceKind::Shader,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Shader => "shader",
            ResourceKind::Program => "program",
        };
        f.write_str(name)
    }
}

/// Snapshot of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    pub kind: ResourceKind,
    pub content_hash: ContentHash,
    pub ref_count: u32,
}

/// Counters kept by the manager since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Driver objects created.
    pub created: u64,
    /// Acquires served from the cache.
    pub reused: u64,
    /// Driver objects destroyed after their last release.
    pub destroyed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_kinds_map_to_object_classes() {
        assert_eq!(ResourceKind::for_asset(AssetKind::Image), ResourceKind::Texture);
        assert_eq!(ResourceKind::for_asset(AssetKind::Font), ResourceKind::Texture);
        assert_eq!(ResourceKind::for_asset(AssetKind::Mesh), ResourceKind::Buffer);
        assert_eq!(ResourceKind::for_asset(AssetKind::Raw), ResourceKind::Buffer);
        assert_eq!(ResourceKind::for_asset(AssetKind::Shader), ResourceKind::Shader);
    }

    #[test]
    fn test_resource_id_display() {
        let id = ResourceId {
            slot: IndexSlot::new(2, 5),
            epoch: 1,
        };
        assert_eq!(id.to_string(), "5v2@1");
    }
}
