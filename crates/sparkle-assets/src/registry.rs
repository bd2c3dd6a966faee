//! Read-only catalog over a loaded bundle.

use std::path::Path;
use std::sync::OnceLock;

use sparkle_core::alloc::HashMap;

use crate::bundle::{EmbeddedBundle, ResourceDescriptor, parse};
use crate::error::{RegistryError, RegistryResult};
use crate::hash::ContentHash;
use crate::id::AssetId;
use crate::kind::{AssetKind, AssetMetadata};
use crate::payload::NormalizedPayload;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// A descriptor together with the bytes it locates.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    descriptor: &'a ResourceDescriptor,
    data: &'a [u8],
}

impl<'a> Resource<'a> {
    pub fn descriptor(&self) -> &'a ResourceDescriptor {
        self.descriptor
    }

    pub fn id(&self) -> AssetId {
        self.descriptor.id
    }

    pub fn identifier(&self) -> &'a str {
        &self.descriptor.identifier
    }

    pub fn kind(&self) -> AssetKind {
        self.descriptor.kind
    }

    pub fn content_hash(&self) -> ContentHash {
        self.descriptor.content_hash
    }

    pub fn metadata(&self) -> AssetMetadata {
        self.descriptor.metadata
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Copy out as an owned payload.
    pub fn to_payload(&self) -> NormalizedPayload {
        NormalizedPayload::new(self.descriptor.metadata, self.data.to_vec())
    }
}

/// Lookup by identifier, [`AssetId`] or content hash over a validated bundle.
///
/// Immutable after construction; share it freely across threads.
pub struct Registry {
    bundle: EmbeddedBundle,
    descriptors: Vec<ResourceDescriptor>,
    by_id: HashMap<AssetId, usize>,
    by_hash: HashMap<ContentHash, usize>,
    payload_start: usize,
}

impl Registry {
    /// Validate `bundle` and index its descriptors.
    pub fn load(bundle: EmbeddedBundle) -> RegistryResult<Self> {
        let parsed = parse(bundle.as_bytes())?;
        let mut descriptors = parsed.descriptors;
        descriptors.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut by_id = HashMap::with_capacity(descriptors.len());
        let mut by_hash = HashMap::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            by_id.insert(descriptor.id, index);
            by_hash.entry(descriptor.content_hash).or_insert(index);
        }

        tracing::debug!(
            "Loaded asset bundle: {} resources, {} bytes",
            descriptors.len(),
            bundle.len()
        );

        Ok(Self {
            bundle,
            descriptors,
            by_id,
            by_hash,
            payload_start: parsed.payload_start,
        })
    }

    pub fn from_static(bytes: &'static [u8]) -> RegistryResult<Self> {
        Self::load(EmbeddedBundle::from_static(bytes))
    }

    pub fn load_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(EmbeddedBundle::from_vec(bytes))
    }

    /// Install the process-wide registry. Fails if one is already installed.
    pub fn init_global(bytes: &'static [u8]) -> RegistryResult<&'static Registry> {
        if GLOBAL.get().is_some() {
            return Err(RegistryError::AlreadyInitialized);
        }
        let registry = Self::from_static(bytes)?;
        GLOBAL
            .set(registry)
            .map_err(|_| RegistryError::AlreadyInitialized)?;
        GLOBAL.get().ok_or(RegistryError::AlreadyInitialized)
    }

    pub fn global() -> Option<&'static Registry> {
        GLOBAL.get()
    }

    fn resource(&self, index: usize) -> Resource<'_> {
        let descriptor = &self.descriptors[index];
        // Ranges were checked against the payload section at load.
        let start = self.payload_start + descriptor.byte_offset as usize;
        let end = start + descriptor.byte_length as usize;
        Resource {
            descriptor,
            data: &self.bundle.as_bytes()[start..end],
        }
    }

    pub fn lookup(&self, identifier: &str) -> RegistryResult<Resource<'_>> {
        self.get(identifier).ok_or_else(|| RegistryError::NotFound {
            identifier: identifier.to_string(),
        })
    }

    pub fn lookup_id(&self, id: AssetId) -> RegistryResult<Resource<'_>> {
        self.by_id
            .get(&id)
            .map(|&index| self.resource(index))
            .ok_or_else(|| RegistryError::NotFound {
                identifier: id.to_string(),
            })
    }

    /// First resource, in identifier order, whose payload has this hash.
    pub fn lookup_hash(&self, hash: ContentHash) -> Option<Resource<'_>> {
        self.by_hash.get(&hash).map(|&index| self.resource(index))
    }

    pub fn get(&self, identifier: &str) -> Option<Resource<'_>> {
        self.by_id
            .get(&AssetId::from_name(identifier))
            .filter(|&&index| self.descriptors[index].identifier == identifier)
            .map(|&index| self.resource(index))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All resources in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = Resource<'_>> {
        (0..self.descriptors.len()).map(|index| self.resource(index))
    }

    /// Recompute every content hash and compare against the stored one.
    pub fn verify(&self) -> RegistryResult<()> {
        for resource in self.iter() {
            let actual = ContentHash::compute(&resource.metadata(), resource.data());
            if actual != resource.content_hash() {
                return Err(RegistryError::corrupt(format!(
                    "content hash mismatch for '{}'",
                    resource.identifier()
                )));
            }
        }
        Ok(())
    }

    pub fn bundle(&self) -> &EmbeddedBundle {
        &self.bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleBuilder;

    fn registry() -> Registry {
        let mut builder = BundleBuilder::new();
        builder.push("data/a", NormalizedPayload::raw(vec![1, 2, 3]));
        builder.push("data/b", NormalizedPayload::raw(vec![4, 5]));
        builder.push("data/c", NormalizedPayload::raw(vec![1, 2, 3]));
        Registry::load(builder.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_lookup_returns_bytes() {
        let registry = registry();
        let b = registry.lookup("data/b").unwrap();
        assert_eq!(b.data(), &[4, 5]);
        assert_eq!(b.kind(), AssetKind::Raw);
        assert_eq!(b.id(), AssetId::from_name("data/b"));
    }

    #[test]
    fn test_missing_identifier_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.lookup("data/missing"),
            Err(RegistryError::NotFound { identifier }) if identifier == "data/missing"
        ));
        assert!(registry.lookup_id(AssetId::from_raw(1)).is_err());
    }

    #[test]
    fn test_lookup_hash_prefers_first_identifier() {
        let registry = registry();
        let a = registry.lookup("data/a").unwrap();
        let by_hash = registry.lookup_hash(a.content_hash()).unwrap();
        assert_eq!(by_hash.identifier(), "data/a");
        assert_eq!(
            registry.lookup("data/c").unwrap().content_hash(),
            a.content_hash()
        );
    }

    #[test]
    fn test_iter_is_sorted() {
        let registry = registry();
        let names: Vec<_> = registry.iter().map(|r| r.identifier()).collect();
        assert_eq!(names, vec!["data/a", "data/b", "data/c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_verify_detects_flipped_payload_byte() {
        let good = registry();
        good.verify().unwrap();

        let mut bytes = good.bundle().as_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = Registry::load(EmbeddedBundle::from_vec(bytes)).unwrap();
        assert!(matches!(
            tampered.verify(),
            Err(RegistryError::CorruptBundle { .. })
        ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Registry>();
    }
}
