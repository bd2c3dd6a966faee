//! Decoder adapters: raw file bytes in, normalized payloads out.

mod image;
mod mesh;
mod raw;
mod shader;

pub use self::image::ImageDecoder;
pub use mesh::MeshDecoder;
pub use raw::RawDecoder;
pub use shader::ShaderDecoder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_executor::Task;
use sparkle_core::TaskPool;
use sparkle_core::alloc::HashMap;

use crate::error::DecodeFailure;
use crate::kind::AssetKind;
use crate::payload::NormalizedPayload;

/// Context handed to a decoder.
pub struct DecodeContext<'a> {
    /// Path of the file, for diagnostics.
    pub path: &'a Path,
    pub bytes: &'a [u8],
    /// Lowercase extension without the dot.
    pub extension: &'a str,
    /// The kind the caller expects back.
    pub declared_kind: AssetKind,
}

/// Default priority for decoders.
pub const DEFAULT_DECODER_PRIORITY: i32 = 0;

/// Converts raw bytes of one asset kind into a [`NormalizedPayload`].
///
/// Decoders must be deterministic: the same bytes always produce the same
/// payload, or the compiler's output stops being reproducible.
///
/// # Example
///
/// ```ignore
/// struct TtfDecoder;
///
/// impl AssetDecoder for TtfDecoder {
///     fn kind(&self) -> AssetKind { AssetKind::Font }
///     fn extensions(&self) -> &[&str] { &["ttf"] }
///     fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
///         // rasterize glyphs into an atlas...
///     }
/// }
/// ```
pub trait AssetDecoder: Send + Sync + 'static {
    fn kind(&self) -> AssetKind;

    /// File extensions handled, without dots.
    fn extensions(&self) -> &[&str];

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure>;

    /// Higher priority decoders win when several claim an extension.
    fn priority(&self) -> i32 {
        DEFAULT_DECODER_PRIORITY
    }
}

#[derive(Clone)]
struct DecoderEntry {
    decoder: Arc<dyn AssetDecoder>,
    priority: i32,
}

/// Decoders indexed by lowercase extension, highest priority first.
#[derive(Default, Clone)]
pub struct DecoderRegistry {
    by_extension: HashMap<String, Vec<DecoderEntry>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in image, shader, mesh and raw decoders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ImageDecoder);
        registry.register(ShaderDecoder);
        registry.register(MeshDecoder);
        registry.register(RawDecoder);
        registry
    }

    pub fn register<D: AssetDecoder>(&mut self, decoder: D) {
        let decoder: Arc<dyn AssetDecoder> = Arc::new(decoder);
        let priority = decoder.priority();

        for ext in decoder.extensions() {
            let entries = self.by_extension.entry(ext.to_lowercase()).or_default();
            entries.push(DecoderEntry {
                decoder: decoder.clone(),
                priority,
            });
            // Stable sort keeps registration order among equal priorities.
            entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        tracing::trace!(
            "Registered {} decoder for {:?}",
            decoder.kind(),
            decoder.extensions()
        );
    }

    /// Best decoder for `extension` (case-insensitive).
    pub fn find(&self, extension: &str) -> Option<&dyn AssetDecoder> {
        self.by_extension
            .get(&extension.to_lowercase())
            .and_then(|entries| entries.first())
            .map(|entry| entry.decoder.as_ref())
    }

    pub fn handles(&self, extension: &str) -> bool {
        self.find(extension).is_some()
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Decode `bytes` with the decoder selected by `path`'s extension and
    /// validate the result against its metadata.
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<NormalizedPayload, DecodeFailure> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| DecodeFailure::new("file has no extension"))?;
        let decoder = self
            .find(&extension)
            .ok_or_else(|| DecodeFailure::new(format!("no decoder for extension .{}", extension)))?;

        let declared_kind = decoder.kind();
        let payload = decoder.decode(DecodeContext {
            path,
            bytes,
            extension: &extension,
            declared_kind,
        })?;

        if payload.kind() != declared_kind {
            return Err(DecodeFailure::new(format!(
                "decoder for .{} produced a {} payload, expected {}",
                extension,
                payload.kind(),
                declared_kind
            )));
        }
        payload.validate()?;
        Ok(payload)
    }

    /// Decode on a pool worker. The render thread awaits the task and
    /// uploads the payload itself.
    pub fn decode_on(
        self: &Arc<Self>,
        pool: &TaskPool,
        path: PathBuf,
        bytes: Vec<u8>,
    ) -> Task<Result<NormalizedPayload, DecodeFailure>> {
        let registry = Arc::clone(self);
        pool.spawn_blocking(move || registry.decode(&path, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::AssetMetadata;

    struct UpperRaw;

    impl AssetDecoder for UpperRaw {
        fn kind(&self) -> AssetKind {
            AssetKind::Raw
        }

        fn extensions(&self) -> &[&str] {
            &["BIN"]
        }

        fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
            Ok(NormalizedPayload::raw(ctx.bytes.to_ascii_uppercase()))
        }

        fn priority(&self) -> i32 {
            10
        }
    }

    struct LyingDecoder;

    impl AssetDecoder for LyingDecoder {
        fn kind(&self) -> AssetKind {
            AssetKind::Image
        }

        fn extensions(&self) -> &[&str] {
            &["lie"]
        }

        fn decode(&self, _ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
            Ok(NormalizedPayload::new(AssetMetadata::Raw, vec![]))
        }
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut registry = DecoderRegistry::with_defaults();
        registry.register(UpperRaw);

        let payload = registry.decode(Path::new("blob.bin"), b"abc").unwrap();
        assert_eq!(payload.bytes, b"ABC");
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let registry = DecoderRegistry::with_defaults();
        assert!(registry.handles("PNG"));
        assert!(registry.handles("vert"));
        assert!(!registry.handles("txt"));
        assert!(registry.extensions().contains(&"obj"));
    }

    #[test]
    fn test_unknown_extension_fails() {
        let registry = DecoderRegistry::with_defaults();
        assert!(registry.decode(Path::new("notes.txt"), b"hi").is_err());
        assert!(registry.decode(Path::new("Makefile"), b"hi").is_err());
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut registry = DecoderRegistry::new();
        registry.register(LyingDecoder);
        let err = registry.decode(Path::new("x.lie"), b"").unwrap_err();
        assert!(err.message().contains("expected image"));
    }

    #[test]
    fn test_decode_on_pool() {
        let registry = Arc::new(DecoderRegistry::with_defaults());
        let pool = TaskPool::new(1);

        let task = registry.decode_on(&pool, PathBuf::from("data.dat"), vec![7, 8, 9]);
        let payload = pollster::block_on(task).unwrap();

        assert_eq!(payload, NormalizedPayload::raw(vec![7, 8, 9]));
    }
}
