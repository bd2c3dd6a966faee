//! Sparkle asset pipeline: compile time and load time.
//!
//! Source files are decoded into normalized payloads, content-hashed and
//! packed into a bundle by the [`AssetCompiler`]. At run time the bundle is
//! validated once and served by a read-only [`Registry`].
//!
//! ```text
//! source tree --AssetCompiler--> EmbeddedBundle --Registry::load--> lookup()
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sparkle_assets::{AssetCompiler, CompilerConfig, Registry};
//!
//! let compiler = AssetCompiler::new(CompilerConfig::default());
//! let bundle = compiler.compile("assets")?;
//! let registry = Registry::load(bundle)?;
//!
//! let logo = registry.lookup("images/logo")?;
//! println!("{} is {:?}", logo.identifier(), logo.metadata());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod build;
pub mod bundle;
pub mod compiler;
pub mod decoder;
pub mod error;
pub mod hash;
pub mod id;
pub mod kind;
pub mod payload;
pub mod registry;

pub use bundle::{BUNDLE_VERSION, BundleBuilder, EmbeddedBundle, ResourceDescriptor};
pub use compiler::{AssetCompiler, CancelToken, CompileStats, CompilerConfig, compile};
pub use decoder::{
    AssetDecoder, DecodeContext, DecoderRegistry, ImageDecoder, MeshDecoder, RawDecoder, ShaderDecoder,
};
pub use error::{CompileError, CompileResult, DecodeFailure, RegistryError, RegistryResult};
pub use hash::ContentHash;
pub use id::AssetId;
pub use kind::{AssetKind, AssetMetadata};
pub use payload::{GlyphRecord, MeshVertex, NormalizedPayload};
pub use registry::{Registry, Resource};

/// Include the module generated by [`build::embed_assets`].
///
/// Expands to `BUNDLE: &[u8]` and an `ids` module of [`AssetId`] constants.
#[macro_export]
macro_rules! include_assets {
    () => {
        include!(concat!(env!("OUT_DIR"), "/sparkle_assets.rs"));
    };
}
