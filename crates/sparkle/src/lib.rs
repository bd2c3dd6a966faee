//! Sparkle - embedded asset bundles and cached GPU resources
//!
//! Sparkle packages application assets at build time and materializes them
//! into GPU objects at run time:
//!
//! - **Asset Compiler**: decodes a source tree into a deterministic,
//!   content-addressed bundle (`assets` feature)
//! - **Resource Registry**: read-only lookup over an embedded bundle
//! - **GPU Resource Manager**: deduplicated, reference-counted driver objects
//!   (`render` feature)
//! - **Render State Cache**: elides bind calls that would not change driver
//!   state
//!
//! # Quick Start
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     sparkle::assets::build::embed_assets("assets").unwrap();
//! }
//! ```
//!
//! ```ignore
//! use sparkle::prelude::*;
//!
//! mod assets {
//!     sparkle::assets::include_assets!();
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sparkle::core::logging::init();
//!     let registry = Registry::init_global(assets::BUNDLE)?;
//!
//!     let mut ctx = RenderContext::new(create_driver(), RenderConfig::default());
//!     let logo = ctx.acquire(&registry.lookup_id(assets::ids::IMAGES_LOGO)?)?;
//!     let unit = ctx.bind_texture(&logo)?;
//!     Ok(())
//! }
//! ```

pub use sparkle_core as core;
pub use sparkle_core::{PixelFormat, ShaderStage, TaskPool};

#[cfg(feature = "assets")]
pub use sparkle_assets as assets;

#[cfg(feature = "render")]
pub use sparkle_render as render;

/// Common imports.
pub mod prelude {
    pub use sparkle_core::{PixelFormat, ShaderStage};

    #[cfg(feature = "assets")]
    pub use sparkle_assets::{
        AssetCompiler, AssetDecoder, AssetId, AssetKind, AssetMetadata, CompileError, CompilerConfig,
        ContentHash, DecodeContext, DecodeFailure, EmbeddedBundle, NormalizedPayload, Registry,
        RegistryError,
    };

    #[cfg(feature = "render")]
    pub use sparkle_render::{
        BindingSlot, GpuError, GpuHandle, GraphicsDriver, RenderConfig, RenderContext, ResourceManager,
        SlotState,
    };
}
