//! Sparkle render side: GPU resources and bound state.
//!
//! The [`ResourceManager`] turns registry resources into driver objects and
//! shares identical payloads through reference-counted [`GpuHandle`]s. The
//! [`RenderStateCache`] sits in front of every bind and drops calls that
//! would not change driver state. A [`RenderContext`] owns both and is pinned
//! to the thread that owns the graphics context.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use std::sync::Arc;
//!
//! use sparkle_assets::{AssetKind, NormalizedPayload};
//! use sparkle_render::{BindingSlot, RenderConfig, RenderContext};
//! use sparkle_test_utils::MockDriver;
//!
//! let driver = Arc::new(MockDriver::new());
//! let mut ctx = RenderContext::new(driver.clone(), RenderConfig::default());
//!
//! let uniforms = ctx.acquire_raw(AssetKind::Raw, &NormalizedPayload::raw(vec![0; 64])).unwrap();
//! assert!(ctx.bind(BindingSlot::uniform_buffer(0), &uniforms).unwrap());
//! assert!(!ctx.bind(BindingSlot::uniform_buffer(0), &uniforms).unwrap());
//! assert_eq!(driver.count_binds(), 1);
//! # }
//! ```

pub mod context;
pub mod error;
pub mod handle;
pub mod manager;
pub mod resource;
pub mod state_cache;
pub mod thread;

pub use context::{RenderConfig, RenderContext};
pub use error::{GpuError, GpuResult};
pub use handle::GpuHandle;
pub use manager::{MESH_BUFFER_USAGE, RAW_BUFFER_USAGE, ResourceManager};
pub use resource::{ManagerStats, ResourceId, ResourceInfo, ResourceKind};
pub use state_cache::{BindStats, BindingKind, BindingSlot, RenderStateCache, SlotState};
pub use thread::RenderThread;

pub use sparkle_test_utils::{BindTarget, GraphicsDriver};
