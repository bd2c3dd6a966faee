//! Sparkle Core
//!
//! Shared building blocks for the Sparkle asset pipeline: hash collections,
//! generational storage, the worker pool used by the asset compiler, logging
//! and profiling setup, and the GPU-facing vocabulary shared by the compiler
//! and the render-side resource manager.

pub mod alloc;
pub mod format;
pub mod logging;
pub mod profiling;
pub mod task_pool;

pub use format::{PixelFormat, ShaderStage};
pub use task_pool::TaskPool;
