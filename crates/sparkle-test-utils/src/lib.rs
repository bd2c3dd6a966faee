//! Graphics driver interface and test utilities for Sparkle.
//!
//! The render side talks to the GPU exclusively through the
//! [`GraphicsDriver`] trait defined here, which keeps the resource manager and
//! the state cache testable without a graphics context.
//!
//! # Overview
//!
//! - [`GraphicsDriver`] - Trait abstracting driver object creation and binding
//! - `MockDriver` - Recording implementation (requires `mock` feature)
//! - `AssetTree` - Temporary on-disk source trees (requires `fixtures` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use sparkle_core::PixelFormat;
//! use sparkle_test_utils::{GraphicsDriver, MockDriver, TextureDesc};
//!
//! let mock = MockDriver::new();
//! let desc = TextureDesc { width: 1, height: 1, format: PixelFormat::Rgba8 };
//! let texture = mock.create_texture(&desc).unwrap();
//! mock.upload_texture(texture, &desc, &[255; 4]).unwrap();
//!
//! assert_eq!(mock.count_texture_creates(), 1);
//! assert!(mock.is_live(texture));
//! # }
//! ```

pub mod driver;
pub mod driver_types;
#[cfg(feature = "fixtures")]
pub mod fixtures;
#[cfg(feature = "mock")]
pub mod mock_driver;

pub use driver::*;
pub use driver_types::*;
#[cfg(feature = "fixtures")]
pub use fixtures::*;
#[cfg(feature = "mock")]
pub use mock_driver::*;
