//! Value types exchanged with a [`GraphicsDriver`](crate::GraphicsDriver).

use std::fmt;

use bitflags::bitflags;
use sparkle_core::PixelFormat;

/// Object name allocated by the driver. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(u32);

impl DriverId {
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl TextureDesc {
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Sampling parameters applied to a texture after upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap: WrapMode,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap: WrapMode::Repeat,
        }
    }
}

impl SamplerParams {
    pub const fn clamped() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap: WrapMode::ClampToEdge,
        }
    }
}

bitflags! {
    /// What a buffer may be bound as.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const COPY_DST = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: BufferUsage,
}

/// A driver binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindTarget {
    Texture(u32),
    VertexBuffer,
    IndexBuffer,
    UniformBuffer(u32),
    Program,
}

/// Failure reported by the graphics driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The shader compiler rejected the source.
    CompileFailed { log: String },
    /// The program failed to link.
    LinkFailed { log: String },
    OutOfMemory { requested: u64 },
    /// The graphics context is gone; every object it owned is invalid.
    ContextLost,
    InvalidObject { id: DriverId },
    Other { message: String },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::CompileFailed { log } => write!(f, "shader compilation failed: {}", log),
            DriverError::LinkFailed { log } => write!(f, "program link failed: {}", log),
            DriverError::OutOfMemory { requested } => {
                write!(f, "out of GPU memory (requested {} bytes)", requested)
            }
            DriverError::ContextLost => write!(f, "graphics context lost"),
            DriverError::InvalidObject { id } => write!(f, "invalid driver object {}", id),
            DriverError::Other { message } => write!(f, "driver error: {}", message),
        }
    }
}

impl std::error::Error for DriverError {}

pub type DriverResult<T> = Result<T, DriverError>;
