//! Error types for GPU resource management and binding.

use std::fmt;
use std::thread::ThreadId;

use sparkle_assets::RegistryError;
use sparkle_core::ShaderStage;
use sparkle_test_utils::DriverError;

use crate::resource::{ResourceId, ResourceKind};
use crate::state_cache::BindingSlot;

/// Errors raised by the resource manager and the state cache.
///
/// Creation failures leave the manager exactly as it was: no cache entry and
/// no live driver object.
#[derive(Debug)]
pub enum GpuError {
    /// The driver rejected a shader source.
    ShaderCompileError { stage: ShaderStage, log: String },

    /// Compiled shaders failed to link into a program.
    ShaderLinkError { log: String },

    /// Any other driver failure, such as running out of memory.
    Driver { source: DriverError },

    /// The graphics context went away. Every handle must be re-acquired.
    ContextLost,

    /// Called from a thread other than the one owning the graphics context.
    WrongThread { expected: ThreadId, found: ThreadId },

    /// Released more times than acquired.
    NotAcquired { id: ResourceId },

    /// The id predates the last context loss.
    StaleHandle { id: ResourceId },

    /// A resource of the wrong kind was passed, e.g. a texture as a program member.
    WrongKind {
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// The payload cannot be turned into a driver object.
    InvalidPayload { reason: String },

    /// The resource cannot be bound to this slot kind.
    IncompatibleBinding {
        slot: BindingSlot,
        kind: ResourceKind,
    },

    /// The slot's unit index is outside the available units.
    InvalidSlot { slot: BindingSlot, available: u32 },

    /// Looking the asset up in the registry failed.
    Registry { source: RegistryError },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::ShaderCompileError { stage, log } => {
                write!(f, "{} shader failed to compile: {}", stage, log)
            }
            GpuError::ShaderLinkError { log } => write!(f, "Program failed to link: {}", log),
            GpuError::Driver { source } => write!(f, "Driver error: {}", source),
            GpuError::ContextLost => write!(f, "Graphics context lost"),
            GpuError::WrongThread { expected, found } => write!(
                f,
                "GPU call from thread {:?}, but the graphics context belongs to {:?}",
                found, expected
            ),
            GpuError::NotAcquired { id } => write!(f, "Resource {} is not acquired", id),
            GpuError::StaleHandle { id } => {
                write!(f, "Resource {} belongs to a lost graphics context", id)
            }
            GpuError::WrongKind { expected, found } => {
                write!(f, "Expected a {} resource, got a {}", expected, found)
            }
            GpuError::InvalidPayload { reason } => write!(f, "Invalid payload: {}", reason),
            GpuError::IncompatibleBinding { slot, kind } => {
                write!(f, "Cannot bind a {} to {}", kind, slot)
            }
            GpuError::InvalidSlot { slot, available } => {
                write!(f, "Invalid slot {} ({} units available)", slot, available)
            }
            GpuError::Registry { source } => write!(f, "Registry error: {}", source),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::Driver { source } => Some(source),
            GpuError::Registry { source } => Some(source),
            _ => None,
        }
    }
}

impl From<DriverError> for GpuError {
    fn from(source: DriverError) -> Self {
        match source {
            DriverError::ContextLost => GpuError::ContextLost,
            source => GpuError::Driver { source },
        }
    }
}

impl From<RegistryError> for GpuError {
    fn from(source: RegistryError) -> Self {
        GpuError::Registry { source }
    }
}

pub type GpuResult<T> = Result<T, GpuError>;
