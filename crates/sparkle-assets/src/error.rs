//! Error types for asset compilation and bundle loading.

use std::fmt;
use std::path::PathBuf;

/// A decoder adapter's failure: a message plus the underlying cause if any.
#[derive(Debug)]
pub struct DecodeFailure {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DecodeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DecodeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Errors that abort a compile run. No bundle is produced.
#[derive(Debug)]
pub enum CompileError {
    /// Reading the source tree or writing the output failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A decoder rejected a source file.
    Decode {
        path: PathBuf,
        cause: DecodeFailure,
    },

    /// Two source files map to the same identifier, or two identifiers to
    /// the same [`AssetId`](crate::AssetId).
    DuplicateIdentifier {
        identifier: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// The path cannot be turned into an identifier.
    InvalidPath { path: PathBuf, reason: String },

    /// The bundle would exceed a format limit.
    BundleTooLarge { reason: String },

    /// Build-script environment is missing something.
    Environment { message: String },

    /// The run was stopped through its [`CancelToken`](crate::CancelToken).
    Cancelled,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Io { path, source } => {
                write!(f, "IO error at '{}': {}", path.display(), source)
            }
            CompileError::Decode { path, cause } => {
                write!(f, "Failed to decode '{}': {}", path.display(), cause)
            }
            CompileError::DuplicateIdentifier {
                identifier,
                first,
                second,
            } => write!(
                f,
                "Duplicate asset identifier '{}' ('{}' and '{}')",
                identifier,
                first.display(),
                second.display()
            ),
            CompileError::InvalidPath { path, reason } => {
                write!(f, "Invalid asset path '{}': {}", path.display(), reason)
            }
            CompileError::BundleTooLarge { reason } => write!(f, "Bundle too large: {}", reason),
            CompileError::Environment { message } => write!(f, "Build environment: {}", message),
            CompileError::Cancelled => write!(f, "Asset compilation cancelled"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            CompileError::Decode { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Errors from loading a bundle or looking up resources in it.
#[derive(Debug)]
pub enum RegistryError {
    /// No resource with this identifier exists. Recoverable.
    NotFound { identifier: String },

    /// The bundle failed validation.
    CorruptBundle { reason: String },

    /// The bundle was written by an incompatible compiler.
    UnsupportedBundleVersion { found: u16, expected: u16 },

    /// [`Registry::init_global`](crate::Registry::init_global) ran twice.
    AlreadyInitialized,

    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RegistryError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        RegistryError::CorruptBundle {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound { identifier } => write!(f, "Resource not found: {}", identifier),
            RegistryError::CorruptBundle { reason } => write!(f, "Corrupt bundle: {}", reason),
            RegistryError::UnsupportedBundleVersion { found, expected } => write!(
                f,
                "Unsupported bundle version {} (this build reads version {})",
                found, expected
            ),
            RegistryError::AlreadyInitialized => write!(f, "Global registry already initialized"),
            RegistryError::Io { path, source } => {
                write!(f, "IO error reading bundle '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
