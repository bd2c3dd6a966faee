//! Stable identifiers for compiled assets.

use std::fmt;
use std::path::{Component, Path};

use crate::error::{CompileError, CompileResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hash of a logical identifier such as `images/logo`.
///
/// Computable in `const` context so generated code can name assets statically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u64);

impl AssetId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:016x})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Logical identifier for a file at `relative` (relative to the source root):
/// `/`-separated components with the final extension removed.
pub fn identifier_for(relative: &Path) -> CompileResult<String> {
    let invalid = |reason: &str| CompileError::InvalidPath {
        path: relative.to_path_buf(),
        reason: reason.to_string(),
    };

    let stem_path = match relative.file_stem() {
        Some(stem) => relative.with_file_name(stem),
        None => return Err(invalid("no file name")),
    };

    let mut parts = Vec::new();
    for component in stem_path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| invalid("not valid UTF-8"))?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => return Err(invalid("must be relative to the source root")),
        }
    }
    if parts.is_empty() {
        return Err(invalid("empty identifier"));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(AssetId::from_name("").to_raw(), 0xcbf29ce484222325);
        assert_eq!(AssetId::from_name("a").to_raw(), 0xaf63dc4c8601ec8c);
        assert_eq!(AssetId::from_name("foobar").to_raw(), 0x85944171f73967e8);
    }

    #[test]
    fn test_asset_id_is_const() {
        const LOGO: AssetId = AssetId::from_name("images/logo");
        assert_eq!(LOGO, AssetId::from_name("images/logo"));
        assert_ne!(LOGO, AssetId::from_name("images/logo2"));
    }

    #[test]
    fn test_identifier_strips_final_extension() {
        assert_eq!(identifier_for(Path::new("images/logo.png")).unwrap(), "images/logo");
        assert_eq!(identifier_for(Path::new("shaders/basic.vert")).unwrap(), "shaders/basic");
        assert_eq!(identifier_for(Path::new("data/archive.tar.gz")).unwrap(), "data/archive.tar");
        assert_eq!(identifier_for(Path::new("./readme")).unwrap(), "readme");
    }

    #[test]
    fn test_identifier_rejects_escaping_paths() {
        assert!(identifier_for(Path::new("../secret.png")).is_err());
        assert!(identifier_for(Path::new("/abs/logo.png")).is_err());
    }
}
