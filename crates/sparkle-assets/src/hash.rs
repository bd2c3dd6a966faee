//! 128-bit content digests used to deduplicate identical payloads.

use std::fmt::{self, Debug, Display, LowerHex};

use sha2::{Digest, Sha256};

use crate::kind::{AssetKind, AssetMetadata};
use crate::payload::NormalizedPayload;

/// First 16 bytes of a SHA-256 over the kind tag, the encoded metadata and
/// the payload bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn compute(metadata: &AssetMetadata, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(metadata.kind().tag().to_le_bytes());
        for word in metadata.encode() {
            hasher.update(word.to_le_bytes());
        }
        hasher.update(bytes);
        Self::truncate(hasher.finalize().as_slice())
    }

    pub fn of_payload(payload: &NormalizedPayload) -> Self {
        Self::compute(&payload.metadata, &payload.bytes)
    }

    /// Digest of an ordered list of member hashes, tagged with `kind`.
    ///
    /// Used for objects assembled from other objects, such as linked programs.
    pub fn combine(kind: AssetKind, members: &[ContentHash]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"combine");
        hasher.update(kind.tag().to_le_bytes());
        hasher.update((members.len() as u32).to_le_bytes());
        for member in members {
            hasher.update(member.0);
        }
        Self::truncate(hasher.finalize().as_slice())
    }

    fn truncate(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }
}

impl LowerHex for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        LowerHex::fmt(self, f)
    }
}

impl Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:x})", self)
    }
}
