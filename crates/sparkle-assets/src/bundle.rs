//! The compiled bundle: a self-describing binary blob.
//!
//! ```text
//! header       32 bytes   magic "SPKB", version u16, flags u16, count u32,
//!                         names_len u32, payload_len u64, reserved u64
//! descriptors  72 bytes each
//! names        names_len bytes of UTF-8 identifiers
//! (zero padding to a 16-byte boundary)
//! payload      payload_len bytes
//! ```
//!
//! All integers are little-endian. Descriptors whose payloads hash the same
//! share one byte range.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sparkle_core::alloc::{HashMap, HashSet};

use crate::error::{CompileError, CompileResult, RegistryError, RegistryResult};
use crate::hash::ContentHash;
use crate::id::AssetId;
use crate::kind::{AssetKind, AssetMetadata, METADATA_WORDS};
use crate::payload::{NormalizedPayload, check_len};

pub const BUNDLE_MAGIC: [u8; 4] = *b"SPKB";
pub const BUNDLE_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 32;
pub const DESCRIPTOR_SIZE: usize = 72;
/// Alignment of the payload section within the bundle.
pub const PAYLOAD_ALIGN: usize = 16;

/// Locates and describes one resource inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub id: AssetId,
    pub identifier: String,
    pub kind: AssetKind,
    pub content_hash: ContentHash,
    /// Offset from the start of the payload section.
    pub byte_offset: u64,
    pub byte_length: u64,
    pub metadata: AssetMetadata,
}

/// Encoded bundle bytes, either embedded in the binary or owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBundle {
    bytes: Cow<'static, [u8]>,
}

impl EmbeddedBundle {
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
        }
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Cow::Owned(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse and validate the descriptor table.
    pub fn descriptors(&self) -> RegistryResult<Vec<ResourceDescriptor>> {
        parse(&self.bytes).map(|parsed| parsed.descriptors)
    }

    /// Write to `path` through a temporary file in the same directory, then
    /// rename into place. Readers never observe a partial bundle.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&self.bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

struct PendingEntry {
    identifier: String,
    content_hash: ContentHash,
    payload: NormalizedPayload,
}

/// Accumulates payloads and encodes them into an [`EmbeddedBundle`].
///
/// Output depends only on the set of entries, not on push order.
pub struct BundleBuilder {
    alignment: usize,
    entries: Vec<PendingEntry>,
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::with_alignment(PAYLOAD_ALIGN)
    }

    /// Align each payload to `alignment` bytes (rounded up to a power of two).
    pub fn with_alignment(alignment: usize) -> Self {
        Self {
            alignment: alignment.max(1).next_power_of_two(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, identifier: impl Into<String>, payload: NormalizedPayload) -> ContentHash {
        let content_hash = ContentHash::of_payload(&payload);
        self.entries.push(PendingEntry {
            identifier: identifier.into(),
            content_hash,
            payload,
        });
        content_hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose payload is already stored under another identifier.
    pub fn duplicate_payloads(&self) -> usize {
        let unique: HashSet<ContentHash> = self.entries.iter().map(|e| e.content_hash).collect();
        self.entries.len() - unique.len()
    }

    pub fn finish(mut self) -> CompileResult<EmbeddedBundle> {
        self.entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut seen_ids: HashMap<AssetId, usize> = HashMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let id = AssetId::from_name(&entry.identifier);
            if let Some(&first) = seen_ids.get(&id) {
                return Err(CompileError::DuplicateIdentifier {
                    identifier: entry.identifier.clone(),
                    first: PathBuf::from(&self.entries[first].identifier),
                    second: PathBuf::from(&entry.identifier),
                });
            }
            seen_ids.insert(id, index);
        }

        let count = u32::try_from(self.entries.len()).map_err(|_| too_large("too many assets"))?;

        let mut names = Vec::new();
        let mut payload = Vec::new();
        let mut stored: HashMap<ContentHash, (u64, u64)> = HashMap::new();
        let mut records = Vec::with_capacity(self.entries.len() * DESCRIPTOR_SIZE);

        for entry in &self.entries {
            let name_offset = u32::try_from(names.len()).map_err(|_| too_large("names table exceeds 4 GiB"))?;
            let name_len = u32::try_from(entry.identifier.len()).map_err(|_| too_large("identifier too long"))?;
            names.extend_from_slice(entry.identifier.as_bytes());

            let (byte_offset, byte_length) = *stored.entry(entry.content_hash).or_insert_with(|| {
                payload.resize(align_up(payload.len(), self.alignment), 0);
                let offset = payload.len() as u64;
                payload.extend_from_slice(&entry.payload.bytes);
                (offset, entry.payload.bytes.len() as u64)
            });

            records.extend_from_slice(&AssetId::from_name(&entry.identifier).to_raw().to_le_bytes());
            records.extend_from_slice(&byte_offset.to_le_bytes());
            records.extend_from_slice(&byte_length.to_le_bytes());
            records.extend_from_slice(entry.content_hash.as_bytes());
            records.extend_from_slice(&name_offset.to_le_bytes());
            records.extend_from_slice(&name_len.to_le_bytes());
            records.extend_from_slice(&entry.payload.kind().tag().to_le_bytes());
            for word in entry.payload.metadata.encode() {
                records.extend_from_slice(&word.to_le_bytes());
            }
        }

        let names_len = u32::try_from(names.len()).map_err(|_| too_large("names table exceeds 4 GiB"))?;

        let mut out = Vec::with_capacity(HEADER_SIZE + records.len() + names.len() + PAYLOAD_ALIGN + payload.len());
        out.extend_from_slice(&BUNDLE_MAGIC);
        out.extend_from_slice(&BUNDLE_VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&names_len.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        debug_assert_eq!(out.len(), HEADER_SIZE);

        out.extend_from_slice(&records);
        out.extend_from_slice(&names);
        out.resize(align_up(out.len(), PAYLOAD_ALIGN), 0);
        out.extend_from_slice(&payload);

        Ok(EmbeddedBundle::from_vec(out))
    }
}

fn too_large(reason: &str) -> CompileError {
    CompileError::BundleTooLarge {
        reason: reason.to_string(),
    }
}

const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

pub(crate) struct ParsedBundle {
    pub descriptors: Vec<ResourceDescriptor>,
    pub payload_start: usize,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn take<const N: usize>(&mut self) -> RegistryResult<[u8; N]> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| RegistryError::corrupt("unexpected end of data"))?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u16(&mut self) -> RegistryResult<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> RegistryResult<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> RegistryResult<u64> {
        self.take().map(u64::from_le_bytes)
    }
}

pub(crate) fn parse(bytes: &[u8]) -> RegistryResult<ParsedBundle> {
    if bytes.len() < HEADER_SIZE {
        return Err(RegistryError::corrupt(format!(
            "truncated header ({} bytes)",
            bytes.len()
        )));
    }

    let mut header = Reader::new(bytes, 0);
    if header.take::<4>()? != BUNDLE_MAGIC {
        return Err(RegistryError::corrupt("bad magic"));
    }
    let version = header.u16()?;
    if version != BUNDLE_VERSION {
        return Err(RegistryError::UnsupportedBundleVersion {
            found: version,
            expected: BUNDLE_VERSION,
        });
    }
    let flags = header.u16()?;
    if flags != 0 {
        return Err(RegistryError::corrupt(format!("unknown flags {:#06x}", flags)));
    }
    let count = header.u32()? as usize;
    let names_len = header.u32()? as usize;
    let payload_len = header.u64()?;

    let names_start = count
        .checked_mul(DESCRIPTOR_SIZE)
        .and_then(|table| table.checked_add(HEADER_SIZE))
        .ok_or_else(|| RegistryError::corrupt("descriptor count overflows"))?;
    let names_end = names_start
        .checked_add(names_len)
        .ok_or_else(|| RegistryError::corrupt("names table overflows"))?;
    let payload_start = align_up(names_end, PAYLOAD_ALIGN);
    let expected_len = usize::try_from(payload_len)
        .ok()
        .and_then(|len| payload_start.checked_add(len))
        .ok_or_else(|| RegistryError::corrupt("payload length overflows"))?;
    if bytes.len() != expected_len {
        return Err(RegistryError::corrupt(format!(
            "length mismatch: header describes {} bytes, found {}",
            expected_len,
            bytes.len()
        )));
    }

    let names = &bytes[names_start..names_end];
    let mut reader = Reader::new(bytes, HEADER_SIZE);
    let mut descriptors = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);

    for index in 0..count {
        let id = AssetId::from_raw(reader.u64()?);
        let byte_offset = reader.u64()?;
        let byte_length = reader.u64()?;
        let content_hash = ContentHash::from_bytes(reader.take()?);
        let name_offset = reader.u32()? as usize;
        let name_len = reader.u32()? as usize;
        let kind_tag = reader.u32()?;
        let mut words = [0u32; METADATA_WORDS];
        for word in &mut words {
            *word = reader.u32()?;
        }

        let corrupt = |what: String| RegistryError::corrupt(format!("descriptor {}: {}", index, what));

        let kind = AssetKind::from_tag(kind_tag).ok_or_else(|| corrupt(format!("unknown kind tag {}", kind_tag)))?;
        let metadata =
            AssetMetadata::decode(kind, words).ok_or_else(|| corrupt(format!("invalid {} metadata", kind)))?;

        let in_range = byte_offset
            .checked_add(byte_length)
            .is_some_and(|end| end <= payload_len);
        if !in_range {
            return Err(corrupt(format!(
                "byte range {}+{} exceeds payload of {} bytes",
                byte_offset, byte_length, payload_len
            )));
        }
        check_len(&metadata, byte_length).map_err(|e| corrupt(e.message().to_string()))?;

        let name_bytes = name_offset
            .checked_add(name_len)
            .and_then(|end| names.get(name_offset..end))
            .ok_or_else(|| corrupt("name outside names table".to_string()))?;
        let identifier = std::str::from_utf8(name_bytes)
            .map_err(|_| corrupt("name is not valid UTF-8".to_string()))?
            .to_string();
        if AssetId::from_name(&identifier) != id {
            return Err(corrupt(format!("id does not match name '{}'", identifier)));
        }
        if !seen.insert(id) {
            return Err(corrupt(format!("duplicate identifier '{}'", identifier)));
        }

        descriptors.push(ResourceDescriptor {
            id,
            identifier,
            kind,
            content_hash,
            byte_offset,
            byte_length,
            metadata,
        });
    }

    Ok(ParsedBundle {
        descriptors,
        payload_start,
    })
}
