//! Normalized payloads produced by decoders and consumed by the GPU side.
//!
//! Multi-byte scalars inside payloads are stored little-endian.

use bytemuck::{Pod, Zeroable};

use crate::error::DecodeFailure;
use crate::kind::{AssetKind, AssetMetadata};

pub const MESH_VERTEX_STRIDE: usize = std::mem::size_of::<MeshVertex>();
pub const GLYPH_RECORD_SIZE: usize = std::mem::size_of::<GlyphRecord>();

/// Interleaved mesh vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Placement of one glyph inside a font atlas.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct GlyphRecord {
    pub codepoint: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub advance: i16,
    pub bearing_x: i16,
    pub bearing_y: i16,
    pub _pad: u16,
}

static_assertions::const_assert_eq!(MESH_VERTEX_STRIDE, 32);
static_assertions::const_assert_eq!(GLYPH_RECORD_SIZE, 20);

/// Decoder output: metadata plus the bytes that will be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPayload {
    pub metadata: AssetMetadata,
    pub bytes: Vec<u8>,
}

impl NormalizedPayload {
    pub fn new(metadata: AssetMetadata, bytes: Vec<u8>) -> Self {
        Self { metadata, bytes }
    }

    pub fn raw(bytes: Vec<u8>) -> Self {
        Self::new(AssetMetadata::Raw, bytes)
    }

    pub fn mesh(vertices: &[MeshVertex], indices: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity(vertices.len() * MESH_VERTEX_STRIDE + indices.len() * 4);
        bytes.extend_from_slice(bytemuck::cast_slice(vertices));
        bytes.extend_from_slice(bytemuck::cast_slice(indices));
        Self::new(
            AssetMetadata::Mesh {
                vertex_count: vertices.len() as u32,
                index_count: indices.len() as u32,
            },
            bytes,
        )
    }

    /// Build a font payload from an R8 atlas and its glyph table.
    pub fn font(
        atlas_width: u32,
        atlas_height: u32,
        line_height: u32,
        atlas: &[u8],
        glyphs: &[GlyphRecord],
    ) -> Self {
        let mut bytes = Vec::with_capacity(atlas.len() + glyphs.len() * GLYPH_RECORD_SIZE);
        bytes.extend_from_slice(atlas);
        bytes.extend_from_slice(bytemuck::cast_slice(glyphs));
        Self::new(
            AssetMetadata::Font {
                atlas_width,
                atlas_height,
                glyph_count: glyphs.len() as u32,
                line_height,
            },
            bytes,
        )
    }

    pub fn kind(&self) -> AssetKind {
        self.metadata.kind()
    }

    /// Check that the byte length matches what the metadata implies.
    pub fn validate(&self) -> Result<(), DecodeFailure> {
        check_len(&self.metadata, self.bytes.len() as u64)
    }
}

pub(crate) fn check_len(metadata: &AssetMetadata, len: u64) -> Result<(), DecodeFailure> {
    match metadata.expected_len() {
        Some(expected) if expected != len => Err(DecodeFailure::new(format!(
            "{} payload is {} bytes, metadata implies {}",
            metadata.kind(),
            len,
            expected
        ))),
        _ => Ok(()),
    }
}

/// Split a mesh payload into vertices and indices. Works on unaligned input.
pub fn mesh_parts(metadata: &AssetMetadata, bytes: &[u8]) -> Option<(Vec<MeshVertex>, Vec<u32>)> {
    let AssetMetadata::Mesh { vertex_count, .. } = *metadata else {
        return None;
    };
    check_len(metadata, bytes.len() as u64).ok()?;
    let split = vertex_count as usize * MESH_VERTEX_STRIDE;
    let (vertices, indices) = bytes.split_at(split);
    Some((read_unaligned(vertices), read_unaligned(indices)))
}

/// Split a font payload into the atlas pixels and glyph table.
pub fn font_parts<'a>(metadata: &AssetMetadata, bytes: &'a [u8]) -> Option<(&'a [u8], Vec<GlyphRecord>)> {
    let AssetMetadata::Font {
        atlas_width,
        atlas_height,
        ..
    } = *metadata
    else {
        return None;
    };
    check_len(metadata, bytes.len() as u64).ok()?;
    let (atlas, glyphs) = bytes.split_at(atlas_width as usize * atlas_height as usize);
    Some((atlas, read_unaligned(glyphs)))
}

fn read_unaligned<T: Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
