//! Asset kinds and their kind-specific metadata.

use std::fmt;

use sparkle_core::{PixelFormat, ShaderStage};

/// Number of `u32` words in an encoded metadata block.
pub const METADATA_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Image,
    Shader,
    Font,
    Mesh,
    Raw,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Image,
        AssetKind::Shader,
        AssetKind::Font,
        AssetKind::Mesh,
        AssetKind::Raw,
    ];

    pub const fn tag(self) -> u32 {
        match self {
            AssetKind::Image => 1,
            AssetKind::Shader => 2,
            AssetKind::Font => 3,
            AssetKind::Mesh => 4,
            AssetKind::Raw => 5,
        }
    }

    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(AssetKind::Image),
            2 => Some(AssetKind::Shader),
            3 => Some(AssetKind::Font),
            4 => Some(AssetKind::Mesh),
            5 => Some(AssetKind::Raw),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Image => "image",
            AssetKind::Shader => "shader",
            AssetKind::Font => "font",
            AssetKind::Mesh => "mesh",
            AssetKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Kind-specific description of a normalized payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetMetadata {
    Image {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    Shader {
        stage: ShaderStage,
    },
    /// An R8 glyph atlas followed by `glyph_count` [`GlyphRecord`](crate::GlyphRecord)s.
    Font {
        atlas_width: u32,
        atlas_height: u32,
        glyph_count: u32,
        line_height: u32,
    },
    /// `vertex_count` [`MeshVertex`](crate::MeshVertex)es followed by `u32` indices.
    Mesh {
        vertex_count: u32,
        index_count: u32,
    },
    Raw,
}

impl AssetMetadata {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetMetadata::Image { .. } => AssetKind::Image,
            AssetMetadata::Shader { .. } => AssetKind::Shader,
            AssetMetadata::Font { .. } => AssetKind::Font,
            AssetMetadata::Mesh { .. } => AssetKind::Mesh,
            AssetMetadata::Raw => AssetKind::Raw,
        }
    }

    /// Fixed-size encoding stored in bundle descriptors and fed to the content hash.
    pub fn encode(&self) -> [u32; METADATA_WORDS] {
        match *self {
            AssetMetadata::Image {
                width,
                height,
                format,
            } => [width, height, format.channel_count(), 0, 0],
            AssetMetadata::Shader { stage } => [stage.tag(), 0, 0, 0, 0],
            AssetMetadata::Font {
                atlas_width,
                atlas_height,
                glyph_count,
                line_height,
            } => [atlas_width, atlas_height, glyph_count, line_height, 0],
            AssetMetadata::Mesh {
                vertex_count,
                index_count,
            } => [
                vertex_count,
                index_count,
                crate::payload::MESH_VERTEX_STRIDE as u32,
                4,
                0,
            ],
            AssetMetadata::Raw => [0; METADATA_WORDS],
        }
    }

    /// Inverse of [`encode`](Self::encode). `None` if the words are not valid for `kind`.
    pub fn decode(kind: AssetKind, words: [u32; METADATA_WORDS]) -> Option<Self> {
        match kind {
            AssetKind::Image => Some(AssetMetadata::Image {
                width: words[0],
                height: words[1],
                format: PixelFormat::from_channel_count(words[2])?,
            }),
            AssetKind::Shader => Some(AssetMetadata::Shader {
                stage: ShaderStage::from_tag(words[0])?,
            }),
            AssetKind::Font => Some(AssetMetadata::Font {
                atlas_width: words[0],
                atlas_height: words[1],
                glyph_count: words[2],
                line_height: words[3],
            }),
            AssetKind::Mesh => {
                if words[2] as usize != crate::payload::MESH_VERTEX_STRIDE || words[3] != 4 {
                    return None;
                }
                Some(AssetMetadata::Mesh {
                    vertex_count: words[0],
                    index_count: words[1],
                })
            }
            AssetKind::Raw => Some(AssetMetadata::Raw),
        }
    }

    /// Payload size implied by the metadata, if the kind fixes one.
    pub fn expected_len(&self) -> Option<u64> {
        match *self {
            AssetMetadata::Image {
                width,
                height,
                format,
            } => Some(width as u64 * height as u64 * format.bytes_per_pixel() as u64),
            AssetMetadata::Font {
                atlas_width,
                atlas_height,
                glyph_count,
                ..
            } => Some(
                atlas_width as u64 * atlas_height as u64
                    + glyph_count as u64 * crate::payload::GLYPH_RECORD_SIZE as u64,
            ),
            AssetMetadata::Mesh {
                vertex_count,
                index_count,
            } => Some(
                vertex_count as u64 * crate::payload::MESH_VERTEX_STRIDE as u64
                    + index_count as u64 * 4,
            ),
            AssetMetadata::Shader { .. } | AssetMetadata::Raw => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(AssetKind::from_tag(0), None);
    }

    #[test]
    fn test_image_metadata_encodes_channel_count() {
        let meta = AssetMetadata::Image {
            width: 64,
            height: 32,
            format: PixelFormat::Rgba8,
        };
        assert_eq!(meta.encode(), [64, 32, 4, 0, 0]);
        assert_eq!(AssetMetadata::decode(AssetKind::Image, meta.encode()), Some(meta));
        assert_eq!(meta.expected_len(), Some(64 * 32 * 4));
    }

    #[test]
    fn test_decode_rejects_invalid_words() {
        assert_eq!(AssetMetadata::decode(AssetKind::Image, [1, 1, 9, 0, 0]), None);
        assert_eq!(AssetMetadata::decode(AssetKind::Shader, [0; 5]), None);
        assert_eq!(AssetMetadata::decode(AssetKind::Mesh, [3, 3, 12, 4, 0]), None);
    }
}
