//! GPU-facing vocabulary shared by the asset compiler and the render side.
//!
//! Both enums have a stable numeric tag because they are written into the
//! compiled bundle's metadata block.

use std::fmt;

/// Pixel layout of a normalized image or glyph atlas. Always 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub const fn channel_count(self) -> u32 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rg8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub const fn bytes_per_pixel(self) -> u32 {
        self.channel_count()
    }

    pub const fn from_channel_count(channels: u32) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::R8),
            2 => Some(PixelFormat::Rg8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub const fn tag(self) -> u32 {
        self.channel_count()
    }

    pub const fn from_tag(tag: u32) -> Option<Self> {
        Self::from_channel_count(tag)
    }
}

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const fn tag(self) -> u32 {
        match self {
            ShaderStage::Vertex => 1,
            ShaderStage::Fragment => 2,
            ShaderStage::Compute => 3,
        }
    }

    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(ShaderStage::Vertex),
            2 => Some(ShaderStage::Fragment),
            3 => Some(ShaderStage::Compute),
            _ => None,
        }
    }

    /// Parse a stage name as written in shader pragmas (`vertex`, `frag`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vertex" | "vert" | "vs" => Some(ShaderStage::Vertex),
            "fragment" | "frag" | "pixel" | "fs" => Some(ShaderStage::Fragment),
            "compute" | "comp" | "cs" => Some(ShaderStage::Compute),
            _ => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}
