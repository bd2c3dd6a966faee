use sparkle_core::ShaderStage;

use super::{AssetDecoder, DecodeContext};
use crate::error::DecodeFailure;
use crate::kind::{AssetKind, AssetMetadata};
use crate::payload::NormalizedPayload;

const STAGE_PRAGMA: &str = "// stage:";

/// Shader source text.
///
/// The stage comes from a `// stage: <name>` pragma on the first line, or
/// from the extension (`vert`, `frag`, `comp`). `wgsl` and `glsl` sources
/// must carry the pragma. Line endings are normalized to `\n` and a UTF-8 BOM
/// is dropped, so checkouts with different line endings hash the same.
pub struct ShaderDecoder;

impl AssetDecoder for ShaderDecoder {
    fn kind(&self) -> AssetKind {
        AssetKind::Shader
    }

    fn extensions(&self) -> &[&str] {
        &["vert", "frag", "comp", "wgsl", "glsl"]
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
        let text = std::str::from_utf8(ctx.bytes)
            .map_err(|e| DecodeFailure::with_source("shader source is not valid UTF-8", e))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let source = text.replace("\r\n", "\n");

        let stage = match pragma_stage(&source)? {
            Some(stage) => stage,
            None => stage_from_extension(ctx.extension).ok_or_else(|| {
                DecodeFailure::new(format!(
                    "cannot infer shader stage for .{} source; add a '{} <stage>' first line",
                    ctx.extension, STAGE_PRAGMA
                ))
            })?,
        };

        Ok(NormalizedPayload::new(
            AssetMetadata::Shader { stage },
            source.into_bytes(),
        ))
    }
}

fn pragma_stage(source: &str) -> Result<Option<ShaderStage>, DecodeFailure> {
    let Some(first) = source.lines().next() else {
        return Ok(None);
    };
    let Some(name) = first.trim().strip_prefix(STAGE_PRAGMA) else {
        return Ok(None);
    };
    ShaderStage::from_name(name)
        .map(Some)
        .ok_or_else(|| DecodeFailure::new(format!("unknown shader stage '{}'", name.trim())))
}

fn stage_from_extension(extension: &str) -> Option<ShaderStage> {
    match extension {
        "vert" => Some(ShaderStage::Vertex),
        "frag" => Some(ShaderStage::Fragment),
        "comp" => Some(ShaderStage::Compute),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn decode(extension: &str, bytes: &[u8]) -> Result<NormalizedPayload, DecodeFailure> {
        ShaderDecoder.decode(DecodeContext {
            path: Path::new("shader"),
            bytes,
            extension,
            declared_kind: AssetKind::Shader,
        })
    }

    #[test]
    fn test_stage_from_extension() {
        let payload = decode("vert", b"void main() {}\n").unwrap();
        assert_eq!(
            payload.metadata,
            AssetMetadata::Shader {
                stage: ShaderStage::Vertex
            }
        );
        assert_eq!(payload.bytes, b"void main() {}\n");
    }

    #[test]
    fn test_pragma_overrides_extension() {
        let payload = decode("wgsl", b"// stage: fragment\n@fragment fn main() {}\n").unwrap();
        assert_eq!(
            payload.metadata,
            AssetMetadata::Shader {
                stage: ShaderStage::Fragment
            }
        );
    }

    #[test]
    fn test_wgsl_without_pragma_fails() {
        assert!(decode("wgsl", b"@vertex fn main() {}").is_err());
        assert!(decode("glsl", b"// stage: tessellation\n").is_err());
    }

    #[test]
    fn test_crlf_and_bom_normalize_to_same_payload() {
        let lf = decode("frag", b"void main() {\n}\n").unwrap();
        let crlf = decode("frag", b"\xef\xbb\xbfvoid main() {\r\n}\r\n").unwrap();
        assert_eq!(lf, crlf);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        assert!(decode("vert", &[0xff, 0xfe, 0x00]).is_err());
    }
}
