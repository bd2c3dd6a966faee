use super::{AssetDecoder, DecodeContext};
use crate::error::DecodeFailure;
use crate::kind::AssetKind;
use crate::payload::NormalizedPayload;

/// Opaque binary blobs, passed through unchanged.
pub struct RawDecoder;

impl AssetDecoder for RawDecoder {
    fn kind(&self) -> AssetKind {
        AssetKind::Raw
    }

    fn extensions(&self) -> &[&str] {
        &["bin", "dat"]
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
        Ok(NormalizedPayload::raw(ctx.bytes.to_vec()))
    }
}
