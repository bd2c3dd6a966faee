use std::io::Cursor;

use super::{AssetDecoder, DecodeContext};
use crate::error::DecodeFailure;
use crate::kind::AssetKind;
use crate::payload::{MeshVertex, NormalizedPayload};

/// Wavefront OBJ via `tobj`.
///
/// Faces are triangulated and vertices are deduplicated into a single index
/// buffer. All objects in the file are concatenated into one mesh. Materials
/// are ignored. Missing texture coordinates and normals are zero-filled.
pub struct MeshDecoder;

impl AssetDecoder for MeshDecoder {
    fn kind(&self) -> AssetKind {
        AssetKind::Mesh
    }

    fn extensions(&self) -> &[&str] {
        &["obj"]
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let mut reader = Cursor::new(ctx.bytes);
        let (models, _materials) =
            tobj::load_obj_buf(&mut reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
                .map_err(|e| DecodeFailure::with_source("invalid OBJ data", e))?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            let base = vertices.len() as u32;
            let count = mesh.positions.len() / 3;
            for i in 0..count {
                vertices.push(MeshVertex {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    uv: read2(&mesh.texcoords, i),
                    normal: read3(&mesh.normals, i),
                });
            }
            indices.extend(mesh.indices.iter().map(|index| base + index));
        }

        if indices.is_empty() {
            return Err(DecodeFailure::new("OBJ file contains no faces"));
        }
        tracing::trace!(
            "Decoded {} -> {} vertices, {} indices",
            ctx.path.display(),
            vertices.len(),
            indices.len()
        );
        Ok(NormalizedPayload::mesh(&vertices, &indices))
    }
}

fn read2(values: &[f32], i: usize) -> [f32; 2] {
    match values.get(i * 2..i * 2 + 2) {
        Some(v) => [v[0], v[1]],
        None => [0.0; 2],
    }
}

fn read3(values: &[f32], i: usize) -> [f32; 3] {
    match values.get(i * 3..i * 3 + 3) {
        Some(v) => [v[0], v[1], v[2]],
        None => [0.0; 3],
    }
}
