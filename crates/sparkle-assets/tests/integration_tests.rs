//! Integration tests for the asset compiler and registry.
//!
//! Every test builds an isolated source tree in a temporary directory.

use sparkle_assets::*;
use sparkle_core::{PixelFormat, ShaderStage};
use sparkle_test_utils::AssetTree;

const BASIC_VERT: &str = "#version 330 core\nlayout(location = 0) in vec3 pos;\nvoid main() { gl_Position = vec4(pos, 1.0); }\n";

fn compiler() -> AssetCompiler {
    AssetCompiler::new(CompilerConfig::default().with_worker_threads(2))
}

fn logo_tree() -> AssetTree {
    let tree = AssetTree::new().unwrap();
    tree.write_png("images/logo.png", 64, 64, [255, 128, 0, 255]).unwrap();
    tree.write_text("shaders/basic.vert", BASIC_VERT).unwrap();
    tree
}

// ============================================================================
// Font decoder supplied by the caller
// ============================================================================

/// Fixed-width "font": every byte of the file is a glyph drawn as a filled
/// 2x2 cell.
struct BlockFontDecoder;

impl AssetDecoder for BlockFontDecoder {
    fn kind(&self) -> AssetKind {
        AssetKind::Font
    }

    fn extensions(&self) -> &[&str] {
        &["blockfont"]
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
        if ctx.bytes.is_empty() {
            return Err(DecodeFailure::new("font defines no glyphs"));
        }
        let count = ctx.bytes.len() as u32;
        let atlas = vec![255u8; (count * 2 * 2) as usize];
        let glyphs: Vec<GlyphRecord> = ctx
            .bytes
            .iter()
            .enumerate()
            .map(|(i, &c)| GlyphRecord {
                codepoint: c as u32,
                x: (i * 2) as u16,
                y: 0,
                width: 2,
                height: 2,
                advance: 3,
                bearing_x: 0,
                bearing_y: 2,
                _pad: 0,
            })
            .collect();
        Ok(NormalizedPayload::font(count * 2, 2, 3, &atlas, &glyphs))
    }
}

// ============================================================================
// Compile and lookup
// ============================================================================

#[test]
fn test_logo_and_shader_scenario() {
    let tree = logo_tree();

    let bundle = compiler().compile(tree.path()).unwrap();
    let registry = Registry::load(bundle).unwrap();

    assert_eq!(registry.len(), 2);

    let logo = registry.lookup("images/logo").unwrap();
    assert_eq!(logo.kind(), AssetKind::Image);
    assert_eq!(
        logo.metadata(),
        AssetMetadata::Image {
            width: 64,
            height: 64,
            format: PixelFormat::Rgba8
        }
    );
    assert_eq!(logo.data().len(), 64 * 64 * 4);
    assert_eq!(&logo.data()[..4], &[255, 128, 0, 255]);

    let shader = registry.lookup("shaders/basic").unwrap();
    assert_eq!(shader.kind(), AssetKind::Shader);
    assert_eq!(
        shader.metadata(),
        AssetMetadata::Shader {
            stage: ShaderStage::Vertex
        }
    );
    assert_eq!(shader.data(), BASIC_VERT.as_bytes());
}

#[test]
fn test_two_runs_produce_identical_bytes() {
    let tree = logo_tree();
    tree.write_text(
        "meshes/tri.obj",
        "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
    )
    .unwrap();
    tree.write("data/blob.bin", &[9, 8, 7]).unwrap();

    let first = compiler().compile(tree.path()).unwrap();
    let second = AssetCompiler::new(CompilerConfig::default().with_worker_threads(5))
        .compile(tree.path())
        .unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_roundtrip_metadata_matches_decoder_output() {
    let tree = logo_tree();
    tree.write_gray_png("images/mask.png", 8, 4).unwrap();

    let decoders = DecoderRegistry::with_defaults();
    let registry = Registry::load(compiler().compile(tree.path()).unwrap()).unwrap();

    for (identifier, file) in [
        ("images/logo", "images/logo.png"),
        ("images/mask", "images/mask.png"),
        ("shaders/basic", "shaders/basic.vert"),
    ] {
        let path = tree.join(file);
        let decoded = decoders.decode(&path, &std::fs::read(&path).unwrap()).unwrap();
        let resource = registry.lookup(identifier).unwrap();

        assert_eq!(resource.metadata(), decoded.metadata, "{identifier}");
        assert_eq!(resource.data(), decoded.bytes.as_slice(), "{identifier}");
        assert_eq!(resource.content_hash(), ContentHash::of_payload(&decoded));
    }
}

#[test]
fn test_identical_images_share_content_hash() {
    let tree = AssetTree::new().unwrap();
    tree.write_png("ui/ok.png", 4, 4, [0, 255, 0, 255]).unwrap();
    tree.write_png("ui/confirm.png", 4, 4, [0, 255, 0, 255]).unwrap();

    let (bundle, stats) = compiler().compile_with_stats(tree.path()).unwrap();
    let registry = Registry::load(bundle).unwrap();

    let ok = registry.lookup("ui/ok").unwrap();
    let confirm = registry.lookup("ui/confirm").unwrap();
    assert_eq!(ok.content_hash(), confirm.content_hash());
    assert_eq!(stats.assets, 2);
    assert_eq!(stats.duplicate_payloads, 1);
}

#[test]
fn test_crlf_checkout_compiles_to_same_bundle() {
    let lf = AssetTree::new().unwrap();
    lf.write_text("shaders/basic.frag", "void main() {\n}\n").unwrap();
    let crlf = AssetTree::new().unwrap();
    crlf.write_text("shaders/basic.frag", "void main() {\r\n}\r\n").unwrap();

    assert_eq!(
        compiler().compile(lf.path()).unwrap(),
        compiler().compile(crlf.path()).unwrap()
    );
}

#[test]
fn test_unrecognized_and_hidden_files_are_skipped() {
    let tree = logo_tree();
    tree.write_text("README.md", "# assets").unwrap();
    tree.write_png(".cache/thumb.png", 2, 2, [0; 4]).unwrap();

    let (bundle, stats) = compiler().compile_with_stats(tree.path()).unwrap();
    let registry = Registry::load(bundle).unwrap();

    assert_eq!(stats.assets, 2);
    assert_eq!(stats.skipped, 1);
    assert!(!registry.contains(".cache/thumb"));

    let with_hidden = AssetCompiler::new(CompilerConfig::default().with_hidden_files(true));
    let registry = Registry::load(with_hidden.compile(tree.path()).unwrap()).unwrap();
    assert!(registry.contains(".cache/thumb"));
}

#[test]
fn test_custom_font_decoder() {
    let tree = AssetTree::new().unwrap();
    tree.write("fonts/mono.blockfont", b"AB").unwrap();

    let mut compiler = compiler();
    compiler.register_decoder(BlockFontDecoder);
    let registry = Registry::load(compiler.compile(tree.path()).unwrap()).unwrap();

    let font = registry.lookup("fonts/mono").unwrap();
    assert_eq!(
        font.metadata(),
        AssetMetadata::Font {
            atlas_width: 4,
            atlas_height: 2,
            glyph_count: 2,
            line_height: 3
        }
    );
    let (atlas, glyphs) = payload::font_parts(&font.metadata(), font.data()).unwrap();
    assert_eq!(atlas.len(), 8);
    assert_eq!(glyphs[1].codepoint, 'B' as u32);
}

#[test]
fn test_empty_tree_gives_empty_bundle() {
    let tree = AssetTree::new().unwrap();
    let registry = Registry::load(compiler().compile(tree.path()).unwrap()).unwrap();
    assert!(registry.is_empty());
}

// ============================================================================
// Compile failures
// ============================================================================

#[test]
fn test_duplicate_identifier_fails() {
    let tree = logo_tree();
    tree.write("images/logo.jpg", b"not even decoded").unwrap();

    match compiler().compile(tree.path()) {
        Err(CompileError::DuplicateIdentifier {
            identifier,
            first,
            second,
        }) => {
            assert_eq!(identifier, "images/logo");
            assert!(first.ends_with("logo.jpg"));
            assert!(second.ends_with("logo.png"));
        }
        other => panic!("expected DuplicateIdentifier, got {other:?}"),
    }
}

#[test]
fn test_decode_error_names_path_and_writes_nothing() {
    let tree = logo_tree();
    tree.write("images/broken.png", b"\x89PNG but truncated").unwrap();
    let dest = tree.join("out/assets.bundle");
    std::fs::create_dir_all(dest.parent().unwrap()).unwrap();

    match compiler().compile_to_file(tree.path(), &dest) {
        Err(CompileError::Decode { path, cause }) => {
            assert!(path.ends_with("images/broken.png"));
            assert_eq!(cause.message(), "invalid image data");
        }
        other => panic!("expected Decode error, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[test]
fn test_first_failure_in_identifier_order_wins() {
    let tree = AssetTree::new().unwrap();
    tree.write("a/first.png", b"garbage").unwrap();
    tree.write("z/last.png", b"garbage").unwrap();

    for _ in 0..5 {
        match compiler().compile(tree.path()) {
            Err(CompileError::Decode { path, .. }) => assert!(path.ends_with("a/first.png")),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let tree = logo_tree();
    let dest = tree.join("assets.bundle");

    let compiler = compiler();
    compiler.cancel_token().cancel();

    assert!(matches!(
        compiler.compile_to_file(tree.path(), &dest),
        Err(CompileError::Cancelled)
    ));
    assert!(!dest.exists());
}

#[test]
fn test_missing_root_is_io_error() {
    let tree = AssetTree::new().unwrap();
    let missing = tree.join("does-not-exist");
    assert!(matches!(
        compiler().compile(&missing),
        Err(CompileError::Io { .. })
    ));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_compile_to_file_then_load_file() {
    let tree = logo_tree();
    let dest = tree.join("build/assets.bundle");
    std::fs::create_dir_all(dest.parent().unwrap()).unwrap();

    let stats = compiler().compile_to_file(tree.path(), &dest).unwrap();
    assert_eq!(stats.assets, 2);

    let registry = Registry::load_file(&dest).unwrap();
    registry.verify().unwrap();
    assert!(registry.contains("images/logo"));
    assert_eq!(
        registry.lookup_id(AssetId::from_name("shaders/basic")).unwrap().identifier(),
        "shaders/basic"
    );
}

#[test]
fn test_tampered_bundle_is_rejected() {
    let tree = logo_tree();
    let mut bytes = compiler().compile(tree.path()).unwrap().as_bytes().to_vec();

    // Descriptor 0 byte_length, pushed past the payload.
    let length_field = bundle::HEADER_SIZE + 16;
    bytes[length_field..length_field + 8].copy_from_slice(&u64::MAX.to_le_bytes());

    assert!(matches!(
        Registry::load(EmbeddedBundle::from_vec(bytes)),
        Err(RegistryError::CorruptBundle { .. })
    ));
}

#[test]
fn test_future_version_is_unsupported() {
    let tree = logo_tree();
    let mut bytes = compiler().compile(tree.path()).unwrap().as_bytes().to_vec();
    bytes[4..6].copy_from_slice(&(BUNDLE_VERSION + 1).to_le_bytes());

    match Registry::load(EmbeddedBundle::from_vec(bytes)) {
        Err(RegistryError::UnsupportedBundleVersion { found, expected }) => {
            assert_eq!(found, BUNDLE_VERSION + 1);
            assert_eq!(expected, BUNDLE_VERSION);
        }
        other => panic!("expected UnsupportedBundleVersion, got {:?}", other.err()),
    }
}

#[test]
fn test_concurrent_lookups() {
    let tree = logo_tree();
    let registry = std::sync::Arc::new(Registry::load(compiler().compile(tree.path()).unwrap()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(registry.lookup("images/logo").unwrap().data().len(), 64 * 64 * 4);
                    assert!(registry.lookup("images/nope").is_err());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Build-script embedding
// ============================================================================

#[test]
fn test_embed_into_writes_bundle_and_module() {
    let tree = logo_tree();
    let out = tempfile::tempdir().unwrap();

    let module_path = build::embed_into(&compiler(), tree.path(), out.path()).unwrap();
    let module = std::fs::read_to_string(&module_path).unwrap();

    assert!(module.contains("pub static BUNDLE: &[u8] = include_bytes!"));
    assert!(module.contains("pub const IMAGES_LOGO: sparkle_assets::AssetId"));
    assert!(module.contains("pub const SHADERS_BASIC: sparkle_assets::AssetId"));

    let bundle = std::fs::read(out.path().join(build::BUNDLE_FILE)).unwrap();
    let registry = Registry::load(EmbeddedBundle::from_vec(bundle)).unwrap();
    assert_eq!(registry.len(), 2);
}
