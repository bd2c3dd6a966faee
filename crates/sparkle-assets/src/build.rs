//! Build-script embedding.
//!
//! Call [`embed_assets`] from a `build.rs`, then expand
//! [`include_assets!`](crate::include_assets) in the crate:
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     sparkle_assets::build::embed_assets("assets").unwrap();
//! }
//!
//! // src/lib.rs
//! mod assets {
//!     sparkle_assets::include_assets!();
//! }
//!
//! let registry = sparkle_assets::Registry::init_global(assets::BUNDLE)?;
//! let logo = registry.lookup_id(assets::ids::IMAGES_LOGO)?;
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sparkle_core::alloc::HashSet;

use crate::compiler::{AssetCompiler, CompilerConfig, THREADS_ENV};
use crate::error::{CompileError, CompileResult};

pub const BUNDLE_FILE: &str = "sparkle_assets.bundle";
pub const MODULE_FILE: &str = "sparkle_assets.rs";

/// Compile `root` into `OUT_DIR` with the default compiler.
///
/// Returns the path of the generated module.
pub fn embed_assets(root: impl AsRef<Path>) -> CompileResult<PathBuf> {
    embed_assets_with(&AssetCompiler::new(CompilerConfig::from_env()), root)
}

/// Compile `root` into `OUT_DIR` with a configured compiler.
pub fn embed_assets_with(compiler: &AssetCompiler, root: impl AsRef<Path>) -> CompileResult<PathBuf> {
    let out_dir = std::env::var_os("OUT_DIR").ok_or_else(|| CompileError::Environment {
        message: "OUT_DIR is not set; call embed_assets from a build script".to_string(),
    })?;
    let root = root.as_ref();

    println!("cargo:rerun-if-changed={}", root.display());
    println!("cargo:rerun-if-env-changed={}", THREADS_ENV);

    embed_into(compiler, root, Path::new(&out_dir))
}

/// Compile `root` and write the bundle plus its Rust module into `out_dir`.
pub fn embed_into(compiler: &AssetCompiler, root: &Path, out_dir: &Path) -> CompileResult<PathBuf> {
    let (bundle, stats) = compiler.compile_with_stats(root)?;
    let identifiers: Vec<String> = bundle
        .descriptors()
        .map_err(|e| CompileError::Environment {
            message: format!("freshly compiled bundle failed validation: {}", e),
        })?
        .into_iter()
        .map(|d| d.identifier)
        .collect();

    let bundle_path = out_dir.join(BUNDLE_FILE);
    bundle.write_to(&bundle_path).map_err(|source| CompileError::Io {
        path: bundle_path.clone(),
        source,
    })?;

    let module_path = out_dir.join(MODULE_FILE);
    let module = generate_module(&bundle_path, &identifiers);
    std::fs::write(&module_path, module).map_err(|source| CompileError::Io {
        path: module_path.clone(),
        source,
    })?;

    tracing::info!(
        "Embedded {} assets into {}",
        stats.assets,
        bundle_path.display()
    );
    Ok(module_path)
}

fn generate_module(bundle_path: &Path, identifiers: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// @generated by sparkle-assets. Do not edit.");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "pub static BUNDLE: &[u8] = include_bytes!({:?});",
        bundle_path.display().to_string()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "#[allow(dead_code)]");
    let _ = writeln!(out, "pub mod ids {{");

    let mut used = HashSet::new();
    for identifier in identifiers {
        let base = const_name(identifier);
        let mut name = base.clone();
        let mut suffix = 2;
        while !used.insert(name.clone()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        let _ = writeln!(out, "    /// `{}`", identifier);
        let _ = writeln!(
            out,
            "    pub const {}: sparkle_assets::AssetId = sparkle_assets::AssetId::from_name({:?});",
            name, identifier
        );
    }
    let _ = writeln!(out, "}}");
    out
}

/// `images/logo-2x` -> `IMAGES_LOGO_2X`
fn const_name(identifier: &str) -> String {
    let mut name: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
