//! Throwaway asset source trees for compiler and registry tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma, Rgba};
use tempfile::TempDir;

/// A source tree living in a temporary directory, removed on drop.
///
/// ```rust,no_run
/// use sparkle_test_utils::AssetTree;
///
/// let tree = AssetTree::new().unwrap();
/// tree.write_png("images/logo.png", 64, 64, [255, 0, 0, 255]).unwrap();
/// tree.write_text("shaders/basic.vert", "void main() {}\n").unwrap();
/// ```
pub struct AssetTree {
    dir: TempDir,
}

impl AssetTree {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn write_text(&self, relative: &str, text: &str) -> io::Result<PathBuf> {
        self.write(relative, text.as_bytes())
    }

    /// Write a solid-color RGBA PNG.
    pub fn write_png(&self, relative: &str, width: u32, height: u32, color: [u8; 4]) -> io::Result<PathBuf> {
        let image = ImageBuffer::from_pixel(width, height, Rgba(color));
        self.save(relative, |path| image.save(path))
    }

    /// Write a single-channel PNG with a horizontal gradient.
    pub fn write_gray_png(&self, relative: &str, width: u32, height: u32) -> io::Result<PathBuf> {
        let image = ImageBuffer::from_fn(width, height, |x, _| Luma([(x * 255 / width.max(1)) as u8]));
        self.save(relative, |path| image.save(path))
    }

    fn save(
        &self,
        relative: &str,
        save: impl FnOnce(&Path) -> image::ImageResult<()>,
    ) -> io::Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        save(&path).map_err(io::Error::other)?;
        Ok(path)
    }

    pub fn remove(&self, relative: &str) -> io::Result<()> {
        fs::remove_file(self.join(relative))
    }
}

/// Encode a solid-color RGBA PNG in memory.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> image::ImageResult<Vec<u8>> {
    let image = ImageBuffer::from_pixel(width, height, Rgba(color));
    let mut out = io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}
