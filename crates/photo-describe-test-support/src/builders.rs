//! Fixture folder builder.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

/// A temporary folder populated with image files.
///
/// The folder is deleted when the builder is dropped.
pub struct FixtureFolder {
    dir: TempDir,
    names: Vec<String>,
}

impl FixtureFolder {
    /// Creates an empty temporary folder.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create fixture dir"),
            names: Vec::new(),
        }
    }

    /// Adds a valid 16x16 image, encoded according to the extension of
    /// `name` (png, jpg, gif, bmp or tiff).
    ///
    /// # Panics
    ///
    /// Panics if the image cannot be written.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_image(mut self, name: &str) -> Self {
        sample_image()
            .save(self.dir.path().join(name))
            .expect("write fixture image");
        self.names.push(name.to_string());
        self
    }

    /// Adds a valid PNG.
    #[must_use]
    pub fn with_png(self, name: &str) -> Self {
        self.with_image(name)
    }

    /// Adds several valid PNGs named `prefix000.png`, `prefix001.png`, ...
    #[must_use]
    pub fn with_pngs(mut self, prefix: &str, count: usize) -> Self {
        for i in 0..count {
            self = self.with_image(&format!("{prefix}{i:03}.png"));
        }
        self
    }

    /// Adds a file with an image extension whose content is not an image.
    #[must_use]
    pub fn with_corrupt(self, name: &str) -> Self {
        self.with_file(name, b"this is not an image")
    }

    /// Adds a PNG cut off halfway through its data.
    ///
    /// # Panics
    ///
    /// Panics if the image cannot be encoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_truncated_png(self, name: &str) -> Self {
        let mut bytes = Vec::new();
        sample_image()
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .expect("encode png");
        bytes.truncate(bytes.len() / 2);
        self.with_file(name, &bytes)
    }

    /// Adds a file with arbitrary content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_file(mut self, name: &str, contents: &[u8]) -> Self {
        fs::write(self.dir.path().join(name), contents).expect("write fixture file");
        if is_image_name(name) {
            self.names.push(name.to_string());
        }
        self
    }

    /// Path of the folder.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the folder.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Names of the image files added so far, in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for FixtureFolder {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_image() -> DynamicImage {
    let img = RgbImage::from_fn(16, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([255u8, 255, 255])
        } else {
            Rgb([0u8, 64, 128])
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn is_image_name(name: &str) -> bool {
    photo_describe_core::scan::is_supported_image(Path::new(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_images_decode() {
        let folder = FixtureFolder::new()
            .with_png("a.png")
            .with_image("b.jpg")
            .with_image("c.bmp");

        for name in folder.names() {
            assert!(image::open(folder.file(name)).is_ok(), "{name} should decode");
        }
    }

    #[test]
    fn test_corrupt_and_truncated_fail_to_decode() {
        let folder = FixtureFolder::new()
            .with_corrupt("bad.png")
            .with_truncated_png("half.png");

        assert!(image::open(folder.file("bad.png")).is_err());
        assert!(image::open(folder.file("half.png")).is_err());
    }

    #[test]
    fn test_non_image_files_not_listed() {
        let folder = FixtureFolder::new()
            .with_file("notes.txt", b"hello")
            .with_pngs("img", 3);
        assert_eq!(folder.names(), ["img000.png", "img001.png", "img002.png"]);
    }
}
