use image::{ImageError, RgbaImage};
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Raster formats offered by the open dialog and accepted on drop.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Check if a path carries one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

// ============================================================================
// LOAD ERRORS
// ============================================================================

/// Why an image could not be turned into a usable pixel buffer.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Decode(ImageError),
    /// Decoded fine but has no pixels.
    Empty { width: u32, height: u32 },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {}", e),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::Empty { width, height } => {
                write!(f, "Image has no pixels ({}x{})", width, height)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Decode(e) => Some(e),
            LoadError::Empty { .. } => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<ImageError> for LoadError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => LoadError::Io(io),
            other => LoadError::Decode(other),
        }
    }
}

// ============================================================================
// LOADED IMAGE
// ============================================================================

/// An immutable, decoded base image.
///
/// `id` is fresh for every load so textures derived from a previous image are
/// never mistaken for the current one.
pub struct LoadedImage {
    pub id: Uuid,
    pub path: Option<PathBuf>,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(pixels: RgbaImage, path: Option<PathBuf>) -> Result<Self, LoadError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(LoadError::Empty { width, height });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            path,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width() as usize, self.height() as usize]
    }

    /// Display name derived from the file name.
    pub fn name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Decode an image file into RGBA.
pub fn load_image(path: &Path) -> Result<LoadedImage, LoadError> {
    let bytes = std::fs::read(path)?;
    let pixels = image::load_from_memory(&bytes)?.into_rgba8();
    LoadedImage::new(pixels, Some(path.to_path_buf()))
}

// ============================================================================
// FILE HANDLER
// ============================================================================

#[derive(Default)]
pub struct FileHandler {
    /// Directory of the last successfully picked file; the next dialog opens there.
    pub last_dir: Option<PathBuf>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show native file dialog to pick an image path (without loading it).
    /// `None` when the user cancels.
    pub fn pick_image_path(&mut self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .set_title("Open Image")
            .add_filter("Images", IMAGE_EXTENSIONS);
        if let Some(dir) = &self.last_dir {
            dialog = dialog.set_directory(dir);
        }
        let path = dialog.pick_file()?;
        self.last_dir = path.parent().map(Path::to_path_buf);
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("maskview-{}-{}", Uuid::new_v4(), name))
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_supported_image(Path::new("a/b/photo.PNG")));
        assert!(is_supported_image(Path::new("scan.jpeg")));
        assert!(is_supported_image(Path::new("scan.Bmp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn loads_png_from_disk() {
        let path = temp_path("ok.png");
        let img = RgbaImage::from_pixel(7, 3, Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (7, 3));
        assert_eq!(loaded.pixels.get_pixel(6, 2), &Rgba([10, 20, 30, 255]));
        assert!(loaded.name().ends_with("ok.png"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let path = temp_path("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = load_image(&path).err().unwrap();
        assert!(matches!(err, LoadError::Decode(_)), "got {err}");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_image(&temp_path("absent.png")).err().unwrap();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let err = LoadedImage::new(RgbaImage::new(0, 5), None).err().unwrap();
        assert!(matches!(err, LoadError::Empty { width: 0, height: 5 }));
    }

    #[test]
    fn each_load_gets_a_fresh_id() {
        let a = LoadedImage::new(RgbaImage::new(1, 1), None).unwrap();
        let b = LoadedImage::new(RgbaImage::new(1, 1), None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name(), "Unknown");
    }
}
