//! Images attached to the next message: loading, size limits, and the pending list.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::core::history::ImageRef;

/// Largest file accepted for upload (10 MB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a supported image (JPG, PNG, GIF, WebP)")]
    NotAnImage(String),
    #[error("{name} is too large ({size} bytes). Maximum size is 10MB.")]
    TooLarge { name: String, size: u64 },
}

/// Image bytes, or an already-encoded `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Binary { bytes: Vec<u8>, mime: String },
    DataUrl(String),
}

/// An image attached to the message being composed. Request-scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    /// Original file name; also the key for de-duplication and removal.
    pub source_name: String,
    pub payload: ImagePayload,
    pub size_bytes: u64,
}

impl UploadedImage {
    /// Accept raw bytes when they look like an image we can decode.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let name = name.into();
        let size = bytes.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { name, size });
        }
        let format = image::guess_format(&bytes).map_err(|_| UploadError::NotAnImage(name.clone()))?;
        Ok(Self {
            source_name: name,
            payload: ImagePayload::Binary {
                bytes,
                mime: format.to_mime_type().to_string(),
            },
            size_bytes: size,
        })
    }

    pub fn from_data_url(name: impl Into<String>, url: impl Into<String>) -> Result<Self, UploadError> {
        let name = name.into();
        let url = url.into();
        if !url.starts_with("data:image/") {
            return Err(UploadError::NotAnImage(name));
        }
        let size = url.len() as u64;
        Ok(Self {
            source_name: name,
            payload: ImagePayload::DataUrl(url),
            size_bytes: size,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let meta = tokio::fs::metadata(path).await.map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                name,
                size: meta.len(),
            });
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(name, bytes)
    }

    /// `data:<mime>;base64,...` form of the image.
    pub fn to_data_url(&self) -> String {
        match &self.payload {
            ImagePayload::DataUrl(url) => url.clone(),
            ImagePayload::Binary { bytes, mime } => {
                format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
            }
        }
    }

    pub fn image_ref(&self) -> ImageRef {
        ImageRef {
            name: self.source_name.clone(),
            size_bytes: self.size_bytes,
        }
    }
}

/// Images waiting for the next send. Names are unique.
#[derive(Debug, Default)]
pub struct PendingUploads {
    items: Vec<UploadedImage>,
}

impl PendingUploads {
    /// Add an image; an image with the same name is replaced in place. Returns true on replace.
    pub fn add(&mut self, image: UploadedImage) -> bool {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.source_name == image.source_name)
        {
            *existing = image;
            return true;
        }
        self.items.push(image);
        false
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.source_name != name);
        self.items.len() != before
    }

    /// Hand over every pending image and clear the list.
    pub fn take(&mut self) -> Vec<UploadedImage> {
        std::mem::take(&mut self.items)
    }

    pub fn snapshot(&self) -> Vec<UploadedImage> {
        self.items.clone()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.source_name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 1x1 transparent PNG.
    pub(crate) const TRANSPARENT_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x60,
        0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01, 0xE9, 0xFA, 0xDC, 0xD8, 0x00, 0x00, 0x00, 0x00,
        0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    pub(crate) fn pixel(name: &str) -> UploadedImage {
        UploadedImage::from_bytes(name, TRANSPARENT_PNG.to_vec()).expect("valid png")
    }

    #[test]
    fn from_bytes_detects_png() {
        let img = pixel("pixel.png");
        assert_eq!(img.size_bytes, TRANSPARENT_PNG.len() as u64);
        assert!(img.to_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn from_bytes_rejects_text() {
        let err = UploadedImage::from_bytes("notes.txt", b"hello there".to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(name) if name == "notes.txt"));
    }

    #[test]
    fn from_bytes_rejects_oversized() {
        let mut bytes = TRANSPARENT_PNG.to_vec();
        bytes.resize(MAX_UPLOAD_BYTES as usize + 1, 0);
        let err = UploadedImage::from_bytes("huge.png", bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn from_data_url_requires_image_mime() {
        assert!(UploadedImage::from_data_url("a", "data:text/plain;base64,AAAA").is_err());
        let img = UploadedImage::from_data_url("a", "data:image/gif;base64,R0lG").unwrap();
        assert_eq!(img.to_data_url(), "data:image/gif;base64,R0lG");
    }

    #[tokio::test]
    async fn from_path_reads_file_name() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("dot.png");
        std::fs::write(&path, TRANSPARENT_PNG).expect("write");
        let img = UploadedImage::from_path(&path).await.expect("load");
        assert_eq!(img.source_name, "dot.png");
    }

    #[tokio::test]
    async fn from_path_missing_file_is_io_error() {
        let err = UploadedImage::from_path(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }

    #[test]
    fn pending_uploads_dedup_by_name() {
        let mut pending = PendingUploads::default();
        assert!(!pending.add(pixel("a.png")));
        assert!(!pending.add(pixel("b.png")));
        assert!(pending.add(pixel("a.png")));
        assert_eq!(pending.names(), vec!["a.png", "b.png"]);
    }

    #[test]
    fn pending_uploads_remove_and_take() {
        let mut pending = PendingUploads::default();
        pending.add(pixel("a.png"));
        pending.add(pixel("b.png"));
        assert!(pending.remove("a.png"));
        assert!(!pending.remove("a.png"));
        let taken = pending.take();
        assert_eq!(taken.len(), 1);
        assert!(pending.is_empty());
    }
}
