//! Storage for images attached to posts. Posts keep only the reference `store` returns; the
//! media directory is served by a static file server under `media_url`.
use crate::twoface::{Cause, DescribeErr, ExternalError, Fallible};
use file_format::FileFormat;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// An uploaded image in one of the accepted formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// File extension matching the sniffed format.
    pub extension: &'static str,
}

impl Upload {
    /// Check an uploaded file. `Ok(None)` when no file was chosen.
    pub fn from_file(bytes: &[u8]) -> Result<Option<Upload>, &'static str> {
        if bytes.is_empty() {
            return Ok(None);
        }
        guard!(let Some(extension) = sniff(bytes) else {
            return Err("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")
        });
        Ok(Some(Upload {
            bytes: bytes.to_vec(),
            extension,
        }))
    }
}

/// The extension for the image formats we accept, detected from the file's contents.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    match FileFormat::from_bytes(bytes) {
        FileFormat::GraphicsInterchangeFormat => Some("gif"),
        FileFormat::PortableNetworkGraphics | FileFormat::AnimatedPortableNetworkGraphics => {
            Some("png")
        }
        FileFormat::JointPhotographicExpertsGroup => Some("jpg"),
        FileFormat::Webp => Some("webp"),
        _ => None,
    }
}

pub trait ImageStore: Send + Sync + 'static {
    /// Persist the image and return a reference to store on the post.
    fn store(&self, upload: &Upload) -> Fallible<String>;
    /// Public URL for a stored reference.
    fn url(&self, reference: &str) -> String;
}

/// Stores images on the local filesystem, named by content hash so re-uploads are free.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let mut url_prefix = url_prefix.to_owned();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }
}

const WRITE_FAILED: ExternalError = ExternalError {
    cause: Cause::ServerError,
    text: "Could not store the image",
};

impl ImageStore for FsImageStore {
    fn store(&self, upload: &Upload) -> Fallible<String> {
        let name = format!(
            "{}.{}",
            hex::encode(Sha256::digest(&upload.bytes)),
            upload.extension
        );
        let dir = self.root.join("posts");
        std::fs::create_dir_all(&dir).describe_err(WRITE_FAILED)?;
        let path = dir.join(&name);
        if !path.exists() {
            std::fs::write(&path, &upload.bytes).describe_err(WRITE_FAILED)?;
        }
        Ok(format!("posts/{}", name))
    }

    fn url(&self, reference: &str) -> String {
        format!("{}{}", self.url_prefix, reference)
    }
}

#[cfg(test)]
pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\
\x0A\x00\x3B";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(SMALL_GIF), Some("gif"));
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR"), Some("png"));
        assert_eq!(sniff(b"\xff\xd8\xff\xe0\x00\x10JFIF\x00"), Some("jpg"));
        assert_eq!(sniff(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some("webp"));
        assert_eq!(sniff(b"%PDF-1.4"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn test_upload_from_file() {
        let upload = Upload::from_file(SMALL_GIF).unwrap().unwrap();
        assert_eq!(upload.bytes, SMALL_GIF);
        assert_eq!(upload.extension, "gif");

        assert_eq!(Upload::from_file(b""), Ok(None));
        assert!(Upload::from_file(b"plain text").is_err());
    }

    #[test]
    fn test_fs_store_is_content_addressed() {
        let root = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(root.path(), "/media");
        let upload = Upload {
            bytes: SMALL_GIF.to_vec(),
            extension: "gif",
        };

        let first = store.store(&upload).unwrap();
        let second = store.store(&upload).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("posts/") && first.ends_with(".gif"));
        assert_eq!(std::fs::read(root.path().join(&first)).unwrap(), SMALL_GIF);
        assert_eq!(store.url(&first), format!("/media/{}", first));
    }
}
