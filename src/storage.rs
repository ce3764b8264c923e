//! On-disk store for uploaded report files.
//!
//! Files land in `<uploads>/reports/<millis>-<sanitized name>` and are
//! addressed by the URL `/uploads/reports/<file>`, which the router serves
//! read-only from the same tree.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const URL_PREFIX: &str = "/uploads/reports/";
const REPORTS_SUBDIR: &str = "reports";
const MAX_NAME_CHARS: usize = 100;
const NAME_COLLISION_ATTEMPTS: i64 = 16;

/// Accepted upload types: PDF documents and JPEG/PNG images.
const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Only PDF, JPG, JPEG, and PNG files are allowed")]
    UnsupportedType,

    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Not a stored upload URL: {0}")]
    InvalidUrl(String),

    #[error("Could not find a free file name for {0}")]
    NameExhausted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized client file name.
    pub file_name: String,
    /// Public URL, `/uploads/reports/<stored name>`.
    pub url: String,
    pub mime_type: &'static str,
    pub size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FileStore {
    /// `root` is the directory served at `/uploads`.
    pub fn new(root: PathBuf, max_bytes: usize) -> Self {
        Self { root, max_bytes }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_SUBDIR)
    }

    /// Validate and persist an upload. The extension and the leading bytes must
    /// both identify the same supported type.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge { limit: self.max_bytes });
        }

        let safe_name = sanitize_filename(original_name);
        let mime_type = allowed_mime_for(&safe_name, bytes)?;

        let dir = self.reports_dir();
        std::fs::create_dir_all(&dir)?;

        let millis = chrono::Utc::now().timestamp_millis();
        for bump in 0..NAME_COLLISION_ATTEMPTS {
            let stored_name = format!("{}-{}", millis + bump, safe_name);
            let path = dir.join(&stored_name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = file.write_all(bytes) {
                let _ = std::fs::remove_file(&path);
                return Err(e.into());
            }

            tracing::info!(file = %stored_name, size = bytes.len(), mime = mime_type, "Report file stored");
            return Ok(StoredFile {
                file_name: safe_name,
                url: format!("{URL_PREFIX}{stored_name}"),
                mime_type,
                size_bytes: bytes.len(),
            });
        }

        Err(StorageError::NameExhausted(safe_name))
    }

    /// Delete the file behind a stored URL. Missing files are not an error.
    pub fn remove(&self, url: &str) -> Result<(), StorageError> {
        let stored_name = url
            .strip_prefix(URL_PREFIX)
            .filter(|name| is_plain_file_name(name))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        match std::fs::remove_file(self.reports_dir().join(stored_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', '\0']) && !name.contains("..")
}

fn allowed_mime_for(file_name: &str, bytes: &[u8]) -> Result<&'static str, StorageError> {
    let by_extension = mime_guess::from_path(file_name)
        .iter()
        .find_map(|m| ALLOWED_MIME_TYPES.iter().copied().find(|a| *a == m.essence_str()));
    let by_content = detect_mime_from_bytes(bytes);

    match (by_extension, by_content) {
        (Some(ext), Some(content)) if ext == content => Ok(ext),
        _ => Err(StorageError::UnsupportedType),
    }
}

/// Identify a supported type from its magic bytes.
pub fn detect_mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png")
    } else if bytes.starts_with(b"%PDF") {
        Some("application/pdf")
    } else {
        None
    }
}

/// Strip path components and special characters from a client file name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let sanitized: String = base
        .chars()
        .filter(|&c| c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized: String = sanitized.chars().take(MAX_NAME_CHARS).collect();

    if sanitized.is_empty() {
        "report".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.4 minimal";
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn store(max: usize) -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("uploads"), max);
        (dir, store)
    }

    #[test]
    fn saves_pdf_under_reports() {
        let (_dir, store) = store(1024);
        let stored = store.save("blood work.pdf", PDF).unwrap();
        assert_eq!(stored.file_name, "blood_work.pdf");
        assert_eq!(stored.mime_type, "application/pdf");
        assert!(stored.url.starts_with(URL_PREFIX));
        assert!(stored.url.ends_with("-blood_work.pdf"));

        let name = stored.url.strip_prefix(URL_PREFIX).unwrap();
        let on_disk = std::fs::read(store.root().join("reports").join(name)).unwrap();
        assert_eq!(on_disk, PDF);
    }

    #[test]
    fn same_name_twice_gets_distinct_urls() {
        let (_dir, store) = store(1024);
        let a = store.save("scan.png", PNG).unwrap();
        let b = store.save("scan.png", PNG).unwrap();
        assert_ne!(a.url, b.url);
    }

    #[test]
    fn rejects_oversize() {
        let (_dir, store) = store(4);
        assert!(matches!(store.save("a.pdf", PDF), Err(StorageError::TooLarge { limit: 4 })));
    }

    #[test]
    fn rejects_empty() {
        let (_dir, store) = store(1024);
        assert!(matches!(store.save("a.pdf", b""), Err(StorageError::Empty)));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let (_dir, store) = store(1024);
        assert!(matches!(store.save("notes.txt", PDF), Err(StorageError::UnsupportedType)));
        assert!(matches!(store.save("noext", PDF), Err(StorageError::UnsupportedType)));
    }

    #[test]
    fn rejects_content_that_disagrees_with_extension() {
        let (_dir, store) = store(1024);
        assert!(matches!(store.save("scan.png", PDF), Err(StorageError::UnsupportedType)));
        assert!(matches!(store.save("x.pdf", b"MZ\x90\x00"), Err(StorageError::UnsupportedType)));
    }

    #[test]
    fn jpeg_and_jpg_extensions_accepted() {
        let (_dir, store) = store(1024);
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(store.save("a.jpg", &jpeg).unwrap().mime_type, "image/jpeg");
        assert_eq!(store.save("a.JPEG", &jpeg).unwrap().mime_type, "image/jpeg");
    }

    #[test]
    fn remove_deletes_and_tolerates_missing() {
        let (_dir, store) = store(1024);
        let stored = store.save("a.pdf", PDF).unwrap();
        store.remove(&stored.url).unwrap();
        store.remove(&stored.url).unwrap();
        let name = stored.url.strip_prefix(URL_PREFIX).unwrap();
        assert!(!store.root().join("reports").join(name).exists());
    }

    #[test]
    fn remove_refuses_foreign_urls() {
        let (_dir, store) = store(1024);
        assert!(matches!(store.remove("/etc/passwd"), Err(StorageError::InvalidUrl(_))));
        assert!(matches!(
            store.remove("/uploads/reports/../../secret"),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn sanitize_path_traversal() {
        let result = sanitize_filename("../../../etc/passwd");
        assert_eq!(result, "passwd");
        let windows = sanitize_filename("C:\\Users\\test\\file.jpg");
        assert_eq!(windows, "file.jpg");
    }

    #[test]
    fn sanitize_special_chars_and_length() {
        assert_eq!(sanitize_filename("my file (1).jpg"), "my_file__1_.jpg");
        assert!(sanitize_filename(&"a".repeat(300)).chars().count() <= MAX_NAME_CHARS);
        assert_eq!(sanitize_filename(""), "report");
        assert_eq!(sanitize_filename("..."), "report");
    }
}
