//! Port for storing uploaded product files and gallery images.
//!
//! Stored paths are relative to the storage root, for example
//! `archivos/5f0c...e2.pdf`. Only paths under [`StorageArea::Images`] are
//! ever served publicly.

use std::path::PathBuf;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by file storage adapters.
    pub enum FileStorageError {
        /// The filesystem operation failed.
        Io { message: String } => "file storage failed: {message}",
        /// The path or name was refused before touching the filesystem.
        Rejected { message: String } => "file storage rejected the request: {message}",
    }
}

/// Directory an upload is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Sold product files.
    Products,
    /// Gallery images.
    Images,
}

impl StorageArea {
    /// Directory name under the storage root.
    #[must_use]
    pub const fn directory(self) -> &'static str {
        match self {
            Self::Products => "archivos",
            Self::Images => "imagenes",
        }
    }
}

/// File received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Name the client sent; only its extension is kept.
    pub original_name: String,
    /// File bytes.
    pub contents: Vec<u8>,
}

impl FileUpload {
    /// Lower-cased extension of the original name, without the dot.
    ///
    /// # Examples
    /// ```
    /// use mercado::domain::ports::FileUpload;
    ///
    /// let upload = FileUpload { original_name: "Guia.PDF".into(), contents: vec![] };
    /// assert_eq!(upload.extension().as_deref(), Some("pdf"));
    /// ```
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.original_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Port for writing, locating, and deleting stored files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write the upload under a fresh random name and return its relative
    /// path.
    async fn store(
        &self,
        area: StorageArea,
        upload: FileUpload,
    ) -> Result<String, FileStorageError>;

    /// Delete a stored file. Missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), FileStorageError>;

    /// Absolute location of a stored file, refusing paths that escape the
    /// storage root.
    fn locate(&self, path: &str) -> Result<PathBuf, FileStorageError>;
}
