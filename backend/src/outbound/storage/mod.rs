//! Local filesystem storage for product files and gallery images.
//!
//! Files live under one uploads root opened as a `cap_std` directory, so
//! every read and write is confined to it. Stored names are random; the
//! client-supplied name only contributes its extension.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{FileStorage, FileStorageError, FileUpload, StorageArea};

const AREAS: [StorageArea; 2] = [StorageArea::Products, StorageArea::Images];

/// `cap_std`-backed implementation of the `FileStorage` port.
#[derive(Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    dir: Arc<Dir>,
}

impl LocalFileStorage {
    /// Open (creating if needed) the uploads root and its area directories.
    ///
    /// # Errors
    /// Returns [`FileStorageError::Io`] when the directories cannot be created
    /// or opened.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStorageError> {
        let root = root.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        for area in AREAS {
            dir.create_dir_all(area.directory())
                .map_err(|error| io_error(&root.join(area.directory()), &error))?;
        }
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Absolute uploads root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory served publicly for gallery images.
    pub fn public_images_dir(&self) -> PathBuf {
        self.root.join(StorageArea::Images.directory())
    }
}

fn io_error(path: &Path, error: &io::Error) -> FileStorageError {
    FileStorageError::io(format!("{}: {error}", path.display()))
}

/// Accept only `<area>/<file>` paths produced by [`LocalFileStorage::store`].
fn checked_relative(path: &str) -> Result<&Path, FileStorageError> {
    let relative = Path::new(path);
    let mut components = relative.components();
    let area = match components.next() {
        Some(Component::Normal(area)) => area,
        _ => return Err(FileStorageError::rejected(format!("invalid storage path: {path}"))),
    };
    let is_known_area = AREAS.iter().any(|known| area == known.directory());
    let has_file = matches!(components.next(), Some(Component::Normal(_)));
    if !is_known_area || !has_file || components.next().is_some() {
        return Err(FileStorageError::rejected(format!(
            "invalid storage path: {path}"
        )));
    }
    Ok(relative)
}

async fn blocking<T, F>(task: F) -> Result<T, FileStorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, FileStorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| FileStorageError::io(format!("storage task failed: {error}")))?
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        area: StorageArea,
        upload: FileUpload,
    ) -> Result<String, FileStorageError> {
        let extension = upload.extension().ok_or_else(|| {
            FileStorageError::rejected(format!(
                "file name has no usable extension: {}",
                upload.original_name
            ))
        })?;
        let relative = format!(
            "{}/{}.{extension}",
            area.directory(),
            Uuid::new_v4().simple()
        );
        let dir = Arc::clone(&self.dir);
        let target = relative.clone();
        let root = self.root.clone();

        blocking(move || {
            dir.write(&target, &upload.contents)
                .map_err(|error| io_error(&root.join(&target), &error))
        })
        .await?;
        debug!(path = %relative, "stored upload");
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> Result<(), FileStorageError> {
        let relative = checked_relative(path)?.to_path_buf();
        let dir = Arc::clone(&self.dir);
        let root = self.root.clone();

        blocking(move || match dir.remove_file(&relative) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&root.join(&relative), &error)),
        })
        .await
    }

    fn locate(&self, path: &str) -> Result<PathBuf, FileStorageError> {
        let relative = checked_relative(path)?;
        let metadata = self
            .dir
            .metadata(relative)
            .map_err(|error| io_error(&self.root.join(relative), &error))?;
        if !metadata.is_file() {
            return Err(FileStorageError::io(format!("not a file: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
