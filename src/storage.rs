use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Path the static directory is mounted at.
pub const STATIC_MOUNT: &str = "/static";
const IMAGE_SUBDIR: &str = "images";
const FILENAME_PREFIX: &str = "chart_image_";
const FILENAME_EXTENSION: &str = "png";

/// A downloaded image persisted under a generated name.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    pub filename: String,
    pub stored_path: PathBuf,
    pub public_url: String,
    pub size: usize,
}

/// Write-once store for downloaded images, backing `/static/images`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    url_path: String,
}

impl ImageStore {
    pub fn new(static_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: static_dir.as_ref().join(IMAGE_SUBDIR),
            url_path: format!("{}/{}", STATIC_MOUNT, IMAGE_SUBDIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists `bytes` under a fresh name and resolves its URL against `base_url`.
    pub async fn store(&self, bytes: &[u8], base_url: &str) -> Result<ImageArtifact> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::StorageWriteFailure(format!(
                "Failed to create {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let filename = generate_filename();
        let stored_path = self.dir.join(&filename);
        write_new(&stored_path, bytes).await?;

        tracing::debug!(path = %stored_path.display(), size = bytes.len(), "stored image");

        Ok(ImageArtifact {
            public_url: self.public_url(base_url, &filename),
            filename,
            stored_path,
            size: bytes.len(),
        })
    }

    /// Absolute URL under which `filename` is served back.
    pub fn public_url(&self, base_url: &str, filename: &str) -> String {
        format!("{}{}/{}", base_url.trim_end_matches('/'), self.url_path, filename)
    }
}

/// Writes `bytes` to a file that must not exist yet.
///
/// An existing file is left untouched. A file that fails mid-write is removed
/// so a truncated artifact never becomes servable.
pub async fn write_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| storage_error(path, e))?;

    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        drop(file);
        return Err(discard_partial(path, e).await);
    }

    Ok(())
}

async fn discard_partial(path: &Path, err: std::io::Error) -> AppError {
    if let Err(cleanup) = fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove partial image");
    }
    storage_error(path, err)
}

fn storage_error(path: &Path, err: std::io::Error) -> AppError {
    AppError::StorageWriteFailure(format!("Failed to write {}: {}", path.display(), err))
}

pub fn generate_filename() -> String {
    secure_filename(&format!(
        "{}{}.{}",
        FILENAME_PREFIX,
        Uuid::new_v4(),
        FILENAME_EXTENSION
    ))
}

/// Reduces `name` to a flat, ASCII-only filename that cannot escape its directory.
pub fn secure_filename(name: &str) -> String {
    let flattened: String = name
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
