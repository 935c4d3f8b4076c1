use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Relative location of product images inside the static directory.
const PRODUCT_IMAGE_DIR: &str = "images/products";

/// Product images stored under the static asset directory and referenced by
/// relative path (`images/products/<uuid>.<ext>`).
#[derive(Debug, Clone)]
pub struct ImageStore {
    static_dir: PathBuf,
}

impl ImageStore {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.static_dir.join(relative)
    }

    /// Writes the image under a fresh name and returns its relative path.
    pub async fn save(&self, extension: &str, bytes: &[u8]) -> AppResult<String> {
        let dir = self.static_dir.join(PRODUCT_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
        tokio::fs::write(dir.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(format!("{PRODUCT_IMAGE_DIR}/{file_name}"))
    }

    /// Removes a previously stored image. Only file names inside the product
    /// image directory are honoured; a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        let Some(file_name) = relative.rsplit('/').next().filter(|n| !n.is_empty()) else {
            return;
        };
        let path = self.absolute(&format!("{PRODUCT_IMAGE_DIR}/{file_name}"));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed previous product image"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove product image")
            }
        }
    }
}

/// Lower-cased extension of an uploaded file, if it is an accepted image type.
pub fn image_extension(file_name: &str) -> AppResult<String> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::BadRequest(format!(
            "File type not allowed. Accepted extensions: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check() {
        assert_eq!(image_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("a.b.webp").unwrap(), "webp");
        assert!(image_extension("script.sh").is_err());
        assert!(image_extension("noextension").is_err());
    }

    #[tokio::test]
    async fn save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let relative = store.save("png", b"\x89PNG").await.unwrap();
        assert!(relative.starts_with("images/products/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        store.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());

        // Unknown files are ignored.
        store.remove("images/products/missing.png").await;
    }
}
