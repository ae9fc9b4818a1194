use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl PhotoUpload {
    pub fn validate(&self) -> Result<(), AppError> {
        let is_image = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(AppError::BadUpload("Images only".to_string()));
        }
        if self.data.is_empty() {
            return Err(AppError::Missing);
        }
        if self.data.len() > MAX_PHOTO_BYTES {
            return Err(AppError::BadUpload("File too large".to_string()));
        }
        Ok(())
    }
}

/// Account photos on local disk, served back under `/uploads`.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the photo and returns its public path.
    pub async fn save(&self, upload: &PhotoUpload) -> Result<String, AppError> {
        upload.validate()?;

        let name = stored_name(upload.file_name.as_deref());
        fs::write(self.dir.join(&name), &upload.data).await?;
        debug!("stored photo {} ({} bytes)", name, upload.data.len());

        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }

    /// Best-effort removal of a photo previously returned by `save`.
    pub async fn remove(&self, public_path: &str) {
        let Some(name) = public_path.strip_prefix(PUBLIC_PREFIX).map(|n| n.trim_start_matches('/')) else {
            return;
        };
        if let Err(e) = fs::remove_file(self.dir.join(name)).await {
            warn!("failed to remove photo {}: {}", public_path, e);
        }
    }
}

fn stored_name(original: Option<&str>) -> String {
    let token: String = Uuid::new_v4().simple().to_string().chars().take(10).collect();
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}_{}{}", Utc::now().timestamp_millis(), token, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png(data: &[u8]) -> PhotoUpload {
        PhotoUpload {
            file_name: Some("me.PNG".to_string()),
            content_type: Some("image/png".to_string()),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = stored_name(Some("photo.jpg"));
        let (millis, rest) = name.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 10 + ".jpg".len());
        assert!(rest.ends_with(".jpg"));

        assert!(!stored_name(None).contains('.'));
        assert!(!stored_name(Some("../../evil.p/hp")).contains('/'));
    }

    #[test]
    fn test_rejects_non_images_and_oversized() {
        let mut text = png(b"hello");
        text.content_type = Some("text/plain".to_string());
        assert!(matches!(text.validate(), Err(AppError::BadUpload(_))));

        let big = png(&vec![0u8; MAX_PHOTO_BYTES + 1]);
        assert!(matches!(big.validate(), Err(AppError::BadUpload(_))));

        assert!(matches!(png(b"").validate(), Err(AppError::Missing)));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempdir().unwrap();
        let photos = PhotoStore::open(dir.path()).await.unwrap();

        let path = photos.save(&png(b"\x89PNG")).await.unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));

        let name = path.trim_start_matches("/uploads/");
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"\x89PNG");

        photos.remove(&path).await;
        assert!(!dir.path().join(name).exists());
    }
}
