use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::Config,
    constants::{IMAGE_TYPES, MAX_IMAGE_SIZE},
    error::{Error, HtmlError, StorageError},
};

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    /// File extension for the declared content type, if it is an accepted image type.
    pub fn extension(&self) -> Option<&'static str> {
        IMAGE_TYPES
            .iter()
            .find(|(mime, _)| mime.eq_ignore_ascii_case(self.content_type.trim()))
            .map(|(_, ext)| *ext)
    }

    pub fn validate(&self) -> Result<&'static str, Error> {
        let extension = self
            .extension()
            .ok_or_else(|| HtmlError::InvalidRequest.new("Unsupported image type"))?;

        if self.bytes.is_empty() {
            return Err(HtmlError::InvalidRequest.new("Image is empty"));
        }
        if self.bytes.len() > MAX_IMAGE_SIZE {
            return Err(HtmlError::InvalidRequest.new("Image exceeds the 5 MB limit"));
        }

        Ok(extension)
    }
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the image under a fresh name and returns its public URL.
    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, Error>;

    /// Accepts either the stored file name or the URL returned by `upload_image`.
    async fn delete_image(&self, name_or_url: &str) -> Result<(), Error>;
}

/// Images kept in a directory served under `public_url`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    dir: PathBuf,
    public_url: String,
}

impl LocalImageStorage {
    pub fn new(dir: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.image_dir, &config.image_public_url)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn public_url_of(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_url, file_name)
    }

    fn resolve(&self, name_or_url: &str) -> Result<PathBuf, StorageError> {
        let name = name_or_url
            .strip_prefix(&self.public_url)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(name_or_url);

        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StorageError::InvalidPath(name_or_url.to_string()));
        }

        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, Error> {
        let extension = upload.validate()?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(StorageError::from)?;
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes)
            .await
            .map_err(StorageError::from)?;

        log::info!("> Stored image {} as {}", upload.file_name, file_name);
        Ok(self.public_url_of(&file_name))
    }

    async fn delete_image(&self, name_or_url: &str) -> Result<(), Error> {
        let path = self.resolve(name_or_url)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("> Deleted image {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(HtmlError::NotFound.new("Image not found"))
            }
            Err(e) => Err(StorageError::from(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, LocalImageStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path(), "http://localhost:3000/uploads/");
        (dir, storage)
    }

    fn png(size: usize) -> ImageUpload {
        ImageUpload::new("tarte.png", "image/png", vec![7; size])
    }

    #[tokio::test]
    async fn upload_then_delete_by_url() {
        let (_dir, storage) = storage();

        let url = storage.upload_image(&png(64)).await.unwrap();
        assert!(url.starts_with("http://localhost:3000/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        assert!(storage.dir().join(name).exists());

        storage.delete_image(&url).await.unwrap();
        assert!(!storage.dir().join(name).exists());
    }

    #[tokio::test]
    async fn uploads_get_distinct_names() {
        let (_dir, storage) = storage();

        let a = storage.upload_image(&png(8)).await.unwrap();
        let b = storage.upload_image(&png(8)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn invalid_uploads_are_rejected() {
        let (_dir, storage) = storage();

        let gif = ImageUpload::new("anim.gif", "image/gif", vec![1; 8]);
        assert_eq!(storage.upload_image(&gif).await.unwrap_err().code, 400);
        assert_eq!(storage.upload_image(&png(0)).await.unwrap_err().code, 400);
        assert_eq!(
            storage
                .upload_image(&png(MAX_IMAGE_SIZE + 1))
                .await
                .unwrap_err()
                .code,
            400
        );
        assert!(storage.upload_image(&png(MAX_IMAGE_SIZE)).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_outside_the_directory_is_refused() {
        let (_dir, storage) = storage();

        for name in ["../secret.png", "nested/a.png", "..", "a\\b.png", ""] {
            assert_eq!(storage.delete_image(name).await.unwrap_err().code, 400);
        }
    }

    #[tokio::test]
    async fn deleting_a_missing_image_is_not_found() {
        let (_dir, storage) = storage();
        let e = storage.delete_image("missing.png").await.unwrap_err();
        assert_eq!(e.code, 404);
    }
}
