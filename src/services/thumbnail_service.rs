use anyhow::{Result, anyhow};
use image::ImageFormat;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

use crate::entities::files;
use crate::services::storage::StorageService;

/// Thumbnail dimension (max width or height)
const THUMB_SIZE: u32 = 256;

pub struct ThumbnailService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
}

impl ThumbnailService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>) -> Self {
        Self { db, storage }
    }

    pub fn thumbnail_key(file_id: &str) -> String {
        format!("thumbnails/{}.png", file_id)
    }

    /// Raster images only; SVG and non-image types have no thumbnail.
    pub fn supports(mime_type: &str) -> bool {
        mime_type.starts_with("image/") && mime_type != "image/svg+xml"
    }

    /// Generate and upload a thumbnail for a stored file, then flag the
    /// row. Called from a background task after upload.
    pub async fn generate_thumbnail(&self, file_id: &str) -> Result<()> {
        let file = files::Entity::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("File not found"))?;

        if file.has_thumbnail {
            return Ok(());
        }
        if !Self::supports(&file.mime_type) {
            return Err(anyhow!("Unsupported mime type for thumbnail generation"));
        }

        let data = self.storage.get_file(&file.storage_key).await?;
        let thumb_data = Self::render_thumbnail(&data)?;

        self.storage
            .upload_file(&Self::thumbnail_key(&file.id), thumb_data)
            .await?;

        let mut active: files::ActiveModel = file.into();
        active.has_thumbnail = Set(true);
        active.update(&self.db).await?;

        info!("Generated thumbnail for {}", file_id);
        Ok(())
    }

    fn render_thumbnail(data: &[u8]) -> Result<Vec<u8>> {
        let img = image::load_from_memory(data)?;
        let thumb = img.thumbnail(THUMB_SIZE, THUMB_SIZE);

        let mut out = Vec::new();
        thumb.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports() {
        assert!(ThumbnailService::supports("image/png"));
        assert!(ThumbnailService::supports("image/jpeg"));
        assert!(!ThumbnailService::supports("image/svg+xml"));
        assert!(!ThumbnailService::supports("video/mp4"));
    }

    #[test]
    fn test_render_thumbnail_shrinks() {
        // 512x512 solid red PNG
        let mut src = Vec::new();
        let img = image::RgbImage::from_pixel(512, 512, image::Rgb([255, 0, 0]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut src), ImageFormat::Png)
            .unwrap();

        let out = ThumbnailService::render_thumbnail(&src).unwrap();
        let thumb = image::load_from_memory(&out).unwrap();
        assert!(thumb.width() <= THUMB_SIZE);
        assert!(thumb.height() <= THUMB_SIZE);
    }

    #[test]
    fn test_render_thumbnail_rejects_garbage() {
        assert!(ThumbnailService::render_thumbnail(b"not an image").is_err());
    }
}
