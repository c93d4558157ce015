use crate::error::{AppError, AppResult};
use std::io::Cursor;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MB
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const THUMB_SIZE: u32 = 50;

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/gif" => data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38],
        "image/webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        _ => false,
    }
}

/// Public URLs of a stored avatar and its thumbnail variant.
pub struct StoredAvatar {
    pub url: String,
    pub thumb_url: String,
}

pub struct UploadService;

impl UploadService {
    /// Store an avatar image plus a 50×50 thumbnail variant.
    /// Returns the public URL paths for both.
    pub async fn save_avatar(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<StoredAvatar> {
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::PayloadTooLarge);
        }

        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {}. Allowed: jpeg, png, gif, webp",
                content_type
            )));
        }

        if !validate_magic_bytes(data, content_type) {
            return Err(AppError::Validation(
                "File content does not match declared content type".to_string(),
            ));
        }

        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => return Err(AppError::Validation("Unsupported file type".to_string())),
        };

        let thumb = render_thumbnail(data)?;

        let stem = Uuid::new_v4();
        let filename = format!("{stem}.{ext}");
        let thumb_filename = format!("{stem}_thumb.png");

        let dir = Path::new(&config.upload_dir).join("avatars");
        let thumb_dir = dir.join("thumbs");

        fs::create_dir_all(&thumb_dir).await.map_err(|e| {
            AppError::Validation(format!("Failed to create upload directory: {}", e))
        })?;

        fs::write(dir.join(&filename), data)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to write file: {}", e)))?;
        fs::write(thumb_dir.join(&thumb_filename), thumb)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to write thumbnail: {}", e)))?;

        Ok(StoredAvatar {
            url: format!("/uploads/avatars/{filename}"),
            thumb_url: format!("/uploads/avatars/thumbs/{thumb_filename}"),
        })
    }
}

/// Decode the upload and re-encode a 50×50 PNG variant.
fn render_thumbnail(data: &[u8]) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::Validation(format!("Unreadable image: {}", e)))?;

    let thumb = img.thumbnail_exact(THUMB_SIZE, THUMB_SIZE);
    let mut out = Cursor::new(Vec::new());
    thumb
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| AppError::Validation(format!("Failed to encode thumbnail: {}", e)))?;
    Ok(out.into_inner())
}
