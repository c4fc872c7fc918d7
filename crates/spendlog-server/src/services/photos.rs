use std::path::Path;

use crate::error::{AppError, AppResult};

/// Placeholder served when a user has never uploaded a photo.
pub const DEFAULT_PHOTO: &str = "/img/default-avatar.svg";

#[derive(Debug)]
pub struct SavedPhoto {
    pub file_name: String,
    /// Path as stored on the user record and requested by browsers.
    pub public_path: String,
}

/// Write an uploaded photo to the uploads directory, synchronously, before the
/// handler responds. File names carry a millisecond-timestamp prefix so
/// repeated uploads of the same file don't overwrite each other.
pub fn save_photo(uploads_dir: &str, original_name: &str, data: &[u8]) -> AppResult<SavedPhoto> {
    std::fs::create_dir_all(uploads_dir)
        .map_err(|e| AppError::Internal(format!("Failed to create uploads directory: {e}")))?;

    let mut safe_name = sanitize_filename::sanitize(original_name);
    if safe_name.is_empty() {
        safe_name = "photo.bin".to_string();
    }

    let file_name = format!("{}-{}", chrono::Utc::now().timestamp_millis(), safe_name);
    let path = Path::new(uploads_dir).join(&file_name);

    std::fs::write(&path, data)
        .map_err(|e| AppError::Internal(format!("Failed to write photo: {e}")))?;

    Ok(SavedPhoto {
        public_path: format!("/uploads/{file_name}"),
        file_name,
    })
}
