// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media host client for post images and profile pictures.
//!
//! Images are posted to an unsigned-upload endpoint (Cloudinary-style);
//! only the returned `secure_url` is ever stored.

use crate::config::Config;
use crate::error::AppError;
use serde::Deserialize;

/// Accepted image content types.
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// Destination of an upload, each with its own size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Posts,
    Profiles,
}

impl MediaFolder {
    pub fn name(self) -> &'static str {
        match self {
            MediaFolder::Posts => "posts",
            MediaFolder::Profiles => "profiles",
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            MediaFolder::Posts => 5 * 1024 * 1024,
            MediaFolder::Profiles => 2 * 1024 * 1024,
        }
    }
}

/// Image received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check type and size before anything leaves the process.
    pub fn validate(&self, folder: MediaFolder) -> Result<(), AppError> {
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(
                "Invalid file type. Only JPEG, PNG, and JPG are allowed".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest("Image file is empty".to_string()));
        }
        if self.bytes.len() > folder.max_bytes() {
            return Err(AppError::BadRequest(format!(
                "Image exceeds the {} MiB limit",
                folder.max_bytes() / (1024 * 1024)
            )));
        }
        Ok(())
    }

    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    fn extension(&self) -> &'static str {
        if self.content_type.eq_ignore_ascii_case("image/png") {
            "png"
        } else {
            "jpg"
        }
    }
}

/// Upload response from the media host.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Media host client.
#[derive(Clone)]
pub struct MediaService {
    http: reqwest::Client,
    /// `None` means no media host is configured
    upload_url: Option<String>,
    upload_preset: String,
    folder_prefix: String,
}

impl MediaService {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: config.media_upload_url.clone(),
            upload_preset: config.media_upload_preset.clone(),
            folder_prefix: config.media_folder_prefix.clone(),
        }
    }

    /// Validate and upload an image, returning its public URL.
    pub async fn upload(&self, folder: MediaFolder, image: ImageUpload) -> Result<String, AppError> {
        image.validate(folder)?;

        let folder_path = format!("{}/{}", self.folder_prefix, folder.name());

        // Mock mode (Debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.upload_url.is_none() {
                return Ok(format!(
                    "mock://media/{}/{}.{}",
                    folder_path,
                    uuid::Uuid::new_v4(),
                    image.extension()
                ));
            }
        }

        let upload_url = self
            .upload_url
            .as_ref()
            .ok_or_else(|| AppError::MediaHost("Media host not configured".to_string()))?;

        let size = image.bytes.len();
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder_path.clone())
            .part("file", part);

        let response = self
            .http
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::MediaHost(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MediaHost(format!(
                "Upload rejected ({}): {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::MediaHost(format!("Invalid upload response: {}", e)))?;

        tracing::info!(folder = %folder_path, size, url = %uploaded.secure_url, "Image uploaded");

        Ok(uploaded.secure_url)
    }
}
