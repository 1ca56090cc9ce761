// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request body helpers shared by the route modules.

use crate::error::{AppError, Result};
use crate::services::ImageUpload;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use std::collections::HashMap;

/// Upper bound on any request body; the largest accepted image plus form
/// overhead.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Unwrap a JSON body, reporting malformed input as `400` in the usual
/// error format.
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Text fields and an optional image read from a multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl FormData {
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// Read a multipart form. The part named `image_field` is taken as the
/// image (if it carries any bytes); every other part is read as text.
pub async fn read_form(mut multipart: Multipart, image_field: &str) -> Result<FormData> {
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == image_field {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(bad_form)?;
            if !bytes.is_empty() {
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(bad_form)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", e.body_text()))
}
