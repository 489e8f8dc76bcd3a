//! Multipart back-office forms with an optional image file.

use std::collections::HashMap;

use axum::extract::Multipart;

use vitrine_api::{Api, ApiError, ImageUpload};

use crate::error::AppError;
use crate::routes::views::non_blank;

/// File field of product and category forms.
pub const IMAGE_FIELD: &str = "image";

/// Text field holding the current (or a pasted) image URL.
pub const IMAGE_URL_FIELD: &str = "image_url";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Text fields plus the uploaded image, if one was chosen.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl MultipartForm {
    /// Read every field of the request.
    ///
    /// # Errors
    ///
    /// Returns a bad request if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Build a form from text fields (tests).
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            image: None,
        }
    }

    /// A text field, empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// A checkbox: present means ticked.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The image reference to store: a fresh upload wins over the URL field.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    pub async fn resolve_image(&mut self, api: &Api) -> Result<Option<String>, ApiError> {
        match self.image.take() {
            Some(upload) => api.upload_image(upload).await.map(Some),
            None => Ok(non_blank(Some(self.text(IMAGE_URL_FIELD)))),
        }
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid form: {}", e.body_text()))
}
