//! Image upload.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::instrument;

use crate::client::Api;
use crate::error::ApiError;

/// An image file taken from a back-office form.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadAnswer {
    #[serde(alias = "url")]
    image_url: String,
}

impl Api {
    /// Upload an image as multipart field `image` and return the stored
    /// reference, to be saved verbatim on the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the file or the call fails.
    #[instrument(skip_all, fields(file = %upload.file_name, len = upload.bytes.len()))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, ApiError> {
        self.require_caller()?;
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = Form::new().part("image", part);
        let answer: UploadAnswer = self.write_multipart("/upload", form).await?;
        Ok(answer.image_url)
    }
}
