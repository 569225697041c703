//! Media upload endpoint (multipart).

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::ApiClient;
use crate::error::{Error, Result};
use crate::types::{MediaType, UploadResult};

/// Raw upload response. The server is supposed to return both fields, but
/// the pipeline validates rather than trusting it.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
}

impl UploadResponse {
    /// Validate into an [`UploadResult`]; a missing or empty `url` or a
    /// missing `media_type` is an upload failure.
    pub fn into_result(self) -> Result<UploadResult> {
        match (self.url, self.media_type) {
            (Some(url), Some(media_type)) if !url.is_empty() => {
                Ok(UploadResult { url, media_type })
            }
            _ => Err(Error::UploadFailed(
                "upload response missing url or media_type".to_string(),
            )),
        }
    }
}

impl ApiClient {
    /// Upload a file. `kind` tells the backend what the upload is for
    /// ("post", "community", "profile"). The MIME type is guessed from the
    /// file name; content-type of the request itself is left to reqwest.
    pub async fn upload_media(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        kind: &str,
    ) -> Result<UploadResponse> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("file", part)
            .text("kind", kind.to_string());

        let body = self.request_multipart("/media/upload/", form).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_response_validates() {
        let response = UploadResponse {
            url: Some("https://cdn/x.png".to_string()),
            media_type: Some(MediaType::Image),
        };
        let result = response.into_result().unwrap();
        assert_eq!(result.url, "https://cdn/x.png");
        assert_eq!(result.media_type, MediaType::Image);
    }

    #[test]
    fn missing_url_is_upload_failure() {
        let response = UploadResponse {
            url: None,
            media_type: Some(MediaType::Image),
        };
        assert!(matches!(
            response.into_result(),
            Err(Error::UploadFailed(_))
        ));
    }

    #[test]
    fn empty_url_is_upload_failure() {
        let response = UploadResponse {
            url: Some(String::new()),
            media_type: Some(MediaType::Video),
        };
        assert!(matches!(
            response.into_result(),
            Err(Error::UploadFailed(_))
        ));
    }

    #[test]
    fn missing_media_type_is_upload_failure() {
        let response = UploadResponse {
            url: Some("https://cdn/x.mp4".to_string()),
            media_type: None,
        };
        assert!(matches!(
            response.into_result(),
            Err(Error::UploadFailed(_))
        ));
    }
}
