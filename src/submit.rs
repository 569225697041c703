//! Composite submissions: the ordered "upload media, then create the post
//! referencing the uploaded URL" operation, and community creation with an
//! uploaded icon. This module is the single place where that ordering is
//! enforced; a failed upload short-circuits before anything is created.

use std::path::Path;

use crate::api::communities::NewCommunity;
use crate::api::posts::NewPost;
use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::session::Navigator;
use crate::types::{Community, MediaItem, MediaType, UploadResult};

pub const MAX_TITLE_LEN: usize = 300;

/// A file staged for upload. The MIME type is guessed from the file name.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            bytes: std::fs::read(path)?,
        })
    }

    /// The media kind implied by the file's MIME prefix; `None` for
    /// anything that is neither image nor video.
    pub fn media_kind(&self) -> Option<MediaType> {
        let mime = mime_guess::from_path(&self.file_name).first()?;
        match mime.type_().as_str() {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub community_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub is_nsfw: bool,
    pub is_spoiler: bool,
    pub media: Option<MediaFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server returned a canonical path and we navigated to it.
    Created { id: i64, path: String },
    /// The post exists but the server omitted its path; the caller should
    /// surface a partial-success message rather than dropping the result.
    CreatedWithoutPath { id: i64 },
}

/// Validate a draft's scalar fields. Exposed separately so forms can check
/// before staging an upload.
pub fn validate_draft(draft: &PostDraft) -> Result<i64> {
    let community_id = draft.community_id.ok_or(Error::MissingCommunity)?;
    let title = draft.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidTitle);
    }
    Ok(community_id)
}

/// Submit a post. Media drafts upload first and only then create the post;
/// text drafts go straight to creation with their content.
pub async fn submit_post(
    api: &ApiClient,
    draft: PostDraft,
    navigator: &dyn Navigator,
) -> Result<SubmitOutcome> {
    let community_id = validate_draft(&draft)?;
    let title = draft.title.trim().to_string();

    let media = match &draft.media {
        Some(file) => {
            if file.media_kind().is_none() {
                return Err(Error::UnsupportedMedia(file.file_name.clone()));
            }
            let uploaded = upload(api, file, "post").await?;
            Some(vec![MediaItem {
                media_url: uploaded.url,
                // The server-reported type is authoritative over the local guess.
                media_type: uploaded.media_type,
            }])
        }
        None => None,
    };

    let request = NewPost {
        title,
        community_id,
        is_nsfw: draft.is_nsfw,
        is_spoiler: draft.is_spoiler,
        content: if media.is_some() {
            String::new()
        } else {
            draft.content
        },
        media,
    };

    let post = api
        .create_post(&request)
        .await
        .map_err(|e| Error::PostCreationFailed(e.to_string()))?;

    match post.path {
        Some(path) => {
            navigator.navigate(&path);
            Ok(SubmitOutcome::Created { id: post.id, path })
        }
        None => Ok(SubmitOutcome::CreatedWithoutPath { id: post.id }),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommunityDraft {
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub is_nsfw: bool,
    pub icon: Option<MediaFile>,
    pub banner: Option<MediaFile>,
}

/// Create a community, uploading icon and banner images first when present.
pub async fn submit_community(
    api: &ApiClient,
    draft: CommunityDraft,
    navigator: &dyn Navigator,
) -> Result<Community> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidTitle);
    }

    let icon_image = match &draft.icon {
        Some(file) => Some(upload(api, file, "community").await?.url),
        None => None,
    };
    let banner_image = match &draft.banner {
        Some(file) => Some(upload(api, file, "community").await?.url),
        None => None,
    };

    let community = api
        .create_community(&NewCommunity {
            name,
            description: draft.description,
            is_private: draft.is_private,
            is_nsfw: draft.is_nsfw,
            icon_image,
            banner_image,
        })
        .await?;

    navigator.navigate(&format!("/communities/{}", community.id));
    Ok(community)
}

/// Upload one file, attributing any failure in the step to the upload so
/// callers can tell it apart from a creation failure.
async fn upload(api: &ApiClient, file: &MediaFile, kind: &str) -> Result<UploadResult> {
    let response = api
        .upload_media(&file.file_name, file.bytes.clone(), kind)
        .await
        .map_err(|e| Error::UploadFailed(e.to_string()))?;
    response.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, community_id: Option<i64>) -> PostDraft {
        PostDraft {
            community_id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn draft_without_community_is_rejected() {
        assert!(matches!(
            validate_draft(&draft("hi", None)),
            Err(Error::MissingCommunity)
        ));
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(matches!(
            validate_draft(&draft("   ", Some(1))),
            Err(Error::InvalidTitle)
        ));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            validate_draft(&draft(&long, Some(1))),
            Err(Error::InvalidTitle)
        ));
    }

    #[test]
    fn max_length_title_is_accepted() {
        let max = "x".repeat(MAX_TITLE_LEN);
        assert_eq!(validate_draft(&draft(&max, Some(7))).unwrap(), 7);
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        // 300 chars but 600 bytes; the limit is on characters
        let accented = "é".repeat(MAX_TITLE_LEN);
        assert_eq!(validate_draft(&draft(&accented, Some(7))).unwrap(), 7);

        let over = "é".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            validate_draft(&draft(&over, Some(7))),
            Err(Error::InvalidTitle)
        ));
    }

    #[test]
    fn media_kind_follows_mime_prefix() {
        assert_eq!(
            MediaFile::new("clip.mp4", vec![]).media_kind(),
            Some(MediaType::Video)
        );
        assert_eq!(
            MediaFile::new("photo.png", vec![]).media_kind(),
            Some(MediaType::Image)
        );
        assert_eq!(MediaFile::new("notes.pdf", vec![]).media_kind(), None);
        assert_eq!(MediaFile::new("noextension", vec![]).media_kind(), None);
    }

    #[tokio::test]
    async fn unsupported_media_fails_before_any_request() {
        // Unroutable API: reaching the network would error differently.
        let api = ApiClient::new("http://127.0.0.1:9");
        let mut d = draft("hi", Some(1));
        d.media = Some(MediaFile::new("notes.pdf", vec![1, 2, 3]));
        let result = submit_post(&api, d, &crate::session::NoNavigation).await;
        assert!(matches!(result, Err(Error::UnsupportedMedia(name)) if name == "notes.pdf"));
    }
}
