//! Post endpoints.

use serde::Serialize;

use super::ApiClient;
use crate::error::Result;
use crate::types::{MediaItem, Post};

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub title: String,
    pub community_id: i64,
    pub is_nsfw: bool,
    pub is_spoiler: bool,
    pub content: String,
    /// Absent for text posts; a non-empty list for media posts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaItem>>,
}

impl ApiClient {
    pub async fn get_posts(&self, community_id: Option<i64>) -> Result<Vec<Post>> {
        let path = match community_id {
            Some(id) => format!("/posts/?community_id={}", id),
            None => "/posts/".to_string(),
        };
        let body = self.get(&path).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let body = self.post("/posts/", &serde_json::to_value(post)?).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;

    #[test]
    fn text_post_serializes_without_media_key() {
        let post = NewPost {
            title: "hello".to_string(),
            community_id: 1,
            is_nsfw: false,
            is_spoiler: false,
            content: "body".to_string(),
            media: None,
        };
        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("media").is_none());
        assert_eq!(value["content"], "body");
    }

    #[test]
    fn media_post_serializes_media_list() {
        let post = NewPost {
            title: "clip".to_string(),
            community_id: 1,
            is_nsfw: false,
            is_spoiler: false,
            content: String::new(),
            media: Some(vec![MediaItem {
                media_url: "https://cdn/clip.mp4".to_string(),
                media_type: MediaType::Video,
            }]),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["media"][0]["media_type"], "video");
        assert_eq!(value["content"], "");
    }
}
