//! Community endpoints.

use serde::Serialize;
use serde_json::json;

use super::ApiClient;
use crate::error::Result;
use crate::types::Community;

#[derive(Debug, Clone, Serialize)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub is_nsfw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
}

impl ApiClient {
    pub async fn get_communities(&self) -> Result<Vec<Community>> {
        let body = self.get("/communities/").await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn get_community(&self, id: i64) -> Result<Community> {
        let body = self.get(&format!("/communities/{}/", id)).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn create_community(&self, community: &NewCommunity) -> Result<Community> {
        let body = self
            .post("/communities/", &serde_json::to_value(community)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn join_community(&self, id: i64) -> Result<()> {
        self.post(&format!("/communities/{}/join/", id), &json!({}))
            .await?;
        Ok(())
    }

    pub async fn leave_community(&self, id: i64) -> Result<()> {
        self.post(&format!("/communities/{}/leave/", id), &json!({}))
            .await?;
        Ok(())
    }
}
