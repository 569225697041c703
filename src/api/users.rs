//! Auth and account endpoints (`/auth/users/…`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ApiClient;
use crate::error::Result;
use crate::types::User;

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub re_password: String,
}

/// The created resource returned by registration, used to drive email
/// verification before any login happens.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub re_new_password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser> {
        let body = self.post("/auth/users/", &serde_json::to_value(request)?).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn create_token(&self, credentials: &Credentials) -> Result<TokenPair> {
        let body = self
            .post("/auth/jwt/create/", &serde_json::to_value(credentials)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn current_user(&self) -> Result<User> {
        let body = self.get("/auth/users/me/").await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.post("/auth/users/reset_password/", &json!({ "email": email }))
            .await?;
        Ok(())
    }

    pub async fn set_password(&self, change: &PasswordChange) -> Result<()> {
        self.post("/auth/users/set_password/", &serde_json::to_value(change)?)
            .await?;
        Ok(())
    }

    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<User> {
        let body = self
            .patch("/auth/users/me/", &serde_json::to_value(patch)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}
