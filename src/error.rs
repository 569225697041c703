use serde_json::Value;

/// Uniform failure object for backend responses: HTTP status, best-effort
/// parsed body, and a human-readable message derived from the body shape.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: u16,
    pub data: Option<Value>,
    pub message: String,
}

impl ApiError {
    /// Build from a non-2xx response body. The body is parsed best-effort;
    /// unparseable bodies leave `data` empty and fall back to a generic message.
    pub fn from_body(status: u16, body: &str) -> Self {
        let data = serde_json::from_str::<Value>(body).ok();
        let message = data
            .as_ref()
            .and_then(message_from_body)
            .unwrap_or_else(|| format!("request failed with status {}", status));
        Self {
            status,
            data,
            message,
        }
    }

    /// The `detail` string from the body, if present.
    pub fn detail(&self) -> Option<&str> {
        self.data.as_ref()?.get("detail")?.as_str()
    }

    /// A machine-readable `code` from the body, if the backend sends one.
    pub fn code(&self) -> Option<&str> {
        self.data.as_ref()?.get("code")?.as_str()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Derive a message from the error-body shapes the backend produces:
/// `{detail}`, `{non_field_errors: [..]}`, or a field-keyed map of arrays
/// rendered as a semicolon-joined `field: messages` summary.
fn message_from_body(data: &Value) -> Option<String> {
    let obj = data.as_object()?;

    if let Some(detail) = obj.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }

    if let Some(errors) = obj.get("non_field_errors").and_then(Value::as_array) {
        let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return Some(joined.join("; "));
        }
    }

    let mut parts = Vec::new();
    for (field, value) in obj {
        if let Some(messages) = value.as_array() {
            let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            if !joined.is_empty() {
                parts.push(format!("{}: {}", field, joined.join(", ")));
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Api(ApiError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("email is not verified")]
    EmailNotVerified,

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("upload failed, post not created: {0}")]
    UploadFailed(String),

    #[error("post creation failed; uploaded media may be orphaned: {0}")]
    PostCreationFailed(String),

    #[error("no community selected")]
    MissingCommunity,

    #[error("title must be between 1 and 300 characters")]
    InvalidTitle,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("a report is already being submitted")]
    ReportInFlight,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status of the underlying API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_body_becomes_message() {
        let err = ApiError::from_body(401, r#"{"detail":"Invalid credentials"}"#);
        assert_eq!(err.status, 401);
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.detail(), Some("Invalid credentials"));
    }

    #[test]
    fn non_field_errors_are_joined() {
        let err = ApiError::from_body(400, r#"{"non_field_errors":["too short","too common"]}"#);
        assert_eq!(err.message, "too short; too common");
    }

    #[test]
    fn field_map_renders_semicolon_joined_summary() {
        let err = ApiError::from_body(
            400,
            r#"{"email":["invalid address"],"username":["taken","too long"]}"#,
        );
        // serde_json objects iterate in key order
        assert_eq!(
            err.message,
            "email: invalid address; username: taken, too long"
        );
    }

    #[test]
    fn unparseable_body_falls_back_to_status_message() {
        let err = ApiError::from_body(502, "<html>bad gateway</html>");
        assert!(err.data.is_none());
        assert_eq!(err.message, "request failed with status 502");
    }

    #[test]
    fn code_is_exposed_when_present() {
        let err = ApiError::from_body(403, r#"{"detail":"nope","code":"email_not_verified"}"#);
        assert_eq!(err.code(), Some("email_not_verified"));
    }

    #[test]
    fn error_status_helper() {
        let err = Error::from(ApiError::from_body(404, "{}"));
        assert_eq!(err.status(), Some(404));
        assert_eq!(Error::PasswordMismatch.status(), None);
    }
}
