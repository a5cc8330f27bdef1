use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug)]
pub enum FCMError {
    #[error("Failed to read service account file: {0}")]
    CredentialsRead(#[from] std::io::Error),

    #[error("Failed to parse service account file: {0}")]
    CredentialsParse(#[from] serde_json::Error),

    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncodeError(String),

    #[error("Failed to get access token: {0}")]
    TokenError(String),

    #[error("Token request failed with status: {0}")]
    TokenRequestFailed(String),

    #[error("Failed to parse token response: {0}")]
    TokenParseError(String),

    #[error("FCM send request failed: {0}")]
    SendRequestError(String),

    #[error("Failed to parse FCM response: {0}")]
    ResponseParseError(String),

    #[error("FCM API error: {0} - {1}")]
    ApiError(String, String),

    #[error("Invalid device token")]
    InvalidToken,
}

impl FCMError {
    /// True when FCM rejected the token itself rather than the request.
    pub fn is_unregistered_token(&self) -> bool {
        match self {
            FCMError::InvalidToken => true,
            FCMError::ApiError(status, body) => {
                let body = body.to_uppercase();
                status.starts_with("404")
                    || body.contains("UNREGISTERED")
                    || (body.contains("INVALID_ARGUMENT") && body.contains("TOKEN"))
            }
            _ => false,
        }
    }
}
