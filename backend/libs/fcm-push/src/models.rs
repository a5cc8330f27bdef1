use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// FCM Send Result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FCMSendResult {
    pub message_id: Option<String>,
    pub token: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    /// FCM rejected the token as unknown or expired
    #[serde(default)]
    pub unregistered: bool,
}

/// Firebase Service Account Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// OAuth2 Token Cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

/// Exactly one of `token` or `topic` is set.
#[derive(Debug, Serialize)]
pub struct FcmMessageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<FcmAndroidConfig>,
}

/// FCM Notification Payload
#[derive(Debug, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct FcmAndroidConfig {
    pub priority: String,
}

impl FcmAndroidConfig {
    pub fn high_priority() -> Self {
        Self {
            priority: "high".to_string(),
        }
    }
}

/// FCM API Response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Multicast send result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MulticastSendResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<FCMSendResult>,
}

impl MulticastSendResult {
    pub fn push(&mut self, result: FCMSendResult) {
        if result.success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.results.push(result);
    }

    /// Tokens whose delivery failed.
    pub fn failed_tokens(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .filter_map(|r| r.token.as_deref())
            .collect()
    }

    /// Failed tokens that should be dropped from the directory.
    pub fn unregistered_tokens(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success && r.unregistered)
            .filter_map(|r| r.token.as_deref())
            .collect()
    }
}
