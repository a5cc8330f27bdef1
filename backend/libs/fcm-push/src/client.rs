use chrono::{Duration, Utc};
use futures::future::join_all;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::FCMError;
use crate::models::*;

/// Upper bound FCM accepts for a single multicast batch.
pub const MAX_MULTICAST_TOKENS: usize = 500;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Firebase Cloud Messaging Client
///
/// Manages OAuth2 token generation, caching, and message delivery against the
/// FCM HTTP v1 API.
pub struct FCMClient {
    pub project_id: String,
    pub credentials: Arc<ServiceAccountKey>,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FCMClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `credentials` - Service account key with OAuth2 credentials
    pub fn new(project_id: String, credentials: ServiceAccountKey) -> Self {
        Self {
            project_id,
            credentials: Arc::new(credentials),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
        }
    }

    /// Load a service account JSON file. The project id falls back to the
    /// one embedded in the key when `project_id` is `None`.
    pub async fn from_service_account_file(
        project_id: Option<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, FCMError> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        let credentials: ServiceAccountKey = serde_json::from_slice(&raw)?;
        let project_id = project_id.unwrap_or_else(|| credentials.project_id.clone());
        info!("Loaded FCM service account for project {}", project_id);
        Ok(Self::new(project_id, credentials))
    }

    fn send_url(&self) -> String {
        format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        )
    }

    /// Send notification to every subscriber of a topic
    pub async fn send_to_topic(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<FCMSendResult, FCMError> {
        let access_token = self.get_access_token().await?;
        self.deliver(&access_token, message(None, Some(topic), title, body, data))
            .await
    }

    /// Send the same notification to each token individually.
    ///
    /// Tokens are processed in chunks of [`MAX_MULTICAST_TOKENS`]; sends inside
    /// a chunk run concurrently. Per-token failures are collected in the
    /// result. Only a failure to obtain an access token aborts the call.
    pub async fn send_each_for_multicast(
        &self,
        device_tokens: &[String],
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<MulticastSendResult, FCMError> {
        let mut outcome = MulticastSendResult::default();
        if device_tokens.is_empty() {
            return Ok(outcome);
        }

        let access_token = self.get_access_token().await?;

        for chunk in device_tokens.chunks(MAX_MULTICAST_TOKENS) {
            debug!("Sending multicast chunk of {} tokens", chunk.len());
            let sends = chunk.iter().map(|token| {
                let access_token = access_token.as_str();
                async move {
                    let delivery = if token.is_empty() {
                        Err(FCMError::InvalidToken)
                    } else {
                        let msg = message(Some(token), None, title, body, data);
                        self.deliver(access_token, msg).await
                    };
                    match delivery {
                        Ok(mut result) => {
                            result.token = Some(token.clone());
                            result
                        }
                        Err(e) => {
                            warn!("FCM delivery to token failed: {}", e);
                            failed_delivery(token, &e)
                        }
                    }
                }
            });

            for result in join_all(sends).await {
                outcome.push(result);
            }
        }

        info!(
            "Multicast complete: {} succeeded, {} failed",
            outcome.success_count, outcome.failure_count
        );
        Ok(outcome)
    }

    async fn deliver(
        &self,
        access_token: &str,
        message: FcmMessage,
    ) -> Result<FCMSendResult, FCMError> {
        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| FCMError::SendRequestError(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let fcm_response: FcmApiResponse = response
                    .json()
                    .await
                    .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

                Ok(FCMSendResult {
                    message_id: fcm_response.name,
                    token: None,
                    success: true,
                    error: None,
                    unregistered: false,
                })
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(FCMError::ApiError(status.to_string(), error_text))
            }
        }
    }

    /// Get access token from service account (with caching)
    pub async fn get_access_token(&self) -> Result<String, FCMError> {
        let mut cache = self.token_cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            // Reuse while valid for at least 60 more seconds
            if cached.expires_at > Utc::now().timestamp() + 60 {
                return Ok(cached.access_token.clone());
            }
        }

        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FCMError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.credentials.private_key_id.clone());
        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| FCMError::JwtEncodeError(e.to_string()))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FCMError::TokenError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FCMError::TokenRequestFailed(response.status().to_string()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FCMError::TokenParseError(e.to_string()))?;

        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }
}

fn failed_delivery(token: &str, error: &FCMError) -> FCMSendResult {
    FCMSendResult {
        message_id: None,
        token: Some(token.to_string()),
        success: false,
        error: Some(error.to_string()),
        unregistered: error.is_unregistered_token(),
    }
}

fn message(
    token: Option<&str>,
    topic: Option<&str>,
    title: &str,
    body: &str,
    data: &BTreeMap<String, String>,
) -> FcmMessage {
    FcmMessage {
        message: FcmMessageContent {
            token: token.map(str::to_string),
            topic: topic.map(str::to_string),
            notification: FcmNotification {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: data.clone(),
            android: Some(FcmAndroidConfig::high_priority()),
        },
    }
}
