/// Push notification sender
///
/// Abstraction over the push transport. The notifier talks to `PushSender`;
/// `FcmPushSender` delivers through Firebase Cloud Messaging.
use async_trait::async_trait;
use fcm_push::{FCMClient, MulticastSendResult};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PushError;
use crate::models::NotificationPayload;

/// Aggregate outcome of a multicast call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MulticastOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    /// Failed tokens the transport reported as no longer registered
    pub unregistered_tokens: Vec<String>,
}

impl From<MulticastSendResult> for MulticastOutcome {
    fn from(result: MulticastSendResult) -> Self {
        Self {
            success_count: result.success_count,
            failure_count: result.failure_count,
            unregistered_tokens: result
                .unregistered_tokens()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Broadcast to every subscriber of `topic`. Returns the message id.
    async fn send_to_topic(
        &self,
        payload: &NotificationPayload,
        topic: &str,
    ) -> Result<String, PushError>;

    /// Deliver to each token individually
    async fn send_each_for_multicast(
        &self,
        payload: &NotificationPayload,
        tokens: &[String],
    ) -> Result<MulticastOutcome, PushError>;
}

/// FCM-backed sender. Without a client every send fails with
/// [`PushError::NotConfigured`].
pub struct FcmPushSender {
    fcm_client: Option<Arc<FCMClient>>,
}

impl FcmPushSender {
    pub fn new(fcm_client: Option<Arc<FCMClient>>) -> Self {
        Self { fcm_client }
    }

    fn client(&self) -> Result<&FCMClient, PushError> {
        match &self.fcm_client {
            Some(client) => Ok(client.as_ref()),
            None => {
                warn!("FCM client not configured");
                Err(PushError::NotConfigured)
            }
        }
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send_to_topic(
        &self,
        payload: &NotificationPayload,
        topic: &str,
    ) -> Result<String, PushError> {
        let result = self
            .client()?
            .send_to_topic(topic, &payload.title, &payload.body, &payload.data)
            .await?;

        let message_id = result.message_id.unwrap_or_default();
        debug!("FCM topic delivery successful: {}", message_id);
        Ok(message_id)
    }

    async fn send_each_for_multicast(
        &self,
        payload: &NotificationPayload,
        tokens: &[String],
    ) -> Result<MulticastOutcome, PushError> {
        let result = self
            .client()?
            .send_each_for_multicast(tokens, &payload.title, &payload.body, &payload.data)
            .await?;

        if result.failure_count > 0 {
            warn!(
                "{} of {} device tokens failed: {:?} (unregistered: {:?})",
                result.failure_count,
                tokens.len(),
                result.failed_tokens(),
                result.unregistered_tokens()
            );
        }

        Ok(MulticastOutcome::from(result))
    }
}
