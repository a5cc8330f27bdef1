/// FCM Push Library
///
/// Firebase Cloud Messaging (HTTP v1) client used by the emergency notifier
/// to reach responder topics and individual citizen devices.
///
/// It handles:
/// - OAuth2 token generation from a Google service account, with caching
/// - Topic messaging
/// - Send-each multicast delivery, chunked to the FCM batch limit

pub mod client;
pub mod errors;
pub mod models;

pub use client::{FCMClient, MAX_MULTICAST_TOKENS};
pub use errors::FCMError;
pub use models::{FCMSendResult, MulticastSendResult, ServiceAccountKey};
