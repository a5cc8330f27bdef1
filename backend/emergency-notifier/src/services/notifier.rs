/// Emergency notification fan-out
///
/// For each new emergency:
/// 1. Broadcast to the topic named after the category
/// 2. Resolve citizens within the configured radius band from the directory
/// 3. Multicast once to their de-duplicated device tokens
///
/// Both branches run concurrently. Dispatch failures are recorded in the
/// `DeliveryResult`; only input and directory failures abort the invocation.
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::directory::UserDirectory;
use super::payload::{nearby_payload, topic_payload};
use super::push_sender::PushSender;
use crate::config::NotifierConfig;
use crate::error::{NotifierError, Result};
use crate::metrics;
use crate::models::{
    DeliveryResult, DispatchStatus, EmergencyReport, EmergencyReportPayload, GeoPoint,
    RadiusBand, UserDirectoryEntry, UserRole,
};

/// Nearby branch outcome before it is folded into the result
#[derive(Debug)]
struct NearbyDispatch {
    recipients: usize,
    status: DispatchStatus,
    delivered: usize,
    failed: usize,
}

pub struct EmergencyNotifier {
    directory: Arc<dyn UserDirectory>,
    push_sender: Arc<dyn PushSender>,
    config: NotifierConfig,
}

impl EmergencyNotifier {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        push_sender: Arc<dyn PushSender>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            directory,
            push_sender,
            config,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Validate a raw report, then fan out
    pub async fn notify_payload(&self, payload: EmergencyReportPayload) -> Result<DeliveryResult> {
        let report = EmergencyReport::try_from(payload).map_err(|e| {
            warn!("Rejected emergency report: {}", e);
            metrics::record_invocation(e.reason());
            e
        })?;
        self.notify(report).await
    }

    /// Fan out one emergency report
    pub async fn notify(&self, report: EmergencyReport) -> Result<DeliveryResult> {
        info!(
            emergency_id = %report.id,
            category = %report.category,
            "Dispatching emergency notifications"
        );

        let (topic_status, nearby) =
            tokio::join!(self.broadcast_to_topic(&report), self.notify_nearby(&report));

        let nearby = match nearby {
            Ok(nearby) => nearby,
            Err(e) => {
                error!(emergency_id = %report.id, "Emergency fan-out aborted: {}", e);
                metrics::record_invocation(e.reason());
                return Err(e);
            }
        };

        let result = DeliveryResult {
            emergency_id: report.id.clone(),
            topic: report.category.as_str().to_string(),
            topic_status,
            nearby_recipients: nearby.recipients,
            nearby_status: nearby.status,
            nearby_delivered: nearby.delivered,
            nearby_failed: nearby.failed,
            completed_at: Utc::now(),
        };

        let outcome = result.outcome();
        metrics::record_invocation(outcome.as_str());
        info!(
            emergency_id = %result.emergency_id,
            topic_status = result.topic_status.as_str(),
            nearby_status = result.nearby_status.as_str(),
            recipients = result.nearby_recipients,
            outcome = outcome.as_str(),
            "Emergency notifications complete"
        );

        Ok(result)
    }

    async fn broadcast_to_topic(&self, report: &EmergencyReport) -> DispatchStatus {
        let payload = topic_payload(report, &self.config);
        let topic = report.category.as_str();

        let status = match self.push_sender.send_to_topic(&payload, topic).await {
            Ok(message_id) => {
                info!(emergency_id = %report.id, topic, message_id = %message_id, "Topic broadcast sent");
                DispatchStatus::Sent
            }
            Err(e) => {
                warn!(emergency_id = %report.id, topic, "Topic broadcast failed: {}", e);
                DispatchStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        metrics::record_dispatch("topic", status.as_str());
        status
    }

    async fn notify_nearby(&self, report: &EmergencyReport) -> Result<NearbyDispatch> {
        let tokens = self.resolve_nearby_tokens(report.location).await?;
        metrics::observe_nearby_recipients(tokens.len());

        if tokens.is_empty() {
            info!(emergency_id = %report.id, "No citizens within range, skipping multicast");
            metrics::record_dispatch("multicast", DispatchStatus::Skipped.as_str());
            return Ok(NearbyDispatch {
                recipients: 0,
                status: DispatchStatus::Skipped,
                delivered: 0,
                failed: 0,
            });
        }

        let payload = nearby_payload(report, &self.config);
        let recipients = tokens.len();

        let sent = self
            .push_sender
            .send_each_for_multicast(&payload, &tokens)
            .await;
        if let Ok(outcome) = &sent {
            if !outcome.unregistered_tokens.is_empty() {
                warn!(
                    emergency_id = %report.id,
                    unregistered = outcome.unregistered_tokens.len(),
                    "Directory holds unregistered device tokens"
                );
            }
        }

        let dispatch = match sent {
            Ok(outcome) if outcome.success_count == 0 => NearbyDispatch {
                recipients,
                status: DispatchStatus::Failed {
                    reason: format!("all {} device deliveries failed", outcome.failure_count),
                },
                delivered: 0,
                failed: outcome.failure_count,
            },
            Ok(outcome) => NearbyDispatch {
                recipients,
                status: DispatchStatus::Sent,
                delivered: outcome.success_count,
                failed: outcome.failure_count,
            },
            Err(e) => {
                warn!(emergency_id = %report.id, recipients, "Multicast dispatch failed: {}", e);
                NearbyDispatch {
                    recipients,
                    status: DispatchStatus::Failed {
                        reason: e.to_string(),
                    },
                    delivered: 0,
                    failed: recipients,
                }
            }
        };

        metrics::record_dispatch("multicast", dispatch.status.as_str());
        Ok(dispatch)
    }

    /// Unique device tokens of citizens inside the radius band around
    /// `origin`, in directory order.
    pub async fn resolve_nearby_tokens(&self, origin: GeoPoint) -> Result<Vec<String>> {
        let band = self.config.radius_band();
        let entries = self
            .directory
            .candidates_near(origin, band.max_km)
            .await
            .map_err(NotifierError::from)?;

        let mut seen = HashSet::new();
        let tokens = entries
            .iter()
            .filter_map(|entry| nearby_token(entry, &origin, &band))
            .filter(|token| seen.insert(*token))
            .map(str::to_string)
            .collect();

        Ok(tokens)
    }
}

/// Token of `entry` if it is a reachable citizen inside `band`.
pub fn nearby_token<'a>(
    entry: &'a UserDirectoryEntry,
    origin: &GeoPoint,
    band: &RadiusBand,
) -> Option<&'a str> {
    if entry.role != UserRole::Citizen {
        return None;
    }
    let location = entry.location.as_ref()?;
    let token = entry.device_token.as_deref()?;

    band.contains(origin.distance_km(location)).then_some(token)
}
