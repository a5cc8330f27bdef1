/// Notification payload construction
use std::collections::BTreeMap;

use crate::config::{EllipsisPolicy, NotifierConfig};
use crate::models::{EmergencyReport, NotificationPayload};

pub const ELLIPSIS: &str = "...";
pub const EMPTY_DESCRIPTION_PLACEHOLDER: &str = "No description provided";

/// Cut `description` to `max_chars` characters and apply the ellipsis policy.
/// Counts chars, not bytes.
pub fn truncate_description(description: &str, max_chars: usize, policy: EllipsisPolicy) -> String {
    let text = if description.trim().is_empty() {
        EMPTY_DESCRIPTION_PLACEHOLDER
    } else {
        description
    };

    let truncated = text.char_indices().nth(max_chars).map(|(cut, _)| &text[..cut]);

    match (truncated, policy) {
        (Some(head), _) => format!("{}{}", head, ELLIPSIS),
        (None, EllipsisPolicy::Always) => format!("{}{}", text, ELLIPSIS),
        (None, EllipsisPolicy::WhenTruncated) => text.to_string(),
    }
}

fn data_map(report: &EmergencyReport) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert("emergency_id".to_string(), report.id.clone());
    data.insert("category".to_string(), report.category.as_str().to_string());
    data
}

fn body(report: &EmergencyReport, config: &NotifierConfig) -> String {
    truncate_description(
        &report.description,
        config.description_truncate_len,
        config.ellipsis_policy,
    )
}

/// Payload for the category topic broadcast
pub fn topic_payload(report: &EmergencyReport, config: &NotifierConfig) -> NotificationPayload {
    NotificationPayload {
        title: format!("New Emergency: {}", report.category),
        body: body(report, config),
        data: data_map(report),
    }
}

/// Payload for citizens near the incident
pub fn nearby_payload(report: &EmergencyReport, config: &NotifierConfig) -> NotificationPayload {
    NotificationPayload {
        title: format!("Emergency Nearby ({})", report.category),
        body: body(report, config),
        data: data_map(report),
    }
}
