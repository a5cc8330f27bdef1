/// Emergency fan-out trigger
use crate::error::NotifierError;
use crate::metrics;
use crate::models::{DeliveryResult, EmergencyReportPayload};
use crate::services::EmergencyNotifier;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Invocation envelope. Callers wrap the report in a one-element `data`
/// array; only the first element is used.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NotifyEmergencyRequest {
    #[serde(default)]
    pub data: Vec<EmergencyReportPayload>,
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Fan out notifications for a newly created emergency
///
/// POST /api/v1/emergencies/notify
pub async fn notify_emergency(
    notifier: web::Data<Arc<EmergencyNotifier>>,
    req: web::Json<NotifyEmergencyRequest>,
) -> Result<HttpResponse, NotifierError> {
    let payload = req.into_inner().data.into_iter().next().ok_or_else(|| {
        metrics::record_invocation("invalid_input");
        NotifierError::InvalidInput("request carried no emergency report".to_string())
    })?;

    let budget = notifier.config().invocation_timeout();
    let result: DeliveryResult =
        match tokio::time::timeout(budget, notifier.notify_payload(payload)).await {
            Ok(result) => result?,
            Err(_) => {
                error!("Emergency fan-out exceeded {:?}", budget);
                metrics::record_invocation("timeout");
                return Err(NotifierError::Timeout(budget));
            }
        };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(result)))
}

/// Body-parse failures are reported the same way as invalid reports
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        metrics::record_invocation("invalid_input");
        NotifierError::InvalidInput(err.to_string()).into()
    })
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api/v1/emergencies")
            .route("/notify", web::post().to(notify_emergency)),
    );
}
