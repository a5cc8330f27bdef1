/// HTTP handlers for the emergency notifier
pub mod emergencies;

pub use emergencies::{register_routes, ApiResponse, NotifyEmergencyRequest};
