pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::{Config, EllipsisPolicy, NotifierConfig};
pub use error::{DirectoryError, NotifierError, PushError, Result};
pub use services::*;
