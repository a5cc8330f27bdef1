pub mod directory;
pub mod notifier;
pub mod payload;
pub mod push_sender;

pub use directory::{InMemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use notifier::{nearby_token, EmergencyNotifier};
pub use push_sender::{FcmPushSender, MulticastOutcome, PushSender};
