// Service exports
pub mod mrz_client;
pub mod notifications;

pub use mrz_client::{shared_client, MrzApiClient, MrzApiError, MrzClientConfig};
pub use notifications::{notify_best_effort, sink_from_settings, LogSink, NotificationError, NotificationSink, TelegramSink};
