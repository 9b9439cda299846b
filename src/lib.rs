//! Kiosk MRZ - passport acquisition for the hotel check-in kiosk
//!
//! This library talks to the MRZ scanning service (camera control, capture,
//! image upload) and turns the machine readable zone it returns into the
//! guest identity used by check-in.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{normalize, CenturyPivot, Normalizer};
pub use models::{ExtractionRequest, ExtractionResult, NormalizedGuestIdentity, RawMrzRecord};
pub use services::{MrzApiClient, MrzApiError, MrzClientConfig, NotificationSink};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let record = RawMrzRecord {
            surname: Some("ERIKSSON<".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize(&record).last_name, "ERIKSSON");
    }
}
