use crate::models::{NormalizedGuestIdentity, RawMrzRecord};
use crate::core::birth_date::{format_birth_date_with_pivot, CenturyPivot};

/// Padding character of the machine readable zone
pub const MRZ_FILLER: char = '<';

/// Replace MRZ filler with spaces and trim the ends
///
/// Internal runs are kept as they are: `"SMITH<<JOHN"` becomes
/// `"SMITH  JOHN"`.
#[inline]
pub fn clean_name(raw: &str) -> String {
    raw.replace(MRZ_FILLER, " ").trim().to_string()
}

/// Converts raw MRZ records into the guest identity used by check-in
///
/// Holds no state besides the century pivot, so one instance can be shared
/// freely and always gives the same output for the same record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    pivot: CenturyPivot,
}

impl Normalizer {
    pub fn new(pivot: CenturyPivot) -> Self {
        Self { pivot }
    }

    pub fn with_default_pivot() -> Self {
        Self::default()
    }

    pub fn pivot(&self) -> CenturyPivot {
        self.pivot
    }

    /// Build a guest identity from a raw record
    ///
    /// Every missing field becomes an empty string.
    pub fn normalize(&self, record: &RawMrzRecord) -> NormalizedGuestIdentity {
        let field = |value: &Option<String>| value.as_deref().unwrap_or("").to_string();

        NormalizedGuestIdentity {
            first_name: clean_name(record.given_name.as_deref().unwrap_or("")),
            last_name: clean_name(record.surname.as_deref().unwrap_or("")),
            passport_number: field(&record.document_number),
            date_of_birth: format_birth_date_with_pivot(
                record.birth_date.as_deref().unwrap_or(""),
                self.pivot,
            ),
            nationality: field(&record.nationality_code),
            gender: field(&record.sex),
        }
    }
}

/// Normalize with the default century pivot
pub fn normalize(record: &RawMrzRecord) -> NormalizedGuestIdentity {
    Normalizer::default().normalize(record)
}
