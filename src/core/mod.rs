// MRZ normalization exports
pub mod birth_date;
pub mod normalizer;

pub use birth_date::{format_birth_date, format_birth_date_with_pivot, CenturyPivot, DEFAULT_CENTURY_PIVOT};
pub use normalizer::{clean_name, normalize, Normalizer, MRZ_FILLER};
