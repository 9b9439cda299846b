use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::services::mrz_client::DEFAULT_UPLOAD_FILENAME;

/// Query string of the image upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtractImageQuery {
    #[validate(length(min = 1, max = 255))]
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for ExtractImageQuery {
    fn default() -> Self {
        Self {
            filename: default_filename(),
        }
    }
}

fn default_filename() -> String {
    DEFAULT_UPLOAD_FILENAME.to_string()
}
