//! Pagination defaults.
//!
//! A [`PaginationConfig`] seeds new page requests. It can be built in code
//! or loaded from JSON, where every field is optional:
//!
//! ```json
//! { "target_max_rows": 50, "absolute_max_rows": 500, "order": "desc" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::types::{BY_CREATION_TIME, DEFAULT_TARGET_MAX_ROWS, Order};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Rows per page when the request has no end key.
    pub target_max_rows: usize,
    /// Hard cap on rows per page, applied even with an end key.
    pub absolute_max_rows: Option<usize>,
    /// Index walked when the request names none.
    pub default_index: String,
    pub order: Order,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            target_max_rows: DEFAULT_TARGET_MAX_ROWS,
            absolute_max_rows: None,
            default_index: BY_CREATION_TIME.to_string(),
            order: Order::Asc,
        }
    }
}

impl PaginationConfig {
    /// Parse a config from JSON text, filling unspecified fields with defaults.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: PaginationConfig = serde_json::from_str(text).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.default_index.is_empty() {
            return Err(ConfigError::EmptyIndexName.into());
        }
        Ok(())
    }
}
