//! Pagination: (page, page_size) → (offset, limit).
//!
//! Pages are 1-based. A page below 1 is treated as page 1, so the offset can
//! never go negative. A page size of 0 asks for nothing and yields an empty
//! page; a negative page size is a caller error.

use serde::{Deserialize, Serialize};

use crate::domain::ValidationError;

/// Page number and size as received from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

/// Offset / limit handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// `offset = (page - 1) * page_size`, `limit = page_size`.
    pub fn window(&self) -> Result<PageWindow, ValidationError> {
        let Ok(limit) = u64::try_from(self.page_size) else {
            return Err(ValidationError::single("pageSize", "must not be negative"));
        };
        let page = self.page.max(1) as u64;
        Ok(PageWindow {
            offset: (page - 1).saturating_mul(limit),
            limit,
        })
    }
}
