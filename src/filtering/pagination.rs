use crate::errors::ApiError;

/// Largest `limit` and `offset` the database binds as a signed 64-bit integer.
const MAX_BOUND: u64 = i64::MAX.unsigned_abs();

/// A validated page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// Rows per page, always > 0
    pub limit: u64,
    /// Zero-based page index
    pub index: u64,
}

impl Page {
    /// Parse the raw `limit`/`page` query values.
    ///
    /// # Errors
    ///
    /// `BadRequest` when `limit` is missing, zero or not a number, when
    /// `page` is not a non-negative number, or when either one pushes the
    /// window past what the database can bind.
    pub fn from_params(limit: Option<&str>, page: Option<&str>) -> Result<Self, ApiError> {
        let limit = limit
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request("Limit is required"))?
            .parse::<u64>()
            .ok()
            .filter(|&l| l > 0)
            .ok_or_else(|| ApiError::bad_request("Limit must be a positive integer"))?;
        if limit > MAX_BOUND {
            return Err(ApiError::bad_request("Limit is too large"));
        }

        let index = match page.map(str::trim).filter(|v| !v.is_empty()) {
            None => 0,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ApiError::bad_request("Page must be a non-negative integer"))?,
        };

        if index.checked_mul(limit).is_none_or(|offset| offset > MAX_BOUND) {
            return Err(ApiError::bad_request("Page is out of range"));
        }

        Ok(Self { limit, index })
    }

    /// Rows skipped before this page. Windows built by [`Page::from_params`]
    /// never overflow.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.index * self.limit
    }

    /// `ceil(total / limit)`
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}
