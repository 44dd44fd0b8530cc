//! Offset pagination primitives shared by Mercado list endpoints.
//!
//! List endpoints accept `page` and `limit` query parameters and respond with
//! a [`Page`] envelope carrying the slice of items plus enough metadata for a
//! client to render pagination controls. [`PageRequest`] owns the validation
//! rules so every adapter clamps and rejects values the same way.

use serde::{Deserialize, Serialize};

/// First page number; pages are one-based.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when a client does not ask for one.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Validation failures raised while building a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// The requested page size is zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange {
        /// Rejected page size.
        limit: u32,
        /// Largest accepted page size.
        max: u32,
    },
}

/// Validated one-based page number and page size.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(3, 25).expect("valid page");
/// assert_eq!(request.offset(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request, rejecting page zero and out-of-range limits.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either value is outside its range.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageRequestError::LimitOutOfRange {
                limit,
                max: MAX_LIMIT,
            });
        }
        Ok(Self { page, limit })
    }

    /// Build a request from optional query values, filling in defaults.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when a supplied value is out of range.
    ///
    /// # Examples
    /// ```
    /// use pagination::{DEFAULT_LIMIT, PageRequest};
    ///
    /// let request = PageRequest::from_query(None, None).expect("defaults");
    /// assert_eq!(request.page(), 1);
    /// assert_eq!(request.limit(), DEFAULT_LIMIT);
    /// ```
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        Self::new(
            page.unwrap_or(DEFAULT_PAGE),
            limit.unwrap_or(DEFAULT_LIMIT),
        )
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before this page starts.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page - 1).saturating_mul(i64::from(self.limit))
    }

    /// Page size as a signed SQL `LIMIT` value.
    #[must_use]
    pub fn sql_limit(self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the totals needed to navigate the rest.
///
/// Serialises as `{"items": [...], "total": n, "page": p, "limit": l,
/// "total_pages": t}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
    /// Number of pages needed to show `total` items.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from a slice of rows and the overall match count.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let request = PageRequest::new(1, 2).expect("valid page");
    /// let page = Page::new(vec!["a", "b"], 5, request);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
            total_pages: total.div_ceil(u64::from(request.limit())),
        }
    }

    /// Convert every item while keeping the pagination metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
