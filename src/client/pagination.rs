//! Pagination parameters for admin list endpoints

/// Default page size for list commands
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Pagination parameters for API requests.
///
/// # Example
/// ```ignore
/// let params = PaginationParams::new().limit(50).page(2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaginationParams {
    /// Page number, 1-indexed
    pub page: Option<usize>,
    /// Items per page
    pub limit: Option<usize>,
    /// Free-text search passed through to the backend
    pub search: Option<String>,
}

impl PaginationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Query string pairs; `page` and `limit` are always present
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.unwrap_or(1).to_string()),
            (
                "limit".to_string(),
                self.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
            ),
        ];

        if let Some(ref term) = self.search {
            params.push(("search".to_string(), term.clone()));
        }

        params
    }
}
