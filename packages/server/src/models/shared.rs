use serde::Serialize;

use crate::session::SessionError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    /// Clamp raw query values to `page >= 1` and `1 <= per_page <= 100`.
    pub fn new(page: Option<u64>, per_page: Option<u64>, total: u64) -> Self {
        let page = Ord::max(page.unwrap_or(1), 1);
        let per_page = per_page.unwrap_or(20).clamp(1, 100);
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }

    /// Rows to skip before this page. Saturates for absurd page numbers.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Whether the page lies past the last row, so there is nothing to fetch.
    pub fn is_past_end(&self) -> bool {
        self.offset() >= self.total
    }
}

/// Validate a trimmed session name (1-256 Unicode characters).
pub fn validate_name(name: &str) -> Result<(), SessionError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(SessionError::Validation(
            "Name must be 1-256 characters".into(),
        ));
    }
    Ok(())
}
