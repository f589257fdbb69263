//! Get-request options and paging state.

use serde::{Deserialize, Serialize};

/// Options controlling a get call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Page to request; the server default is the first page.
    pub page: Option<u32>,
    /// Records per page; the server default applies when unset.
    pub per_page: Option<u32>,
    /// Whether to follow pages until the server reports no more.
    pub auto_paging: bool,
    /// Whether to ask for the supplemental data section.
    pub include_supplemental_data: bool,
    /// Upper bound on pages fetched by auto-paging.
    pub max_pages: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            page: None,
            per_page: None,
            auto_paging: true,
            include_supplemental_data: true,
            max_pages: None,
        }
    }
}

impl RequestOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting page.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Enables or disables auto-paging.
    #[must_use]
    pub fn with_auto_paging(mut self, auto_paging: bool) -> Self {
        self.auto_paging = auto_paging;
        self
    }

    /// Enables or disables the supplemental data section.
    #[must_use]
    pub fn with_supplemental_data(mut self, include: bool) -> Self {
        self.include_supplemental_data = include;
        self
    }

    /// Caps the number of pages auto-paging will fetch.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }
}

/// Paging metadata decoded from a get response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingState {
    /// Whether the server has more pages.
    pub has_more: bool,
    /// The page this response answered.
    pub current_page: u32,
}
