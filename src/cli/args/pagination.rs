//! Pagination argument types for list commands

use clap::Args;

use crate::client::PaginationParams;

/// Shared pagination arguments for list commands.
#[derive(Args, Debug, Default, Clone)]
pub struct PaginationArgs {
    /// Page number (1-indexed)
    #[arg(long, short = 'p')]
    pub page: Option<usize>,

    /// Maximum results per page
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

impl PaginationArgs {
    /// Convert CLI args to API pagination params
    pub fn to_params(&self) -> PaginationParams {
        let mut params = PaginationParams::new();

        if let Some(page) = self.page {
            params = params.page(page);
        }
        if let Some(limit) = self.limit {
            params = params.limit(limit);
        }
        if let Some(ref term) = self.search {
            params = params.search(term.clone());
        }

        params
    }
}
