// History paging

use super::EntryKind;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Filter and page selection for transaction history
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryQuery {
    pub kind: Option<EntryKind>,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Page and limit clamped to usable values
    pub fn normalized(&self) -> (usize, usize) {
        (self.page.max(1), self.limit.clamp(1, MAX_PAGE_SIZE))
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            kind: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus totals
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current: usize,
    pub pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Cut a page out of an already filtered, ordered list
    pub fn from_items(all: Vec<T>, query: &HistoryQuery) -> Self {
        let (page, limit) = query.normalized();
        let total = all.len();
        let pages = total.div_ceil(limit);
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            items,
            current: page,
            pages,
            total,
        }
    }
}
