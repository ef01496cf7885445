//! Pagination for service listings.
//!
//! Re-exports the shared `Pagination` input and adds the `Page` envelope returned by list calls.

pub use common::pagination::Pagination;
use serde::Serialize;

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, opts: Pagination, total: u64) -> Self {
        let (idx, per_page) = opts.normalize();
        Self { items, page: idx as u32 + 1, per_page: per_page as u32, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), page: self.page, per_page: self.per_page, total: self.total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_reports_normalized_inputs() {
        let p = Page::new(vec![1, 2], Pagination { page: 0, per_page: 500 }, 2);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);
        assert_eq!(p.map(|x| x * 10).items, vec![10, 20]);
    }
}
