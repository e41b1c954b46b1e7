use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Zero-based page window resolved from raw `page`/`limit` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page: i64,
    pub limit: i64,
}

impl PageOptions {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(0).max(0);
        let limit = match limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.limit)
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            total,
            pages: (total + self.limit - 1) / self.limit,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_given() {
        let options = PageOptions::new(None, None);
        assert_eq!(options, PageOptions { page: 0, limit: 25 });
        assert_eq!(options.offset(), 0);
    }

    #[test]
    fn caps_limit_and_clamps_bad_values() {
        assert_eq!(PageOptions::new(Some(2), Some(500)).limit, MAX_PAGE_SIZE);
        assert_eq!(PageOptions::new(Some(-3), Some(0)), PageOptions { page: 0, limit: 25 });
        assert_eq!(PageOptions::new(None, Some(-10)).limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn offset_is_page_times_limit() {
        assert_eq!(PageOptions::new(Some(3), Some(10)).offset(), 30);
    }

    #[test]
    fn page_count_rounds_up() {
        let options = PageOptions::new(Some(0), Some(10));
        assert_eq!(options.into_page(vec![1; 10], 21).pages, 3);
        assert_eq!(options.into_page(Vec::<i32>::new(), 0).pages, 0);
        assert_eq!(options.into_page(vec![1; 10], 20).pages, 2);
    }
}
