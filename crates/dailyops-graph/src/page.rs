//! Skip/limit pagination shared by link and candidate listings

use serde::{Deserialize, Serialize};

/// Default page size when the caller gives none
pub const DEFAULT_LIMIT: u64 = 50;

/// Largest page a caller may request
pub const MAX_LIMIT: u64 = 200;

/// Largest offset a database driver accepts (SQL offsets are signed 64-bit)
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// Requested window into an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub skip: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Build a page request, applying the default limit and the caps
    ///
    /// An offset past [`MAX_SKIP`] is clamped; such a page is always empty.
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        let limit = match limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
        };

        Self {
            skip: skip.unwrap_or(0).min(MAX_SKIP),
            limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    /// Slice an in-memory, already ordered list
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.skip as usize)
            .take(request.limit as usize)
            .collect();

        Self {
            items,
            total,
            skip: request.skip,
            limit: request.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(PageRequest::new(None, None).limit, DEFAULT_LIMIT);
        assert_eq!(PageRequest::new(None, Some(0)).limit, DEFAULT_LIMIT);
        assert_eq!(PageRequest::new(Some(5), Some(10_000)).limit, MAX_LIMIT);
        assert_eq!(PageRequest::new(Some(5), Some(10)).skip, 5);
    }

    #[test]
    fn test_skip_is_clamped_to_signed_range() {
        assert_eq!(PageRequest::new(Some(u64::MAX), None).skip, MAX_SKIP);
        assert_eq!(PageRequest::new(Some(MAX_SKIP), None).skip, MAX_SKIP);

        let page = Page::from_vec(vec![1, 2, 3], PageRequest::new(Some(u64::MAX), None));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_from_vec_slices_window() {
        let page = Page::from_vec((0..10).collect(), PageRequest::new(Some(8), Some(5)));
        assert_eq!(page.items, vec![8, 9]);
        assert_eq!(page.total, 10);
    }
}
