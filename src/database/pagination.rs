use serde::{Deserialize, Serialize};

use crate::{
    constants::{MAX_COUNT_PER_PAGE, RECIPE_COUNT_PER_PAGE},
    error::{Error, HttpError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Out of range values fall back to the first page and the default size.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|page| *page >= 1).unwrap_or(1);
        let limit = limit
            .filter(|limit| *limit >= 1)
            .map(|limit| limit.min(MAX_COUNT_PER_PAGE))
            .unwrap_or(RECIPE_COUNT_PER_PAGE);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    /// An empty first page is a valid empty listing. An empty later page is past the end.
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Result<Self, Error> {
        if rows.is_empty() {
            if request.page > 1 {
                return Err(HttpError::NotFound.new("Invalid page"));
            }
            return Ok(Self::no_rows());
        }
        let page_count = (total_rows + request.limit - 1) / request.limit;

        let next = (request.page < page_count).then_some(request.page + 1);
        let previous = (request.page > 1).then(|| (request.page - 1).min(page_count));

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: f(self.results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_and_caps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 6 });
        assert_eq!(PageRequest::new(Some(0), Some(-4)), PageRequest { page: 1, limit: 6 });
        assert_eq!(PageRequest::new(Some(3), Some(1000)).limit, MAX_COUNT_PER_PAGE);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_saturate_the_offset() {
        let request = PageRequest::new(Some(i64::MAX), Some(MAX_COUNT_PER_PAGE));
        assert_eq!(request.offset(), i64::MAX);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = PageContext::from_rows(vec![1, 2], 6, PageRequest::new(Some(2), Some(2))).unwrap();
        assert_eq!(page.count, 6);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
    }

    #[test]
    fn last_and_only_pages_have_no_next() {
        let last = PageContext::from_rows(vec![5], 5, PageRequest::new(Some(3), Some(2))).unwrap();
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));

        let only = PageContext::from_rows(vec![1, 2], 2, PageRequest::new(None, Some(2))).unwrap();
        assert_eq!(only.next, None);
        assert_eq!(only.previous, None);
    }

    #[test]
    fn empty_rows_yield_an_empty_page() {
        let page: PageContext<i32> =
            PageContext::from_rows(vec![], 0, PageRequest::default()).unwrap();
        assert_eq!(page, PageContext::no_rows());
    }

    #[test]
    fn pages_past_the_end_are_not_found() {
        let error = PageContext::<i32>::from_rows(vec![], 0, PageRequest::new(Some(500), None))
            .unwrap_err();
        assert_eq!(error.code, 404);
        assert_eq!(error.message(), "Invalid page");
    }
}
