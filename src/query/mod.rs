pub mod handlers;
pub mod queries;

use serde::Serialize;

pub const PAGE_SIZE: i64 = 10;

// region:    --- Pagination
/// A resolved page number for a listing of `total` rows.
/// A missing or non-numeric page is the first page; an out-of-range page is the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub num_pages: i64,
}

impl PageRequest {
    pub fn resolve(raw: Option<&str>, total: i64) -> Self {
        let num_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
            Some(Ok(n)) => n,
        };
        Self { number, num_pages }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.number,
            num_pages: request.num_pages,
            total,
        }
    }
}
// endregion: --- Pagination

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbage_page_is_first() {
        assert_eq!(PageRequest::resolve(None, 35).number, 1);
        assert_eq!(PageRequest::resolve(Some("abc"), 35).number, 1);
        assert_eq!(PageRequest::resolve(Some(""), 35).number, 1);
    }

    #[test]
    fn out_of_range_page_is_last() {
        let request = PageRequest::resolve(Some("9"), 35);
        assert_eq!(request.num_pages, 4);
        assert_eq!(request.number, 4);
        assert_eq!(request.offset(), 30);
        assert_eq!(PageRequest::resolve(Some("0"), 35).number, 4);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let request = PageRequest::resolve(Some("3"), 0);
        assert_eq!(request.num_pages, 1);
        assert_eq!(request.number, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let request = PageRequest::resolve(Some(" 2 "), 20);
        assert_eq!(request.num_pages, 2);
        assert_eq!(request.number, 2);
        assert_eq!(request.offset(), 10);
    }
}
