//! Fixed-size pages over an ordered listing, selected by the `page` query parameter.
//!
//! Out-of-range requests are clamped to the nearest real page rather than rejected, so a stale
//! link to page 9 of a listing that shrank still renders something.
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Items per page on every listing.
pub const PAGE_SIZE: usize = 10;

/// The `page` query parameter. Kept as a string so that garbage falls back to page 1 instead of
/// failing the request.
#[derive(Deserialize, Default, Debug, Clone)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Parse from a raw query string. Anything unparseable is treated as "no page requested".
    pub fn from_query_string(query: &str) -> Self {
        serde_qs::from_str(query).unwrap_or_default()
    }
}

/// The page a client asked for, before clamping to the listing's length. Missing or non-numeric
/// input means page 1, as does anything below 1. A number too big to represent is still a number,
/// so it means "past the end".
pub fn requested_number(requested: Option<&str>) -> usize {
    guard!(let Some(raw) = requested.map(str::trim) else {
        return 1;
    });
    match raw.parse::<i64>() {
        Ok(n) if n < 1 => 1,
        Ok(n) => usize::try_from(n).unwrap_or(usize::MAX),
        Err(_) if is_unsigned_integer(raw) => usize::MAX,
        Err(_) => 1,
    }
}

fn is_unsigned_integer(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Which slice of a listing a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// 1-indexed page number, after clamping.
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        assert!(per_page > 0, "page size must be positive");
        Self { per_page }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self, count: usize) -> usize {
        std::cmp::max(1, (count + self.per_page - 1) / self.per_page)
    }

    /// Locate the requested page in a listing of `count` items.
    pub fn window(&self, count: usize, requested: Option<&str>) -> Window {
        let num_pages = self.num_pages(count);
        let number = std::cmp::min(requested_number(requested), num_pages);
        let offset = (number - 1) * self.per_page;
        Window {
            number,
            num_pages,
            count,
            offset,
            limit: std::cmp::min(self.per_page, count.saturating_sub(offset)),
        }
    }

    /// Slice an in-memory ordered sequence.
    pub fn paginate<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let window = self.window(items.len(), requested);
        let slice = items[window.offset..window.offset + window.limit].to_vec();
        Page::new(slice, window)
    }
}

/// One page of a listing, ready to be rendered.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: Window) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_and_sizes() {
        let paginator = Paginator::default();
        for count in 0..=35 {
            let items: Vec<usize> = (0..count).collect();
            let expected_pages = std::cmp::max(1, (count + PAGE_SIZE - 1) / PAGE_SIZE);
            assert_eq!(paginator.num_pages(count), expected_pages, "count={}", count);

            let mut seen = Vec::new();
            for number in 1..=expected_pages {
                let page = paginator.paginate(&items, Some(&number.to_string()));
                if number < expected_pages {
                    assert_eq!(page.len(), PAGE_SIZE);
                } else if count > 0 {
                    let rest = count % PAGE_SIZE;
                    assert_eq!(page.len(), if rest == 0 { PAGE_SIZE } else { rest });
                }
                seen.extend(page.items);
            }
            // Pages tile the listing exactly once, in order.
            assert_eq!(seen, items);
        }
    }

    #[test]
    fn test_thirteen_items() {
        let items: Vec<u32> = (1..=13).collect();
        let paginator = Paginator::default();

        let first = paginator.paginate(&items, None);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert!(!first.has_previous);
        assert!(first.has_next);

        let second = paginator.paginate(&items, Some("2"));
        assert_eq!(second.items, vec![11, 12, 13]);
        assert_eq!(second.number, 2);
        assert_eq!(second.num_pages, 2);
        assert!(second.has_previous);
        assert!(!second.has_next);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let paginator = Paginator::default();
        let window = paginator.window(25, Some("99"));
        assert_eq!(window.number, 3);
        assert_eq!(window.offset, 20);
        assert_eq!(window.limit, 5);

        assert_eq!(paginator.window(25, Some("0")).number, 1);
        assert_eq!(paginator.window(25, Some("-4")).number, 1);
        assert_eq!(paginator.window(25, Some("two")).number, 1);
        assert_eq!(paginator.window(25, Some("")).number, 1);
        assert_eq!(paginator.window(25, Some("99999999999999999999")).number, 3);
        assert_eq!(paginator.window(25, Some("+99999999999999999999")).number, 3);
        assert_eq!(paginator.window(25, Some("-99999999999999999999")).number, 1);
        assert_eq!(paginator.window(25, Some("1e99")).number, 1);
    }

    #[test]
    fn test_requested_number() {
        assert_eq!(requested_number(None), 1);
        assert_eq!(requested_number(Some(" 7 ")), 7);
        assert_eq!(requested_number(Some("0")), 1);
        assert_eq!(requested_number(Some("junk")), 1);
        assert_eq!(requested_number(Some("123456789012345678901234567890")), usize::MAX);
    }

    #[test]
    fn test_empty_listing_has_one_empty_page() {
        let paginator = Paginator::default();
        let page = paginator.paginate::<u8>(&[], Some("3"));
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next);
    }

    #[test]
    fn test_same_input_same_page() {
        let items: Vec<u8> = (0..50).collect();
        let paginator = Paginator::new(7);
        assert_eq!(
            paginator.paginate(&items, Some("4")),
            paginator.paginate(&items, Some("4"))
        );
    }

    #[test]
    fn test_page_query_parsing() {
        assert_eq!(PageQuery::from_query_string("page=3").page.as_deref(), Some("3"));
        assert_eq!(PageQuery::from_query_string("").page, None);
        assert_eq!(PageQuery::from_query_string("other=1").page, None);
    }
}
