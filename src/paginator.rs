//! Page-number pagination over a counted listing. Page numbers are taken
//! straight from the query string, so parsing is deliberately lenient: junk
//! becomes page 1 and out-of-range numbers clamp to the last page.

use crate::datastore::postfilters::Slice;
use serde::Serialize;

/// Splits `total` items into pages of `per_page`.
#[derive(Clone, Copy, Debug)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// How many pages there are. An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    /// Resolve a raw `?page=` value to a real page number.
    pub fn get_page(&self, raw: Option<&str>) -> i64 {
        let number = match raw {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(number) => number,
                Err(_) => return 1,
            },
        };
        if number < 1 || number > self.num_pages() {
            self.num_pages()
        } else {
            number
        }
    }

    /// The datastore window holding the given page.
    pub fn slice(&self, page: i64) -> Slice {
        Slice {
            offset: (page - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    /// Bundle fetched items with the numbers templates need for page links.
    pub fn page_of<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        Page {
            number,
            num_pages: self.num_pages(),
            has_previous: number > 1,
            has_next: number < self.num_pages(),
            total: self.total,
            items,
        }
    }
}

/// One page of a listing, ready to render.
#[derive(Serialize, Clone, Debug)]
pub struct Page<T> {
    pub number: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub total: i64,
    pub items: Vec<T>,
}
