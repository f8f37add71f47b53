//! Listing query: author filter followed by page/limit slicing.

use serde::Deserialize;

use crate::book::Book;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Raw query string of `GET /api/books`. Values that are not integers fall
/// back to their defaults rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub author: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        parse_or(self.page.as_deref(), DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        parse_or(self.limit.as_deref(), DEFAULT_LIMIT)
    }

    /// Filter `books` by author, then cut out the requested page
    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        let filtered: Vec<&Book> = match self.author.as_deref() {
            Some(author) => books
                .iter()
                .filter(|book| book.author() == Some(author))
                .collect(),
            None => books.iter().collect(),
        };

        let (start, end) = page_bounds(self.page(), self.limit(), filtered.len());
        filtered[start..end].to_vec()
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Resolve `[(page - 1) * limit, page * limit)` against a sequence of `len`.
///
/// Negative bounds count back from the end, out-of-range bounds clamp, and an
/// inverted range collapses to empty, so any page/limit pair is answerable.
pub fn page_bounds(page: i64, limit: i64, len: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(limit);
    let end = page.saturating_mul(limit);

    let start = resolve_index(start, len);
    let end = resolve_index(end, len);

    if start >= end {
        (0, 0)
    } else {
        (start, end)
    }
}

fn resolve_index(index: i64, len: usize) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 {
        index.saturating_add(len).max(0)
    } else {
        index.min(len)
    };
    // `resolved` lies in 0..=len here.
    resolved as usize
}
