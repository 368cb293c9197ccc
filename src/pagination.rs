use axum::http::Uri;
use serde::{Deserialize, Serialize};

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u64 = 1000;

// SQLite binds LIMIT/OFFSET as signed 64-bit.
const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

impl PageParams {
    pub fn window(self, default_limit: u64) -> Window {
        Window {
            limit: self.limit.filter(|l| *l > 0).unwrap_or(default_limit).min(MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).min(MAX_OFFSET),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `next`/`previous` are relative links that keep every other query parameter.
    pub fn new(results: Vec<T>, count: u64, window: Window, uri: &Uri) -> Self {
        let Window { limit, offset } = window;
        let end = offset.saturating_add(limit);
        let next = (end < count).then(|| link(uri, limit, end));
        let previous = (offset > 0).then(|| link(uri, limit, offset.saturating_sub(limit)));
        Self { count, next, previous, results }
    }
}

fn link(uri: &Uri, limit: u64, offset: u64) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            key != "limit" && key != "offset"
        })
        .map(str::to_string)
        .collect();
    params.push(format!("limit={limit}"));
    if offset > 0 {
        params.push(format!("offset={offset}"));
    }
    format!("{}?{}", uri.path(), params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(uri: &str, count: u64, limit: u64, offset: u64) -> Page<()> {
        Page::new(vec![], count, Window { limit, offset }, &uri.parse().unwrap())
    }

    #[test]
    fn default_window() {
        assert_eq!(PageParams::default().window(10), Window { limit: 10, offset: 0 });
        let zero = PageParams { limit: Some(0), offset: Some(5) };
        assert_eq!(zero.window(10), Window { limit: 10, offset: 5 });
    }

    #[test]
    fn window_is_clamped() {
        let huge = PageParams { limit: Some(u64::MAX), offset: Some(u64::MAX) };
        assert_eq!(huge.window(10), Window { limit: MAX_PAGE_SIZE, offset: i64::MAX as u64 });
        let p = page("/v1/genres/", 3, MAX_PAGE_SIZE, u64::MAX);
        assert_eq!(p.next, None);
        assert!(p.previous.is_some());
    }

    #[test]
    fn first_page_has_only_next() {
        let p = page("/v1/titles/?year=1994", 25, 10, 0);
        assert_eq!(p.next.as_deref(), Some("/v1/titles/?year=1994&limit=10&offset=10"));
        assert_eq!(p.previous, None);
    }

    #[test]
    fn middle_page_links_replace_window_params() {
        let p = page("/v1/genres/?limit=10&offset=10&search=dr", 25, 10, 10);
        assert_eq!(p.next.as_deref(), Some("/v1/genres/?search=dr&limit=10&offset=20"));
        assert_eq!(p.previous.as_deref(), Some("/v1/genres/?search=dr&limit=10"));
    }

    #[test]
    fn last_page_has_no_next() {
        let p = page("/v1/genres/?offset=20", 25, 10, 20);
        assert_eq!(p.next, None);
        assert_eq!(p.previous.as_deref(), Some("/v1/genres/?limit=10&offset=10"));
    }
}
