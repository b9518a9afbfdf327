//! Token-based pagination.

use std::future::Future;

use super::api::AwsResult;

/// One page of a paginated describe or list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates the final page of a result set.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Creates a page followed by `next_token`.
    ///
    /// An empty token is treated as the end of the result set.
    #[must_use]
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self {
            items,
            next_token: next_token.filter(|token| !token.is_empty()),
        }
    }
}

/// Fetches pages until no next token is returned and concatenates them.
///
/// `fetch` receives the token of the page to fetch, `None` for the first.
///
/// # Errors
///
/// Returns the first error returned by `fetch`; pages already fetched are
/// discarded.
pub async fn drain_pages<T, F, Fut>(mut fetch: F) -> AwsResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = AwsResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut next_token = None;

    loop {
        let page = fetch(next_token.take()).await?;
        items.extend(page.items);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    Ok(items)
}
