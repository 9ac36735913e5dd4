//! Sequential accumulation of pages into one result set.
//!
//! The endpoint hands back at most one page per round trip plus an opaque
//! continuation cursor. The pager walks that chain strictly sequentially:
//! the next request is only issued after the previous page is absorbed, so
//! at most one request per query is in flight at any time.

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::ClientError;
use crate::page::{Page, SparqlEndpoint};

/// What to do after absorbing one page.
#[derive(Debug, PartialEq, Eq)]
enum PageOutcome {
    /// Fetch the next page with this cursor.
    Continue(String),
    /// The result set is complete.
    Done,
}

/// Fold one page into the accumulator and decide whether to keep paging.
///
/// Termination is checked after every page: the walk ends when the cap is
/// reached or the page carried no cursor. Overshoot past the cap is
/// truncated to exactly the cap, preserving server order.
fn absorb_page(
    collected: &mut Vec<serde_json::Value>,
    page: Page,
    cap: Option<usize>,
) -> PageOutcome {
    collected.extend(page.bindings);
    if let Some(cap) = cap
        && collected.len() >= cap
    {
        collected.truncate(cap);
        return PageOutcome::Done;
    }
    page.cursor.map_or(PageOutcome::Done, PageOutcome::Continue)
}

/// Collect every binding of a query, paging until the cursor chain ends or
/// the cap is reached.
///
/// The cancellation token is checked once per iteration, before each
/// fetch; an in-flight request is never interrupted, so cancellation takes
/// effect between pages. An error on any page discards the partial
/// accumulation.
///
/// # Errors
///
/// Returns [`ClientError::Cancelled`] when the token was cancelled, or
/// whatever the page fetch produced.
pub async fn collect_bindings(
    endpoint: &SparqlEndpoint,
    query: &str,
    cap: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<serde_json::Value>, ClientError> {
    let mut collected: Vec<serde_json::Value> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_index: usize = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let page = endpoint.fetch_page(query, cursor.as_deref()).await?;
        debug!(
            page_index,
            binding_count = page.bindings.len(),
            has_cursor = page.cursor.is_some(),
            "page fetched"
        );

        match absorb_page(&mut collected, page, cap) {
            PageOutcome::Continue(next) => cursor = Some(next),
            PageOutcome::Done => break,
        }
        page_index = page_index.saturating_add(1);
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn numbered_bindings(range: std::ops::Range<usize>) -> Vec<serde_json::Value> {
        range.map(|n| serde_json::json!({ "n": n })).collect()
    }

    fn page(range: std::ops::Range<usize>, cursor: Option<&str>) -> Page {
        Page {
            bindings: numbered_bindings(range),
            cursor: cursor.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn cap_truncates_to_exactly_the_cap() {
        // Three pages of ten with cursors c1, c2, then none; a cap of 25
        // keeps exactly the first 25 bindings in arrival order.
        let mut collected = Vec::new();
        let cap = Some(25);

        let first = absorb_page(&mut collected, page(0..10, Some("c1")), cap);
        assert_eq!(first, PageOutcome::Continue("c1".to_owned()));

        let second = absorb_page(&mut collected, page(10..20, Some("c2")), cap);
        assert_eq!(second, PageOutcome::Continue("c2".to_owned()));

        let third = absorb_page(&mut collected, page(20..30, None), cap);
        assert_eq!(third, PageOutcome::Done);

        assert_eq!(collected.len(), 25);
        assert_eq!(collected.first(), Some(&serde_json::json!({ "n": 0 })));
        assert_eq!(collected.last(), Some(&serde_json::json!({ "n": 24 })));
    }

    #[test]
    fn cap_reached_exactly_stops_despite_cursor() {
        let mut collected = Vec::new();
        let outcome = absorb_page(&mut collected, page(0..10, Some("c1")), Some(10));
        assert_eq!(outcome, PageOutcome::Done);
        assert_eq!(collected.len(), 10);
    }

    #[test]
    fn no_cap_runs_to_cursor_exhaustion() {
        let mut collected = Vec::new();
        let first = absorb_page(&mut collected, page(0..10, Some("c1")), None);
        assert_eq!(first, PageOutcome::Continue("c1".to_owned()));
        let second = absorb_page(&mut collected, page(10..14, None), None);
        assert_eq!(second, PageOutcome::Done);
        assert_eq!(collected.len(), 14);
    }

    #[test]
    fn empty_page_with_cursor_continues() {
        // The cursor is adopted from every page, including empty ones, so
        // a sparse page cannot stall the walk on a stale cursor.
        let mut collected = Vec::new();
        let outcome = absorb_page(&mut collected, page(0..0, Some("c9")), Some(5));
        assert_eq!(outcome, PageOutcome::Continue("c9".to_owned()));
        assert!(collected.is_empty());
    }

    #[test]
    fn cap_of_zero_yields_empty_result() {
        let mut collected = Vec::new();
        let outcome = absorb_page(&mut collected, page(0..10, Some("c1")), Some(0));
        assert_eq!(outcome, PageOutcome::Done);
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_any_fetch() {
        // Port 9 is never contacted: the token is checked at the loop
        // boundary before the first request goes out.
        let endpoint = SparqlEndpoint::new("http://127.0.0.1:9", Duration::from_millis(200));
        assert!(endpoint.is_ok());
        let Some(endpoint) = endpoint.ok() else {
            return;
        };

        let token = CancellationToken::new();
        token.cancel();
        let result = collect_bindings(&endpoint, "SELECT ?s WHERE { }", None, &token).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }
}
