//! Pagination
//!
//! Follows `nextLink` continuations until ARM stops returning one.

use super::model::Page;
use anyhow::Result;
use std::collections::HashSet;
use std::future::Future;

/// Items gathered across pages, plus the failure that stopped the walk early
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub error: Option<anyhow::Error>,
}

impl<T> Collected<T> {
    /// Tolerant conversion: a failure after at least one item is logged and the
    /// partial list kept; a failure before anything arrived is returned.
    pub fn into_tolerant(self, what: &str) -> Result<Vec<T>> {
        match self.error {
            None => Ok(self.items),
            Some(err) if self.items.is_empty() => Err(err),
            Some(err) => {
                tracing::warn!(
                    "Listing {} stopped after {} items: {:#}",
                    what,
                    self.items.len(),
                    err
                );
                Ok(self.items)
            }
        }
    }
}

/// Fetch every page (auto-paginate), stopping at the first failing page or
/// at a `nextLink` that was already followed
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Collected<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let page = match fetch(cursor.clone()).await {
            Ok(page) => page,
            Err(err) => return Collected { items, error: Some(err) },
        };
        items.extend(page.value);

        match page.next_link {
            Some(next) if !seen.insert(next.clone()) => {
                return Collected {
                    items,
                    error: Some(anyhow::anyhow!("Pagination revisited nextLink {}", next)),
                };
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Collected { items, error: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<Page<u32>> {
        vec![
            Page::new(vec![1, 2], Some("p2".to_string())),
            Page::new(vec![3], Some("p3".to_string())),
            Page::last(vec![4, 5]),
        ]
    }

    #[tokio::test]
    async fn test_collects_all_pages() {
        let collected = collect_pages(|cursor| async move {
            let index = match cursor.as_deref() {
                None => 0,
                Some("p2") => 1,
                Some("p3") => 2,
                Some(other) => anyhow::bail!("unexpected cursor {other}"),
            };
            Ok(pages().remove(index))
        })
        .await;

        assert!(collected.error.is_none());
        assert_eq!(collected.items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_failure_mid_stream_keeps_earlier_pages() {
        let collected = collect_pages(|cursor| async move {
            match cursor.as_deref() {
                None => Ok(Page::new(vec![1, 2], Some("p2".to_string()))),
                _ => anyhow::bail!("API request failed: 500"),
            }
        })
        .await;

        assert_eq!(collected.items, vec![1, 2]);
        assert!(collected.error.is_some());
        assert_eq!(collected.into_tolerant("test items").unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failure_on_first_page_is_an_error() {
        let collected: Collected<u32> =
            collect_pages(|_| async { anyhow::bail!("API request failed: 403") }).await;

        assert!(collected.items.is_empty());
        assert!(collected.into_tolerant("test items").is_err());
    }

    #[tokio::test]
    async fn test_repeated_next_link_stops() {
        let collected = collect_pages(|_| async { Ok(Page::new(vec![7], Some("same".to_string()))) }).await;

        assert_eq!(collected.items, vec![7, 7]);
        assert!(collected.error.is_some());
    }

    #[tokio::test]
    async fn test_cycling_next_links_stop() {
        let walk = collect_pages(|cursor| async move {
            let next = match cursor.as_deref() {
                Some("a") => "b",
                _ => "a",
            };
            Ok(Page::new(vec![1], Some(next.to_string())))
        });

        let collected = tokio::time::timeout(std::time::Duration::from_secs(2), walk)
            .await
            .expect("pagination should terminate");

        // None -> a, a -> b, b -> a (already followed)
        assert_eq!(collected.items, vec![1, 1, 1]);
        assert!(collected.error.is_some());
    }
}
