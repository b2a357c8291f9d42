use crate::error::Result;
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

/// A single page of a marker-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub marker: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, marker: Option<String>) -> Self {
        Self { items, marker }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            marker: None,
        }
    }
}

/// Lazy sequence of pages driven by a continuation marker.
///
/// The sequence is finite and cannot be restarted: it ends after the first
/// page without a marker, after a page that echoes the marker it was asked
/// with, or after the first error.
pub struct Pages<T, F> {
    fetch: F,
    marker: Option<String>,
    done: bool,
    fetched: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Pages<T, F>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            marker: None,
            done: false,
            fetched: 0,
            _item: PhantomData,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Option<Result<Vec<T>>> {
        if self.done {
            return None;
        }

        let sent = self.marker.take();
        match (self.fetch)(sent.clone()).await {
            Ok(page) => {
                self.fetched += 1;
                debug!(
                    page = self.fetched,
                    items = page.items.len(),
                    more = page.marker.is_some(),
                    "Fetched page"
                );
                // Log downloads can echo the request marker at end of file
                match page.marker {
                    Some(next) if sent.as_deref() != Some(next.as_str()) => {
                        self.marker = Some(next);
                    }
                    _ => self.done = true,
                }
                Some(Ok(page.items))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    /// Drain every remaining page into one vector, preserving page order.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(items) = self.next_page().await {
            all.extend(items?);
        }
        Ok(all)
    }
}
