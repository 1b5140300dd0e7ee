//! Lazy iteration over paged listing calls
//!
//! `Pages` fetches one page at a time, only when the items of the previous
//! page are used up. A fetch error is yielded once and ends the sequence.
//! To restart, build a new `Pages` from the same fetch function.

use std::vec;

use crate::infrastructure::traits::Page;
use crate::infrastructure::RemoteResult;

/// Iterator over the items of all pages of a listing.
pub struct Pages<T, F> {
    fetch: F,
    buffer: vec::IntoIter<T>,
    next_token: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<T, F> Pages<T, F>
where
    F: FnMut(Option<&str>) -> RemoteResult<Page<T>>,
{
    /// `fetch` receives the page token (`None` for the first page).
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            buffer: Vec::new().into_iter(),
            next_token: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(Option<&str>) -> RemoteResult<Page<T>>,
{
    type Item = RemoteResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }

            let page = (self.fetch)(self.next_token.as_deref());
            self.pages_fetched += 1;
            match page {
                Ok(page) => {
                    self.next_token = page.next_page_token.filter(|t| !t.is_empty());
                    self.exhausted = self.next_token.is_none();
                    self.buffer = page.items.into_iter();
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::RemoteError;

    /// Serves `items` in pages of `size`, tokens are offsets.
    fn paged(items: Vec<u32>, size: usize) -> impl FnMut(Option<&str>) -> RemoteResult<Page<u32>> {
        move |token: Option<&str>| {
            let start: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (start + size).min(items.len());
            Ok(Page {
                items: items[start..end].to_vec(),
                next_page_token: (end < items.len()).then(|| end.to_string()),
            })
        }
    }

    #[test]
    fn given_multiple_pages_when_iterating_then_yields_all_items_in_order() {
        let mut pages = Pages::new(paged((1..=7).collect(), 3));
        let items: Vec<u32> = pages.by_ref().map(Result::unwrap).collect();
        assert_eq!(items, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(pages.pages_fetched(), 3);
    }

    #[test]
    fn given_early_match_when_searching_then_later_pages_are_not_fetched() {
        let mut pages = Pages::new(paged((1..=10).collect(), 2));
        let found = pages.by_ref().map(Result::unwrap).find(|n| *n == 3);
        assert_eq!(found, Some(3));
        assert_eq!(pages.pages_fetched(), 2);
    }

    #[test]
    fn given_empty_listing_when_iterating_then_yields_nothing() {
        let pages = Pages::new(|_: Option<&str>| Ok(Page::<u32>::last(vec![])));
        assert_eq!(pages.count(), 0);
    }

    #[test]
    fn given_failing_second_page_when_iterating_then_error_ends_sequence() {
        let mut calls = 0;
        let pages = Pages::new(move |_token: Option<&str>| {
            calls += 1;
            if calls == 1 {
                Ok(Page {
                    items: vec![1u32],
                    next_page_token: Some("next".into()),
                })
            } else {
                Err(RemoteError::Transport("connection reset".into()))
            }
        });

        let results: Vec<_> = pages.collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(1));
        assert!(results[1].is_err());
    }
}
