// 📄 Listing Engine - search, sponsored/organic split, page windows
//
// Pure transform from a snapshot of results + query + page number to what the
// results page renders. No I/O, no shared state, never fails.

use serde::Serialize;
use tracing::warn;

use crate::entities::{ResultKind, WebResult};
use crate::repository::ContentRepository;

/// Organic results shown per page on the results page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ============================================================================
// CALLER-OWNED STATE
// ============================================================================

/// Search box contents and current page, owned by whatever front end drives
/// the engine. The engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingState {
    pub query: String,
    pub page: i64,
}

impl Default for ListingState {
    fn default() -> Self {
        ListingState {
            query: String::new(),
            page: 1,
        }
    }
}

impl ListingState {
    pub fn new(query: impl Into<String>, page: i64) -> Self {
        ListingState {
            query: query.into(),
            page,
        }
    }

    /// Replace the query. The page number is kept as is; a page that no
    /// longer exists simply renders empty.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.page < total_pages as i64 {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn go_to(&mut self, page: i64) {
        self.page = page;
    }
}

// ============================================================================
// ENGINE OUTPUTS
// ============================================================================

/// Sponsored/organic split of the query matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    pub featured: Option<&'a WebResult>,
    pub organic: Vec<&'a WebResult>,
}

/// One page of a list plus how many pages the list spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
}

/// Everything the results page needs for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView<'a> {
    pub featured: Option<&'a WebResult>,
    #[serde(rename = "results")]
    pub page_items: Vec<&'a WebResult>,
    pub page: i64,
    pub total_pages: usize,
    /// Number of results matching the query, sponsored included
    pub match_count: usize,
}

impl ListingView<'_> {
    /// True when nothing matched the query at all.
    pub fn is_empty(&self) -> bool {
        self.match_count == 0
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages as i64
    }

    /// Page buttons to show; empty when there is a single page or none.
    pub fn page_numbers(&self) -> Vec<usize> {
        if self.total_pages > 1 {
            (1..=self.total_pages).collect()
        } else {
            Vec::new()
        }
    }
}

// ============================================================================
// LISTING ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingEngine {
    page_size: usize,
}

impl Default for ListingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListingEngine {
    /// A page size of 0 is treated as 1.
    pub fn new(page_size: usize) -> Self {
        ListingEngine {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Results whose title, description or name contains the query,
    /// ignoring case. Input order is kept; the query is not trimmed.
    pub fn filter<'a>(&self, results: &'a [WebResult], query: &str) -> Vec<&'a WebResult> {
        let needle = query.to_lowercase();

        results
            .iter()
            .filter(|result| matches_query(result, &needle))
            .collect()
    }

    /// First sponsored match becomes the featured entry; organic matches
    /// keep their order. Later sponsored matches end up in neither.
    pub fn partition<'a>(&self, matches: &[&'a WebResult]) -> Partition<'a> {
        let featured = matches
            .iter()
            .copied()
            .find(|result| result.kind == ResultKind::Sponsored);

        let organic = matches
            .iter()
            .copied()
            .filter(|result| result.kind == ResultKind::Organic)
            .collect();

        Partition { featured, organic }
    }

    /// Slice out page `page` (1-based). Pages outside `1..=total_pages`,
    /// zero and negatives included, give an empty slice.
    pub fn paginate<'a, T>(&self, items: &'a [T], page: i64) -> PageWindow<'a, T> {
        let len = items.len();
        let total_pages = len.div_ceil(self.page_size);

        // Widen before multiplying so extreme page numbers cannot wrap.
        let size = self.page_size as i128;
        let start = (page as i128 - 1).saturating_mul(size);
        let end = start.saturating_add(size);

        let start = start.clamp(0, len as i128) as usize;
        let end = end.clamp(start as i128, len as i128) as usize;

        PageWindow {
            items: &items[start..end],
            total_pages,
        }
    }

    /// filter -> partition -> paginate for the caller's current state.
    pub fn view<'a>(&self, results: &'a [WebResult], state: &ListingState) -> ListingView<'a> {
        let matches = self.filter(results, &state.query);
        let Partition { featured, organic } = self.partition(&matches);
        let window = self.paginate(&organic, state.page);

        ListingView {
            featured,
            page_items: window.items.to_vec(),
            page: state.page,
            total_pages: window.total_pages,
            match_count: matches.len(),
        }
    }
}

fn matches_query(result: &WebResult, needle: &str) -> bool {
    needle.is_empty()
        || result.title.to_lowercase().contains(needle)
        || result.description.to_lowercase().contains(needle)
        || result.name.to_lowercase().contains(needle)
}

// ============================================================================
// SNAPSHOT LOADING
// ============================================================================

/// Results fetched once per page load, plus the load error if the fetch
/// failed. A failed fetch still gives the engine an empty list to work on.
#[derive(Debug, Clone, Default)]
pub struct ResultsSnapshot {
    pub results: Vec<WebResult>,
    pub load_error: Option<String>,
}

impl ResultsSnapshot {
    pub fn fetch<R: ContentRepository + ?Sized>(repo: &R) -> Self {
        match repo.list_results() {
            Ok(results) => ResultsSnapshot {
                results,
                load_error: None,
            },
            Err(err) => {
                warn!(error = %err, "failed to load web results");
                ResultsSnapshot {
                    results: Vec::new(),
                    load_error: Some(err.to_string()),
                }
            }
        }
    }

    pub fn failed(&self) -> bool {
        self.load_error.is_some()
    }
}
