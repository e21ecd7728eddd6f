//! Cursor pagination for the reel feed.
//!
//! Maintains the ordered, de-duplicated card collection for one screen
//! plus the cursor and loading / exhausted flags.  The controller performs
//! no IO: it hands out at most one outstanding [`PageRequest`] at a time
//! and the session driver feeds the outcome back in.

use std::collections::HashSet;

use tracing::{debug, warn};

use wayfare_shared::constants::MAX_PAGE_SIZE;
use wayfare_shared::{FeedError, FeedPage, ReelCard, ReelId};

/// One backend page fetch the driver should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Cursor returned by the previous page, `None` for the first page.
    pub cursor: Option<String>,
    /// Page size, already clamped to what the backend accepts.
    pub limit: u32,
}

/// Mutable feed state for one screen.  Hosts read it through snapshots;
/// only the controllers mutate it.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Cards in arrival order.  Append-only between screen resets.
    pub cards: Vec<ReelCard>,
    /// Cursor for the next fetch.
    pub cursor: Option<String>,
    /// A page fetch is in flight.
    pub loading: bool,
    /// The backend said no more pages exist.
    pub exhausted: bool,
    /// Most recent page failure, cleared by a later success or retry.
    pub error: Option<FeedError>,
}

/// Drives [`FeedState`] through load / merge / failure transitions.
#[derive(Debug, Clone)]
pub struct FeedController {
    state: FeedState,
    seen: HashSet<ReelId>,
    page_size: u32,
}

impl FeedController {
    /// Create a controller with the given page size, clamped to the
    /// backend's accepted range.
    pub fn new(page_size: u32) -> Self {
        Self {
            state: FeedState::default(),
            seen: HashSet::new(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn cards(&self) -> &[ReelCard] {
        &self.state.cards
    }

    pub fn len(&self) -> usize {
        self.state.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.cards.is_empty()
    }

    pub fn card(&self, index: usize) -> Option<&ReelCard> {
        self.state.cards.get(index)
    }

    /// Mutable card access for the engagement controller.
    pub(crate) fn card_mut_by_id(&mut self, id: &ReelId) -> Option<&mut ReelCard> {
        self.state.cards.iter_mut().find(|card| &card.id == id)
    }

    /// Ask for the next page.  Returns `None` while a load is already in
    /// flight or the feed is exhausted, which makes repeated trailing
    /// triggers (scroll jitter, re-renders) harmless.
    pub fn next_page_request(&mut self) -> Option<PageRequest> {
        if self.state.loading {
            debug!("page request suppressed: load already in flight");
            return None;
        }
        if self.state.exhausted {
            debug!("page request suppressed: feed exhausted");
            return None;
        }
        self.state.loading = true;
        Some(PageRequest {
            cursor: self.state.cursor.clone(),
            limit: self.page_size,
        })
    }

    /// Clear a previous failure and ask again.  The retried request
    /// carries the same cursor the failed one did.
    pub fn retry(&mut self) -> Option<PageRequest> {
        self.state.error = None;
        self.next_page_request()
    }

    /// Merge one fetched page.  Cards whose id was already seen are
    /// dropped; the rest append in backend order.  Returns how many cards
    /// were actually added.
    pub fn apply_page(&mut self, page: FeedPage) -> usize {
        let mut appended = 0;
        for card in page.cards {
            if self.seen.insert(card.id.clone()) {
                self.state.cards.push(card);
                appended += 1;
            } else {
                debug!(reel = %card.id, "dropping duplicate reel from overlapping page");
            }
        }
        self.state.cursor = page.next_cursor;
        self.state.exhausted = !page.has_more;
        self.state.loading = false;
        self.state.error = None;
        debug!(
            appended,
            total = self.state.cards.len(),
            exhausted = self.state.exhausted,
            "feed page merged"
        );
        appended
    }

    /// Record a failed page load.  Already-loaded cards and the cursor
    /// stay exactly as they were, so a retry resumes where the failure
    /// happened.
    pub fn apply_failure(&mut self, error: FeedError) {
        warn!(error = %error, "feed page load failed");
        self.state.loading = false;
        self.state.error = Some(error);
    }

    /// Terminal empty feed: the backend returned nothing and promises
    /// nothing more.  Hosts render the empty state instead of a spinner.
    pub fn is_empty_terminal(&self) -> bool {
        self.state.exhausted && self.state.cards.is_empty() && !self.state.loading
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(wayfare_shared::constants::DEFAULT_PAGE_SIZE)
    }
}
