//! Feed state containers
//!
//! A feed owns one dataset plus its loading flag. Fetches are split in two:
//! `begin` hands out a [`FetchTicket`] stamped with the feed's generation, and
//! `settle` applies the outcome only if that generation is still current.
//! Invalidation and newer fetches bump the generation, so a result that
//! arrives after either is dropped instead of overwriting newer state.

use serde::Serialize;

use crate::models::{Employee, Transaction, TransactionPage};

/// Proof of an issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Generic request/cache container
#[derive(Debug, Clone, Serialize)]
pub struct Feed<T> {
    data: Option<T>,
    loading: bool,
    #[serde(skip)]
    generation: u64,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            generation: 0,
        }
    }
}

impl<T> Feed<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Issue a fetch; any fetch still in flight is superseded
    pub fn begin(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket { generation: self.generation }
    }

    /// Synchronously clear the data; in-flight fetches no longer own the feed
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.data = None;
        self.loading = false;
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply a fetch outcome. `None` is a failed fetch: loading clears and the
    /// data is left as it was. Returns `false` for a stale ticket.
    pub fn settle(&mut self, ticket: &FetchTicket, outcome: Option<T>) -> bool {
        self.settle_with(ticket, outcome, |_, next| next)
    }

    /// Like [`Feed::settle`], combining the previous data with the new value
    pub fn settle_with<F>(&mut self, ticket: &FetchTicket, outcome: Option<T>, merge: F) -> bool
    where
        F: FnOnce(Option<T>, T) -> T,
    {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        if let Some(value) = outcome {
            let previous = self.data.take();
            self.data = Some(merge(previous, value));
        }
        true
    }

    /// Mutate the stored data in place
    pub fn update<F: FnOnce(&mut T)>(&mut self, f: F) {
        if let Some(data) = self.data.as_mut() {
            f(data);
        }
    }
}

/// Known employees; never invalidated by the view
pub type EmployeeDirectory = Feed<Vec<Employee>>;

// ==================== Paginated feed ====================

/// Next-page fetch issued by the paginated feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: FetchTicket,
    /// Cursor to request; `None` is the first page
    pub page: Option<String>,
}

/// Accumulated pages of the unfiltered transaction list
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaginatedFeed {
    #[serde(flatten)]
    feed: Feed<TransactionPage>,
}

impl PaginatedFeed {
    pub fn data(&self) -> Option<&TransactionPage> {
        self.feed.data()
    }

    pub fn loading(&self) -> bool {
        self.feed.loading()
    }

    /// Cursor of the next fetch: the first page when nothing is loaded,
    /// `None` once the last page has been merged
    pub fn cursor(&self) -> Option<Option<&str>> {
        match self.feed.data() {
            None => Some(None),
            Some(page) => page.next_page.as_deref().map(Some),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor().is_none()
    }

    /// Issue a fetch for the next page. Returns `None` when every page has
    /// been loaded already.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        let page = self.cursor()?.map(str::to_string);
        if self.feed.loading() {
            log::debug!("paginated feed: superseding in-flight page fetch");
        }
        Some(PageRequest { ticket: self.feed.begin(), page })
    }

    /// Merge a fetched page after the pages already loaded
    pub fn settle(&mut self, request: &PageRequest, outcome: Option<TransactionPage>) -> bool {
        self.feed.settle_with(&request.ticket, outcome, |previous, next| match previous {
            Some(previous) => previous.merge(next),
            None => next,
        })
    }

    pub fn invalidate(&mut self) {
        self.feed.invalidate();
    }

    pub(crate) fn update_rows<F: FnMut(&mut Transaction)>(&mut self, mut f: F) {
        self.feed.update(|page| page.data.iter_mut().for_each(&mut f));
    }
}

// ==================== Employee-filtered feed ====================

/// Fetch-by-id issued by the filtered feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub ticket: FetchTicket,
    pub employee_id: String,
}

/// Transactions of a single employee; every fetch fully replaces the data
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilteredFeed {
    #[serde(flatten)]
    feed: Feed<Vec<Transaction>>,
    employee_id: Option<String>,
}

impl FilteredFeed {
    pub fn data(&self) -> Option<&Vec<Transaction>> {
        self.feed.data()
    }

    pub fn loading(&self) -> bool {
        self.feed.loading()
    }

    /// Employee of the most recent fetch
    pub fn employee_id(&self) -> Option<&str> {
        self.employee_id.as_deref()
    }

    pub fn begin_fetch(&mut self, employee_id: &str) -> FilterRequest {
        self.employee_id = Some(employee_id.to_string());
        FilterRequest {
            ticket: self.feed.begin(),
            employee_id: employee_id.to_string(),
        }
    }

    pub fn settle(&mut self, request: &FilterRequest, outcome: Option<Vec<Transaction>>) -> bool {
        self.feed.settle(&request.ticket, outcome)
    }

    pub fn invalidate(&mut self) {
        self.feed.invalidate();
        self.employee_id = None;
    }

    pub(crate) fn update_rows<F: FnMut(&mut Transaction)>(&mut self, f: F) {
        self.feed.update(|rows| rows.iter_mut().for_each(f));
    }
}
