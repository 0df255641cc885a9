//! View state snapshot and its transitions
//!
//! `ViewState` is the single source of truth for the view. Every mutation goes
//! through one of the transition methods below; they are synchronous and do no
//! I/O, so the coordinator runs them under its lock between awaits and tests
//! can drive them directly.

use serde::Serialize;

use crate::feeds::{EmployeeDirectory, FetchTicket, FilterRequest, FilteredFeed, PageRequest, PaginatedFeed};
use crate::models::{Employee, Transaction, TransactionPage};
use crate::types::{Mode, ViewPhase};

/// Handle for an in-progress "load all transactions" action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadAllTicket {
    /// View epoch the action was started in
    pub epoch: u64,
    /// Employee directory fetch issued by the action
    pub directory: FetchTicket,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Gates the employee select while the directory is being fetched
    pub is_loading: bool,
    pub is_filtered_by_employee: bool,
    /// Bumped each time a mode is entered
    pub epoch: u64,
    pub directory: EmployeeDirectory,
    pub paginated: PaginatedFeed,
    pub filtered: FilteredFeed,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        if self.is_filtered_by_employee {
            Mode::ByEmployee
        } else {
            Mode::All
        }
    }

    pub fn phase(&self) -> ViewPhase {
        match self.mode() {
            Mode::ByEmployee if self.filtered.loading() => ViewPhase::LoadingFiltered,
            Mode::ByEmployee => ViewPhase::ViewingFiltered,
            Mode::All if self.is_loading || self.paginated.loading() => ViewPhase::LoadingAll,
            Mode::All if self.epoch == 0 => ViewPhase::Initial,
            Mode::All => ViewPhase::ViewingAll,
        }
    }

    /// The list shown to the user: paginated data first, then filtered data
    pub fn displayed_transactions(&self) -> Option<&[Transaction]> {
        self.paginated
            .data()
            .map(|page| page.data.as_slice())
            .or_else(|| self.filtered.data().map(Vec::as_slice))
    }

    pub fn employees(&self) -> Option<&[Employee]> {
        self.directory.data().map(Vec::as_slice)
    }

    /// Startup condition: directory neither loaded nor loading
    pub fn needs_initial_load(&self) -> bool {
        self.directory.data().is_none() && !self.directory.loading()
    }

    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    // ==================== Transitions ====================

    /// Entry into ALL mode, up to the employee fetch
    pub fn begin_load_all(&mut self) -> LoadAllTicket {
        self.is_loading = true;
        self.filtered.invalidate();
        self.is_filtered_by_employee = false;
        self.epoch += 1;
        log::debug!("view epoch {}: entering ALL mode", self.epoch);
        LoadAllTicket {
            epoch: self.epoch,
            directory: self.directory.begin(),
        }
    }

    /// Run the startup transition if the startup condition holds. Checking
    /// and transitioning in one step makes the initial load one-shot.
    pub fn begin_initial_load(&mut self) -> Option<LoadAllTicket> {
        if self.needs_initial_load() {
            Some(self.begin_load_all())
        } else {
            None
        }
    }

    /// Employee fetch of a load-all action finished. Clears the loading flag
    /// unless a newer directory fetch owns it. Returns whether the action may
    /// go on to fetch the next page.
    pub fn settle_employees(&mut self, ticket: &LoadAllTicket, outcome: Option<Vec<Employee>>) -> bool {
        if !self.directory.settle(&ticket.directory, outcome) {
            log::debug!("discarding stale employee directory result");
            return false;
        }
        self.is_loading = false;
        self.is_current_epoch(ticket.epoch)
    }

    /// Page fetch of a load-all action. `None` when the action was
    /// superseded or every page is loaded.
    pub fn begin_next_page(&mut self, ticket: &LoadAllTicket) -> Option<PageRequest> {
        if !self.is_current_epoch(ticket.epoch) {
            log::debug!("view epoch {} superseded, skipping page fetch", ticket.epoch);
            return None;
        }
        self.paginated.begin_next_page()
    }

    pub fn settle_page(&mut self, request: &PageRequest, outcome: Option<TransactionPage>) -> bool {
        let applied = self.paginated.settle(request, outcome);
        if !applied {
            log::debug!("discarding stale page result for page {:?}", request.page);
        }
        applied
    }

    /// Entry into BY_EMPLOYEE mode
    pub fn begin_load_by_employee(&mut self, employee_id: &str) -> FilterRequest {
        self.paginated.invalidate();
        self.is_filtered_by_employee = true;
        self.epoch += 1;
        log::debug!("view epoch {}: entering BY_EMPLOYEE mode for {}", self.epoch, employee_id);
        self.filtered.begin_fetch(employee_id)
    }

    pub fn settle_employee_transactions(&mut self, request: &FilterRequest, outcome: Option<Vec<Transaction>>) -> bool {
        let applied = self.filtered.settle(request, outcome);
        if !applied {
            log::debug!("discarding stale transactions of employee {}", request.employee_id);
        }
        applied
    }

    /// Reflect a stored approval change in whichever feed holds the row
    pub fn apply_approval(&mut self, transaction_id: &str, approved: bool) {
        let mut patch = |t: &mut Transaction| {
            if t.id == transaction_id {
                t.approved = approved;
            }
        };
        self.paginated.update_rows(&mut patch);
        self.filtered.update_rows(&mut patch);
    }

    // ==================== Control state ====================

    /// "View More" is rendered only with a displayed list, in ALL mode, while
    /// the paginated feed has a next page
    pub fn view_more_visible(&self) -> bool {
        self.displayed_transactions().is_some()
            && !self.is_filtered_by_employee
            && self.paginated.data().map_or(false, TransactionPage::has_next_page)
    }

    pub fn view_more_disabled(&self) -> bool {
        self.paginated.loading()
    }

    /// Value the employee select should show as chosen
    pub fn selected_employee_id(&self) -> &str {
        if self.is_filtered_by_employee {
            self.filtered.employee_id().unwrap_or_default()
        } else {
            crate::models::EMPTY_EMPLOYEE_ID
        }
    }
}
