//! Basic types for the view-state module

use serde::{Deserialize, Serialize};

/// Which feed is authoritative for the displayed transaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Paginated "all transactions" feed
    All,
    /// Transactions of one employee
    ByEmployee,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::All
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::All => write!(f, "ALL"),
            Mode::ByEmployee => write!(f, "BY_EMPLOYEE"),
        }
    }
}

/// Coarse phase of the view, derived from the state snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewPhase {
    /// Nothing requested yet
    Initial,
    /// Employees or the next page are being fetched
    LoadingAll,
    /// Paginated feed settled
    ViewingAll,
    /// Employee transactions are being fetched
    LoadingFiltered,
    /// Filtered feed settled
    ViewingFiltered,
}

impl ViewPhase {
    /// Check if some fetch is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewPhase::LoadingAll | ViewPhase::LoadingFiltered)
    }
}

impl std::fmt::Display for ViewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewPhase::Initial => write!(f, "INITIAL"),
            ViewPhase::LoadingAll => write!(f, "LOADING_ALL"),
            ViewPhase::ViewingAll => write!(f, "VIEWING_ALL"),
            ViewPhase::LoadingFiltered => write!(f, "LOADING_FILTERED"),
            ViewPhase::ViewingFiltered => write!(f, "VIEWING_FILTERED"),
        }
    }
}
