//! Core data models for the ledger view

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Id carried by the "All Employees" sentinel
pub const EMPTY_EMPLOYEE_ID: &str = "";

/// Employee information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique employee identifier
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Employee {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// The "no filter" sentinel shown first in the employee select
    pub fn empty() -> Self {
        Self::new(EMPTY_EMPLOYEE_ID, "All", "Employees")
    }

    /// Check if this is the "no filter" sentinel
    pub fn is_empty_sentinel(&self) -> bool {
        self.id == EMPTY_EMPLOYEE_ID
    }

    /// Display name ("First Last")
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Transaction information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,
    pub amount: Decimal,
    /// Employee who made the transaction
    pub employee: Employee,
    pub merchant: String,
    pub date: NaiveDate,
    /// Approval state, toggled from the view
    #[serde(default)]
    pub approved: bool,
}

impl Transaction {
    /// Check if transaction belongs to the given employee
    pub fn belongs_to(&self, employee_id: &str) -> bool {
        self.employee.id == employee_id
    }
}

/// One page of the unfiltered transaction list.
///
/// In the paginated feed this holds every page loaded so far, with
/// `next_page` taken from the most recent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub data: Vec<Transaction>,
    /// Token for the next page; `None` when no further pages exist
    pub next_page: Option<String>,
}

impl TransactionPage {
    /// Check if further pages exist
    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a later page, taking over its cursor
    pub fn merge(mut self, next: TransactionPage) -> TransactionPage {
        self.data.extend(next.data);
        self.next_page = next.next_page;
        self
    }
}

/// Ledger fixture as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFixture {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}
