//! Presentation model derived from a [`ViewState`]
//!
//! Renderers only ever see this model; nothing here is stored.

use serde::Serialize;

use crate::models::{Employee, Transaction, EMPTY_EMPLOYEE_ID};
use crate::state::ViewState;
use crate::types::{Mode, ViewPhase};

pub const SELECT_LABEL: &str = "Filter by employee";
pub const SELECT_LOADING_LABEL: &str = "Loading employees";

/// One option of the employee select, as `{value, label}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
}

impl From<&Employee> for SelectItem {
    fn from(employee: &Employee) -> Self {
        Self {
            value: employee.id.clone(),
            label: employee.full_name(),
        }
    }
}

/// Employee select control
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSelect {
    pub label: &'static str,
    pub loading_label: &'static str,
    pub is_loading: bool,
    pub items: Vec<SelectItem>,
    pub default_value: &'static str,
    pub selected_value: String,
}

/// "View More" action control; absent from the model when not rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewMoreControl {
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub phase: ViewPhase,
    pub mode: Mode,
    pub employee_select: EmployeeSelect,
    /// `None` while nothing has been loaded
    pub transactions: Option<Vec<Transaction>>,
    pub view_more: Option<ViewMoreControl>,
}

impl ViewModel {
    pub fn from_state(state: &ViewState) -> Self {
        let sentinel = Employee::empty();
        let items = match state.employees() {
            None => Vec::new(),
            Some(employees) => std::iter::once(&sentinel)
                .chain(employees.iter())
                .map(SelectItem::from)
                .collect(),
        };

        let view_more = state.view_more_visible().then(|| ViewMoreControl {
            disabled: state.view_more_disabled(),
        });

        Self {
            phase: state.phase(),
            mode: state.mode(),
            employee_select: EmployeeSelect {
                label: SELECT_LABEL,
                loading_label: SELECT_LOADING_LABEL,
                is_loading: state.is_loading,
                items,
                default_value: EMPTY_EMPLOYEE_ID,
                selected_value: state.selected_employee_id().to_string(),
            },
            transactions: state.displayed_transactions().map(<[Transaction]>::to_vec),
            view_more,
        }
    }

    /// Check if any indicator is showing, so renderers know to refresh
    pub fn is_busy(&self) -> bool {
        self.employee_select.is_loading || self.phase.is_loading()
    }
}

impl From<&ViewState> for ViewModel {
    fn from(state: &ViewState) -> Self {
        Self::from_state(state)
    }
}
