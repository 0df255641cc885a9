//! View-state coordinator
//!
//! Orchestrates the employee directory, the paginated feed and the filtered
//! feed in response to user actions. Each action starts with one synchronous
//! transition on the [`ViewState`] (taken under the state lock) and then
//! continues asynchronously; the lock is never held across a source call.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{CoreError, CoreResult};
use crate::feeds::FilterRequest;
use crate::models::Employee;
use crate::source::LedgerApiRef;
use crate::state::{LoadAllTicket, ViewState};
use crate::view::ViewModel;

/// User actions the presentation layer can dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    /// The view became visible
    Mount,
    /// Employee select changed; `None` when cleared without a choice
    SelectEmployee(Option<Employee>),
    /// "View More" activated
    ViewMore,
}

impl ViewAction {
    pub fn name(&self) -> &'static str {
        match self {
            ViewAction::Mount => "mount",
            ViewAction::SelectEmployee(_) => "select_employee",
            ViewAction::ViewMore => "view_more",
        }
    }
}

/// What is left to do after an action's first transition
#[derive(Debug)]
enum Pending {
    LoadAll(LoadAllTicket),
    ByEmployee(FilterRequest),
    Idle,
}

fn split<T>(result: CoreResult<T>) -> (Option<T>, Option<CoreError>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(error) => (None, Some(error)),
    }
}

/// Owns the view state of one session
pub struct ViewCoordinator {
    api: LedgerApiRef,
    state: RwLock<ViewState>,
}

impl ViewCoordinator {
    pub fn new(api: LedgerApiRef) -> Self {
        Self {
            api,
            state: RwLock::new(ViewState::new()),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Presentation model of the current state
    pub async fn view(&self) -> ViewModel {
        ViewModel::from_state(&*self.state.read().await)
    }

    /// Startup hook. Fires the initial load when the directory is neither
    /// loaded nor loading; returns whether it fired.
    pub async fn mount(&self) -> CoreResult<bool> {
        self.run(ViewAction::Mount).await
    }

    /// Enter ALL mode: refresh employees, then fetch the next page
    pub async fn load_all_transactions(&self) -> CoreResult<()> {
        let ticket = self.state.write().await.begin_load_all();
        self.finish_load_all(ticket).await
    }

    /// Enter BY_EMPLOYEE mode for one employee
    pub async fn load_transactions_by_employee(&self, employee_id: &str) -> CoreResult<()> {
        let request = self.state.write().await.begin_load_by_employee(employee_id);
        self.finish_load_by_employee(request).await
    }

    /// Employee select change handler
    pub async fn select_employee(&self, selection: Option<Employee>) -> CoreResult<()> {
        self.run(ViewAction::SelectEmployee(selection)).await.map(|_| ())
    }

    /// "View More" handler. Returns `false` when the control is hidden or
    /// disabled and nothing was done.
    pub async fn view_more(&self) -> CoreResult<bool> {
        self.run(ViewAction::ViewMore).await
    }

    /// Apply an action's first transition now and drive the rest on a
    /// spawned task. The returned handle yields the action's result.
    pub async fn dispatch(self: &Arc<Self>, action: ViewAction) -> JoinHandle<CoreResult<()>> {
        let pending = {
            let mut state = self.state.write().await;
            Self::begin(&mut state, &action)
        };
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.drive(pending).await.map(|_| ()) })
    }

    /// Map a select value to an employee: absent is no selection, the empty
    /// id is the "All Employees" sentinel, anything else must be a known
    /// employee.
    pub async fn resolve_selection(&self, value: Option<&str>) -> CoreResult<Option<Employee>> {
        let Some(id) = value else {
            return Ok(None);
        };
        if id == crate::models::EMPTY_EMPLOYEE_ID {
            return Ok(Some(Employee::empty()));
        }
        let state = self.state.read().await;
        state
            .employees()
            .and_then(|employees| employees.iter().find(|e| e.id == id))
            .cloned()
            .map(Some)
            .ok_or_else(|| CoreError::EmployeeNotFound { id: id.to_string() })
    }

    /// Store an approval change and reflect it in the displayed rows
    pub async fn set_transaction_approval(&self, transaction_id: &str, approved: bool) -> CoreResult<()> {
        self.api.set_transaction_approval(transaction_id, approved).await?;
        self.state.write().await.apply_approval(transaction_id, approved);
        log::info!("transaction {} approval set to {}", transaction_id, approved);
        Ok(())
    }

    // ==================== Orchestration ====================

    async fn run(&self, action: ViewAction) -> CoreResult<bool> {
        let pending = {
            let mut state = self.state.write().await;
            Self::begin(&mut state, &action)
        };
        self.drive(pending).await
    }

    fn begin(state: &mut ViewState, action: &ViewAction) -> Pending {
        log::debug!("action {} in phase {}", action.name(), state.phase());
        match action {
            ViewAction::Mount => match state.begin_initial_load() {
                Some(ticket) => {
                    log::info!("initial load triggered");
                    Pending::LoadAll(ticket)
                }
                None => Pending::Idle,
            },
            ViewAction::SelectEmployee(None) => Pending::Idle,
            ViewAction::SelectEmployee(Some(employee)) if employee.is_empty_sentinel() => {
                Pending::LoadAll(state.begin_load_all())
            }
            ViewAction::SelectEmployee(Some(employee)) => {
                Pending::ByEmployee(state.begin_load_by_employee(&employee.id))
            }
            ViewAction::ViewMore => {
                if !state.view_more_visible() || state.view_more_disabled() {
                    log::debug!("view more ignored: control hidden or disabled");
                    return Pending::Idle;
                }
                // re-runs the whole ALL-mode entry, employee refresh included
                Pending::LoadAll(state.begin_load_all())
            }
        }
    }

    async fn drive(&self, pending: Pending) -> CoreResult<bool> {
        match pending {
            Pending::LoadAll(ticket) => self.finish_load_all(ticket).await.map(|_| true),
            Pending::ByEmployee(request) => self.finish_load_by_employee(request).await.map(|_| true),
            Pending::Idle => Ok(false),
        }
    }

    async fn finish_load_all(&self, ticket: LoadAllTicket) -> CoreResult<()> {
        let (employees, failure) = split(self.api.employees().await);

        let request = {
            let mut state = self.state.write().await;
            let proceed = state.settle_employees(&ticket, employees);
            if let Some(error) = failure {
                return Err(error);
            }
            if !proceed {
                return Ok(());
            }
            state.begin_next_page(&ticket)
        };

        // the select is interactive again from here on; the page fetch below
        // only drives the paginated feed's own loading flag
        let Some(request) = request else {
            log::debug!("paginated feed exhausted, nothing to fetch");
            return Ok(());
        };
        let (page, failure) = split(self.api.paginated_transactions(request.page.as_deref()).await);
        self.state.write().await.settle_page(&request, page);

        failure.map_or(Ok(()), Err)
    }

    async fn finish_load_by_employee(&self, request: FilterRequest) -> CoreResult<()> {
        let (rows, failure) = split(self.api.transactions_by_employee(&request.employee_id).await);
        self.state.write().await.settle_employee_transactions(&request, rows);

        failure.map_or(Ok(()), Err)
    }
}
