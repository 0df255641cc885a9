//! Core ledger view state and business logic

pub mod coordinator;
pub mod error;
pub mod feeds;
pub mod models;
pub mod source;
pub mod state;
pub mod types;
pub mod view;

use ledgerview_config::Config;
use std::sync::Arc;

pub use coordinator::{ViewAction, ViewCoordinator};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use feeds::{EmployeeDirectory, Feed, FetchTicket, FilteredFeed, PaginatedFeed};
pub use models::{Employee, LedgerFixture, Transaction, TransactionPage, EMPTY_EMPLOYEE_ID};
pub use source::{CachedLedgerApi, InMemoryLedgerApi, LedgerApi, LedgerApiRef};
pub use state::ViewState;
pub use types::{Mode, ViewPhase};
pub use view::ViewModel;

/// Build the ledger source described by the configuration, wrapped in the
/// response cache when enabled
pub async fn build_source(config: &Config) -> CoreResult<LedgerApiRef> {
    let api: LedgerApiRef = Arc::new(InMemoryLedgerApi::from_config(config).await?);
    if config.data.cache_responses {
        log::info!("Response cache enabled");
        Ok(Arc::new(CachedLedgerApi::new(api)))
    } else {
        Ok(api)
    }
}

// ==================== Test support ====================

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    use crate::error::{CoreError, CoreResult};
    use crate::models::{Employee, LedgerFixture, Transaction, TransactionPage};
    use crate::source::LedgerApi;

    pub fn ada() -> Employee {
        Employee::new("1", "Ada", "Lovelace")
    }

    pub fn grace() -> Employee {
        Employee::new("2", "Grace", "Hopper")
    }

    pub fn tx(id: &str, employee_id: &str) -> Transaction {
        let employee = if employee_id == "2" { grace() } else { Employee::new(employee_id, "Ada", "Lovelace") };
        Transaction {
            id: id.to_string(),
            amount: Decimal::new(1250, 2),
            employee,
            merchant: "Acme".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            approved: false,
        }
    }

    pub fn page(ids: &[&str], next: Option<&str>) -> TransactionPage {
        TransactionPage {
            data: ids.iter().map(|id| tx(id, "1")).collect(),
            next_page: next.map(str::to_string),
        }
    }

    /// Two employees and `count` transactions tx1..txN, alternating owners
    pub fn fixture(count: usize) -> LedgerFixture {
        LedgerFixture {
            employees: vec![ada(), grace()],
            transactions: (1..=count)
                .map(|n| tx(&format!("tx{}", n), if n % 2 == 1 { "1" } else { "2" }))
                .collect(),
        }
    }

    /// Records how often each request reaches the wrapped source
    pub struct CountingApi<A> {
        inner: A,
        calls: Mutex<HashMap<&'static str, usize>>,
    }

    impl<A: LedgerApi> CountingApi<A> {
        pub fn new(inner: A) -> Self {
            Self {
                inner,
                calls: Mutex::new(HashMap::new()),
            }
        }

        pub fn calls(&self, name: &str) -> usize {
            self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
        }

        fn record(&self, name: &'static str) {
            *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
        }
    }

    #[async_trait]
    impl<A: LedgerApi> LedgerApi for CountingApi<A> {
        async fn employees(&self) -> CoreResult<Vec<Employee>> {
            self.record("employees");
            self.inner.employees().await
        }

        async fn paginated_transactions(&self, page: Option<&str>) -> CoreResult<TransactionPage> {
            self.record("paginated");
            self.inner.paginated_transactions(page).await
        }

        async fn transactions_by_employee(&self, employee_id: &str) -> CoreResult<Vec<Transaction>> {
            self.record("by_employee");
            self.inner.transactions_by_employee(employee_id).await
        }

        async fn set_transaction_approval(&self, transaction_id: &str, approved: bool) -> CoreResult<()> {
            self.record("approval");
            self.inner.set_transaction_approval(transaction_id, approved).await
        }
    }

    type Reply<T> = oneshot::Sender<CoreResult<T>>;

    /// Source whose responses are released by the test, in any order
    #[derive(Default)]
    pub struct GatedApi {
        employees: Mutex<VecDeque<Reply<Vec<Employee>>>>,
        pages: Mutex<VecDeque<(Option<String>, Reply<TransactionPage>)>>,
        by_employee: Mutex<VecDeque<(String, Reply<Vec<Transaction>>)>>,
        employee_calls: AtomicUsize,
    }

    async fn wait_for<T>(queue: &Mutex<VecDeque<T>>, what: &str) -> T {
        for _ in 0..10_000 {
            if let Some(item) = queue.lock().unwrap().pop_front() {
                return item;
            }
            tokio::task::yield_now().await;
        }
        panic!("no {} request was issued", what);
    }

    async fn await_reply<T>(rx: oneshot::Receiver<CoreResult<T>>) -> CoreResult<T> {
        rx.await
            .unwrap_or_else(|_| Err(CoreError::fetch_failed("gated", "reply dropped")))
    }

    impl GatedApi {
        pub async fn next_employees(&self) -> Reply<Vec<Employee>> {
            wait_for(&self.employees, "employees").await
        }

        pub async fn next_page(&self) -> (Option<String>, Reply<TransactionPage>) {
            wait_for(&self.pages, "paginated").await
        }

        pub async fn next_by_employee(&self) -> (String, Reply<Vec<Transaction>>) {
            wait_for(&self.by_employee, "by-employee").await
        }

        pub fn pending_pages(&self) -> usize {
            self.pages.lock().unwrap().len()
        }

        /// Requests issued and not yet taken by the test
        pub fn pending(&self) -> usize {
            self.employees.lock().unwrap().len() + self.pending_pages() + self.by_employee.lock().unwrap().len()
        }

        pub fn employee_calls(&self) -> usize {
            self.employee_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LedgerApi for GatedApi {
        async fn employees(&self) -> CoreResult<Vec<Employee>> {
            self.employee_calls.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = oneshot::channel();
            self.employees.lock().unwrap().push_back(tx);
            await_reply(rx).await
        }

        async fn paginated_transactions(&self, page: Option<&str>) -> CoreResult<TransactionPage> {
            let (tx, rx) = oneshot::channel();
            self.pages.lock().unwrap().push_back((page.map(str::to_string), tx));
            await_reply(rx).await
        }

        async fn transactions_by_employee(&self, employee_id: &str) -> CoreResult<Vec<Transaction>> {
            let (tx, rx) = oneshot::channel();
            self.by_employee.lock().unwrap().push_back((employee_id.to_string(), tx));
            await_reply(rx).await
        }

        async fn set_transaction_approval(&self, _transaction_id: &str, _approved: bool) -> CoreResult<()> {
            Ok(())
        }
    }
}
