//! Ledger source - the transport the feeds fetch from
//!
//! - `LedgerApi`: the boundary the coordinator consumes
//! - `InMemoryLedgerApi`: JSON fixture backed source with page slicing and
//!   optional simulated latency
//! - `CachedLedgerApi`: memoising decorator, flushed when an approval changes

use async_trait::async_trait;
use ledgerview_config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::models::{Employee, LedgerFixture, Transaction, TransactionPage};

/// Source reference type
pub type LedgerApiRef = Arc<dyn LedgerApi>;

/// Requests the feeds issue against the ledger backend
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// All known employees
    async fn employees(&self) -> CoreResult<Vec<Employee>>;

    /// One page of the unfiltered list; `None` requests the first page
    async fn paginated_transactions(&self, page: Option<&str>) -> CoreResult<TransactionPage>;

    /// Every transaction of one employee
    async fn transactions_by_employee(&self, employee_id: &str) -> CoreResult<Vec<Transaction>>;

    /// Set the approval flag of a transaction
    async fn set_transaction_approval(&self, transaction_id: &str, approved: bool) -> CoreResult<()>;
}

// ==================== In-memory source ====================

/// Fixture backed ledger source
pub struct InMemoryLedgerApi {
    data: RwLock<LedgerFixture>,
    page_size: usize,
    employees_latency: Duration,
    transactions_latency: Duration,
}

impl InMemoryLedgerApi {
    /// Create a source over an already loaded fixture
    pub fn new(fixture: LedgerFixture, page_size: usize) -> Self {
        Self {
            data: RwLock::new(fixture),
            page_size: page_size.max(1),
            employees_latency: Duration::ZERO,
            transactions_latency: Duration::ZERO,
        }
    }

    /// Delay every response, so loading states are observable
    pub fn with_latency(mut self, employees: Duration, transactions: Duration) -> Self {
        self.employees_latency = employees;
        self.transactions_latency = transactions;
        self
    }

    /// Load the fixture from a JSON file
    pub async fn from_file(path: &Path, page_size: usize) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => CoreError::IoError,
        })?;
        let fixture: LedgerFixture = serde_json::from_str(&content)?;
        log::info!(
            "Loaded ledger fixture {}: {} employees, {} transactions",
            path.display(),
            fixture.employees.len(),
            fixture.transactions.len()
        );
        Ok(Self::new(fixture, page_size))
    }

    /// Build the source described by the configuration
    pub async fn from_config(config: &Config) -> CoreResult<Self> {
        let api = Self::from_file(&config.data_file_path(), config.pagination.page_size).await?;
        Ok(api.with_latency(
            Duration::from_millis(config.latency.employees_ms),
            Duration::from_millis(config.latency.transactions_ms),
        ))
    }

    fn read(&self) -> CoreResult<std::sync::RwLockReadGuard<'_, LedgerFixture>> {
        self.data.read().map_err(|_| CoreError::InternalError {
            message: "ledger fixture lock poisoned".to_string(),
        })
    }

    async fn simulate(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn page_index(&self, token: Option<&str>, total: usize) -> CoreResult<usize> {
        let Some(token) = token else {
            return Ok(0);
        };
        let invalid = || CoreError::InvalidPageToken { token: token.to_string() };
        let index: usize = token.trim().parse().map_err(|_| invalid())?;
        let past_end = index.checked_mul(self.page_size).map_or(true, |start| start >= total);
        if index > 0 && past_end {
            return Err(invalid());
        }
        Ok(index)
    }
}

#[async_trait]
impl LedgerApi for InMemoryLedgerApi {
    async fn employees(&self) -> CoreResult<Vec<Employee>> {
        Self::simulate(self.employees_latency).await;
        Ok(self.read()?.employees.clone())
    }

    async fn paginated_transactions(&self, page: Option<&str>) -> CoreResult<TransactionPage> {
        Self::simulate(self.transactions_latency).await;
        let data = self.read()?;
        let total = data.transactions.len();
        let index = self.page_index(page, total)?;

        let start = index * self.page_size;
        let end = (start + self.page_size).min(total);
        let next_page = if end < total { Some((index + 1).to_string()) } else { None };

        Ok(TransactionPage {
            data: data.transactions[start.min(total)..end].to_vec(),
            next_page,
        })
    }

    async fn transactions_by_employee(&self, employee_id: &str) -> CoreResult<Vec<Transaction>> {
        if employee_id.is_empty() {
            return Err(CoreError::ValidationError {
                message: "Employee id cannot be empty".to_string(),
            });
        }
        Self::simulate(self.transactions_latency).await;
        Ok(self
            .read()?
            .transactions
            .iter()
            .filter(|t| t.belongs_to(employee_id))
            .cloned()
            .collect())
    }

    async fn set_transaction_approval(&self, transaction_id: &str, approved: bool) -> CoreResult<()> {
        Self::simulate(self.transactions_latency).await;
        let mut data = self.data.write().map_err(|_| CoreError::InternalError {
            message: "ledger fixture lock poisoned".to_string(),
        })?;
        let transaction = data
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| CoreError::TransactionNotFound { id: transaction_id.to_string() })?;
        transaction.approved = approved;
        Ok(())
    }
}

// ==================== Response cache ====================

#[derive(Default)]
struct ResponseCache {
    /// Bumped whenever transaction entries are dropped; fills started under an
    /// older version are not stored
    version: u64,
    employees: Option<Vec<Employee>>,
    pages: HashMap<Option<String>, TransactionPage>,
    by_employee: HashMap<String, Vec<Transaction>>,
}

/// Memoising wrapper around another source
pub struct CachedLedgerApi {
    inner: LedgerApiRef,
    cache: Mutex<ResponseCache>,
}

impl CachedLedgerApi {
    pub fn new(inner: LedgerApiRef) -> Self {
        Self {
            inner,
            cache: Mutex::new(ResponseCache::default()),
        }
    }

    /// Drop every cached transaction response
    pub async fn clear_transactions(&self) {
        let mut cache = self.cache.lock().await;
        cache.version += 1;
        cache.pages.clear();
        cache.by_employee.clear();
    }
}

#[async_trait]
impl LedgerApi for CachedLedgerApi {
    async fn employees(&self) -> CoreResult<Vec<Employee>> {
        if let Some(hit) = self.cache.lock().await.employees.clone() {
            log::debug!("cache hit: employees");
            return Ok(hit);
        }
        let employees = self.inner.employees().await?;
        self.cache.lock().await.employees = Some(employees.clone());
        Ok(employees)
    }

    async fn paginated_transactions(&self, page: Option<&str>) -> CoreResult<TransactionPage> {
        let key = page.map(str::to_string);
        let version = {
            let cache = self.cache.lock().await;
            if let Some(hit) = cache.pages.get(&key) {
                log::debug!("cache hit: paginatedTransactions page={:?}", key);
                return Ok(hit.clone());
            }
            cache.version
        };
        let fetched = self.inner.paginated_transactions(page).await?;
        let mut cache = self.cache.lock().await;
        if cache.version == version {
            cache.pages.insert(key, fetched.clone());
        }
        Ok(fetched)
    }

    async fn transactions_by_employee(&self, employee_id: &str) -> CoreResult<Vec<Transaction>> {
        let version = {
            let cache = self.cache.lock().await;
            if let Some(hit) = cache.by_employee.get(employee_id) {
                log::debug!("cache hit: transactionsByEmployee id={}", employee_id);
                return Ok(hit.clone());
            }
            cache.version
        };
        let fetched = self.inner.transactions_by_employee(employee_id).await?;
        let mut cache = self.cache.lock().await;
        if cache.version == version {
            cache.by_employee.insert(employee_id.to_string(), fetched.clone());
        }
        Ok(fetched)
    }

    async fn set_transaction_approval(&self, transaction_id: &str, approved: bool) -> CoreResult<()> {
        self.inner.set_transaction_approval(transaction_id, approved).await?;
        self.clear_transactions().await;
        Ok(())
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, page, CountingApi, GatedApi};

    #[tokio::test]
    async fn test_pages_are_sliced_with_string_tokens() {
        let api = InMemoryLedgerApi::new(fixture(7), 3);

        let first = api.paginated_transactions(None).await.unwrap();
        assert_eq!(first.data.len(), 3);
        assert_eq!(first.next_page.as_deref(), Some("1"));

        let second = api.paginated_transactions(Some("1")).await.unwrap();
        assert_eq!(second.data[0].id, "tx4");
        assert_eq!(second.next_page.as_deref(), Some("2"));

        let last = api.paginated_transactions(Some("2")).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.next_page, None);
    }

    #[tokio::test]
    async fn test_invalid_page_tokens() {
        let api = InMemoryLedgerApi::new(fixture(4), 2);
        assert!(matches!(
            api.paginated_transactions(Some("p2")).await,
            Err(CoreError::InvalidPageToken { .. })
        ));
        assert!(matches!(
            api.paginated_transactions(Some("2")).await,
            Err(CoreError::InvalidPageToken { .. })
        ));
        assert!(matches!(
            api.paginated_transactions(Some("18446744073709551615")).await,
            Err(CoreError::InvalidPageToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_ledger_first_page() {
        let api = InMemoryLedgerApi::new(LedgerFixture::default(), 5);
        let page = api.paginated_transactions(None).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_transactions_by_employee() {
        let api = InMemoryLedgerApi::new(fixture(6), 5);
        let rows = api.transactions_by_employee("2").await.unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|t| t.employee.id == "2"));

        assert!(api.transactions_by_employee("nobody").await.unwrap().is_empty());
        assert!(matches!(
            api.transactions_by_employee("").await,
            Err(CoreError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_approval() {
        let api = InMemoryLedgerApi::new(fixture(2), 5);
        api.set_transaction_approval("tx1", true).await.unwrap();
        let page = api.paginated_transactions(None).await.unwrap();
        assert!(page.data[0].approved);

        assert!(matches!(
            api.set_transaction_approval("missing", true).await,
            Err(CoreError::TransactionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let result = InMemoryLedgerApi::from_file(Path::new("/no/such/ledger.json"), 5).await;
        assert!(matches!(result, Err(CoreError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_cache_memoises_until_approval_changes() {
        let inner = Arc::new(CountingApi::new(InMemoryLedgerApi::new(fixture(6), 5)));
        let cached = CachedLedgerApi::new(inner.clone());

        cached.employees().await.unwrap();
        cached.employees().await.unwrap();
        cached.paginated_transactions(None).await.unwrap();
        cached.paginated_transactions(None).await.unwrap();
        assert_eq!(inner.calls("employees"), 1);
        assert_eq!(inner.calls("paginated"), 1);

        cached.set_transaction_approval("tx1", true).await.unwrap();
        let page = cached.paginated_transactions(None).await.unwrap();
        assert_eq!(inner.calls("paginated"), 2);
        assert!(page.data[0].approved);

        // employees survive an approval change
        cached.employees().await.unwrap();
        assert_eq!(inner.calls("employees"), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_fill_started_before_approval() {
        let inner = Arc::new(GatedApi::default());
        let cached = Arc::new(CachedLedgerApi::new(inner.clone()));

        let reader = cached.clone();
        let read = tokio::spawn(async move { reader.paginated_transactions(None).await });
        let (_, reply) = inner.next_page().await;
        cached.set_transaction_approval("tx1", true).await.unwrap();
        let _ = reply.send(Ok(page(&["tx1"], None)));
        assert_eq!(read.await.unwrap().unwrap().data[0].id, "tx1");

        // the page read before the approval was not stored
        let reader = cached.clone();
        let read = tokio::spawn(async move { reader.paginated_transactions(None).await });
        let (_, reply) = inner.next_page().await;
        let _ = reply.send(Ok(page(&["tx1"], None)));
        read.await.unwrap().unwrap();

        // an uninterrupted fill is served from the cache
        let hit = tokio::time::timeout(Duration::from_secs(1), cached.paginated_transactions(None))
            .await
            .expect("page should be cached")
            .unwrap();
        assert_eq!(hit.data.len(), 1);
        assert_eq!(inner.pending_pages(), 0);
    }
}
