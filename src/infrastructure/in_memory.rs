use crate::domain::finance_request::{FinanceRequest, NewFinanceRequest, RequestStatus};
use crate::domain::ids::{InvoiceId, LenderId, RequestId, ScoreId, SmeId};
use crate::domain::party::{CreditScore, Invoice, InvoicePatch, Lender, Sme};
use crate::domain::ports::{CreditScoreStore, FinanceRequestStore, LenderStore, SmeDirectory};
use crate::error::{FinanceError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct RequestTable {
    last_id: u64,
    rows: BTreeMap<RequestId, FinanceRequest>,
}

/// A thread-safe in-memory store for finance requests.
///
/// Ids come from a counter guarded by the same lock as the rows, so a
/// `BTreeMap` keyed by id iterates in insertion order. `replace` holds the
/// write lock across the status comparison and the write.
#[derive(Default, Clone)]
pub struct InMemoryFinanceRequestStore {
    table: Arc<RwLock<RequestTable>>,
}

impl InMemoryFinanceRequestStore {
    /// Creates a new, empty in-memory finance request store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FinanceRequestStore for InMemoryFinanceRequestStore {
    async fn insert(&self, request: NewFinanceRequest) -> Result<FinanceRequest> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let request = request.with_id(RequestId(table.last_id));
        table.rows.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: RequestId) -> Result<Option<FinanceRequest>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn replace(&self, request: FinanceRequest, expected: RequestStatus) -> Result<()> {
        let mut table = self.table.write().await;
        let current = table
            .rows
            .get_mut(&request.id)
            .ok_or(FinanceError::RequestNotFound(request.id))?;
        if current.status() != expected {
            return Err(FinanceError::ConcurrencyConflict(request.id));
        }
        *current = request;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<FinanceRequest>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }
}

/// A thread-safe in-memory directory of SMEs and their invoices.
#[derive(Default, Clone)]
pub struct InMemorySmeDirectory {
    smes: Arc<RwLock<BTreeMap<SmeId, Sme>>>,
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
}

impl InMemorySmeDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SmeDirectory for InMemorySmeDirectory {
    async fn store_sme(&self, sme: Sme) -> Result<()> {
        let mut smes = self.smes.write().await;
        smes.insert(sme.id, sme);
        Ok(())
    }

    async fn find_sme(&self, id: SmeId) -> Result<Option<Sme>> {
        let smes = self.smes.read().await;
        Ok(smes.get(&id).cloned())
    }

    async fn all_smes(&self) -> Result<Vec<Sme>> {
        let smes = self.smes.read().await;
        Ok(smes.values().cloned().collect())
    }

    async fn store_invoice(&self, invoice: Invoice) -> Result<()> {
        let mut invoices = self.invoices.write().await;
        invoices.insert(invoice.id, invoice);
        Ok(())
    }

    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices.get(&id).cloned())
    }

    async fn invoices_for(&self, sme: SmeId) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;
        let mut owned: Vec<Invoice> = invoices
            .values()
            .filter(|i| i.sme_id == sme)
            .cloned()
            .collect();
        owned.sort_by_key(|i| i.id);
        Ok(owned)
    }

    async fn update_invoice(&self, id: InvoiceId, patch: InvoicePatch) -> Result<Invoice> {
        let mut invoices = self.invoices.write().await;
        let invoice = invoices
            .get_mut(&id)
            .ok_or(FinanceError::InvoiceNotFound(id))?;
        invoice.apply(patch);
        Ok(invoice.clone())
    }
}

#[derive(Default)]
struct ScoreTable {
    last_id: u64,
    by_sme: HashMap<SmeId, Vec<CreditScore>>,
}

/// A thread-safe in-memory store of credit score snapshots.
#[derive(Default, Clone)]
pub struct InMemoryCreditScoreStore {
    table: Arc<RwLock<ScoreTable>>,
}

impl InMemoryCreditScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CreditScoreStore for InMemoryCreditScoreStore {
    async fn record(&self, sme: SmeId, value: Decimal, at: DateTime<Utc>) -> Result<CreditScore> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let score = CreditScore {
            id: ScoreId(table.last_id),
            sme_id: sme,
            value,
            created_at: at,
        };
        table.by_sme.entry(sme).or_default().push(score.clone());
        Ok(score)
    }

    async fn latest(&self, sme: SmeId) -> Result<Option<CreditScore>> {
        let table = self.table.read().await;
        Ok(table.by_sme.get(&sme).and_then(|scores| {
            scores
                .iter()
                .max_by_key(|s| (s.created_at, s.id))
                .cloned()
        }))
    }

    async fn history(&self, sme: SmeId) -> Result<Vec<CreditScore>> {
        let table = self.table.read().await;
        Ok(table.by_sme.get(&sme).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryLenderStore {
    lenders: Arc<RwLock<HashMap<LenderId, Lender>>>,
}

impl InMemoryLenderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LenderStore for InMemoryLenderStore {
    async fn store_lender(&self, lender: Lender) -> Result<()> {
        let mut lenders = self.lenders.write().await;
        lenders.insert(lender.id, lender);
        Ok(())
    }

    async fn find_lender(&self, id: LenderId) -> Result<Option<Lender>> {
        let lenders = self.lenders.read().await;
        Ok(lenders.get(&id).cloned())
    }
}
