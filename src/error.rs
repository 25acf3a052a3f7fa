use crate::domain::finance_request::RequestStatus;
use crate::domain::ids::{InvoiceId, LenderId, RequestId, SmeId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the finance engine and its adapters.
#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("SME {0} not found")]
    SmeNotFound(SmeId),
    #[error("Invoice {0} not found")]
    InvoiceNotFound(InvoiceId),
    #[error("Lender {0} not found")]
    LenderNotFound(LenderId),
    #[error("Finance request {0} not found")]
    RequestNotFound(RequestId),
    #[error("Invoice {invoice} cannot be financed: {reason}")]
    InvalidInvoice { invoice: InvoiceId, reason: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Approved amount {approved} exceeds requested amount {requested}")]
    AmountExceedsRequest {
        approved: Decimal,
        requested: Decimal,
    },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Cannot {action} request with status: {status}")]
    InvalidTransition {
        action: &'static str,
        status: RequestStatus,
    },
    #[error("Finance request {0} was modified concurrently")]
    ConcurrencyConflict(RequestId),
    #[error("Finance request {0} is under contention, try again")]
    StoreContention(RequestId),
    #[error("Store operation timed out after {0} ms")]
    StoreTimeout(u128),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Malformed command: {0}")]
    MalformedCommand(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
}

/// Coarse classification callers use to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    InvalidTransition,
    /// Safe to retry the same call later.
    Transient,
    Internal,
}

impl FinanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FinanceError::SmeNotFound(_)
            | FinanceError::InvoiceNotFound(_)
            | FinanceError::LenderNotFound(_)
            | FinanceError::RequestNotFound(_) => ErrorKind::NotFound,
            FinanceError::InvalidInvoice { .. }
            | FinanceError::InvalidAmount(_)
            | FinanceError::AmountExceedsRequest { .. }
            | FinanceError::ValidationError(_)
            | FinanceError::MalformedCommand(_) => ErrorKind::Validation,
            FinanceError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            FinanceError::ConcurrencyConflict(_)
            | FinanceError::StoreContention(_)
            | FinanceError::StoreTimeout(_) => ErrorKind::Transient,
            FinanceError::Config(_)
            | FinanceError::CsvError(_)
            | FinanceError::IoError(_)
            | FinanceError::InternalError(_) => ErrorKind::Internal,
            #[cfg(feature = "storage-rocksdb")]
            FinanceError::RocksDB(_) => ErrorKind::Internal,
        }
    }

    /// Wraps a serialization failure from a storage adapter.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FinanceError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;
