use crate::domain::finance_request::{FinanceRequest, NewFinanceRequest, RequestStatus};
use crate::domain::ids::RequestId;
use crate::domain::ports::FinanceRequestStore;
use crate::error::{FinanceError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing finance requests keyed by big-endian id.
pub const CF_REQUESTS: &str = "finance_requests";
/// Column Family for store bookkeeping such as the id counter.
pub const CF_META: &str = "meta";

const LAST_ID_KEY: &[u8] = b"last_request_id";

/// A persistent finance request store backed by RocksDB.
///
/// Big-endian keys make iteration follow id order. Writes that depend on a
/// prior read (id allocation, conditional replace) are serialised through
/// `write_lock`, which makes the status check and the write one atomic step.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_requests = ColumnFamilyDescriptor::new(CF_REQUESTS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_requests, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            FinanceError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read(&self, id: RequestId) -> Result<Option<FinanceRequest>> {
        let cf = self.cf(CF_REQUESTS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(FinanceError::internal)?,
            )),
            None => Ok(None),
        }
    }

    fn last_id(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, LAST_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    FinanceError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt request id counter",
                    )))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl FinanceRequestStore for RocksDBStore {
    async fn insert(&self, request: NewFinanceRequest) -> Result<FinanceRequest> {
        let _guard = self.write_lock.lock().await;

        let id = self.last_id()? + 1;
        let request = request.with_id(RequestId(id));
        let value = serde_json::to_vec(&request).map_err(FinanceError::internal)?;

        // Counter first: a crash in between leaves a gap, never a reused id.
        self.db
            .put_cf(self.cf(CF_META)?, LAST_ID_KEY, id.to_be_bytes())?;
        self.db
            .put_cf(self.cf(CF_REQUESTS)?, id.to_be_bytes(), value)?;

        Ok(request)
    }

    async fn get(&self, id: RequestId) -> Result<Option<FinanceRequest>> {
        self.read(id)
    }

    async fn replace(&self, request: FinanceRequest, expected: RequestStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let current = self
            .read(request.id)?
            .ok_or(FinanceError::RequestNotFound(request.id))?;
        if current.status() != expected {
            return Err(FinanceError::ConcurrencyConflict(request.id));
        }

        let value = serde_json::to_vec(&request).map_err(FinanceError::internal)?;
        self.db
            .put_cf(self.cf(CF_REQUESTS)?, request.id.0.to_be_bytes(), value)?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<FinanceRequest>> {
        let cf = self.cf(CF_REQUESTS)?;
        let mut requests = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            requests.push(serde_json::from_slice(&value).map_err(FinanceError::internal)?);
        }
        Ok(requests)
    }
}
