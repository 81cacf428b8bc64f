//! Redb-backed storage for the gateway record.
//!
//! One table, keyed by canonical MAC address, holding the ciborium-encoded
//! [`GatewayRecord`]. A deployment normally has exactly one row; the
//! unique-by-MAC key makes repeated bootstrap syncs idempotent. The whole
//! table is wiped when the backend stops recognizing our credentials.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Table: gateways
/// Key: canonical MAC address (`aa:bb:cc:dd:ee:ff`)
/// Value: CBOR-encoded `GatewayRecord`
const GATEWAYS: TableDefinition<&str, &[u8]> = TableDefinition::new("gateways");

/// Storage failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database could not be opened, read or written.
    #[error("storage i/o: {0}")]
    Io(String),

    /// A stored value could not be encoded or decoded.
    #[error("record serialization: {0}")]
    Serialization(String),
}

/// The gateway's identity and credentials as known to the backend.
///
/// Field-for-field mirror of the backend's gateway resource; `None` maps
/// to its nullable columns. The backend-assigned `id` is authoritative and
/// replaces whatever is cached locally on every successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRecord {
    /// Backend-assigned numeric id.
    pub id: Option<i64>,
    /// Canonical MAC address, the primary identifier.
    pub mac_address: String,
    /// Reported hostname.
    pub hostname: Option<String>,
    /// Reported IP address.
    pub ip_address: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Opaque bearer token; presence means the gateway is provisioned.
    pub access_token: Option<String>,
    /// Backend-side status string.
    pub status: Option<String>,
    /// Last heartbeat the backend acknowledged.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Backend creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Backend update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GatewayRecord {
    /// Empty record for the given MAC.
    pub fn new(mac_address: impl Into<String>) -> Self {
        Self {
            id: None,
            mac_address: mac_address.into(),
            hostname: None,
            ip_address: None,
            name: None,
            description: None,
            access_token: None,
            status: None,
            last_heartbeat: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Durable gateway store backed by redb.
///
/// Thread-safe through redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct GatewayStore {
    db: Arc<Database>,
}

impl GatewayStore {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// `StoreError::Io` if the database cannot be opened or created. The
    /// binary treats this as an unrecoverable startup failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(GATEWAYS).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Insert or replace the record keyed by its MAC address.
    pub fn upsert(&self, record: &GatewayRecord) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(GATEWAYS).map_err(|e| StoreError::Io(e.to_string()))?;

            let mut bytes = Vec::new();
            ciborium::into_writer(record, &mut bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            table
                .insert(record.mac_address.as_str(), bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    /// Load the record for a MAC address.
    pub fn get(&self, mac_address: &str) -> Result<Option<GatewayRecord>, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(GATEWAYS).map_err(|e| StoreError::Io(e.to_string()))?;

        match table.get(mac_address).map_err(|e| StoreError::Io(e.to_string()))? {
            Some(value) => {
                let record: GatewayRecord = ciborium::from_reader(value.value())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }

    /// Delete every stored record.
    ///
    /// Called when the backend rejects our credentials; the next loop
    /// iteration starts from a clean slate.
    pub fn wipe(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(GATEWAYS).map_err(|e| StoreError::Io(e.to_string()))?;

            let macs: Vec<String> = table
                .iter()
                .map_err(|e| StoreError::Io(e.to_string()))?
                .map(|entry| {
                    entry
                        .map(|(key, _)| key.value().to_string())
                        .map_err(|e| StoreError::Io(e.to_string()))
                })
                .collect::<Result<_, _>>()?;

            for mac in macs {
                table.remove(mac.as_str()).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(GATEWAYS).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(table.iter().map_err(|e| StoreError::Io(e.to_string()))?.count())
    }
}
