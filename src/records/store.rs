//! Record store: append-only JSON collections on disk.
//!
//! Each collection is one JSON array rewritten in full on every save
//! (reload, append, rewrite). Saves to a collection are serialized through
//! a per-collection async mutex, and the trip sequence number is assigned
//! inside that critical section.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{DriverRegistration, RecordKind, TripRequest};
use crate::channels::UserId;
use crate::error::StoreError;

/// Persistence contract for finalized submissions.
///
/// Loads never fail: unreadable storage reads as empty. Saves report
/// failure so the caller can log it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All stored trip requests, oldest first.
    async fn load_trip_requests(&self) -> Vec<TripRequest>;

    /// All stored driver registrations, oldest first.
    async fn load_driver_registrations(&self) -> Vec<DriverRegistration>;

    /// Append a trip request. Sets `request.sequence_number` to the number
    /// of readable stored requests plus one, even when the write fails.
    async fn save_trip_request(&self, request: &mut TripRequest) -> Result<(), StoreError>;

    /// Append a driver registration.
    async fn save_driver_registration(
        &self,
        registration: &DriverRegistration,
    ) -> Result<(), StoreError>;

    /// The user's own trip requests, most recent first, at most `limit`.
    async fn recent_trip_requests(&self, user_id: UserId, limit: usize) -> Vec<TripRequest> {
        let mut own: Vec<TripRequest> = self
            .load_trip_requests()
            .await
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        own.reverse();
        own.truncate(limit);
        own
    }
}

/// One JSON array file holding records of a single kind.
struct JsonCollection<T> {
    kind: RecordKind,
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn new(kind: RecordKind, path: PathBuf) -> Self {
        Self {
            kind,
            path,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            kind: self.kind,
            path: self.path.clone(),
            source,
        }
    }

    /// Strict read: a missing or blank file is empty, anything else must parse.
    async fn read(&self) -> Result<Vec<T>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
            kind: self.kind,
            path: self.path.clone(),
            source,
        })
    }

    /// Lenient read used by queries.
    async fn load(&self) -> Vec<T> {
        match self.read().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    kind = %self.kind,
                    error = %e,
                    "Failed to load records, treating store as empty"
                );
                Vec::new()
            }
        }
    }

    /// Reload, let `prepare` stamp the record from what is stored, append, rewrite.
    ///
    /// A collection that exists but cannot be read is never overwritten.
    async fn append<F>(&self, record: &mut T, prepare: F) -> Result<(), StoreError>
    where
        F: FnOnce(&[T], &mut T) + Send,
        T: Clone,
    {
        let _guard = self.write_lock.lock().await;

        let mut records = match self.read().await {
            Ok(records) => records,
            Err(e) => {
                prepare(&[], record);
                return Err(e);
            }
        };
        prepare(&records, record);
        records.push(record.clone());

        self.write_all(&records).await?;
        debug!(kind = %self.kind, count = records.len(), "Record collection rewritten");
        Ok(())
    }

    /// Write the whole collection through a temp file and rename it into place.
    async fn write_all(&self, records: &[T]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_vec_pretty(records).map_err(|source| {
            StoreError::Serialization {
                kind: self.kind,
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, body).await.map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// Record store keeping `orders.json` and `drivers.json` in one directory.
pub struct JsonFileStore {
    trips: JsonCollection<TripRequest>,
    drivers: JsonCollection<DriverRegistration>,
}

impl JsonFileStore {
    /// Create a store rooted at `data_dir`. Files are created on first save.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            trips: JsonCollection::new(
                RecordKind::TripRequest,
                dir.join(RecordKind::TripRequest.file_name()),
            ),
            drivers: JsonCollection::new(
                RecordKind::DriverRegistration,
                dir.join(RecordKind::DriverRegistration.file_name()),
            ),
        }
    }

    /// Path of the file backing `kind`.
    pub fn path(&self, kind: RecordKind) -> &Path {
        match kind {
            RecordKind::TripRequest => &self.trips.path,
            RecordKind::DriverRegistration => &self.drivers.path,
        }
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_trip_requests(&self) -> Vec<TripRequest> {
        self.trips.load().await
    }

    async fn load_driver_registrations(&self) -> Vec<DriverRegistration> {
        self.drivers.load().await
    }

    async fn save_trip_request(&self, request: &mut TripRequest) -> Result<(), StoreError> {
        self.trips
            .append(request, |existing, request| {
                request.sequence_number = existing.len() as u64 + 1;
            })
            .await?;
        info!(
            sequence_number = request.sequence_number,
            user_id = %request.user_id,
            "Trip request saved"
        );
        Ok(())
    }

    async fn save_driver_registration(
        &self,
        registration: &DriverRegistration,
    ) -> Result<(), StoreError> {
        let mut registration = registration.clone();
        self.drivers.append(&mut registration, |_, _| {}).await?;
        info!(user_id = %registration.user_id, "Driver registration saved");
        Ok(())
    }
}
