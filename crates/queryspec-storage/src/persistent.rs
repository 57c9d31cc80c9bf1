use crate::mem::InMemoryStore;
use crate::snapshot::{read_snapshot, write_snapshot, SNAPSHOT_FILE};
use crate::traits::{Repository, StoreResult};
use crate::wal::{Wal, WalRecord};
use parking_lot::Mutex;
use queryspec_core::{Entity, Query, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tracing::info;

/// The in-memory store made durable: every write reaches the WAL before it is applied in
/// memory, and `compact` folds the WAL into a snapshot. Writes hold the WAL lock throughout.
///
/// Layout of `data_dir`: `snapshot.zst` (optional) and `wal.log`.
pub struct PersistentStore<E> {
    mem: InMemoryStore<E>,
    wal: Mutex<Wal>,
    data_dir: PathBuf,
}

impl<E> PersistentStore<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        let wal = Wal::open(&data_dir)?;
        let mem = InMemoryStore::new();

        let snap = data_dir.join(SNAPSHOT_FILE);
        let mut from_snapshot = 0usize;
        if snap.exists() {
            for row in read_snapshot::<E>(&snap)? {
                mem.replay_put(row);
                from_snapshot += 1;
            }
        }

        let records = Wal::replay(&data_dir)?;
        let replayed = records.len();
        for rec in records {
            match rec {
                WalRecord::Put { id, payload } => {
                    let mut row: E = serde_json::from_value(payload)
                        .map_err(|e| StoreError::Corrupt(format!("wal put {id}: {e}")))?;
                    row.set_id(id);
                    mem.replay_put(row);
                }
                WalRecord::Delete { id } => mem.replay_delete(id),
            }
        }
        info!(
            dir = %data_dir.display(),
            from_snapshot,
            replayed,
            rows = mem.len(),
            "persistent store opened"
        );
        Ok(Self {
            mem,
            wal: Mutex::new(wal),
            data_dir,
        })
    }

    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    /// Writes every live row to the snapshot and empties the WAL. Returns the row count.
    pub fn compact(&self) -> StoreResult<usize> {
        let mut wal = self.wal.lock();
        let rows = self.mem.all_rows();
        let written = write_snapshot(&self.data_dir.join(SNAPSHOT_FILE), &rows)?;
        wal.truncate()?;
        info!(rows = written, "compacted");
        Ok(written)
    }

    fn put_record(row: &E) -> StoreResult<WalRecord> {
        Ok(WalRecord::Put {
            id: row.id(),
            payload: serde_json::to_value(row).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        })
    }
}

#[async_trait::async_trait]
impl<E> Repository<E> for PersistentStore<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    async fn find(&self, id: i64) -> StoreResult<Option<E>> {
        Ok(self.mem.get(id))
    }

    async fn create(&self, mut entity: E) -> StoreResult<E> {
        let mut wal = self.wal.lock();
        entity.set_id(self.mem.next_id());
        wal.append(&Self::put_record(&entity)?)?;
        Ok(self.mem.insert(entity))
    }

    async fn update(&self, entity: E) -> StoreResult<E> {
        let mut wal = self.wal.lock();
        if !self.mem.contains(entity.id()) {
            return Err(StoreError::NotFound);
        }
        wal.append(&Self::put_record(&entity)?)?;
        self.mem.replace(entity)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut wal = self.wal.lock();
        if !self.mem.contains(id) {
            return Err(StoreError::NotFound);
        }
        wal.append(&WalRecord::Delete { id })?;
        self.mem.remove(id)
    }

    async fn fetch(&self, query: &Query<E>) -> StoreResult<Vec<E>> {
        Ok(self.mem.scan(query))
    }

    async fn count(&self, query: &Query<E>) -> StoreResult<u64> {
        Ok(self.mem.tally(query))
    }
}
