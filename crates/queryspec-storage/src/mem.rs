use crate::traits::{Repository, StoreResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus::{register_histogram_vec, HistogramVec};
use queryspec_core::{Entity, Query, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

static QUERY_SCAN_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "query_scan_seconds",
        "In-memory query evaluation latency",
        &["entity", "terminal"]
    )
    .unwrap()
});

/// Rows keyed by id. Iteration order is id order, which is also the unsorted result order.
pub struct InMemoryStore<E> {
    inner: Arc<RwLock<Inner<E>>>,
}

struct Inner<E> {
    rows: BTreeMap<i64, E>,
    next_id: i64,
}

impl<E> Clone for InMemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Loads rows as-is; rows without a positive id are numbered after the highest one.
    pub fn from_rows(rows: impl IntoIterator<Item = E>) -> Self {
        let store = Self::new();
        let mut unnumbered = Vec::new();
        for row in rows {
            if row.id() > 0 {
                store.replay_put(row);
            } else {
                unnumbered.push(row);
            }
        }
        for row in unnumbered {
            store.insert(row);
        }
        store
    }

    /// The id the next `insert` will assign.
    pub fn next_id(&self) -> i64 {
        self.inner.read().next_id
    }

    pub fn contains(&self, id: i64) -> bool {
        self.inner.read().rows.contains_key(&id)
    }

    pub fn replay_put(&self, row: E) {
        let mut inner = self.inner.write();
        let id = row.id();
        inner.next_id = inner.next_id.max(id + 1);
        inner.rows.insert(id, row);
    }

    pub fn replay_delete(&self, id: i64) {
        self.inner.write().rows.remove(&id);
    }

    pub fn all_rows(&self) -> Vec<E> {
        self.inner.read().rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: i64) -> Option<E> {
        self.inner.read().rows.get(&id).cloned()
    }

    pub fn insert(&self, mut entity: E) -> E {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        entity.set_id(id);
        inner.rows.insert(id, entity.clone());
        info!(entity = E::shape().name, id, "created");
        entity
    }

    pub fn replace(&self, entity: E) -> StoreResult<E> {
        let mut inner = self.inner.write();
        let slot = inner
            .rows
            .get_mut(&entity.id())
            .ok_or(StoreError::NotFound)?;
        *slot = entity.clone();
        info!(entity = E::shape().name, id = entity.id(), "updated");
        Ok(entity)
    }

    pub fn remove(&self, id: i64) -> StoreResult<()> {
        let removed = self.inner.write().rows.remove(&id);
        match removed {
            Some(_) => {
                info!(entity = E::shape().name, id, "deleted");
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    pub fn scan(&self, query: &Query<E>) -> Vec<E> {
        let _timer = Self::timer("fetch");
        let inner = self.inner.read();
        let rows = query.run(inner.rows.values());
        debug!(entity = E::shape().name, returned = rows.len(), "fetch");
        rows
    }

    pub fn tally(&self, query: &Query<E>) -> u64 {
        let _timer = Self::timer("count");
        let inner = self.inner.read();
        query.count(inner.rows.values()) as u64
    }

    fn timer(terminal: &str) -> prometheus::HistogramTimer {
        QUERY_SCAN_SECONDS
            .with_label_values(&[E::shape().name, terminal])
            .start_timer()
    }
}

#[async_trait::async_trait]
impl<E: Entity> Repository<E> for InMemoryStore<E> {
    async fn find(&self, id: i64) -> StoreResult<Option<E>> {
        Ok(self.get(id))
    }

    async fn create(&self, entity: E) -> StoreResult<E> {
        Ok(self.insert(entity))
    }

    async fn update(&self, entity: E) -> StoreResult<E> {
        self.replace(entity)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.remove(id)
    }

    async fn fetch(&self, query: &Query<E>) -> StoreResult<Vec<E>> {
        Ok(self.scan(query))
    }

    async fn count(&self, query: &Query<E>) -> StoreResult<u64> {
        Ok(self.tally(query))
    }
}
