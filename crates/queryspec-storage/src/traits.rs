use queryspec_core::{Entity, Query, StoreError};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Keyed storage for one entity type plus the two query terminals.
///
/// `fetch` materializes a [`Query`] (predicate, ordering and window); `count` ignores nothing
/// it is given, so callers hand it an unwindowed query when they want a total.
#[async_trait::async_trait]
pub trait Repository<E: Entity>: Send + Sync + 'static {
    async fn find(&self, id: i64) -> StoreResult<Option<E>>;
    /// Assigns a fresh id and returns the stored entity.
    async fn create(&self, entity: E) -> StoreResult<E>;
    /// Replaces the entity with the same id; `NotFound` when there is none.
    async fn update(&self, entity: E) -> StoreResult<E>;
    async fn delete(&self, id: i64) -> StoreResult<()>;

    async fn fetch(&self, query: &Query<E>) -> StoreResult<Vec<E>>;
    async fn count(&self, query: &Query<E>) -> StoreResult<u64>;

    async fn all(&self) -> StoreResult<Vec<E>> {
        self.fetch(&Query::all()).await
    }
}
