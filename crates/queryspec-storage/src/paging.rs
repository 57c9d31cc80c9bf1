//! Compile, fetch and count a search in one call.
//!
//! The page and the total are issued concurrently. Each terminal races the cancellation
//! token; whichever completes first wins, and a cancelled token always wins ties so no
//! partial page is ever returned.

use crate::traits::{Repository, StoreResult};
use queryspec_core::{
    AliasMap, Entity, PagedResult, Query, SearchRequest, Specification, StoreError,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub async fn list_paged<E, R>(
    store: &R,
    spec: &Specification<E>,
    cancel: &CancellationToken,
) -> StoreResult<PagedResult<E>>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    let prepared = spec.apply(Query::all());
    let page = until_cancelled(cancel, store.fetch(&prepared.page));
    let total = until_cancelled(cancel, store.count(&prepared.count));
    let (items, total) = tokio::try_join!(page, total)?;
    debug!(returned = items.len(), total, "listed page");
    Ok(PagedResult::new(items, total, spec.page()))
}

/// Validates the whole request before touching the store.
pub async fn apply_specification<E, R>(
    store: &R,
    request: &SearchRequest,
    aliases: &AliasMap,
    cancel: &CancellationToken,
) -> queryspec_core::Result<PagedResult<E>>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    let spec = Specification::<E>::compile(request, aliases)?;
    Ok(list_paged(store, &spec, cancel).await?)
}

async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::InMemoryStore;
    use chrono::NaiveDate;
    use queryspec_core::{Filter, SortSpec, WeatherForecast};

    fn store() -> InMemoryStore<WeatherForecast> {
        InMemoryStore::from_rows((1..=12).map(|i| WeatherForecast {
            id: i,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            temperature_c: i as i32 * 3,
            summary: Some("Mild".into()),
            location: Default::default(),
        }))
    }

    #[tokio::test]
    async fn test_page_and_total() {
        let request = SearchRequest::default()
            .filter("temperatureC", Filter::gt("10"))
            .sort_by(SortSpec::desc("temperatureC"))
            .page(2, 3);
        let page = apply_specification(&store(), &request, &AliasMap::new(), &CancellationToken::new())
            .await
            .unwrap();
        let temps: Vec<_> = page.items().iter().map(|f| f.temperature_c).collect();
        assert_eq!(temps, vec![27, 24, 21]);
        assert_eq!(page.total_count(), 9);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_token_yields_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = apply_specification(&store(), &SearchRequest::default(), &AliasMap::new(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
