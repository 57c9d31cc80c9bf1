//! Deferred queries and the specification pipeline that builds them.
//!
//! # Order of application
//!
//! 1. Compile every filter and the sort key (all errors surface here)
//! 2. Apply the combined predicate, unless the filter set is empty
//! 3. Snapshot the filtered query as the count query
//! 4. Apply the ordering, if a sort field was given
//! 5. Apply the page window
//!
//! Nothing here executes anything; stores interpret the resulting [`Query`] values.

use crate::alias::AliasMap;
use crate::errors::SpecError;
use crate::filter::compile_filter_set;
use crate::predicate::Predicate;
use crate::query::{FilterSet, LogicalOperator, PageRequest, SearchRequest, SortSpec};
use crate::schema::Entity;
use crate::sort::{build_ordering, SortKey};
use std::marker::PhantomData;
use tracing::debug;

/// A composable, not yet executed query over entities of type `E`.
pub struct Query<E> {
    predicate: Option<Predicate>,
    ordering: Option<SortKey>,
    skip: usize,
    take: Option<usize>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            ordering: self.ordering.clone(),
            skip: self.skip,
            take: self.take,
            _entity: PhantomData,
        }
    }
}

impl<E> Default for Query<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> Query<E> {
    pub fn all() -> Self {
        Self {
            predicate: None,
            ordering: None,
            skip: 0,
            take: None,
            _entity: PhantomData,
        }
    }

    /// Narrows the query; successive filters are conjunctive.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            None => predicate,
            Some(existing) => existing.and(predicate),
        });
        self
    }

    pub fn order_by(mut self, key: SortKey) -> Self {
        self.ordering = Some(key);
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.take = Some(n);
        self
    }

}

impl<E: Entity> Query<E> {
    pub fn matches(&self, entity: &E) -> bool {
        self.predicate
            .as_ref()
            .map_or(true, |p| p.evaluate(entity))
    }

    /// Evaluates the query against rows held in memory, in their given order.
    ///
    /// The sort is stable, so ties keep source order here, but that is a property of this
    /// evaluator rather than of the query.
    pub fn run<'a, I>(&self, rows: I) -> Vec<E>
    where
        I: IntoIterator<Item = &'a E>,
    {
        let mut matched: Vec<&E> = rows.into_iter().filter(|e| self.matches(e)).collect();
        if let Some(key) = &self.ordering {
            matched.sort_by(|a, b| key.compare(*a, *b));
        }
        let take = self.take.unwrap_or(usize::MAX);
        matched
            .into_iter()
            .skip(self.skip)
            .take(take)
            .cloned()
            .collect()
    }

    /// Counts what [`Query::run`] would return without cloning anything.
    pub fn count<'a, I>(&self, rows: I) -> usize
    where
        I: IntoIterator<Item = &'a E>,
    {
        let matched = rows.into_iter().filter(|e| self.matches(e)).count();
        let after_skip = matched.saturating_sub(self.skip);
        self.take.map_or(after_skip, |t| after_skip.min(t))
    }
}

/// The page query and its unpaged count companion.
pub struct PreparedQuery<E> {
    pub page: Query<E>,
    pub count: Query<E>,
}

/// A compiled search request for entity type `E`.
pub struct Specification<E> {
    predicate: Option<Predicate>,
    ordering: Option<SortKey>,
    page: PageRequest,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Specification<E> {
    pub fn compile(request: &SearchRequest, aliases: &AliasMap) -> Result<Self, SpecError> {
        let shape = E::shape();
        let predicate = if request.filters.is_empty() {
            None
        } else {
            Some(compile_filter_set(
                shape,
                &request.filters,
                request.operator,
                aliases,
            )?)
        };
        let ordering = match &request.sort {
            Some(sort) if sort.is_requested() => Some(build_ordering(shape, sort, aliases)?),
            _ => None,
        };
        debug!(
            entity = shape.name,
            filtered = predicate.is_some(),
            sorted = ordering.is_some(),
            page = request.page.page,
            size = request.page.size,
            "compiled specification"
        );
        Ok(Self {
            predicate,
            ordering,
            page: request.page,
            _entity: PhantomData,
        })
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn apply(&self, source: Query<E>) -> PreparedQuery<E> {
        let mut query = source;
        if let Some(p) = &self.predicate {
            query = query.filter(p.clone());
        }
        let count = query.clone();
        if let Some(key) = &self.ordering {
            query = query.order_by(key.clone());
        }
        let page = query.skip(self.page.skip()).take(self.page.take());
        PreparedQuery { page, count }
    }
}

/// Compiles and applies in one step.
pub fn apply<E: Entity>(
    source: Query<E>,
    filters: FilterSet,
    operator: LogicalOperator,
    sort: Option<SortSpec>,
    page: PageRequest,
    aliases: &AliasMap,
) -> Result<PreparedQuery<E>, SpecError> {
    let request = SearchRequest {
        filters,
        operator,
        sort,
        page,
    };
    Ok(Specification::compile(&request, aliases)?.apply(source))
}
