pub mod alias;
pub mod errors;
pub mod filter;
pub mod model;
pub mod paged;
pub mod pipeline;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod sort;
pub mod value;

pub use alias::AliasMap;
pub use errors::*;
pub use model::*;
pub use paged::PagedResult;
pub use pipeline::{PreparedQuery, Query, Specification};
pub use predicate::{CompareOp, Predicate};
pub use query::*;
pub use schema::{Entity, FieldLocation, FieldPath, Record, ScalarType, Shape};
pub use sort::SortKey;
pub use value::Value;
