//! Single-key ordering over a registered entity shape.
//!
//! Only one key is supported. Entities whose keys compare equal have no defined relative
//! order; callers that need a stable page sequence must sort by a unique field.

use crate::alias::AliasMap;
use crate::errors::SpecError;
use crate::query::{SortDirection, SortSpec};
use crate::schema::{FieldPath, Record, ScalarType, Shape};
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: FieldPath,
    pub ty: ScalarType,
    pub direction: SortDirection,
}

impl SortKey {
    /// The field's value, erased to the common comparable representation.
    pub fn extract<R: Record>(&self, record: &R) -> Value {
        record.field_value(self.field.segments())
    }

    pub fn compare<R: Record>(&self, a: &R, b: &R) -> Ordering {
        let ord = self.extract(a).sort_cmp(&self.extract(b));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

pub fn build_ordering(
    shape: &'static Shape,
    sort: &SortSpec,
    aliases: &AliasMap,
) -> Result<SortKey, SpecError> {
    let path = aliases.resolve(sort.field.trim());
    let loc = shape
        .resolve(path)
        .ok_or_else(|| SpecError::UnsupportedSortField {
            field: sort.field.clone(),
        })?;
    Ok(SortKey {
        field: loc.path,
        ty: loc.ty,
        direction: sort.direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    static SHAPE: Shape = Shape::new("Row", &[FieldDef::scalar("age", ScalarType::Int)]);

    struct Row(i32);

    impl Record for Row {
        fn field_value(&self, path: &[&str]) -> Value {
            match path {
                ["age"] => Value::Int(self.0),
                _ => Value::Null,
            }
        }
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let key = build_ordering(&SHAPE, &SortSpec::asc("age"), &AliasMap::new()).unwrap();
        let mut rows = vec![Row(30), Row(20), Row(25)];
        rows.sort_by(|a, b| key.compare(a, b));
        assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), vec![20, 25, 30]);

        let key = build_ordering(&SHAPE, &SortSpec::desc("AGE"), &AliasMap::new()).unwrap();
        rows.sort_by(|a, b| key.compare(a, b));
        assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), vec![30, 25, 20]);
    }

    #[test]
    fn test_unknown_sort_field() {
        let err = build_ordering(&SHAPE, &SortSpec::asc("height"), &AliasMap::new()).unwrap_err();
        assert_eq!(
            err,
            SpecError::UnsupportedSortField {
                field: "height".into()
            }
        );
    }

    #[test]
    fn test_sort_through_alias() {
        let aliases = AliasMap::new().with("years", "age");
        let key = build_ordering(&SHAPE, &SortSpec::asc("years"), &aliases).unwrap();
        assert_eq!(key.field.to_string(), "age");
        assert_eq!(key.ty, ScalarType::Int);
    }
}
