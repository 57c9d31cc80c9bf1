//! Compiles caller filters into predicates over a registered entity shape.

use crate::alias::AliasMap;
use crate::errors::SpecError;
use crate::predicate::{combine, CompareOp, Predicate};
use crate::query::{Filter, FilterOperator, FilterSet, LogicalOperator};
use crate::schema::{FieldLocation, ScalarType, Shape};
use crate::value::Value;
use tracing::debug;

/// Builds the single-field predicate for `field` on `shape`.
///
/// `field` is the caller-facing name; it is looked up in `aliases` before resolution.
pub fn compile_filter(
    shape: &'static Shape,
    field: &str,
    filter: &Filter,
    aliases: &AliasMap,
) -> Result<Predicate, SpecError> {
    let path = aliases.resolve(field);
    let loc = shape
        .resolve(path)
        .ok_or_else(|| SpecError::UnsupportedFilterField {
            field: field.to_string(),
        })?;

    let op = match filter.operator {
        FilterOperator::Between => return compile_between(field, filter, &loc),
        FilterOperator::Eq | FilterOperator::Ne => CompareOp::Eq,
        FilterOperator::Contains => CompareOp::Contains,
        FilterOperator::StartsWith => CompareOp::StartsWith,
        FilterOperator::EndsWith => CompareOp::EndsWith,
        FilterOperator::Gt => CompareOp::Gt,
        FilterOperator::Gte => CompareOp::Gte,
        FilterOperator::Lt => CompareOp::Lt,
        FilterOperator::Lte => CompareOp::Lte,
    };

    let raw = filter
        .value
        .as_deref()
        .ok_or_else(|| SpecError::MissingFilterValue {
            field: field.to_string(),
            operator: filter.operator.to_string(),
        })?;
    let value = coerce(field, raw, loc.ty)?;

    let legal = match op {
        CompareOp::Eq => true,
        CompareOp::Contains | CompareOp::StartsWith | CompareOp::EndsWith => loc.ty.is_text(),
        CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => loc.ty.is_ordered(),
    };
    if !legal {
        return Err(unsupported_for_type(field, filter.operator, loc.ty));
    }

    let predicate = Predicate::compare(loc.path, op, value);
    Ok(if filter.operator == FilterOperator::Ne {
        Predicate::not(predicate)
    } else {
        predicate
    })
}

fn compile_between(
    field: &str,
    filter: &Filter,
    loc: &FieldLocation,
) -> Result<Predicate, SpecError> {
    let (from, to) = match (filter.value_from.as_deref(), filter.value_to.as_deref()) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(SpecError::MissingRangeValue {
                field: field.to_string(),
            })
        }
    };
    if !loc.ty.is_ordered() {
        return Err(unsupported_for_type(field, FilterOperator::Between, loc.ty));
    }
    let from = coerce(field, from, loc.ty)?;
    let to = coerce(field, to, loc.ty)?;
    Ok(Predicate::And(vec![
        Predicate::compare(loc.path.clone(), CompareOp::Gte, from),
        Predicate::compare(loc.path.clone(), CompareOp::Lte, to),
    ]))
}

fn coerce(field: &str, raw: &str, ty: ScalarType) -> Result<Value, SpecError> {
    Value::parse(ty, raw).ok_or_else(|| SpecError::InvalidFilterValue {
        field: field.to_string(),
        value: raw.to_string(),
        expected: ty,
    })
}

fn unsupported_for_type(field: &str, op: FilterOperator, ty: ScalarType) -> SpecError {
    SpecError::UnsupportedOperatorForType {
        field: field.to_string(),
        operator: op.to_string(),
        ty,
    }
}

/// Compiles every entry of `filters` and merges them under `mode`.
///
/// All entries are compiled before anything is combined, so a bad filter is reported even
/// when an earlier one would already decide the outcome. The first failure in key order wins.
pub fn compile_filter_set(
    shape: &'static Shape,
    filters: &FilterSet,
    mode: LogicalOperator,
    aliases: &AliasMap,
) -> Result<Predicate, SpecError> {
    let compiled: Vec<Result<Predicate, SpecError>> = filters
        .iter()
        .map(|(field, filter)| compile_filter(shape, field, filter, aliases))
        .collect();
    let predicates = compiled.into_iter().collect::<Result<Vec<_>, _>>()?;
    debug!(
        entity = shape.name,
        filters = predicates.len(),
        ?mode,
        "compiled filter set"
    );
    Ok(combine(predicates, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Record};

    static SHAPE: Shape = Shape::new(
        "Sample",
        &[
            FieldDef::scalar("count", ScalarType::Int),
            FieldDef::scalar("flag", ScalarType::Bool),
            FieldDef::scalar("name", ScalarType::Text),
        ],
    );

    struct Sample {
        count: i32,
        flag: bool,
        name: &'static str,
    }

    impl Record for Sample {
        fn field_value(&self, path: &[&str]) -> Value {
            match path {
                ["count"] => Value::Int(self.count),
                ["flag"] => Value::Bool(self.flag),
                ["name"] => Value::Text(self.name.to_string()),
                _ => Value::Null,
            }
        }
    }

    fn compile(field: &str, filter: Filter) -> Result<Predicate, SpecError> {
        compile_filter(&SHAPE, field, &filter, &AliasMap::new())
    }

    #[test]
    fn test_unknown_field() {
        let err = compile("nonexistent", Filter::eq("1")).unwrap_err();
        assert_eq!(
            err,
            SpecError::UnsupportedFilterField {
                field: "nonexistent".into()
            }
        );
    }

    #[test]
    fn test_missing_value() {
        let filter = Filter {
            operator: FilterOperator::Gt,
            value: None,
            value_from: None,
            value_to: None,
        };
        assert!(matches!(
            compile("count", filter),
            Err(SpecError::MissingFilterValue { .. })
        ));
    }

    #[test]
    fn test_between_requires_both_bounds() {
        let mut filter = Filter::between("1", "2");
        filter.value_to = None;
        assert!(matches!(
            compile("count", filter),
            Err(SpecError::MissingRangeValue { .. })
        ));
    }

    #[test]
    fn test_invalid_literal() {
        let err = compile("count", Filter::gt("twenty")).unwrap_err();
        assert_eq!(
            err,
            SpecError::InvalidFilterValue {
                field: "count".into(),
                value: "twenty".into(),
                expected: ScalarType::Int,
            }
        );
    }

    #[test]
    fn test_operator_type_mismatches() {
        let text_on_number = compile("count", Filter::new(FilterOperator::Contains, "1"));
        let order_on_text = compile("name", Filter::gt("a"));
        let order_on_bool = compile("flag", Filter::new(FilterOperator::Lt, "true"));
        let between_on_text = compile("name", Filter::between("a", "b"));
        for result in [text_on_number, order_on_text, order_on_bool, between_on_text] {
            assert!(matches!(
                result,
                Err(SpecError::UnsupportedOperatorForType { .. })
            ));
        }
    }

    #[test]
    fn test_ne_negates_eq() {
        let p = compile("name", Filter::new(FilterOperator::Ne, "a")).unwrap();
        assert!(matches!(p, Predicate::Not(_)));
        let sample = Sample {
            count: 1,
            flag: true,
            name: "b",
        };
        assert!(p.evaluate(&sample));
    }

    #[test]
    fn test_bool_equality() {
        let p = compile("flag", Filter::eq("False")).unwrap();
        let on = Sample {
            count: 0,
            flag: true,
            name: "",
        };
        let off = Sample {
            count: 0,
            flag: false,
            name: "",
        };
        assert!(!p.evaluate(&on));
        assert!(p.evaluate(&off));
    }

    #[test]
    fn test_filter_set_reports_every_entry() {
        let filters: FilterSet = [
            ("count".to_string(), Filter::gt("1")),
            ("missing".to_string(), Filter::eq("x")),
        ]
        .into_iter()
        .collect();
        let err = compile_filter_set(&SHAPE, &filters, LogicalOperator::Or, &AliasMap::new())
            .unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedFilterField { .. }));
    }

    #[test]
    fn test_alias_is_applied_before_resolution() {
        let aliases = AliasMap::new().with("n", "count");
        let p = compile_filter(&SHAPE, "N", &Filter::eq("3"), &aliases).unwrap();
        let sample = Sample {
            count: 3,
            flag: false,
            name: "",
        };
        assert!(p.evaluate(&sample));
    }
}
