//! Boolean predicate trees over entities.
//!
//! A [`Predicate`] is plain data: stores either translate it into their native query form or,
//! like the in-memory store, evaluate it row by row with [`Predicate::evaluate`].

use crate::query::LogicalOperator;
use crate::schema::{FieldPath, Record};
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: FieldPath,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    Compare(Comparison),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(field: FieldPath, op: CompareOp, value: Value) -> Self {
        Predicate::Compare(Comparison { field, op, value })
    }

    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    pub fn evaluate<R: Record>(&self, record: &R) -> bool {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Compare(c) => c.evaluate(record),
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(record)),
            Predicate::Not(inner) => !inner.evaluate(record),
        }
    }

    /// Conjunction with another predicate, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }
}

impl Comparison {
    fn evaluate<R: Record>(&self, record: &R) -> bool {
        let actual = record.field_value(self.field.segments());
        if actual.is_null() {
            return false;
        }
        match self.op {
            CompareOp::Eq => match (actual.as_text(), self.value.as_text()) {
                (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => actual.compare(&self.value) == Some(Ordering::Equal),
            },
            CompareOp::Gt => actual.compare(&self.value) == Some(Ordering::Greater),
            CompareOp::Gte => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Lt => actual.compare(&self.value) == Some(Ordering::Less),
            CompareOp::Lte => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Contains => text_op(&actual, &self.value, |a, b| a.contains(b)),
            CompareOp::StartsWith => text_op(&actual, &self.value, |a, b| a.starts_with(b)),
            CompareOp::EndsWith => text_op(&actual, &self.value, |a, b| a.ends_with(b)),
        }
    }
}

/// Text matching ignores case on both sides.
fn text_op(actual: &Value, expected: &Value, f: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_text(), expected.as_text()) {
        (Some(a), Some(b)) => f(&a.to_lowercase(), &b.to_lowercase()),
        _ => false,
    }
}

/// Merges single-field predicates under one request-wide mode.
///
/// `And` of nothing matches everything; `Or` of nothing matches nothing, because the
/// disjunction is folded from a `False` identity.
pub fn combine(predicates: Vec<Predicate>, mode: LogicalOperator) -> Predicate {
    match mode {
        LogicalOperator::And => {
            if predicates.is_empty() {
                Predicate::True
            } else {
                Predicate::And(predicates)
            }
        }
        LogicalOperator::Or => {
            let mut parts = Vec::with_capacity(predicates.len() + 1);
            parts.push(Predicate::False);
            parts.extend(predicates);
            Predicate::Or(parts)
        }
    }
}
