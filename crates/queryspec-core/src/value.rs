//! Scalar values read from entities and parsed from filter literals.

use crate::schema::ScalarType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl Value {
    /// Strictly parses a literal into the given type. Surrounding whitespace is ignored for
    /// everything except text, which is taken verbatim.
    pub fn parse(ty: ScalarType, raw: &str) -> Option<Value> {
        let t = raw.trim();
        match ty {
            ScalarType::Int => t.parse().ok().map(Value::Int),
            ScalarType::Long => t.parse().ok().map(Value::Long),
            ScalarType::Double => t
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Double),
            ScalarType::Date => parse_date(t).map(Value::Date),
            ScalarType::DateTime => parse_datetime(t).map(Value::DateTime),
            ScalarType::Bool => {
                if t.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if t.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ScalarType::Text => Some(Value::Text(raw.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Comparison used by predicates. Numbers of different widths are compared by value;
    /// anything involving null, or two unrelated types, is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Long(b)) => Some(i64::from(*a).cmp(b)),
            (Value::Long(a), Value::Int(b)) => Some(a.cmp(&i64::from(*b))),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Total order used for sorting: nulls first, then by type rank, then by value.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            _ => match self.compare(other) {
                Some(ord) => ord,
                None => self.rank().cmp(&other.rank()),
            },
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Long(_) | Value::Double(_) => 2,
            Value::Date(_) => 3,
            Value::DateTime(_) => 4,
            Value::Text(_) => 5,
        }
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map(Value::Text).unwrap_or(Value::Null)
    }
}

fn parse_date(t: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(t).ok().map(|d| d.date_naive()))
}

fn parse_datetime(t: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(t) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S") {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_strictly() {
        assert_eq!(Value::parse(ScalarType::Int, " 20 "), Some(Value::Int(20)));
        assert_eq!(Value::parse(ScalarType::Int, "20.5"), None);
        assert_eq!(Value::parse(ScalarType::Int, "3000000000"), None);
        assert_eq!(
            Value::parse(ScalarType::Long, "3000000000"),
            Some(Value::Long(3_000_000_000))
        );
        assert_eq!(Value::parse(ScalarType::Double, "1.5"), Some(Value::Double(1.5)));
        assert_eq!(Value::parse(ScalarType::Double, "NaN"), None);
        assert_eq!(Value::parse(ScalarType::Int, "warm"), None);
    }

    #[test]
    fn test_parse_bool_case_insensitive() {
        assert_eq!(Value::parse(ScalarType::Bool, "TRUE"), Some(Value::Bool(true)));
        assert_eq!(Value::parse(ScalarType::Bool, "false"), Some(Value::Bool(false)));
        assert_eq!(Value::parse(ScalarType::Bool, "yes"), None);
    }

    #[test]
    fn test_parse_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Value::parse(ScalarType::Date, "2024-03-01"), Some(Value::Date(d)));
        assert_eq!(
            Value::parse(ScalarType::Date, "2024-03-01T10:00:00Z"),
            Some(Value::Date(d))
        );
        assert_eq!(Value::parse(ScalarType::Date, "01/03/2024"), None);

        let midnight = d.and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(
            Value::parse(ScalarType::DateTime, "2024-03-01"),
            Some(Value::DateTime(midnight))
        );
        let ten = d.and_hms_opt(10, 0, 0).unwrap().and_utc();
        assert_eq!(
            Value::parse(ScalarType::DateTime, "2024-03-01T12:00:00+02:00"),
            Some(Value::DateTime(ten))
        );
        assert_eq!(
            Value::parse(ScalarType::DateTime, "2024-03-01T10:00:00"),
            Some(Value::DateTime(ten))
        );
    }

    #[test]
    fn test_text_is_verbatim() {
        assert_eq!(
            Value::parse(ScalarType::Text, " Balmy "),
            Some(Value::Text(" Balmy ".into()))
        );
    }

    #[test]
    fn test_compare_widens_numbers() {
        assert_eq!(Value::Int(3).compare(&Value::Long(3)), Some(Ordering::Equal));
        assert_eq!(Value::Int(3).compare(&Value::Double(2.5)), Some(Ordering::Greater));
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
        assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_sort_cmp_puts_nulls_first() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Null,
            Value::Text("a".into()),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![Value::Null, Value::Text("a".into()), Value::Text("b".into())]
        );
    }
}
