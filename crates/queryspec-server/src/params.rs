//! Query-string binding for the search endpoint.
//!
//! ```text
//! filters[<field>].operator=<op>&filters[<field>].value=<v>
//! filters[<field>].valueFrom=<a>&filters[<field>].valueTo=<b>
//! operator=<and|or>&sortby=<field>&direction=<asc|desc>&page=<n>&size=<n>
//! ```
//!
//! Keys are matched case-insensitively and unknown keys are ignored. Field names inside
//! `filters[...]` are passed through untouched; resolving them is the compiler's job.

use queryspec_core::{
    Filter, FilterOperator, LogicalOperator, PageRequest, ParseError, SearchRequest,
    SortDirection, SortSpec, SpecError,
};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error(transparent)]
    Operator(#[from] SpecError),
    #[error(transparent)]
    Unknown(#[from] ParseError),
    #[error("'{value}' is not a valid {key}")]
    NotANumber { key: &'static str, value: String },
    #[error("{key} must be at least 1")]
    TooSmall { key: &'static str },
    #[error("size must not exceed {max}")]
    TooLarge { max: u32 },
}

#[derive(Default)]
struct FilterParts {
    operator: Option<String>,
    value: Option<String>,
    value_from: Option<String>,
    value_to: Option<String>,
}

pub fn parse_search(pairs: &[(String, String)], max_size: u32) -> Result<SearchRequest, ParamError> {
    let mut parts: BTreeMap<String, FilterParts> = BTreeMap::new();
    let mut request = SearchRequest::default();
    let mut sort_field: Option<String> = None;
    let mut direction = SortDirection::default();

    for (key, value) in pairs {
        if let Some((field, prop)) = filter_key(key) {
            let prop = prop.to_ascii_lowercase();
            if !matches!(prop.as_str(), "operator" | "value" | "valuefrom" | "valueto") {
                continue;
            }
            let entry = parts.entry(field.to_string()).or_default();
            let slot = match prop.as_str() {
                "operator" => &mut entry.operator,
                "value" => &mut entry.value,
                "valuefrom" => &mut entry.value_from,
                _ => &mut entry.value_to,
            };
            *slot = Some(value.clone());
            continue;
        }
        match key.to_ascii_lowercase().as_str() {
            "operator" => request.operator = value.parse::<LogicalOperator>()?,
            "sortby" => sort_field = Some(value.clone()),
            "direction" => direction = value.parse()?,
            "page" => request.page.page = number("page", value)?,
            "size" => request.page.size = number("size", value)?,
            _ => {}
        }
    }

    for (field, p) in parts {
        // An absent operator binds to the enum's first member.
        let operator = match p.operator.as_deref() {
            Some(op) => op.parse::<FilterOperator>()?,
            None => FilterOperator::Eq,
        };
        request.filters.insert(
            field,
            Filter {
                operator,
                value: p.value,
                value_from: p.value_from,
                value_to: p.value_to,
            },
        );
    }

    if let Some(field) = sort_field {
        request.sort = Some(SortSpec { field, direction });
    }
    validate_page(request.page, max_size)?;
    Ok(request)
}

/// `filters[temp].value` -> `("temp", "value")`
fn filter_key(key: &str) -> Option<(&str, &str)> {
    let head = key.get(..8)?;
    if !head.eq_ignore_ascii_case("filters[") {
        return None;
    }
    let rest = &key[8..];
    let close = rest.find("].")?;
    let field = &rest[..close];
    if field.is_empty() {
        return None;
    }
    Some((field, &rest[close + 2..]))
}

fn number(key: &'static str, raw: &str) -> Result<u32, ParamError> {
    raw.trim().parse().map_err(|_| ParamError::NotANumber {
        key,
        value: raw.to_string(),
    })
}

fn validate_page(page: PageRequest, max_size: u32) -> Result<(), ParamError> {
    if page.page < 1 {
        return Err(ParamError::TooSmall { key: "page" });
    }
    if page.size < 1 {
        return Err(ParamError::TooSmall { key: "size" });
    }
    if page.size > max_size {
        return Err(ParamError::TooLarge { max: max_size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(q: &[(&str, &str)]) -> Vec<(String, String)> {
        q.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_full_query_string() {
        let req = parse_search(
            &pairs(&[
                ("operator", "or"),
                ("page", "1"),
                ("size", "15"),
                ("sortby", "temp"),
                ("direction", "asc"),
                ("filters[summary].operator", "eq"),
                ("filters[summary].value", "balmy"),
                ("filters[temp].operator", "Gt"),
                ("filters[temp].value", "2"),
            ]),
            100,
        )
        .unwrap();
        assert_eq!(req.operator, LogicalOperator::Or);
        assert_eq!(req.page, PageRequest::new(1, 15));
        assert_eq!(req.sort, Some(SortSpec::asc("temp")));
        assert_eq!(req.filters["summary"], Filter::eq("balmy"));
        assert_eq!(req.filters["temp"], Filter::gt("2"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let req = parse_search(
            &pairs(&[
                ("SortBy", "date"),
                ("DIRECTION", "Desc"),
                ("Filters[temp].Operator", "between"),
                ("filters[temp].VALUEFROM", "0"),
                ("filters[temp].valueTo", "25"),
            ]),
            100,
        )
        .unwrap();
        let sort = req.sort.unwrap();
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(req.filters["temp"], Filter::between("0", "25"));
    }

    #[test]
    fn test_defaults_and_unknown_keys() {
        let req = parse_search(
            &pairs(&[
                ("utm_source", "x"),
                ("filters[summary].color", "red"),
                ("filters[temp].value", "3"),
            ]),
            100,
        )
        .unwrap();
        assert_eq!(req.page, PageRequest::default());
        assert!(req.sort.is_none());
        assert!(!req.filters.contains_key("summary"));
        assert_eq!(req.filters["temp"], Filter::eq("3"));
    }

    #[test]
    fn test_bad_tokens_are_rejected() {
        let bad_op = parse_search(&pairs(&[("filters[temp].operator", "like")]), 100);
        assert!(matches!(
            bad_op,
            Err(ParamError::Operator(SpecError::UnsupportedOperator { .. }))
        ));
        assert!(matches!(
            parse_search(&pairs(&[("operator", "xor")]), 100),
            Err(ParamError::Unknown(_))
        ));
        assert!(matches!(
            parse_search(&pairs(&[("direction", "up")]), 100),
            Err(ParamError::Unknown(_))
        ));
        assert!(matches!(
            parse_search(&pairs(&[("page", "two")]), 100),
            Err(ParamError::NotANumber { key: "page", .. })
        ));
    }

    #[test]
    fn test_page_bounds() {
        for (page, size) in [("0", "10"), ("1", "0"), ("1", "101"), ("-1", "10")] {
            let res = parse_search(&pairs(&[("page", page), ("size", size)]), 100);
            assert!(res.is_err(), "page={page} size={size}");
        }
        assert!(parse_search(&pairs(&[("page", "9"), ("size", "100")]), 100).is_ok());
    }

    #[test]
    fn test_filter_key_shapes() {
        assert_eq!(filter_key("filters[location.city].value"), Some(("location.city", "value")));
        assert_eq!(filter_key("filters[].value"), None);
        assert_eq!(filter_key("filters[temp]"), None);
        assert_eq!(filter_key("filter"), None);
    }
}
