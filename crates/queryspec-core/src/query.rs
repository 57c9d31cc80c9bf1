use crate::errors::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of filter operators accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum FilterOperator {
    Eq,
    Ne,
    Contains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Between => "between",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [FilterOperator; 10] = [
            FilterOperator::Eq,
            FilterOperator::Ne,
            FilterOperator::Contains,
            FilterOperator::StartsWith,
            FilterOperator::EndsWith,
            FilterOperator::Gt,
            FilterOperator::Gte,
            FilterOperator::Lt,
            FilterOperator::Lte,
            FilterOperator::Between,
        ];
        let s = s.trim();
        ALL.into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpecError::UnsupportedOperator {
                operator: s.to_string(),
            })
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = SpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One field's condition. `Between` uses the range bounds, every other operator `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_from: Option<String>,
    #[serde(default)]
    pub value_to: Option<String>,
}

impl Filter {
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: Some(value.into()),
            value_from: None,
            value_to: None,
        }
    }

    pub fn between(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            operator: FilterOperator::Between,
            value: None,
            value_from: Some(from.into()),
            value_to: Some(to.into()),
        }
    }

    pub fn eq(value: impl Into<String>) -> Self {
        Self::new(FilterOperator::Eq, value)
    }

    pub fn gt(value: impl Into<String>) -> Self {
        Self::new(FilterOperator::Gt, value)
    }
}

/// Caller-facing field name -> filter. Sorted so compilation order is stable.
pub type FilterSet = BTreeMap<String, Filter>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl FromStr for LogicalOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(LogicalOperator::And),
            "or" => Ok(LogicalOperator::Or),
            _ => Err(ParseError {
                kind: "logical operator",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ParseError {
                kind: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// A blank field means the caller did not ask for an ordering.
    pub fn is_requested(&self) -> bool {
        !self.field.trim().is_empty()
    }
}

/// 1-based page window. Both numbers are expected to be at least 1; validating that is the
/// caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn skip(&self) -> usize {
        self.page.saturating_sub(1) as usize * self.size as usize
    }

    pub fn take(&self) -> usize {
        self.size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Everything a caller can ask of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub filters: FilterSet,
    pub operator: LogicalOperator,
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

impl SearchRequest {
    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(field.into(), filter);
        self
    }

    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = PageRequest::new(page, size);
        self
    }
}
