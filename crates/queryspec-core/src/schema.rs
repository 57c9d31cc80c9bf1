//! Registration-time entity shapes and dotted path resolution.
//!
//! Every searchable entity publishes a `'static` [`Shape`] listing its members, their scalar
//! types and any nested shapes. Paths are resolved against that descriptor only, so a name
//! that is not registered can never be reached.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal type of a resolvable field; selects the literal parser and the legal operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int,
    Long,
    Double,
    Date,
    DateTime,
    Bool,
    Text,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Long | ScalarType::Double)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ScalarType::Date | ScalarType::DateTime)
    }

    /// Types that support `Gt`/`Lt` style comparisons and `Between`.
    pub fn is_ordered(self) -> bool {
        self.is_numeric() || self.is_temporal()
    }

    pub fn is_text(self) -> bool {
        self == ScalarType::Text
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarType::Int => "integer",
            ScalarType::Long => "long",
            ScalarType::Double => "double",
            ScalarType::Date => "date",
            ScalarType::DateTime => "date-time",
            ScalarType::Bool => "boolean",
            ScalarType::Text => "text",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Scalar(ScalarType),
    Object(&'static Shape),
}

#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn scalar(name: &'static str, ty: ScalarType) -> Self {
        Self {
            name,
            ty: FieldType::Scalar(ty),
        }
    }

    pub const fn object(name: &'static str, shape: &'static Shape) -> Self {
        Self {
            name,
            ty: FieldType::Object(shape),
        }
    }
}

/// Declared members of an entity (or of a nested value inside one).
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl Shape {
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self { name, fields }
    }

    /// Case-insensitive member lookup.
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a dotted path such as `location.city`.
    ///
    /// Returns `None` when any segment is empty or unknown, or when the path tries to step
    /// through a scalar. Paths that stop on a nested object are not resolvable either; only
    /// scalar terminals can be filtered or sorted.
    pub fn resolve(&self, path: &str) -> Option<FieldLocation> {
        let mut shape = self;
        let mut segments = Vec::new();
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if part.is_empty() {
                return None;
            }
            let def = shape.field(part)?;
            segments.push(def.name);
            match def.ty {
                FieldType::Object(next) => shape = next,
                FieldType::Scalar(ty) => {
                    if parts.peek().is_some() {
                        return None;
                    }
                    return Some(FieldLocation {
                        path: FieldPath(segments),
                        ty,
                    });
                }
            }
        }
        None
    }
}

/// Canonical member names leading to a field, as registered on the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<&'static str>);

impl FieldPath {
    pub fn segments(&self) -> &[&'static str] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A resolved field: where it lives and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocation {
    pub path: FieldPath,
    pub ty: ScalarType,
}

/// Read access to registered members by canonical path.
///
/// Implementations match on the segments produced by [`Shape::resolve`] and return
/// [`Value::Null`] for anything they do not recognise.
pub trait Record {
    fn field_value(&self, path: &[&str]) -> Value;
}

/// A searchable, storable entity.
pub trait Entity: Record + Clone + Send + Sync + 'static {
    fn shape() -> &'static Shape;
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}
