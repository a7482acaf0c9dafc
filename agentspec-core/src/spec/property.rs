//! Declared property types.
//!
//! Documents declare properties as `{type: ..., properties: ...}`. They are
//! read into a closed set of variants so that every mapping over them (such as
//! the generated validator) is total.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A declared property type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProperty", into = "RawProperty")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    /// Nested object with its own named properties, in declaration order.
    Object(IndexMap<String, PropertyType>),
    /// Any type name not listed above. Accepts any value; the original name
    /// is kept so documents round-trip unchanged.
    Unknown(String),
}

/// Document shape of a property declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawProperty {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RawProperty>>,
}

impl From<RawProperty> for PropertyType {
    fn from(raw: RawProperty) -> Self {
        match (raw.kind.as_deref(), raw.properties) {
            (Some("string"), _) => PropertyType::String,
            (Some("number"), _) => PropertyType::Number,
            (Some("boolean"), _) => PropertyType::Boolean,
            (Some("object"), properties) | (None, properties @ Some(_)) => PropertyType::Object(
                properties
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(name, prop)| (name, PropertyType::from(prop)))
                    .collect(),
            ),
            (Some(other), _) => PropertyType::Unknown(other.to_string()),
            (None, None) => PropertyType::Unknown(String::new()),
        }
    }
}

impl From<PropertyType> for RawProperty {
    fn from(prop: PropertyType) -> Self {
        let (kind, properties) = match prop {
            PropertyType::String => (Some("string".to_string()), None),
            PropertyType::Number => (Some("number".to_string()), None),
            PropertyType::Boolean => (Some("boolean".to_string()), None),
            PropertyType::Object(fields) => (
                Some("object".to_string()),
                Some(
                    fields
                        .into_iter()
                        .map(|(name, field)| (name, RawProperty::from(field)))
                        .collect(),
                ),
            ),
            PropertyType::Unknown(name) if name.is_empty() => (None, None),
            PropertyType::Unknown(name) => (Some(name), None),
        };
        RawProperty { kind, properties }
    }
}

impl PropertyType {
    /// Build an object type from `(name, type)` pairs.
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, PropertyType)>,
        S: Into<String>,
    {
        PropertyType::Object(
            fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Fields of an object type, if this is one.
    pub fn fields(&self) -> Option<&IndexMap<String, PropertyType>> {
        match self {
            PropertyType::Object(fields) => Some(fields),
            _ => None,
        }
    }
}
