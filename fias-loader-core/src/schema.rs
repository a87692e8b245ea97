//! Entity schema descriptors and the records that flow through a pipeline.
//!
//! An [`EntitySchema`] is static configuration: destination table, creation
//! DDL, the XML element to match and the ordered column mappings. Schemas
//! are `const`-constructible so the registry lives in read-only data and is
//! shared by reference between pipeline tasks.

use crate::coercion::{CoercionError, CoercionKind, TypedValue, coerce};
use std::collections::HashMap;

/// Maps one source attribute to one destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// XML attribute name on the matched element
    pub source_attribute: &'static str,
    /// Destination column name
    pub column: &'static str,
    /// Rule turning the attribute text into a column value
    pub coercion: CoercionKind,
}

impl FieldMapping {
    /// Declares a mapping.
    pub const fn new(
        source_attribute: &'static str,
        column: &'static str,
        coercion: CoercionKind,
    ) -> Self {
        Self {
            source_attribute,
            column,
            coercion,
        }
    }

    /// Whether the column accepts NULL; follows from the coercion kind.
    pub const fn nullable(&self) -> bool {
        self.coercion.is_optional()
    }
}

/// Immutable descriptor of one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Destination table, also the key used to locate the input file
    pub table_name: &'static str,
    /// Local name of the XML element holding one record
    pub element_name: &'static str,
    /// `CREATE TABLE` statement for the destination table
    pub ddl: &'static str,
    /// Column mappings in insert order
    pub fields: &'static [FieldMapping],
}

impl EntitySchema {
    /// Coerces a decoded element into a record aligned with `fields`.
    ///
    /// Attributes not declared in `fields` are ignored.
    ///
    /// # Errors
    /// Returns the first [`CoercionError`] in field order.
    pub fn coerce_record(&self, element: &RawElement) -> Result<TypedRecord, CoercionError> {
        self.fields
            .iter()
            .map(|field| {
                coerce(
                    field.source_attribute,
                    element.get(field.source_attribute),
                    field.coercion,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TypedRecord)
    }

    /// Comma separated destination columns in insert order.
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.column)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Attribute name to raw value for one matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawElement {
    attributes: HashMap<String, String>,
}

impl RawElement {
    /// Creates an element from decoded attributes.
    pub const fn new(attributes: HashMap<String, String>) -> Self {
        Self { attributes }
    }

    /// Raw value of an attribute, `None` when absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Number of attributes on the element.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True when the element carried no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawElement
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Typed values aligned with the schema's `fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedRecord(Vec<TypedValue>);

impl TypedRecord {
    /// Values in field order.
    pub fn values(&self) -> &[TypedValue] {
        &self.0
    }
}
