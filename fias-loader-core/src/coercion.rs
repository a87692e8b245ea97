//! Conversion of raw XML attribute strings into typed column values.
//!
//! The source export encodes everything as attribute text. Each destination
//! column declares a [`CoercionKind`]; [`coerce`] turns the attribute value
//! (or its absence) into a [`TypedValue`] ready to be bound as a statement
//! parameter.
//!
//! # Absence
//! Optional kinds map a missing attribute to an explicit absent value
//! (`None` inside the matching variant). Required kinds fail with
//! [`CoercionError`]. For optional non-text kinds an empty attribute is
//! treated as absent as well; optional text keeps the empty string.
//!
//! # Formats
//! - integers: base-10 `i64`, no surrounding whitespace
//! - booleans: the flags `1` and `0` only
//! - dates: `YYYY-MM-DD` only
//! - GUIDs: hyphenated UUIDs

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// The single date layout used by the export.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coercion rule attached to one destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CoercionKind {
    /// Required signed integer
    Integer,
    /// Integer, NULL when the attribute is absent or empty
    OptionalInteger,
    /// Required string, taken verbatim
    Text,
    /// String, NULL when the attribute is absent
    OptionalText,
    /// `1` / `0` flag
    Boolean,
    /// Calendar date in [`DATE_FORMAT`]
    Date,
    /// Date, NULL when the attribute is absent or empty
    OptionalDate,
    /// Required hyphenated UUID
    Uuid,
    /// UUID, NULL when the attribute is absent or empty
    OptionalUuid,
}

impl CoercionKind {
    /// Whether absence of the attribute is allowed.
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::OptionalInteger | Self::OptionalText | Self::OptionalDate | Self::OptionalUuid
        )
    }

    /// Lowercase name used in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::OptionalInteger => "optional integer",
            Self::Text => "text",
            Self::OptionalText => "optional text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::OptionalDate => "optional date",
            Self::Uuid => "uuid",
            Self::OptionalUuid => "optional uuid",
        }
    }
}

impl fmt::Display for CoercionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed scalar produced by coercion.
///
/// Optional kinds keep their own variant so that an absent value still
/// carries its column type when bound as a NULL parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// Value of [`CoercionKind::Integer`]
    Integer(i64),
    /// Value of [`CoercionKind::OptionalInteger`]
    OptionalInteger(Option<i64>),
    /// Value of [`CoercionKind::Text`]
    Text(String),
    /// Value of [`CoercionKind::OptionalText`]
    OptionalText(Option<String>),
    /// Value of [`CoercionKind::Boolean`]
    Boolean(bool),
    /// Value of [`CoercionKind::Date`]
    Date(NaiveDate),
    /// Value of [`CoercionKind::OptionalDate`]
    OptionalDate(Option<NaiveDate>),
    /// Value of [`CoercionKind::Uuid`]
    Uuid(Uuid),
    /// Value of [`CoercionKind::OptionalUuid`]
    OptionalUuid(Option<Uuid>),
}

impl TypedValue {
    /// True for an absent optional value.
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::OptionalInteger(None)
                | Self::OptionalText(None)
                | Self::OptionalDate(None)
                | Self::OptionalUuid(None)
        )
    }
}

/// Why a value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercionFailure {
    /// Required attribute not present on the element
    Missing,
    /// Attribute present but outside the kind's grammar
    Invalid(String),
}

/// Failure to coerce one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' as {kind}: {}", describe(.raw.as_deref(), .failure))]
pub struct CoercionError {
    /// Source attribute name
    pub field: String,
    /// Raw attribute text, `None` when absent
    pub raw: Option<String>,
    /// Rule that was applied
    pub kind: CoercionKind,
    /// What went wrong
    pub failure: CoercionFailure,
}

fn describe(raw: Option<&str>, failure: &CoercionFailure) -> String {
    match (failure, raw) {
        (CoercionFailure::Missing, _) => "required attribute is missing".to_string(),
        (CoercionFailure::Invalid(reason), Some(raw)) => format!("invalid value {raw:?} ({reason})"),
        (CoercionFailure::Invalid(reason), None) => reason.clone(),
    }
}

impl CoercionError {
    /// Required attribute absent.
    pub fn missing(field: &str, kind: CoercionKind) -> Self {
        Self {
            field: field.to_string(),
            raw: None,
            kind,
            failure: CoercionFailure::Missing,
        }
    }

    fn invalid(field: &str, raw: &str, kind: CoercionKind, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            raw: Some(raw.to_string()),
            kind,
            failure: CoercionFailure::Invalid(reason.into()),
        }
    }
}

/// Coerces a raw attribute value under `kind`.
///
/// # Errors
/// Returns [`CoercionError`] when a required attribute is absent or when a
/// present value does not match the kind's grammar.
///
/// # Example
/// ```rust
/// use fias_loader_core::coercion::{CoercionKind, TypedValue, coerce};
///
/// let value = coerce("AOLEVEL", Some("7"), CoercionKind::Integer).unwrap();
/// assert_eq!(value, TypedValue::Integer(7));
///
/// let value = coerce("OKATO", None, CoercionKind::OptionalText).unwrap();
/// assert_eq!(value, TypedValue::OptionalText(None));
/// ```
pub fn coerce(
    field: &str,
    raw: Option<&str>,
    kind: CoercionKind,
) -> Result<TypedValue, CoercionError> {
    let Some(raw) = raw else {
        return absent(field, kind);
    };

    match kind {
        CoercionKind::Integer => parse_integer(field, raw, kind).map(TypedValue::Integer),
        CoercionKind::Text => Ok(TypedValue::Text(raw.to_string())),
        CoercionKind::OptionalText => Ok(TypedValue::OptionalText(Some(raw.to_string()))),
        CoercionKind::Boolean => parse_flag(field, raw).map(TypedValue::Boolean),
        CoercionKind::Date => parse_date(field, raw, kind).map(TypedValue::Date),
        CoercionKind::Uuid => parse_uuid(field, raw, kind).map(TypedValue::Uuid),
        CoercionKind::OptionalInteger if raw.is_empty() => Ok(TypedValue::OptionalInteger(None)),
        CoercionKind::OptionalInteger => {
            parse_integer(field, raw, kind).map(|v| TypedValue::OptionalInteger(Some(v)))
        }
        CoercionKind::OptionalDate if raw.is_empty() => Ok(TypedValue::OptionalDate(None)),
        CoercionKind::OptionalDate => {
            parse_date(field, raw, kind).map(|v| TypedValue::OptionalDate(Some(v)))
        }
        CoercionKind::OptionalUuid if raw.is_empty() => Ok(TypedValue::OptionalUuid(None)),
        CoercionKind::OptionalUuid => {
            parse_uuid(field, raw, kind).map(|v| TypedValue::OptionalUuid(Some(v)))
        }
    }
}

fn absent(field: &str, kind: CoercionKind) -> Result<TypedValue, CoercionError> {
    match kind {
        CoercionKind::OptionalInteger => Ok(TypedValue::OptionalInteger(None)),
        CoercionKind::OptionalText => Ok(TypedValue::OptionalText(None)),
        CoercionKind::OptionalDate => Ok(TypedValue::OptionalDate(None)),
        CoercionKind::OptionalUuid => Ok(TypedValue::OptionalUuid(None)),
        CoercionKind::Integer
        | CoercionKind::Text
        | CoercionKind::Boolean
        | CoercionKind::Date
        | CoercionKind::Uuid => Err(CoercionError::missing(field, kind)),
    }
}

fn parse_integer(field: &str, raw: &str, kind: CoercionKind) -> Result<i64, CoercionError> {
    raw.parse::<i64>()
        .map_err(|e| CoercionError::invalid(field, raw, kind, e.to_string()))
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, CoercionError> {
    match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(CoercionError::invalid(
            field,
            raw,
            CoercionKind::Boolean,
            "expected 1 or 0",
        )),
    }
}

fn parse_date(field: &str, raw: &str, kind: CoercionKind) -> Result<NaiveDate, CoercionError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| CoercionError::invalid(field, raw, kind, format!("expected YYYY-MM-DD, {e}")))
}

fn parse_uuid(field: &str, raw: &str, kind: CoercionKind) -> Result<Uuid, CoercionError> {
    Uuid::parse_str(raw).map_err(|e| CoercionError::invalid(field, raw, kind, e.to_string()))
}
