//! The `Entity` trait and the untyped record form entities travel in.
//!
//! Adapters never see concrete domain types: they move `Record`s keyed by
//! declared property names, and use the entity's `EntityType` to find the
//! physical column for each property.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainError;
use crate::schema::{ColumnType, EntityType};

/// Declared name of the surrogate key property shared by every entity.
pub const ID: &str = "Id";

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Property values of one entity, keyed by declared property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entity: &'static str,
    values: BTreeMap<&'static str, Value>,
}

impl Record {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, property: &'static str, value: impl Into<Value>) -> Self {
        self.values.insert(property, value.into());
        self
    }

    pub fn set(&mut self, property: &'static str, value: impl Into<Value>) {
        self.values.insert(property, value.into());
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Returns the value of a property; absent properties read as `Null`.
    pub fn get(&self, property: &str) -> &Value {
        self.values.get(property).unwrap_or(&Value::Null)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn id(&self) -> Option<i64> {
        match self.get(ID) {
            Value::Integer(id) => Some(*id),
            _ => None,
        }
    }

    pub fn integer(&self, property: &'static str) -> Result<i64, DomainError> {
        match self.get(property) {
            Value::Integer(v) => Ok(*v),
            other => Err(self.mismatch(property, "an integer", other)),
        }
    }

    pub fn real(&self, property: &'static str) -> Result<f64, DomainError> {
        match self.get(property) {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            other => Err(self.mismatch(property, "a real number", other)),
        }
    }

    pub fn text(&self, property: &'static str) -> Result<String, DomainError> {
        match self.get(property) {
            Value::Text(v) => Ok(v.clone()),
            other => Err(self.mismatch(property, "text", other)),
        }
    }

    pub fn optional_text(&self, property: &'static str) -> Result<Option<String>, DomainError> {
        match self.get(property) {
            Value::Null => Ok(None),
            _ => self.text(property).map(Some),
        }
    }

    pub fn timestamp(&self, property: &'static str) -> Result<DateTime<Utc>, DomainError> {
        match self.get(property) {
            Value::Timestamp(v) => Ok(*v),
            Value::Text(v) => DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DomainError::InvalidRecord {
                    entity: self.entity,
                    reason: format!("{}: {}", property, e),
                }),
            other => Err(self.mismatch(property, "a timestamp", other)),
        }
    }

    fn mismatch(&self, property: &str, expected: &str, got: &Value) -> DomainError {
        DomainError::InvalidRecord {
            entity: self.entity,
            reason: format!("{} should be {}, got {:?}", property, expected, got),
        }
    }
}

/// A persisted domain type.
///
/// Every entity has a surrogate integer key (`Id`) assigned by the store on
/// insert. Implementations describe their table once in `entity_type` and
/// project themselves to and from a `Record`.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Declared (Pascal case) entity name, e.g. `PaymentMethod`.
    const NAME: &'static str;

    /// Lowercase label used in result messages, e.g. `payment method`.
    const LABEL: &'static str;

    /// The declared schema descriptor, before any naming convention runs.
    fn entity_type() -> EntityType;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self, DomainError>;

    /// Copies the updatable fields of `patch` onto `self`.
    ///
    /// Only an explicit whitelist is copied; every other field, the id
    /// included, keeps its persisted value.
    fn apply_patch(&mut self, patch: &Self);

    /// Rows inserted with fixed ids when the schema is created.
    fn seed() -> Vec<Self> {
        Vec::new()
    }

    /// Checks the required and max-length constraints of the descriptor.
    fn validate(&self) -> Result<(), DomainError> {
        validate_record(&Self::entity_type(), &self.to_record())
    }
}

/// Checks a record against the required and max-length constraints of an
/// entity type. The generated key is exempt from the required check.
pub fn validate_record(entity_type: &EntityType, record: &Record) -> Result<(), DomainError> {
    for property in entity_type.properties() {
        let value = record.get(property.name);
        if value.is_null() {
            if property.required && !property.generated_on_add {
                return Err(DomainError::Required {
                    entity: entity_type.name,
                    property: property.name,
                });
            }
            continue;
        }

        if let (ColumnType::Text { max_length: Some(max) }, Value::Text(text)) =
            (&property.column_type, value)
        {
            let actual = text.chars().count();
            if actual > *max {
                return Err(DomainError::MaxLength {
                    entity: entity_type.name,
                    property: property.name,
                    max: *max,
                    actual,
                });
            }
        }
    }
    Ok(())
}
