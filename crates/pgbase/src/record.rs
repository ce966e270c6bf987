//! Column/value records for inserts and updates.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// An ordered set of column assignments.
///
/// Column order is kept as given, which fixes the column order of the
/// generated INSERT/UPDATE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Record::set).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column. An existing column keeps its position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(c, _)| c == column)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(c, _)| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Build a record from a JSON object of scalars.
    pub fn from_json(json: &JsonValue) -> OrmResult<Self> {
        let JsonValue::Object(obj) = json else {
            return Err(OrmError::validation("record must be a JSON object"));
        };
        obj.iter()
            .map(|(column, raw)| {
                Value::from_json(raw)
                    .map(|v| (column.clone(), v))
                    .ok_or_else(|| {
                        OrmError::validation(format!("column '{column}' must be a scalar value"))
                    })
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Record::from_json(&json).map_err(serde::de::Error::custom)
    }
}
