//! In-process implementation of the record API.
//!
//! Used for local development and tests of the remote backends.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::query::{Combinator, Condition, Operator, QueryParams, SubGroup, WhereGroup};
use super::{Record, RecordApi, RecordApiError, RecordId, value_as_decimal, value_as_i64};

#[derive(Debug, Default)]
struct Tables {
    tables: HashMap<String, BTreeMap<i64, Map<String, Value>>>,
    next_id: i64,
}

/// Record collections held in memory.
///
/// Cheaply cloneable; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecords {
    inner: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

fn poisoned() -> RecordApiError {
    RecordApiError::Rejected("record store lock poisoned".to_owned())
}

impl MemoryRecords {
    /// Create an empty set of collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn seed(&self, table: &str, fields: Map<String, Value>) -> Result<RecordId, RecordApiError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        tables.next_id += 1;
        let id = tables.next_id;
        tables
            .tables
            .entry(table.to_owned())
            .or_default()
            .insert(id, fields);
        Ok(RecordId::new(id))
    }

    /// Number of records in a collection.
    #[must_use]
    pub fn count(&self, table: &str) -> usize {
        self.inner
            .read()
            .map(|t| t.tables.get(table).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Make every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RecordApiError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RecordApiError::Status {
                status: 503,
                body: "service unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

fn to_record(id: i64, fields: &Map<String, Value>, projection: &[&str]) -> Record {
    let fields = if projection.is_empty() {
        fields.clone()
    } else {
        fields
            .iter()
            .filter(|(name, _)| projection.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    };
    Record {
        id: RecordId::new(id),
        fields,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => obj.get("Name").and_then(text_of),
        _ => None,
    }
}

fn contains(field: &Value, needle: &Value) -> bool {
    let Some(needle) = text_of(needle) else {
        return false;
    };
    match field {
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .any(|item| item.contains(&needle)),
        other => text_of(other).is_some_and(|text| text.contains(&needle)),
    }
}

fn equal(field: &Value, expected: &Value) -> bool {
    match (field, expected) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(s), Value::Bool(b)) | (Value::Bool(b), Value::String(s)) => {
            s.trim().parse::<bool>().is_ok_and(|parsed| parsed == *b)
        }
        (Value::Object(_), Value::Number(_)) => value_as_i64(field)
            .zip(value_as_i64(expected))
            .is_some_and(|(a, b)| a == b),
        (_, Value::Number(_)) | (Value::Number(_), _) => value_as_decimal(field)
            .zip(value_as_decimal(expected))
            .is_some_and(|(a, b)| a == b),
        _ => text_of(field)
            .zip(text_of(expected))
            .is_some_and(|(a, b)| a == b),
    }
}

fn evaluate(fields: &Map<String, Value>, condition: &Condition) -> bool {
    let Some(field) = fields.get(&condition.field_name).filter(|v| !v.is_null()) else {
        return false;
    };
    condition.values.iter().any(|expected| match condition.operator {
        Operator::Contains => contains(field, expected),
        Operator::EqualTo => equal(field, expected),
        Operator::GreaterThanOrEqualTo => value_as_decimal(field)
            .zip(value_as_decimal(expected))
            .is_some_and(|(a, b)| a >= b),
        Operator::LessThanOrEqualTo => value_as_decimal(field)
            .zip(value_as_decimal(expected))
            .is_some_and(|(a, b)| a <= b),
    })
}

fn combine<T>(items: &[T], operator: Combinator, holds: impl Fn(&T) -> bool) -> bool {
    match operator {
        Combinator::And => items.iter().all(holds),
        Combinator::Or => items.is_empty() || items.iter().any(holds),
    }
}

fn sub_group_holds(fields: &Map<String, Value>, sub_group: &SubGroup) -> bool {
    combine(&sub_group.conditions, sub_group.operator, |c| evaluate(fields, c))
}

fn group_holds(fields: &Map<String, Value>, group: &WhereGroup) -> bool {
    combine(&group.sub_groups, group.operator, |s| sub_group_holds(fields, s))
}

fn matches(fields: &Map<String, Value>, params: &QueryParams) -> bool {
    params.conditions.iter().all(|c| evaluate(fields, c))
        && params.where_groups.iter().all(|g| group_holds(fields, g))
}

#[async_trait]
impl RecordApi for MemoryRecords {
    async fn query(&self, table: &str, params: &QueryParams) -> Result<Vec<Record>, RecordApiError> {
        self.check_available()?;
        let tables = self.inner.read().map_err(|_| poisoned())?;
        let projection: Vec<&str> = params.field_names().collect();

        Ok(tables
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|(_, fields)| matches(fields, params))
                    .map(|(id, fields)| to_record(*id, fields, &projection))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_by_id(&self, table: &str, id: RecordId) -> Result<Option<Record>, RecordApiError> {
        self.check_available()?;
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(tables
            .tables
            .get(table)
            .and_then(|rows| rows.get(&id.get()))
            .map(|fields| to_record(id.get(), fields, &[])))
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, RecordApiError> {
        self.check_available()?;
        let id = self.seed(table, fields.clone())?;
        Ok(Record { id, fields })
    }

    async fn update(
        &self,
        table: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Record, RecordApiError> {
        self.check_available()?;
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let row = tables
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(&id.get()))
            .ok_or_else(|| RecordApiError::invalid(table, format!("no record with Id {id}")))?;

        row.extend(fields);
        Ok(to_record(id.get(), row, &[]))
    }

    async fn delete(&self, table: &str, id: RecordId) -> Result<(), RecordApiError> {
        self.check_available()?;
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        if let Some(rows) = tables.tables.get_mut(table) {
            rows.remove(&id.get());
        }
        Ok(())
    }
}
