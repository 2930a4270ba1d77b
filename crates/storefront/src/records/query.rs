//! Query parameters for the record API: field projection and filter predicates.
//!
//! ```json
//! {
//!   "fields": [{ "field": { "Name": "Name" } }, { "field": { "Name": "price" } }],
//!   "where": [{ "fieldName": "featured", "operator": "EqualTo", "values": [true] }],
//!   "whereGroups": [{
//!     "operator": "OR",
//!     "subGroups": [{
//!       "operator": "OR",
//!       "conditions": [{ "fieldName": "Name", "operator": "Contains", "values": ["phone"] }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Every `where` condition and every group must hold (AND). Inside a group,
//! sub-groups combine with the group operator; inside a sub-group, conditions
//! combine with the sub-group operator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field to include in query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub field: FieldName,
}

/// Wrapper matching the `{ "Name": "..." }` shape of the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSelector {
    /// Select a field by name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_owned(),
            },
        }
    }
}

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Contains,
    EqualTo,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
}

/// How conditions or sub-groups combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

/// A predicate on one named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Condition {
    /// Create a condition with a single comparison value.
    #[must_use]
    pub fn new(field_name: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.to_owned(),
            operator,
            values: vec![value.into()],
        }
    }
}

/// Conditions joined by one combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGroup {
    pub operator: Combinator,
    pub conditions: Vec<Condition>,
}

/// Sub-groups joined by one combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereGroup {
    pub operator: Combinator,
    pub sub_groups: Vec<SubGroup>,
}

impl WhereGroup {
    /// A group that holds when any of `conditions` holds.
    #[must_use]
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            operator: Combinator::Or,
            sub_groups: vec![SubGroup {
                operator: Combinator::Or,
                conditions,
            }],
        }
    }
}

/// Parameters of a `query` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(default)]
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
}

impl QueryParams {
    /// Project the given fields. An empty list returns every field.
    #[must_use]
    pub fn select(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|name| FieldSelector::new(name)).collect(),
            ..Self::default()
        }
    }

    /// Add a condition that must hold.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a group that must hold.
    #[must_use]
    pub fn group(mut self, group: WhereGroup) -> Self {
        self.where_groups.push(group);
        self
    }

    /// Names of the projected fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.name.as_str())
    }
}
