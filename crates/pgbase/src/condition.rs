//! Where-map condition types.
//!
//! A [`WhereMap`] is an ordered list of `field → Op` conditions plus one
//! [`Logic`] that decides whether they are joined with AND or OR. Maps are built
//! either in code or parsed from the loosely typed JSON form:
//!
//! ```ignore
//! use pgbase::WhereMap;
//! use serde_json::json;
//!
//! let map = WhereMap::from_json(&json!({
//!     "id": ["in", [1, 2, 3]],
//!     "category_id": ["<>", 9],
//!     "tag_id": 10,
//!     "_logic": "or"
//! }))?;
//!
//! let same = WhereMap::or()
//!     .in_list("id", [1, 2, 3])
//!     .ne("category_id", 9)
//!     .eq("tag_id", 10);
//! assert_eq!(map, same);
//! # Ok::<(), pgbase::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::warn;

/// JSON key that selects the join logic instead of naming a field.
pub const LOGIC_KEY: &str = "_logic";

/// How the predicates of one where-map are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    /// Parse `"and"` / `"or"`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("and") {
            Some(Logic::And)
        } else if s.eq_ignore_ascii_case("or") {
            Some(Logic::Or)
        } else {
            None
        }
    }

    /// SQL connector placed between two predicates.
    pub fn connector(self) -> &'static str {
        match self {
            Logic::And => " AND ",
            Logic::Or => " OR ",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator tag without its operand, as written in a where-map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Eq,
    Gt,
    Lt,
    Ne,
    Like,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl OpKind {
    /// Parse an operator tag, ignoring case.
    ///
    /// Both the short tags (`in`, `notin`, `<>`, `null`, ...) and the spelled-out
    /// names (`not-in`, `neq`, `is-null`, ...) are accepted.
    pub fn parse(tag: &str) -> Option<Self> {
        let kind = match tag.trim().to_ascii_lowercase().as_str() {
            "=" | "eq" => OpKind::Eq,
            ">" | "gt" => OpKind::Gt,
            "<" | "lt" => OpKind::Lt,
            "<>" | "!=" | "neq" | "ne" => OpKind::Ne,
            "like" => OpKind::Like,
            "in" => OpKind::In,
            "notin" | "not-in" | "not_in" => OpKind::NotIn,
            "between" => OpKind::Between,
            "notbetween" | "not-between" | "not_between" => OpKind::NotBetween,
            "null" | "is-null" | "is_null" => OpKind::IsNull,
            "notnull" | "is-not-null" | "is_not_null" => OpKind::IsNotNull,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical short tag.
    pub fn tag(self) -> &'static str {
        match self {
            OpKind::Eq => "=",
            OpKind::Gt => ">",
            OpKind::Lt => "<",
            OpKind::Ne => "<>",
            OpKind::Like => "like",
            OpKind::In => "in",
            OpKind::NotIn => "notin",
            OpKind::Between => "between",
            OpKind::NotBetween => "notbetween",
            OpKind::IsNull => "null",
            OpKind::IsNotNull => "notnull",
        }
    }
}

/// A condition on one field, carrying the operand shape its operator needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// field = value
    Eq(Value),
    /// field > value
    Gt(Value),
    /// field < value
    Lt(Value),
    /// field <> value
    Ne(Value),
    /// field LIKE pattern
    Like(Value),
    /// field IN (values...)
    In(Vec<Value>),
    /// field NOT IN (values...)
    NotIn(Vec<Value>),
    /// field BETWEEN a AND b
    Between(Value, Value),
    /// field NOT BETWEEN a AND b
    NotBetween(Value, Value),
    /// field IS NULL
    IsNull,
    /// field IS NOT NULL
    IsNotNull,
}

impl Op {
    pub fn eq(value: impl Into<Value>) -> Self {
        Op::Eq(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Op::Gt(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Op::Lt(value.into())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Op::Ne(value.into())
    }

    pub fn like(pattern: impl Into<Value>) -> Self {
        Op::Like(pattern.into())
    }

    pub fn in_list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Op::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Op::NotIn(values.into_iter().map(Into::into).collect())
    }

    pub fn between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Op::Between(from.into(), to.into())
    }

    pub fn not_between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Op::NotBetween(from.into(), to.into())
    }

    /// The operator tag of this condition.
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Eq(_) => OpKind::Eq,
            Op::Gt(_) => OpKind::Gt,
            Op::Lt(_) => OpKind::Lt,
            Op::Ne(_) => OpKind::Ne,
            Op::Like(_) => OpKind::Like,
            Op::In(_) => OpKind::In,
            Op::NotIn(_) => OpKind::NotIn,
            Op::Between(..) => OpKind::Between,
            Op::NotBetween(..) => OpKind::NotBetween,
            Op::IsNull => OpKind::IsNull,
            Op::IsNotNull => OpKind::IsNotNull,
        }
    }

    /// Build a condition from a parsed tag and its JSON operand.
    pub fn from_json(field: &str, kind: OpKind, operand: Option<&JsonValue>) -> OrmResult<Self> {
        let op = match kind {
            OpKind::Eq => Op::Eq(scalar_operand(field, kind, operand)?),
            OpKind::Gt => Op::Gt(scalar_operand(field, kind, operand)?),
            OpKind::Lt => Op::Lt(scalar_operand(field, kind, operand)?),
            OpKind::Ne => Op::Ne(scalar_operand(field, kind, operand)?),
            OpKind::Like => Op::Like(scalar_operand(field, kind, operand)?),
            OpKind::In => Op::In(list_operand(field, kind, operand)?),
            OpKind::NotIn => Op::NotIn(list_operand(field, kind, operand)?),
            OpKind::Between => {
                let (from, to) = range_operand(field, kind, operand)?;
                Op::Between(from, to)
            }
            OpKind::NotBetween => {
                let (from, to) = range_operand(field, kind, operand)?;
                Op::NotBetween(from, to)
            }
            // The operand of a null check is ignored.
            OpKind::IsNull => Op::IsNull,
            OpKind::IsNotNull => Op::IsNotNull,
        };
        Ok(op)
    }
}

fn scalar(field: &str, kind: OpKind, json: &JsonValue) -> OrmResult<Value> {
    Value::from_json(json).ok_or_else(|| {
        OrmError::invalid_condition(format!(
            "field '{field}': '{}' expects a scalar operand, got {}",
            kind.tag(),
            json_kind(json)
        ))
    })
}

fn scalar_operand(field: &str, kind: OpKind, operand: Option<&JsonValue>) -> OrmResult<Value> {
    let json = operand.ok_or_else(|| missing_operand(field, kind))?;
    scalar(field, kind, json)
}

fn list_operand(field: &str, kind: OpKind, operand: Option<&JsonValue>) -> OrmResult<Vec<Value>> {
    match operand.ok_or_else(|| missing_operand(field, kind))? {
        JsonValue::Array(items) => items.iter().map(|v| scalar(field, kind, v)).collect(),
        other => Err(OrmError::invalid_condition(format!(
            "field '{field}': '{}' expects an array operand, got {}",
            kind.tag(),
            json_kind(other)
        ))),
    }
}

fn range_operand(
    field: &str,
    kind: OpKind,
    operand: Option<&JsonValue>,
) -> OrmResult<(Value, Value)> {
    match operand.ok_or_else(|| missing_operand(field, kind))? {
        JsonValue::Array(items) if items.len() == 2 => {
            Ok((scalar(field, kind, &items[0])?, scalar(field, kind, &items[1])?))
        }
        other => Err(OrmError::invalid_condition(format!(
            "field '{field}': '{}' expects a two-element array, got {}",
            kind.tag(),
            json_kind(other)
        ))),
    }
}

fn missing_operand(field: &str, kind: OpKind) -> OrmError {
    OrmError::invalid_condition(format!(
        "field '{field}': '{}' requires an operand",
        kind.tag()
    ))
}

fn json_kind(json: &JsonValue) -> String {
    match json {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(_) => "a bool".to_string(),
        JsonValue::Number(_) => "a number".to_string(),
        JsonValue::String(_) => "a string".to_string(),
        JsonValue::Array(items) => format!("an array of {} elements", items.len()),
        JsonValue::Object(_) => "an object".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    Strict,
    Lenient,
}

/// An ordered set of field conditions joined by one [`Logic`].
///
/// Iteration order is insertion order (for JSON input: the order of the keys).
/// The same field may appear more than once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereMap {
    logic: Logic,
    conditions: Vec<(String, Op)>,
}

impl WhereMap {
    /// An empty AND map.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty OR map.
    pub fn or() -> Self {
        Self::new().with_logic(Logic::Or)
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    pub fn set_logic(&mut self, logic: Logic) {
        self.logic = logic;
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    /// Append a condition.
    pub fn push(&mut self, field: impl Into<String>, op: Op) {
        self.conditions.push((field.into(), op));
    }

    /// Append a condition (builder form).
    pub fn op(mut self, field: impl Into<String>, op: Op) -> Self {
        self.push(field, op);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(field, Op::eq(value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(field, Op::gt(value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(field, Op::lt(value))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(field, Op::ne(value))
    }

    pub fn like(self, field: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.op(field, Op::like(pattern))
    }

    pub fn in_list<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.op(field, Op::in_list(values))
    }

    pub fn not_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.op(field, Op::not_in(values))
    }

    pub fn between(
        self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.op(field, Op::between(from, to))
    }

    pub fn not_between(
        self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.op(field, Op::not_between(from, to))
    }

    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.op(field, Op::IsNull)
    }

    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.op(field, Op::IsNotNull)
    }

    /// True when the map has no field conditions (the logic setting alone does not count).
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Op)> {
        self.conditions.iter().map(|(f, op)| (f.as_str(), op))
    }

    /// Fail with [`OrmError::EmptyCondition`] if the map is empty.
    ///
    /// Mutating operations call this so that an empty map never turns into
    /// "every row in the table".
    pub fn require_non_empty(&self, operation: &'static str) -> OrmResult<()> {
        if self.is_empty() {
            return Err(OrmError::EmptyCondition(operation));
        }
        Ok(())
    }

    /// Parse the JSON object form. Unknown operators are an error.
    pub fn from_json(json: &JsonValue) -> OrmResult<Self> {
        Self::parse(json, ParseMode::Strict)
    }

    /// Parse the JSON object form, dropping entries with unknown operators.
    ///
    /// Dropped entries are logged at WARN. An unrecognized `_logic` value falls
    /// back to AND. Malformed operands are still errors.
    pub fn from_json_lenient(json: &JsonValue) -> OrmResult<Self> {
        Self::parse(json, ParseMode::Lenient)
    }

    fn parse(json: &JsonValue, mode: ParseMode) -> OrmResult<Self> {
        let JsonValue::Object(obj) = json else {
            return Err(OrmError::invalid_condition(format!(
                "where-map must be a JSON object, got {}",
                json_kind(json)
            )));
        };

        let mut map = WhereMap::new();
        for (key, value) in obj {
            if key.eq_ignore_ascii_case(LOGIC_KEY) {
                map.logic = parse_logic(value, mode)?;
                continue;
            }
            match parse_entry(key, value) {
                Ok(op) => map.push(key.clone(), op),
                Err(OrmError::UnknownOperator { field, operator }) if mode == ParseMode::Lenient => {
                    warn!(
                        target: "pgbase.condition",
                        field = %field,
                        operator = %operator,
                        "dropping where-map entry with unknown operator"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(map)
    }
}

fn parse_logic(value: &JsonValue, mode: ParseMode) -> OrmResult<Logic> {
    if let Some(logic) = value.as_str().and_then(Logic::parse) {
        return Ok(logic);
    }
    match mode {
        ParseMode::Strict => Err(OrmError::invalid_condition(format!(
            "'{LOGIC_KEY}' must be \"and\" or \"or\", got {value}"
        ))),
        ParseMode::Lenient => {
            warn!(
                target: "pgbase.condition",
                value = %value,
                "unrecognized where-map logic, using AND"
            );
            Ok(Logic::And)
        }
    }
}

fn parse_entry(field: &str, value: &JsonValue) -> OrmResult<Op> {
    match value {
        JsonValue::Array(items) => {
            let (tag, operand) = match items.as_slice() {
                [tag] => (tag, None),
                [tag, operand] => (tag, Some(operand)),
                _ => {
                    return Err(OrmError::invalid_condition(format!(
                        "field '{field}': expected [operator, operand], got {}",
                        json_kind(value)
                    )));
                }
            };
            let tag = tag.as_str().ok_or_else(|| {
                OrmError::invalid_condition(format!(
                    "field '{field}': operator must be a string, got {}",
                    json_kind(tag)
                ))
            })?;
            let kind = OpKind::parse(tag).ok_or_else(|| OrmError::unknown_operator(field, tag))?;
            Op::from_json(field, kind, operand)
        }
        JsonValue::Object(_) => Err(OrmError::invalid_condition(format!(
            "field '{field}': nested objects are not supported"
        ))),
        // `field = NULL` never matches; treat it as IS NULL.
        JsonValue::Null => Ok(Op::IsNull),
        scalar => Ok(Op::Eq(Value::from_json(scalar).unwrap_or(Value::Null))),
    }
}

impl TryFrom<&JsonValue> for WhereMap {
    type Error = OrmError;

    fn try_from(json: &JsonValue) -> OrmResult<Self> {
        WhereMap::from_json(json)
    }
}

impl<'de> Deserialize<'de> for WhereMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        WhereMap::from_json(&json).map_err(serde::de::Error::custom)
    }
}
