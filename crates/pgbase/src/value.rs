//! Loosely typed scalar values for where-maps and records.
//!
//! Where-maps and records usually come from dynamic input (JSON request bodies,
//! form data), so their values are not known at compile time. [`Value`] carries
//! one scalar and binds it as a Postgres parameter, converting to whatever type
//! Postgres infers for the placeholder:
//!
//! - `Null` binds to any type.
//! - `Int`/`Float` bind to integer, float, `numeric` and `json` placeholders.
//! - `Text` binds to text types as-is and is parsed for `bool`, integers,
//!   floats, `numeric`, `uuid`, `date`, `time`, `timestamp`, `timestamptz`,
//!   `json`/`jsonb` and enum types. Timestamps without an offset are UTC.
//!
//! # Example
//! ```ignore
//! use pgbase::Value;
//!
//! let v: Value = 30.into();
//! let name = Value::from("alice");
//! let missing: Value = Option::<i64>::None.into(); // Value::Null
//! ```

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type};
use uuid::Uuid;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a JSON scalar. Arrays and objects are not scalars and yield `None`.
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => Some(Value::Null),
            JsonValue::Bool(b) => Some(Value::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            JsonValue::String(s) => Some(Value::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    fn mismatch(&self, ty: &Type) -> Box<dyn Error + Sync + Send> {
        format!("cannot bind {} value to Postgres type {}", self.kind(), ty).into()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::JSON | Type::JSONB => JsonValue::Bool(*b).to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*i).to_sql(ty, out),
                Type::JSON | Type::JSONB => JsonValue::from(*i).to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Float(x) => match *ty {
                Type::FLOAT4 => (*x as f32).to_sql(ty, out),
                Type::FLOAT8 => x.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*x)?.to_sql(ty, out),
                Type::JSON | Type::JSONB => JsonValue::from(*x).to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Text(s) => self.text_to_sql(s, ty, out),
        }
    }

    // NULL fits any column; non-null values are checked in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl Value {
    /// Bind text, parsing it into the placeholder's type when that is not textual.
    fn text_to_sql(
        &self,
        s: &str,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match *ty {
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                s.to_sql(ty, out)
            }
            Type::BOOL => parse_bool(s)
                .ok_or_else(|| self.unparsable(ty, "expected a boolean"))?
                .to_sql(ty, out),
            Type::INT2 => self.parse::<i16>(s, ty)?.to_sql(ty, out),
            Type::INT4 => self.parse::<i32>(s, ty)?.to_sql(ty, out),
            Type::INT8 => self.parse::<i64>(s, ty)?.to_sql(ty, out),
            Type::FLOAT4 => self.parse::<f32>(s, ty)?.to_sql(ty, out),
            Type::FLOAT8 => self.parse::<f64>(s, ty)?.to_sql(ty, out),
            Type::NUMERIC => self.parse::<Decimal>(s, ty)?.to_sql(ty, out),
            Type::UUID => self.parse::<Uuid>(s, ty)?.to_sql(ty, out),
            Type::DATE => self.parse::<NaiveDate>(s, ty)?.to_sql(ty, out),
            Type::TIME => self.parse::<NaiveTime>(s, ty)?.to_sql(ty, out),
            Type::TIMESTAMP => parse_naive_datetime(s.trim())
                .ok_or_else(|| self.unparsable(ty, "expected YYYY-MM-DD[ HH:MM[:SS]]"))?
                .to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_datetime_utc(s.trim())
                .ok_or_else(|| self.unparsable(ty, "expected an RFC 3339 or local timestamp"))?
                .to_sql(ty, out),
            Type::JSON | Type::JSONB => serde_json::from_str::<JsonValue>(s)
                .map_err(|e| self.unparsable(ty, e))?
                .to_sql(ty, out),
            // Enum labels travel as their text in the binary protocol.
            _ if matches!(ty.kind(), Kind::Enum(_)) => {
                out.put_slice(s.as_bytes());
                Ok(IsNull::No)
            }
            _ => Err(self.mismatch(ty)),
        }
    }

    fn parse<T>(&self, s: &str, ty: &Type) -> Result<T, Box<dyn Error + Sync + Send>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        s.trim().parse().map_err(|e| self.unparsable(ty, e))
    }

    fn unparsable(&self, ty: &Type, reason: impl fmt::Display) -> Box<dyn Error + Sync + Send> {
        format!("cannot bind {self} to Postgres type {ty}: {reason}").into()
    }
}

/// Boolean spellings Postgres itself accepts.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-time without zone; a bare date means midnight.
fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            s.parse::<NaiveDate>()
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Date-time with an optional offset; without one the value is taken as UTC.
fn parse_datetime_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z").ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_naive_datetime(s).map(|naive| naive.and_utc()))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_postgres::types::FromSql;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(Value::from_json(&json!(30)), Some(Value::Int(30)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from_json(&json!("a")), Some(Value::Text("a".into())));
        assert_eq!(Value::from_json(&json!(true)), Some(Value::Bool(true)));
        assert_eq!(Value::from_json(&json!(null)), Some(Value::Null));
    }

    #[test]
    fn json_containers_are_not_scalars() {
        assert_eq!(Value::from_json(&json!([1, 2])), None);
        assert_eq!(Value::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn int_narrows_to_int4() {
        let mut buf = BytesMut::new();
        let res = Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(res, IsNull::No));
        assert_eq!(&buf[..], &7_i32.to_be_bytes());
    }

    #[test]
    fn int_out_of_range_for_int2_errors() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_rejects_numeric_column() {
        let mut buf = BytesMut::new();
        assert!(Value::from("x").to_sql(&Type::INT8, &mut buf).is_err());
    }

    fn encode<T: ToSql>(value: &T, ty: &Type) -> Vec<u8> {
        let mut buf = BytesMut::new();
        let res = value.to_sql_checked(ty, &mut buf).unwrap();
        assert!(matches!(res, IsNull::No));
        buf.to_vec()
    }

    #[test]
    fn null_binds_to_any_column_type() {
        for ty in [
            Type::TIMESTAMPTZ,
            Type::NUMERIC,
            Type::UUID,
            Type::DATE,
            Type::JSONB,
            Type::BYTEA,
        ] {
            let mut buf = BytesMut::new();
            let res = Value::Null.to_sql_checked(&ty, &mut buf).unwrap();
            assert!(matches!(res, IsNull::Yes), "{ty}");
        }
    }

    #[test]
    fn text_parses_dates_and_timestamps() {
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let midnight = new_year.and_hms_opt(0, 0, 0).unwrap();

        assert_eq!(
            encode(&Value::from("2024-01-01"), &Type::DATE),
            encode(&new_year, &Type::DATE)
        );
        assert_eq!(
            encode(&Value::from("2024-01-01"), &Type::TIMESTAMP),
            encode(&midnight, &Type::TIMESTAMP)
        );

        let utc = midnight.and_utc();
        for raw in [
            "2024-01-01 00:00:00",
            "2024-01-01T00:00:00Z",
            "2024-01-01T02:00:00+02:00",
            "2024-01-01 00:00",
            "2024-01-01",
        ] {
            assert_eq!(
                encode(&Value::from(raw), &Type::TIMESTAMPTZ),
                encode(&utc, &Type::TIMESTAMPTZ),
                "{raw}"
            );
        }

        let noon = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        assert_eq!(encode(&Value::from("12:30:00"), &Type::TIME), encode(&noon, &Type::TIME));
    }

    #[test]
    fn bad_timestamp_text_names_the_type() {
        let mut buf = BytesMut::new();
        let err = Value::from("yesterday")
            .to_sql_checked(&Type::TIMESTAMPTZ, &mut buf)
            .err().expect("expected an error");
        assert!(err.to_string().contains("timestamptz"));
    }

    #[test]
    fn text_parses_uuid_numeric_and_json() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            encode(&Value::from(id), &Type::UUID),
            encode(&Uuid::parse_str(id).unwrap(), &Type::UUID)
        );
        assert_eq!(
            encode(&Value::from("12.50"), &Type::NUMERIC),
            encode(&Decimal::from_str("12.50").unwrap(), &Type::NUMERIC)
        );
        assert_eq!(
            encode(&Value::from(r#"{"a": 1}"#), &Type::JSONB),
            encode(&serde_json::json!({"a": 1}), &Type::JSONB)
        );
    }

    #[test]
    fn form_style_text_binds_to_integers_and_bools() {
        assert_eq!(encode(&Value::from("5"), &Type::INT4), 5_i32.to_be_bytes());
        assert_eq!(encode(&Value::from(" 42 "), &Type::INT8), 42_i64.to_be_bytes());
        assert_eq!(encode(&Value::from("on"), &Type::BOOL), encode(&true, &Type::BOOL));

        let mut buf = BytesMut::new();
        assert!(Value::from("70000").to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn numbers_bind_to_numeric() {
        let decode = |v: Value| {
            let bytes = encode(&v, &Type::NUMERIC);
            Decimal::from_sql(&Type::NUMERIC, &bytes).unwrap()
        };
        assert_eq!(decode(Value::Int(5)), Decimal::new(5, 0));
        assert_eq!(decode(Value::Float(9.5)), Decimal::new(95, 1));
        assert_eq!(decode(Value::from("-0.25")), Decimal::new(-25, 2));
    }

    #[test]
    fn numbers_do_not_bind_to_dates() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(5).to_sql_checked(&Type::DATE, &mut buf).is_err());
        assert!(Value::Bool(true).to_sql_checked(&Type::UUID, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_null() {
        let mut buf = BytesMut::new();
        let res = Value::Null.to_sql(&Type::INT8, &mut buf).unwrap();
        assert!(matches!(res, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(Option::<i32>::None), Value::Null);
        assert_eq!(Value::from(Some(3_i32)), Value::Int(3));
    }

    #[test]
    fn deserializes_untagged() {
        let v: Vec<Value> = serde_json::from_value(json!([1, "b", false, null, 2.5])).unwrap();
        assert_eq!(
            v,
            vec![
                Value::Int(1),
                Value::Text("b".into()),
                Value::Bool(false),
                Value::Null,
                Value::Float(2.5),
            ]
        );
    }
}
