// src/hash/value.rs

//! Hashable input values and their canonical forms.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::HashError;

/// A task input value, as handed to the hasher.
///
/// Maps keep their insertion order; hashing sorts them by key. Lists and
/// tuples are kept apart so callers can model both, but hash identically.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&Path> for Value {
    fn from(v: &Path) -> Self {
        Value::Str(v.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::from(v.as_path())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 above i64::MAX lands here too and loses precision.
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
            toml::Value::Array(items) => Value::list(items),
            toml::Value::Table(table) => Value::map(table),
        }
    }
}

/// Exact rational value of a finite `f64`: `mantissa * 2^exponent`.
///
/// The mantissa is odd (or zero, with exponent 0), so two floats get the
/// same `ExactFloat` exactly when they denote the same real number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExactFloat {
    pub mantissa: i64,
    pub exponent: i32,
}

impl ExactFloat {
    pub fn from_f64(x: f64) -> Result<Self, HashError> {
        if !x.is_finite() {
            return Err(HashError::NonFiniteFloat(x));
        }
        if x == 0.0 {
            return Ok(Self {
                mantissa: 0,
                exponent: 0,
            });
        }

        let bits = x.to_bits();
        let negative = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7ff) as i32;
        let fraction = bits & ((1u64 << 52) - 1);

        // Subnormals have no implicit leading bit and a fixed exponent.
        let (mut mantissa, mut exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };

        let shift = mantissa.trailing_zeros();
        mantissa >>= shift;
        exponent += shift as i32;

        // mantissa < 2^53, so it always fits.
        let mantissa = mantissa as i64;
        Ok(Self {
            mantissa: if negative { -mantissa } else { mantissa },
            exponent,
        })
    }

    /// Reduced `(numerator, denominator)` pair, if it fits in 128 bits.
    pub fn as_ratio(self) -> Option<(i128, u128)> {
        if self.exponent >= 0 {
            let factor = i128::try_from(2u128.checked_pow(self.exponent as u32)?).ok()?;
            Some((i128::from(self.mantissa).checked_mul(factor)?, 1))
        } else {
            let denominator = 2u128.checked_pow(self.exponent.unsigned_abs())?;
            Some((i128::from(self.mantissa), denominator))
        }
    }
}

/// Canonical form of a value: what actually gets digested.
///
/// Mappings become key-sorted pairs, sequences lose their kind, floats
/// become exact rationals, and file or directory inputs become the digest of
/// their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Canonical {
    Null,
    Bool(bool),
    Int(i64),
    Float(ExactFloat),
    Str(String),
    Digest(String),
    Seq(Vec<Canonical>),
    Pairs(Vec<(String, Canonical)>),
}
