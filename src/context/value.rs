//! Typed access to looked-up query, form and path values.

use std::fmt::Display;
use std::str::FromStr;

use super::error::ContextError;

/// A looked-up string value, or the error from the lookup.
///
/// Conversions return the original lookup error unchanged, so a missing key
/// surfaces as [`ContextError::KeyNotFound`] no matter which accessor the
/// caller picked.
///
/// ```rust
/// use webtrie::context::{ContextError, StringValue};
///
/// assert_eq!(StringValue::new("page", "3").to_i64().unwrap(), 3);
/// assert!(matches!(
///     StringValue::new("page", "three").to_i64(),
///     Err(ContextError::InvalidValue { .. })
/// ));
/// ```
#[derive(Debug)]
pub struct StringValue {
    key: String,
    value: Result<String, ContextError>,
}

impl StringValue {
    /// A successful lookup.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Ok(value.into()),
        }
    }

    pub(crate) fn missing(location: &'static str, key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: Err(ContextError::KeyNotFound {
                location,
                key: key.to_string(),
            }),
        }
    }

    /// Key this value was looked up under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the lookup succeeded.
    pub fn is_ok(&self) -> bool {
        self.value.is_ok()
    }

    /// Borrow the raw string.
    pub fn as_str(&self) -> Result<&str, &ContextError> {
        self.value.as_deref()
    }

    /// Take the raw string.
    pub fn into_string(self) -> Result<String, ContextError> {
        self.value
    }

    /// Convert with [`FromStr`].
    pub fn parse<T>(self) -> Result<T, ContextError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.value?;
        raw.parse::<T>().map_err(|e| ContextError::InvalidValue {
            key: self.key,
            reason: e.to_string(),
            value: raw,
        })
    }

    pub fn to_i64(self) -> Result<i64, ContextError> {
        self.parse()
    }

    pub fn to_i32(self) -> Result<i32, ContextError> {
        self.parse()
    }

    pub fn to_u64(self) -> Result<u64, ContextError> {
        self.parse()
    }

    pub fn to_f64(self) -> Result<f64, ContextError> {
        self.parse()
    }

    /// Accepts `1 t T true TRUE True` and `0 f F false FALSE False`.
    pub fn to_bool(self) -> Result<bool, ContextError> {
        let raw = self.value?;
        match raw.as_str() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(ContextError::InvalidValue {
                key: self.key,
                value: raw,
                reason: "not a boolean".to_string(),
            }),
        }
    }
}
