//! Scalar values and the comparison semantics defined in the data model:
//! null is incomparable under ordering, numeric equality coerces across
//! int/float/decimal, text equality is byte-equal, and ordering for
//! binary/date/time/datetime is byte-lexicographic.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;
use std::fmt;

/// A tagged scalar value stored in a [`crate::row::Row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    Text(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Binary(v) => write!(f, "{v:02x?}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
        }
    }
}

impl Scalar {
    /// True for null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for `Int`, `Float`, and `Decimal`.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Decimal(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Decimal(v) => bigdecimal::ToPrimitive::to_f64(v),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Self::Int(v) => Some(BigDecimal::from(*v)),
            Self::Float(v) => BigDecimal::try_from(*v).ok(),
            Self::Decimal(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// `eq(col, null)` is IS NULL; numeric-to-numeric equality coerces
    /// (`5 == 5.0`); everything else compares structurally.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (a, b) if a.is_numeric() && b.is_numeric() => numeric_eq(a, b),
            (Self::Text(a), Self::Text(b)) => a.as_bytes() == b.as_bytes(),
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering comparison used by `<, <=, >, >=`. Returns `None` when
    /// either side is null (the row is excluded from the filter) or the
    /// two scalars are not comparable (one numeric, one text, etc).
    #[must_use]
    pub fn partial_order(&self, other: &Self) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => numeric_cmp(a, b),
            (Self::Text(a), Self::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn numeric_eq(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Int(a), Scalar::Int(b)) => a == b,
        _ => match (a.as_decimal(), b.as_decimal()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
    }
}

fn numeric_cmp(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    match (a, b) {
        (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
        _ => match (a.as_decimal(), b.as_decimal()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })+
    };
}
impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}
impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}
impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Int(i64::from(v))
    }
}
impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}
impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_equality_coerces() {
        assert!(Scalar::Int(5).value_eq(&Scalar::Float(5.0)));
        assert!(!Scalar::Int(5).value_eq(&Scalar::Float(5.1)));
    }

    #[test]
    fn null_is_never_value_eq_to_anything_but_null() {
        assert!(Scalar::Null.value_eq(&Scalar::Null));
        assert!(!Scalar::Null.value_eq(&Scalar::Int(0)));
    }

    #[test]
    fn null_is_incomparable_under_ordering() {
        assert_eq!(Scalar::Null.partial_order(&Scalar::Int(1)), None);
        assert_eq!(Scalar::Int(1).partial_order(&Scalar::Null), None);
    }

    #[test]
    fn text_equality_is_byte_equal() {
        assert!(Scalar::Text("abc".into()).value_eq(&Scalar::Text("abc".into())));
        assert!(!Scalar::Text("abc".into()).value_eq(&Scalar::Text("abd".into())));
    }

    #[test]
    fn cross_type_non_numeric_is_not_comparable() {
        assert_eq!(
            Scalar::Text("1".into()).partial_order(&Scalar::Int(1)),
            None
        );
    }
}
