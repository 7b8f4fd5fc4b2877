use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

///
/// Value
///
/// Pure literal representation used in filters, plans, and result rows.
/// This layer carries no schema knowledge; field-type agreement is checked
/// during intent validation and again by the guardrail enforcer.
///
/// Monetary amounts are always `Decimal`, never floats.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    List(Vec<Value>),
}

impl Value {
    /// The type family this literal belongs to.
    #[must_use]
    pub const fn family(&self) -> ValueFamily {
        match self {
            Self::Null => ValueFamily::Null,
            Self::Bool(_) => ValueFamily::Bool,
            Self::Int(_) | Self::Decimal(_) => ValueFamily::Numeric,
            Self::Text(_) => ValueFamily::Text,
            Self::Date(_) => ValueFamily::Date,
            Self::List(_) => ValueFamily::List,
        }
    }

    /// True if this literal is a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Numeric view of this literal, widening `Int` to `Decimal`.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(n) => Some(Decimal::from(*n)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Total order over same-family scalars; `None` across families.
    ///
    /// `Int` and `Decimal` compare within the shared numeric family so a
    /// filter literal written as `100` orders correctly against stored
    /// `100.00` amounts.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_decimal()?;
                let b = other.as_decimal()?;
                Some(a.cmp(&b))
            }
        }
    }

    /// Equality under the same cross-numeric rules as [`Self::canonical_cmp`].
    #[must_use]
    pub fn canonical_eq(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

///
/// ValueFamily
///
/// Coarse literal classification used for operator allow-lists and the
/// guardrail type check. `Int` and `Decimal` share the numeric family.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueFamily {
    Null,
    Bool,
    Numeric,
    Text,
    Date,
    List,
}

impl fmt::Display for ValueFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Date => "date",
            Self::List => "list",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Value {
        Value::Decimal(s.parse().unwrap())
    }

    #[test]
    fn int_and_decimal_share_the_numeric_family() {
        assert_eq!(Value::Int(7).family(), ValueFamily::Numeric);
        assert_eq!(dec("7.00").family(), ValueFamily::Numeric);
    }

    #[test]
    fn canonical_cmp_widens_int_to_decimal() {
        assert_eq!(
            Value::Int(100).canonical_cmp(&dec("100.00")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            dec("100.50").canonical_cmp(&Value::Int(101)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn canonical_cmp_rejects_cross_family_pairs() {
        assert_eq!(
            Value::Text("100".into()).canonical_cmp(&Value::Int(100)),
            None
        );
        assert_eq!(
            Value::Bool(true).canonical_cmp(&Value::Text("true".into())),
            None
        );
    }

    #[test]
    fn decimal_display_preserves_scale() {
        assert_eq!(dec("100.50").to_string(), "100.50");
    }
}
