use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// How a bound element's raw state becomes a [`FieldValue`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Checkbox,
}

impl FieldKind {
    /// Coerces the raw text of a text-like element. Checkbox state never
    /// arrives as text, so checkboxes fall back to the text reading here.
    pub fn coerce_text(self, raw: &str) -> FieldValue {
        match self {
            FieldKind::Number => FieldValue::Number(parse_int(raw)),
            FieldKind::Text | FieldKind::Checkbox => FieldValue::Text(raw.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Empty text, zero, NaN and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(value) => !value.is_empty(),
            FieldValue::Number(value) => *value != 0.0 && !value.is_nan(),
            FieldValue::Bool(value) => *value,
        }
    }

    /// True for a number that failed to parse.
    pub fn is_nan(&self) -> bool {
        matches!(self, FieldValue::Number(value) if value.is_nan())
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Number(value) if value.is_nan() => f.write_str("NaN"),
            FieldValue::Number(value) if value.is_infinite() => {
                if value.is_sign_negative() {
                    f.write_str("-Infinity")
                } else {
                    f.write_str("Infinity")
                }
            }
            FieldValue::Number(value) if *value == 0.0 => f.write_str("0"),
            FieldValue::Number(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Text(value) => serializer.serialize_str(value),
            FieldValue::Bool(value) => serializer.serialize_bool(*value),
            FieldValue::Number(value) if !value.is_finite() => serializer.serialize_none(),
            FieldValue::Number(value) if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*value as i64)
            }
            FieldValue::Number(value) => serializer.serialize_f64(*value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

/// Integer parse with browser `parseInt` semantics: leading whitespace and
/// an optional sign are skipped, a `0x` prefix switches to hexadecimal, and
/// the longest run of valid digits is read. Input without any digit yields
/// NaN rather than zero.
pub fn parse_int(raw: &str) -> f64 {
    let trimmed = raw.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let mut value: Option<f64> = None;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
    }

    match value {
        Some(value) if negative => -value,
        Some(value) => value,
        None => f64::NAN,
    }
}
