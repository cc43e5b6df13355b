//! NBT-like structured documents attached to blocks, entities and storages.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Compound payload: string keys to tags, sorted for deterministic output.
pub type Compound = BTreeMap<String, Tag>;

/// A single structured-data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// 8-bit signed integer.
    Byte(i8),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list.
    List(Vec<Tag>),
    /// Keyed compound.
    Compound(Compound),
}

impl Tag {
    /// Empty compound.
    pub fn compound() -> Self {
        Self::Compound(Compound::new())
    }

    /// Numeric value, if this tag is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Byte(v) => Some(f64::from(v)),
            Self::Short(v) => Some(f64::from(v)),
            Self::Int(v) => Some(f64::from(v)),
            Self::Long(v) => Some(v as f64),
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Element count for lists/compounds, character count for strings.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::List(items) => Some(items.len()),
            Self::Compound(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Convert a JSON value: integers become `Int` (or `Long` when out of
    /// range), other numbers `Double`, booleans `Byte`, null an empty compound.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::compound(),
            Value::Bool(b) => Self::Byte(i8::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map_or(Self::Long(i), Self::Int),
                None => Self::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Compound(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a JSON object into a compound; non-objects yield an empty one.
    pub fn compound_from_json(value: &Value) -> Compound {
        match Self::from_json(value) {
            Self::Compound(map) => map,
            _ => Compound::new(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(v) => write!(f, "{v}b"),
            Self::Short(v) => write!(f, "{v}s"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v:?}f"),
            Self::Double(v) => write!(f, "{v:?}d"),
            Self::String(s) => write!(f, "{s:?}"),
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
            Self::Compound(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
