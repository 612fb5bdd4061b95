//! Tagged value type for worker-namespace slots.
//!
//! Everything a namespace can hold is one of these explicit cases:
//! broadcast scalars, opaque payloads, message dictionaries. Tasks that
//! run purely for their side effect return [`Value::Unit`].

use serde::{Deserialize, Serialize};

use crate::dict::MessageDict;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Result of an effect-only task (a bind, an entry overwrite).
    Unit,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Dict(MessageDict),
}

impl Value {
    /// Variant name, for diagnostics and type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Dict(_) => "dict",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&MessageDict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut MessageDict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<MessageDict> for Value {
    fn from(d: MessageDict) -> Self {
        Self::Dict(d)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(Value::Unit.type_name(), "unit");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Dict(MessageDict::new()).type_name(), "dict");
    }

    #[test]
    fn checked_accessors() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Text("x".into()).as_int(), None);
        assert_eq!(Value::Text("x".into()).as_text(), Some("x"));
        assert_eq!(Value::Int(7).as_text(), None);
        assert!(Value::Dict(MessageDict::new()).as_dict().is_some());
        assert!(Value::Unit.as_dict().is_none());
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("hi"), Value::Text("hi".into()));
    }
}
