//! Core GRT value representation.
//!
//! A [`Value`] is the reference-counted, dynamically introspectable unit of
//! data the rest of the application exchanges. Scalars are stored inline,
//! containers are shared handles: cloning a `Value` never deep-copies a
//! container, it produces another reference to the same store.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::dict::DictRef;
use super::list::ListRef;
use super::object::ObjectRef;

/// The value kinds the runtime distinguishes.
///
/// `Any` never appears as the kind of a concrete value; it exists as the
/// unconstrained content type of containers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Type {
    Any,
    Int,
    Real,
    Str,
    List,
    Dict,
    Object,
}

/// Parses a user-supplied type name. Accepts the canonical short names the
/// runtime prints plus the long spellings scripting code tends to use.
pub fn str_to_type(name: &str) -> Option<Type> {
    match name {
        "int" | "integer" => Some(Type::Int),
        "real" | "double" => Some(Type::Real),
        "string" => Some(Type::Str),
        "list" => Some(Type::List),
        "dict" => Some(Type::Dict),
        "object" => Some(Type::Object),
        _ => None,
    }
}

pub fn type_to_str(ty: Type) -> &'static str {
    match ty {
        Type::Any => "",
        Type::Int => "int",
        Type::Real => "real",
        Type::Str => "string",
        Type::List => "list",
        Type::Dict => "dict",
        Type::Object => "object",
    }
}

/// A conversion hint: the expected base kind plus, for containers, the
/// expected content kind and (for object content) class name.
#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub base: Type,
    pub content: Type,
    pub content_class: Option<String>,
}

impl TypeSpec {
    pub fn of(base: Type) -> Self {
        TypeSpec {
            base,
            content: Type::Any,
            content_class: None,
        }
    }

    /// The hint `update()` passes: a dictionary of unconstrained content.
    pub fn dict_of_any() -> Self {
        TypeSpec::of(Type::Dict)
    }
}

/// Errors raised by the runtime value layer itself.
#[derive(Clone, Debug, PartialEq)]
pub enum GrtError {
    TypeMismatch { expected: Type, actual: Type },
    BadItem(String),
    UnknownClass(String),
}

impl Display for GrtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrtError::TypeMismatch { expected, actual } => write!(
                f,
                "Type mismatch: expected type {}, but got {}",
                type_to_str(*expected),
                type_to_str(*actual)
            ),
            GrtError::BadItem(msg) => write!(f, "{}", msg),
            GrtError::UnknownClass(name) => write!(f, "unknown class {}", name),
        }
    }
}

impl std::error::Error for GrtError {}

/// A single runtime value.
///
/// `Unset` is the explicit "no value" state: it is what an uninitialized
/// reference holds, and it is storable in a dictionary to express
/// "key present, value empty" as distinct from key absence.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Unset,
    Int(i64),
    Real(f64),
    Str(Arc<String>),
    List(ListRef),
    Dict(DictRef),
    Object(ObjectRef),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Arc::new(s.into()))
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Unset)
    }

    pub fn kind(&self) -> Type {
        match self {
            Value::Unset => Type::Any,
            Value::Int(_) => Type::Int,
            Value::Real(_) => Type::Real,
            Value::Str(_) => Type::Str,
            Value::List(_) => Type::List,
            Value::Dict(_) => Type::Dict,
            Value::Object(_) => Type::Object,
        }
    }

    /// Renders the value as JSON for diagnostic output. `seen` guards
    /// against reference cycles through shared containers.
    pub(crate) fn render(&self, seen: &mut Vec<usize>) -> serde_json::Value {
        match self {
            Value::Unset => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Number::from_f64(*r)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.as_ref().clone()),
            Value::List(list) => list.render(seen),
            Value::Dict(dict) => dict.render(seen),
            Value::Object(object) => object.render(seen),
        }
    }

    /// Canonical string rendering, used by diagnostic output and the
    /// adapter's `str()` surface.
    pub fn to_display_string(&self) -> String {
        self.render(&mut Vec::new()).to_string()
    }
}

/// Observable equality: scalars compare by content, containers by identity
/// of the shared store.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unset, Value::Unset) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Dict(a), Value::Dict(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unset => write!(f, "<unset>"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(_) | Value::Dict(_) | Value::Object(_) => {
                write!(f, "{}", self.to_display_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip() {
        for ty in [Type::Int, Type::Real, Type::Str, Type::List, Type::Dict, Type::Object] {
            assert_eq!(str_to_type(type_to_str(ty)), Some(ty));
        }
        assert_eq!(str_to_type("integer"), Some(Type::Int));
        assert_eq!(str_to_type("double"), Some(Type::Real));
        assert_eq!(str_to_type("tuple"), None);
    }

    #[test]
    fn unset_is_invalid() {
        assert!(!Value::Unset.is_valid());
        assert!(Value::Int(0).is_valid());
        assert_eq!(Value::default(), Value::Unset);
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::string("x").to_display_string(), "\"x\"");
        assert_eq!(Value::Unset.to_display_string(), "null");
    }
}
