//! The value conversion layer.
//!
//! Implemented on [`Context`]: `to_host` maps any runtime value onto a
//! distinct, round-trippable host representation; `from_host` attempts the
//! reverse and returns `None` as an explicit "no runtime representation"
//! sentinel, which callers must distinguish from a hard conversion error.

use crate::bridge::context::{Context, HostValue};
use crate::bridge::dict::DictAdapter;
use crate::runtime::{DictRef, ListRef, Type, TypeSpec, Value};

impl Context {
    /// Converts a runtime value to its host representation. Total over all
    /// value kinds; container values come back as shared handles, so mutation
    /// through the host representation is visible runtime-side.
    pub fn to_host(&self, value: &Value) -> HostValue {
        match value {
            Value::Unset => HostValue::None,
            Value::Int(i) => HostValue::Int(*i),
            Value::Real(r) => HostValue::Float(*r),
            Value::Str(s) => HostValue::Str(s.as_ref().clone()),
            Value::List(list) => HostValue::List(list.clone()),
            Value::Dict(dict) => HostValue::Dict(DictAdapter::wrap(dict.clone())),
            Value::Object(object) => HostValue::Object(object.clone()),
        }
    }

    /// Attempts to convert a host value to a runtime value, optionally under
    /// a target-type hint. Returns `None` when the host value has no
    /// meaningful runtime representation.
    pub fn from_host(&self, value: &HostValue, hint: Option<&TypeSpec>) -> Option<Value> {
        match hint {
            None => self.from_host_untyped(value),
            Some(spec) if spec.base == Type::Any => self.from_host_untyped(value),
            Some(spec) => {
                let converted = self.from_host_untyped(value)?;
                // Unset carries no kind; a hinted conversion wants a value.
                if converted.is_valid() && converted.kind() == spec.base {
                    Some(converted)
                } else {
                    None
                }
            }
        }
    }

    fn from_host_untyped(&self, value: &HostValue) -> Option<Value> {
        match value {
            HostValue::None => Some(Value::Unset),
            // the runtime has no boolean kind
            HostValue::Bool(b) => Some(Value::Int(i64::from(*b))),
            HostValue::Int(i) => Some(Value::Int(*i)),
            HostValue::Float(f) => Some(Value::Real(*f)),
            HostValue::Str(s) => Some(Value::string(s.clone())),
            HostValue::Seq(items) => {
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(self.from_host(item, None)?);
                }
                Some(Value::List(ListRef::from_values(converted)))
            }
            HostValue::Map(map) => {
                let dict = DictRef::new_untyped();
                for (key, item) in map {
                    // an untyped dict accepts every converted value
                    dict.set(key, self.from_host(item, None)?).ok()?;
                }
                Some(Value::Dict(dict))
            }
            HostValue::Dict(adapter) => Some(Value::Dict(adapter.handle().clone())),
            HostValue::List(list) => Some(Value::List(list.clone())),
            HostValue::Object(object) => Some(Value::Object(object.clone())),
            HostValue::Handle(v) => Some(v.clone()),
            HostValue::Foreign(_) => None,
        }
    }
}
