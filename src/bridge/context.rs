//! The embedding session context.
//!
//! A [`Context`] is the explicit handle every bridge operation takes: it owns
//! the object-class registry, the module namespace of published type
//! descriptors, and the error translation table. There is deliberately no
//! ambient process-wide session; callers thread the context through instead
//! of fetching a hidden global.

use std::fmt::Display;

use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::bridge::dict::DictAdapter;
use crate::bridge::error::BridgeError;
use crate::runtime::{ClassRegistry, ListRef, ObjectRef, Value};

/// A value as the scripting side sees it: dynamically typed, with native
/// container literals plus shared handles to bridged runtime values.
#[derive(Clone, Debug)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Native host sequence; converts element-wise.
    Seq(Vec<HostValue>),
    /// Native host mapping; converts into a fresh runtime dictionary.
    Map(IndexMap<String, HostValue>),
    /// A bridged runtime dictionary, sharing its backing store.
    Dict(DictAdapter),
    /// A bridged runtime list handle.
    List(ListRef),
    /// A bridged runtime object handle.
    Object(ObjectRef),
    /// An opaque reference to an existing runtime value.
    Handle(Value),
    /// A host object with no runtime representation; carries its host type
    /// name for diagnostics. Never convertible.
    Foreign(String),
}

impl HostValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "None",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Seq(_) => "sequence",
            HostValue::Map(_) => "mapping",
            HostValue::Dict(_) => "grt.Dict",
            HostValue::List(_) => "grt.List",
            HostValue::Object(_) => "grt.Object",
            HostValue::Handle(_) => "grt value reference",
            HostValue::Foreign(_) => "foreign object",
        }
    }
}

/// Observable equality: scalars and native containers compare structurally,
/// bridged handles compare by identity of the shared store.
impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::None, HostValue::None) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Seq(a), HostValue::Seq(b)) => a == b,
            (HostValue::Map(a), HostValue::Map(b)) => a == b,
            (HostValue::Dict(a), HostValue::Dict(b)) => a.handle().ptr_eq(b.handle()),
            (HostValue::List(a), HostValue::List(b)) => a.ptr_eq(b),
            (HostValue::Object(a), HostValue::Object(b)) => a.ptr_eq(b),
            (HostValue::Handle(a), HostValue::Handle(b)) => a == b,
            (HostValue::Foreign(a), HostValue::Foreign(b)) => a == b,
            _ => false,
        }
    }
}

/// The host's native exception categories, Python-shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostExceptionKind {
    TypeError,
    ValueError,
    NameError,
    KeyError,
    AttributeError,
    StopIteration,
    RuntimeError,
}

/// An error in the form the embedding host signals it.
#[derive(Clone, Debug, PartialEq)]
pub struct HostException {
    pub kind: HostExceptionKind,
    pub message: String,
}

impl HostException {
    pub fn new(kind: HostExceptionKind, message: impl Into<String>) -> Self {
        HostException {
            kind,
            message: message.into(),
        }
    }
}

impl Display for HostException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// A type published into the embedding module's namespace.
#[derive(Clone, Debug, Serialize)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub doc: &'static str,
}

impl TypeDescriptor {
    /// Readiness check: a descriptor is publishable once it carries a
    /// namespaced type name.
    fn ready(&self) -> bool {
        !self.name.is_empty() && self.name.contains('.')
    }

    /// The name the descriptor is published under (sans module prefix).
    fn published_name(&self) -> &'static str {
        self.name.rsplit('.').next().unwrap_or(self.name)
    }
}

const DICT_TYPE: TypeDescriptor = TypeDescriptor {
    name: "grt.Dict",
    doc: "Dict([grttype, grtclass]) -> GRT Dict\n\
          \n\
          Creates a new instance of a GRT dict object. If a grttype argument is given,\n\
          the dict will be typed and accept values of that type only. For object dicts,\n\
          a GRT class name may also be given.",
};

const DICT_ITERATOR_TYPE: TypeDescriptor = TypeDescriptor {
    name: "grt.DictIterator",
    doc: "GRT Dictionary iterator object",
};

/// The active embedding session.
pub struct Context {
    registry: ClassRegistry,
    module: FxHashMap<&'static str, TypeDescriptor>,
}

impl Context {
    /// Opens a session with an empty class registry. Fails if the bridge
    /// types cannot be published; that failure is fatal to session startup.
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_registry(ClassRegistry::new())
    }

    /// Opens a session over an already populated class registry.
    pub fn with_registry(registry: ClassRegistry) -> Result<Self, BridgeError> {
        let mut ctx = Context {
            registry,
            module: FxHashMap::default(),
        };
        ctx.init_dict_types()?;
        Ok(ctx)
    }

    /// Publishes the Dict and DictIterator type descriptors into the module
    /// namespace.
    fn init_dict_types(&mut self) -> Result<(), BridgeError> {
        for descriptor in [DICT_TYPE, DICT_ITERATOR_TYPE] {
            if !descriptor.ready() {
                return Err(BridgeError::Internal(format!(
                    "could not initialize GRT Dict type '{}'",
                    descriptor.name
                )));
            }
            debug!("publishing type {}", descriptor.name);
            self.module
                .insert(descriptor.published_name(), descriptor);
        }
        Ok(())
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.registry
    }

    /// Looks up a published type descriptor by its module-local name.
    pub fn lookup_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.module.get(name)
    }

    /// Resolves an opaque foreign reference to the runtime value it wraps.
    pub fn resolve_handle(&self, value: &HostValue) -> Result<Value, BridgeError> {
        match value {
            HostValue::Handle(v) => Ok(v.clone()),
            HostValue::Dict(adapter) => Ok(Value::Dict(adapter.handle().clone())),
            HostValue::List(list) => Ok(Value::List(list.clone())),
            HostValue::Object(object) => Ok(Value::Object(object.clone())),
            other => Err(BridgeError::ConversionError(format!(
                "expected a GRT value reference, got {}",
                other.type_name()
            ))),
        }
    }

    /// Translates an internal error into the host's native error-signaling
    /// form. Deterministic per variant.
    pub fn translate(&self, err: BridgeError) -> HostException {
        let kind = match &err {
            BridgeError::InvalidArgument(_) | BridgeError::BadItem(_) => {
                HostExceptionKind::ValueError
            }
            BridgeError::UnknownClass(_) => HostExceptionKind::NameError,
            BridgeError::TypeMismatch(_) | BridgeError::ConversionError(_) => {
                HostExceptionKind::TypeError
            }
            BridgeError::KeyTypeError(_) | BridgeError::KeyNotFound(_) => {
                HostExceptionKind::KeyError
            }
            BridgeError::StopIteration => HostExceptionKind::StopIteration,
            BridgeError::Invalidated | BridgeError::Internal(_) => HostExceptionKind::RuntimeError,
        };
        HostException::new(kind, err.to_string())
    }
}
