//! grt-bridge: bidirectional value marshalling between an embedded scripting
//! session and the GRT typed value system.
//!
//! The [`bridge`] module is the core: a foreign mapping type
//! ([`bridge::DictAdapter`]) that behaves like a native associative container
//! on the scripting side while being backed by a typed, optionally
//! schema-constrained runtime dictionary, plus the stateful external iterator
//! and the conversion layer that moves values and errors across the boundary.
//! The [`runtime`] module is the minimal GRT value model the bridge marshals
//! against.

pub mod bridge;
pub mod runtime;

pub use bridge::{
    dispatch, BridgeError, Context, DictAdapter, DictInit, DictIterator, HostException,
    HostExceptionKind, HostValue,
};
pub use runtime::{ClassRegistry, DictRef, GrtError, ListRef, ObjectRef, Type, TypeSpec, Value};
