//! The generic runtime (GRT) value model.
//!
//! This is the statically-typed, reference-counted side of the bridge: the
//! value representation the larger application uses for structured,
//! introspectable data. The bridge consumes it through a small operation set
//! (create/get/set/remove/count/iterate/type-introspect plus the class
//! registry); nothing here knows about the scripting side.
//!
//! # Submodules
//! - `value`: the `Value` enum, value kinds and conversion hints
//! - `dict`: the ordered, optionally content-constrained dictionary store
//! - `list`: the ordered value sequence
//! - `object`: object instances and the metaclass registry

pub mod dict;
pub mod list;
pub mod object;
pub mod value;

pub use dict::DictRef;
pub use list::ListRef;
pub use object::{ClassDef, ClassRegistry, ObjectRef};
pub use value::{str_to_type, type_to_str, GrtError, Type, TypeSpec, Value};
