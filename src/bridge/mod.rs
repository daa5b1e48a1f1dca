//! The scripting-side bridge.
//!
//! Everything the embedded scripting environment touches lives here: the
//! session [`Context`](context::Context), the value conversion layer, the
//! typed dict adapter with its name dispatch table, and the external
//! iterator. The runtime value model underneath is consumed, never extended.

pub mod context;
pub mod convert;
pub mod dict;
pub mod error;
pub mod iter;

pub use context::{Context, HostException, HostExceptionKind, HostValue, TypeDescriptor};
pub use dict::{dispatch, DictAdapter, DictInit, DictMethod, RESERVED_ATTRS};
pub use error::BridgeError;
pub use iter::DictIterator;
