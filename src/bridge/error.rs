//! Error taxonomy of the bridge layer.
//!
//! Every failure an adapter or iterator operation can produce is one of these
//! variants. `StopIteration` is part of normal control flow, not a fault: it
//! signals loop termination and is never logged. All variants are translated
//! into host exceptions at the dispatch boundary; none cross it raw.

use std::fmt::Display;

use crate::runtime::{type_to_str, GrtError};

#[derive(Clone, Debug, PartialEq)]
pub enum BridgeError {
    /// Malformed call arguments or a bad type-name string.
    InvalidArgument(String),
    /// An object class name that does not resolve against the registry.
    UnknownClass(String),
    /// A value of the wrong kind where a dictionary was required.
    TypeMismatch(String),
    /// The underlying value conversion failed outright.
    ConversionError(String),
    /// A non-string key reached a strict accessor.
    KeyTypeError(String),
    /// The requested key is not present; carries the key.
    KeyNotFound(String),
    /// The store rejected a value due to its content-type/class constraint.
    BadItem(String),
    /// Normal iteration termination.
    StopIteration,
    /// The backing dictionary changed shape while an iterator was live.
    Invalidated,
    /// Bridge-internal failure (type registration, lost cursor).
    Internal(String),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::InvalidArgument(msg) => write!(f, "{}", msg),
            BridgeError::UnknownClass(_) => write!(f, "invalid GRT class name"),
            BridgeError::TypeMismatch(msg) => write!(f, "{}", msg),
            BridgeError::ConversionError(msg) => write!(f, "{}", msg),
            BridgeError::KeyTypeError(msg) => write!(f, "{}", msg),
            BridgeError::KeyNotFound(key) => write!(f, "invalid key '{}'", key),
            BridgeError::BadItem(msg) => write!(f, "{}", msg),
            BridgeError::StopIteration => write!(f, "StopIteration"),
            BridgeError::Invalidated => {
                write!(f, "dictionary changed shape during iteration")
            }
            BridgeError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<GrtError> for BridgeError {
    fn from(err: GrtError) -> Self {
        match err {
            GrtError::TypeMismatch { expected, actual } => BridgeError::TypeMismatch(format!(
                "expected a {} value, but got {}",
                type_to_str(expected),
                type_to_str(actual)
            )),
            GrtError::BadItem(msg) => BridgeError::BadItem(msg),
            GrtError::UnknownClass(name) => BridgeError::UnknownClass(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Type;

    #[test]
    fn messages_carry_the_key() {
        let err = BridgeError::KeyNotFound("owner".to_owned());
        assert_eq!(err.to_string(), "invalid key 'owner'");
    }

    #[test]
    fn runtime_errors_map_onto_the_taxonomy() {
        let err: BridgeError = GrtError::TypeMismatch {
            expected: Type::Dict,
            actual: Type::Int,
        }
        .into();
        assert!(matches!(err, BridgeError::TypeMismatch(_)));
        let err: BridgeError = GrtError::BadItem("nope".to_owned()).into();
        assert_eq!(err, BridgeError::BadItem("nope".to_owned()));
    }
}
