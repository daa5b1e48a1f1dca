//! The typed dict adapter.
//!
//! A [`DictAdapter`] is the foreign mapping object scripting code holds: it
//! owns exactly one [`DictRef`] handle and routes every key and attribute
//! operation through the conversion layer of the [`Context`]. Name-based
//! access from the host goes through [`dispatch`], a tagged method table with
//! a final fallback that treats an unmatched name as a dictionary key.
//!
//! The introspection names (`__members__`, `__methods__`, `contenttype`) are
//! reserved: assigning to them is rejected instead of silently shadowing the
//! introspection surface.

use std::fmt::{Debug, Display};

use log::debug;

use crate::bridge::context::{Context, HostException, HostExceptionKind, HostValue};
use crate::bridge::error::BridgeError;
use crate::bridge::iter::DictIterator;
use crate::runtime::{str_to_type, type_to_str, DictRef, TypeSpec, Value};

/// Attribute names the adapter resolves itself, never as dictionary keys.
pub const RESERVED_ATTRS: [&str; 3] = ["__members__", "__methods__", "contenttype"];

/// The fixed method listing `__methods__` reports.
const METHOD_LISTING: [&str; 6] = ["keys", "items", "values", "has_key", "update", "setdefault"];

const BAD_KEY: &str = "grt.Dict key must be a string";
const BAD_VALUE: &str = "grt.Dict may only be assigned other GRT or string/numeric values";
const BAD_TYPE_NAME: &str = "grt type must be grt.integer, real, string, dict or object";

/// Construction arguments as they arrive from the boundary layer. A supplied
/// source handle wins over type/class hints.
#[derive(Clone, Debug, Default)]
pub struct DictInit {
    pub type_hint: Option<String>,
    pub class_name: Option<String>,
    pub source: Option<HostValue>,
}

/// The foreign mapping object backed by one runtime dictionary.
///
/// Cloning the adapter shares the backing store (host-side aliasing of one
/// dictionary value). Re-initialization is plain assignment: constructing a
/// new adapter over an existing binding releases the prior handle on drop,
/// and a failed construction leaves no adapter behind.
#[derive(Clone)]
pub struct DictAdapter {
    dict: DictRef,
}

impl DictAdapter {
    /// Wraps an already-held dictionary handle, sharing it.
    pub(crate) fn wrap(dict: DictRef) -> Self {
        DictAdapter { dict }
    }

    /// Creates an adapter over a fresh, unconstrained dictionary.
    pub fn new() -> Self {
        DictAdapter::wrap(DictRef::new_untyped())
    }

    /// Creates an adapter over a fresh dictionary constrained to the named
    /// content type and, optionally, object class.
    pub fn with_content_type(
        ctx: &Context,
        type_name: &str,
        class_name: Option<&str>,
    ) -> Result<Self, BridgeError> {
        let content_type = str_to_type(type_name)
            .ok_or_else(|| BridgeError::InvalidArgument(BAD_TYPE_NAME.to_owned()))?;
        if let Some(class) = class_name {
            if ctx.registry().get(class).is_none() {
                return Err(BridgeError::UnknownClass(class.to_owned()));
            }
        }
        debug!(
            "constructing typed grt.Dict (content {}{})",
            type_name,
            class_name.map(|c| format!(", class {}", c)).unwrap_or_default()
        );
        Ok(DictAdapter::wrap(DictRef::new_typed(content_type, class_name)))
    }

    /// Creates an adapter over an existing runtime dictionary referenced by
    /// an opaque handle.
    pub fn from_handle(ctx: &Context, source: &HostValue) -> Result<Self, BridgeError> {
        let value = ctx.resolve_handle(source)?;
        let dict = DictRef::cast_from(value)?;
        Ok(DictAdapter::wrap(dict))
    }

    /// Boundary constructor: dispatches on the supplied arguments the way
    /// the host-side `__init__` does.
    pub fn init(ctx: &Context, args: &DictInit) -> Result<Self, BridgeError> {
        if let Some(source) = &args.source {
            return DictAdapter::from_handle(ctx, source);
        }
        match &args.type_hint {
            None if args.class_name.is_none() => Ok(DictAdapter::new()),
            None => Err(BridgeError::InvalidArgument(BAD_TYPE_NAME.to_owned())),
            Some(type_name) => {
                DictAdapter::with_content_type(ctx, type_name, args.class_name.as_deref())
            }
        }
    }

    /// The owned backing handle.
    pub fn handle(&self) -> &DictRef {
        &self.dict
    }

    pub fn count(&self) -> usize {
        self.dict.count()
    }

    /// Strict subscript access: the key must be a host string.
    pub fn subscript(&self, ctx: &Context, key: &HostValue) -> Result<HostValue, BridgeError> {
        let key = key
            .as_str()
            .ok_or_else(|| BridgeError::KeyTypeError(BAD_KEY.to_owned()))?;
        self.get_key(ctx, key)
    }

    /// Looks up `key` and converts the stored value.
    pub fn get_key(&self, ctx: &Context, key: &str) -> Result<HostValue, BridgeError> {
        match self.dict.get(key) {
            Some(value) => Ok(ctx.to_host(&value)),
            None => Err(BridgeError::KeyNotFound(key.to_owned())),
        }
    }

    /// Strict subscript assignment. `value` of `None` is a deletion request;
    /// the host null sentinel stores an explicit empty value.
    pub fn set_item(
        &self,
        ctx: &Context,
        key: &HostValue,
        value: Option<&HostValue>,
    ) -> Result<(), BridgeError> {
        let key = key
            .as_str()
            .ok_or_else(|| BridgeError::KeyTypeError(BAD_KEY.to_owned()))?;
        self.set_key(ctx, key, value)
    }

    /// String-keyed assignment; see [`Self::set_item`]. All failure paths
    /// leave the dictionary unchanged.
    pub fn set_key(
        &self,
        ctx: &Context,
        key: &str,
        value: Option<&HostValue>,
    ) -> Result<(), BridgeError> {
        if RESERVED_ATTRS.contains(&key) {
            return Err(BridgeError::InvalidArgument(format!(
                "'{}' is a reserved grt.Dict attribute name",
                key
            )));
        }
        match value {
            None => {
                // idempotent removal
                self.dict.remove(key);
                Ok(())
            }
            Some(HostValue::None) => Ok(self.dict.set(key, Value::Unset)?),
            Some(host) => {
                let converted = ctx
                    .from_host(host, None)
                    .filter(Value::is_valid)
                    .ok_or_else(|| BridgeError::InvalidArgument(BAD_VALUE.to_owned()))?;
                Ok(self.dict.set(key, converted)?)
            }
        }
    }

    /// Never fails: a non-string key reports "not found".
    pub fn has_key(&self, key: &HostValue) -> bool {
        key.as_str().is_some_and(|k| self.dict.has_key(k))
    }

    /// Snapshot of current keys in iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.dict.keys()
    }

    /// Snapshot of `(key, converted value)` pairs in iteration order.
    pub fn items(&self, ctx: &Context) -> Vec<(String, HostValue)> {
        self.dict
            .entries()
            .into_iter()
            .map(|(k, v)| (k, ctx.to_host(&v)))
            .collect()
    }

    /// Snapshot of converted values in iteration order.
    pub fn values(&self, ctx: &Context) -> Vec<HostValue> {
        self.dict
            .entries()
            .into_iter()
            .map(|(_, v)| ctx.to_host(&v))
            .collect()
    }

    /// Merges the entries of `other` into this dictionary, overwriting on
    /// key collision. `other` must convert, under a dict-of-any hint, to a
    /// runtime dictionary.
    pub fn update(&self, ctx: &Context, other: &HostValue) -> Result<(), BridgeError> {
        let hint = TypeSpec::dict_of_any();
        let source = match ctx.from_host(other, Some(&hint)) {
            Some(Value::Dict(dict)) => dict,
            _ => {
                // distinguish "wrong kind of value" from "no representation"
                return Err(if ctx.from_host(other, None).is_some() {
                    BridgeError::InvalidArgument("invalid argument".to_owned())
                } else {
                    BridgeError::InvalidArgument("invalid argument for update()".to_owned())
                });
            }
        };
        let entries = source.entries();
        // validate everything up front so a constraint violation cannot
        // leave a partial merge behind
        for (_, value) in &entries {
            self.dict.accepts(value)?;
        }
        for (key, value) in entries {
            self.dict.set(&key, value)?;
        }
        Ok(())
    }

    /// Two-argument `get`: a present key returns its converted value, an
    /// absent key returns the supplied default unchanged (no conversion
    /// round-trip), and with no default the lookup fails.
    pub fn get_default(
        &self,
        ctx: &Context,
        key: &str,
        default: Option<&HostValue>,
    ) -> Result<HostValue, BridgeError> {
        if self.dict.has_key(key) {
            return self.get_key(ctx, key);
        }
        match default {
            Some(value) => Ok(value.clone()),
            None => Err(BridgeError::KeyNotFound(key.to_owned())),
        }
    }

    /// `setdefault`: a present key returns its value; an absent key stores
    /// the default and returns the stored value re-fetched through the same
    /// storage/conversion round-trip as any other value, so the caller sees
    /// what was actually persisted.
    pub fn set_default(
        &self,
        ctx: &Context,
        key: &str,
        default: Option<&HostValue>,
    ) -> Result<HostValue, BridgeError> {
        if self.dict.has_key(key) {
            return self.get_key(ctx, key);
        }
        let fallback = default.cloned().unwrap_or(HostValue::None);
        self.set_key(ctx, key, Some(&fallback))?;
        self.get_key(ctx, key)
    }

    /// `(content type name, content class name or empty)`.
    pub fn contenttype(&self) -> (String, String) {
        (
            type_to_str(self.dict.content_type()).to_owned(),
            self.dict.content_class_name(),
        )
    }

    /// Produces an external iterator over the current entries.
    pub fn iter(&self) -> DictIterator {
        DictIterator::over(&self.dict)
    }

    /// Attribute-style access: the reserved introspection names resolve
    /// here, anything else falls back to a key lookup.
    pub fn attr(&self, ctx: &Context, name: &str) -> Result<HostValue, BridgeError> {
        match name {
            "__members__" => {
                let mut members = vec![HostValue::Str("__contenttype__".to_owned())];
                members.extend(self.keys().into_iter().map(HostValue::Str));
                Ok(HostValue::Seq(members))
            }
            "__methods__" => Ok(HostValue::Seq(
                METHOD_LISTING
                    .iter()
                    .map(|m| HostValue::Str((*m).to_owned()))
                    .collect(),
            )),
            "contenttype" => {
                let (type_name, class_name) = self.contenttype();
                Ok(HostValue::Seq(vec![
                    HostValue::Str(type_name),
                    HostValue::Str(class_name),
                ]))
            }
            _ => self.get_key(ctx, name),
        }
    }
}

impl Default for DictAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DictAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dict.to_display_string())
    }
}

impl Debug for DictAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grt.Dict({})", self.dict.to_display_string())
    }
}

/// The adapter's named operations, dispatched by name at the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DictMethod {
    Keys,
    Items,
    Values,
    HasKey,
    Update,
    Get,
    SetDefault,
}

impl DictMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "keys" => Some(DictMethod::Keys),
            "items" => Some(DictMethod::Items),
            "values" => Some(DictMethod::Values),
            "has_key" => Some(DictMethod::HasKey),
            "update" => Some(DictMethod::Update),
            "get" => Some(DictMethod::Get),
            "setdefault" => Some(DictMethod::SetDefault),
            _ => None,
        }
    }
}

fn pair(key: String, value: HostValue) -> HostValue {
    HostValue::Seq(vec![HostValue::Str(key), value])
}

fn key_arg(args: &[HostValue]) -> Result<&str, BridgeError> {
    match args.first() {
        None => Err(BridgeError::InvalidArgument(
            "missing required argument".to_owned(),
        )),
        Some(value) => value
            .as_str()
            .ok_or_else(|| BridgeError::KeyTypeError(BAD_KEY.to_owned())),
    }
}

fn call(
    adapter: &DictAdapter,
    ctx: &Context,
    method: DictMethod,
    args: &[HostValue],
) -> Result<HostValue, BridgeError> {
    match method {
        DictMethod::Keys | DictMethod::Items | DictMethod::Values => {
            if !args.is_empty() {
                return Err(BridgeError::InvalidArgument(
                    "method takes no arguments".to_owned(),
                ));
            }
            Ok(match method {
                DictMethod::Keys => {
                    HostValue::Seq(adapter.keys().into_iter().map(HostValue::Str).collect())
                }
                DictMethod::Items => HostValue::Seq(
                    adapter
                        .items(ctx)
                        .into_iter()
                        .map(|(k, v)| pair(k, v))
                        .collect(),
                ),
                _ => HostValue::Seq(adapter.values(ctx)),
            })
        }
        DictMethod::HasKey => {
            let key = args.first().ok_or_else(|| {
                BridgeError::InvalidArgument("missing required argument".to_owned())
            })?;
            Ok(HostValue::Bool(adapter.has_key(key)))
        }
        DictMethod::Update => {
            let other = args.first().ok_or_else(|| {
                BridgeError::InvalidArgument("dict argument required for update()".to_owned())
            })?;
            adapter.update(ctx, other)?;
            Ok(HostValue::None)
        }
        DictMethod::Get => {
            let key = key_arg(args)?;
            adapter.get_default(ctx, key, args.get(1))
        }
        DictMethod::SetDefault => {
            let key = key_arg(args)?;
            adapter.set_default(ctx, key, args.get(1))
        }
    }
}

/// Boundary entry point: resolves `name` against the method table, falling
/// back to attribute/key lookup for unmatched names. This is where internal
/// errors become host exceptions; nothing below it signals host-natively.
pub fn dispatch(
    adapter: &DictAdapter,
    ctx: &Context,
    name: &str,
    args: &[HostValue],
) -> Result<HostValue, HostException> {
    if let Some(method) = DictMethod::from_name(name) {
        return call(adapter, ctx, method, args).map_err(|e| ctx.translate(e));
    }
    if !args.is_empty() {
        return Err(HostException::new(
            HostExceptionKind::TypeError,
            format!("'{}' is not a grt.Dict method", name),
        ));
    }
    adapter.attr(ctx, name).map_err(|e| match e {
        BridgeError::KeyNotFound(key) => HostException::new(
            HostExceptionKind::AttributeError,
            format!("unknown attribute '{}'", key),
        ),
        other => ctx.translate(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new().unwrap()
    }

    fn str_val(s: &str) -> HostValue {
        HostValue::Str(s.to_owned())
    }

    #[test]
    fn construction_argument_precedence() {
        let ctx = ctx();
        let existing = DictAdapter::new();
        existing.set_key(&ctx, "k", Some(&HostValue::Int(1))).unwrap();

        // a source handle wins over hints
        let init = DictInit {
            type_hint: Some("int".to_owned()),
            class_name: None,
            source: Some(HostValue::Dict(existing.clone())),
        };
        let adapter = DictAdapter::init(&ctx, &init).unwrap();
        assert!(adapter.handle().ptr_eq(existing.handle()));

        // no arguments at all: fresh and unconstrained
        let adapter = DictAdapter::init(&ctx, &DictInit::default()).unwrap();
        assert_eq!(adapter.contenttype(), (String::new(), String::new()));
    }

    #[test]
    fn bad_type_name_is_invalid_argument() {
        let ctx = ctx();
        let err = DictAdapter::with_content_type(&ctx, "tuple", None).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidArgument(BAD_TYPE_NAME.to_owned())
        );
    }

    #[test]
    fn unknown_class_fails_construction() {
        let ctx = ctx();
        let err = DictAdapter::with_content_type(&ctx, "object", Some("db.Missing")).unwrap_err();
        assert_eq!(err, BridgeError::UnknownClass("db.Missing".to_owned()));
        assert_eq!(err.to_string(), "invalid GRT class name");
    }

    #[test]
    fn from_handle_requires_a_dict_value() {
        let ctx = ctx();
        let err = DictAdapter::from_handle(&ctx, &HostValue::Handle(Value::Int(3))).unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch(_)));
        let err = DictAdapter::from_handle(&ctx, &HostValue::Int(3)).unwrap_err();
        assert!(matches!(err, BridgeError::ConversionError(_)));
    }

    #[test]
    fn subscript_rejects_non_string_keys() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        let err = adapter.subscript(&ctx, &HostValue::Int(1)).unwrap_err();
        assert_eq!(err, BridgeError::KeyTypeError(BAD_KEY.to_owned()));
        // ... but has_key is lenient
        assert!(!adapter.has_key(&HostValue::Int(1)));
    }

    #[test]
    fn foreign_values_cannot_be_assigned() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        let err = adapter
            .set_key(&ctx, "f", Some(&HostValue::Foreign("lambda".to_owned())))
            .unwrap_err();
        assert_eq!(err, BridgeError::InvalidArgument(BAD_VALUE.to_owned()));
        assert_eq!(adapter.count(), 0);
    }

    #[test]
    fn reserved_names_are_rejected_as_keys() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        for name in RESERVED_ATTRS {
            let err = adapter
                .set_key(&ctx, name, Some(&HostValue::Int(1)))
                .unwrap_err();
            assert!(matches!(err, BridgeError::InvalidArgument(_)));
        }
        assert_eq!(adapter.count(), 0);
    }

    #[test]
    fn members_listing_leads_with_the_marker() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        adapter.set_key(&ctx, "host", Some(&str_val("db1"))).unwrap();

        let HostValue::Seq(members) = adapter.attr(&ctx, "__members__").unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(members[0], str_val("__contenttype__"));
        assert_eq!(members[1], str_val("host"));

        let HostValue::Seq(methods) = adapter.attr(&ctx, "__methods__").unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(methods.len(), 6);
        assert!(methods.contains(&str_val("setdefault")));
    }

    #[test]
    fn attribute_fallback_resolves_keys() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        adapter.set_key(&ctx, "name", Some(&str_val("sakila"))).unwrap();
        assert_eq!(adapter.attr(&ctx, "name").unwrap(), str_val("sakila"));
        let err = adapter.attr(&ctx, "missing").unwrap_err();
        assert!(matches!(err, BridgeError::KeyNotFound(_)));
    }

    #[test]
    fn dispatch_enforces_arity_and_translates() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        adapter.set_key(&ctx, "a", Some(&HostValue::Int(1))).unwrap();

        let exc = dispatch(&adapter, &ctx, "keys", &[HostValue::Int(1)]).unwrap_err();
        assert_eq!(exc.kind, HostExceptionKind::ValueError);
        assert_eq!(exc.message, "method takes no arguments");

        let keys = dispatch(&adapter, &ctx, "keys", &[]).unwrap();
        assert_eq!(keys, HostValue::Seq(vec![str_val("a")]));

        // unmatched name falls back to key lookup
        let value = dispatch(&adapter, &ctx, "a", &[]).unwrap();
        assert_eq!(value, HostValue::Int(1));
        let exc = dispatch(&adapter, &ctx, "b", &[]).unwrap_err();
        assert_eq!(exc.kind, HostExceptionKind::AttributeError);
        assert_eq!(exc.message, "unknown attribute 'b'");
    }

    #[test]
    fn dispatch_get_returns_default_unconverted() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        let sentinel = HostValue::Foreign("marker".to_owned());
        let result = dispatch(&adapter, &ctx, "get", &[str_val("k"), sentinel.clone()]).unwrap();
        assert_eq!(result, sentinel);

        let exc = dispatch(&adapter, &ctx, "get", &[str_val("k")]).unwrap_err();
        assert_eq!(exc.kind, HostExceptionKind::KeyError);
        assert_eq!(exc.message, "invalid key 'k'");
    }

    #[test]
    fn update_requires_a_mapping() {
        let ctx = ctx();
        let adapter = DictAdapter::new();
        let err = adapter.update(&ctx, &HostValue::Int(1)).unwrap_err();
        assert_eq!(err, BridgeError::InvalidArgument("invalid argument".to_owned()));
        let err = adapter
            .update(&ctx, &HostValue::Foreign("module".to_owned()))
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidArgument("invalid argument for update()".to_owned())
        );
    }

    #[test]
    fn update_does_not_partially_merge_on_constraint_violation() {
        let ctx = ctx();
        let adapter = DictAdapter::with_content_type(&ctx, "int", None).unwrap();
        adapter.set_key(&ctx, "kept", Some(&HostValue::Int(0))).unwrap();

        let mut other = indexmap::IndexMap::new();
        other.insert("x".to_owned(), HostValue::Int(1));
        other.insert("bad".to_owned(), str_val("s"));
        let err = adapter.update(&ctx, &HostValue::Map(other)).unwrap_err();
        assert!(matches!(err, BridgeError::BadItem(_)));
        assert_eq!(adapter.keys(), vec!["kept"]);
        assert_eq!(adapter.get_key(&ctx, "kept").unwrap(), HostValue::Int(0));
    }
}
