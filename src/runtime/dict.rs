//! The runtime dictionary store.
//!
//! A [`DictRef`] is a shared handle to an ordered mapping from string keys to
//! [`Value`]s. Insertion order is preserved and is the canonical iteration
//! order. A dictionary may constrain its content to a single value kind and,
//! for object content, to a named object class; a store that enforces a
//! constraint rejects offending values with [`GrtError::BadItem`] without
//! mutating anything.
//!
//! Every structural change (a key appearing or disappearing) bumps a
//! generation counter. Overwriting the value of an existing key does not
//! change the dictionary's shape and leaves the generation alone; cursors
//! remain meaningful across overwrites but not across structural changes.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::value::{GrtError, Type, Value};

struct DictStore {
    entries: IndexMap<String, Value>,
    content_type: Type,
    content_class: Option<String>,
    generation: u64,
}

/// Shared handle to a dictionary store. Cloning the handle shares the store;
/// mutation through any clone is visible to all of them.
#[derive(Clone)]
pub struct DictRef(Arc<RwLock<DictStore>>);

impl DictRef {
    /// Creates a fresh, unconstrained dictionary.
    pub fn new_untyped() -> Self {
        Self::with_store(Type::Any, None)
    }

    /// Creates a dictionary constrained to `content_type` (and, for object
    /// content, to `content_class`).
    pub fn new_typed(content_type: Type, content_class: Option<&str>) -> Self {
        Self::with_store(content_type, content_class.map(str::to_owned))
    }

    fn with_store(content_type: Type, content_class: Option<String>) -> Self {
        DictRef(Arc::new(RwLock::new(DictStore {
            entries: IndexMap::new(),
            content_type,
            content_class,
            generation: 0,
        })))
    }

    /// Casts a generic value to a dictionary handle.
    pub fn cast_from(value: Value) -> Result<DictRef, GrtError> {
        match value {
            Value::Dict(dict) => Ok(dict),
            other => Err(GrtError::TypeMismatch {
                expected: Type::Dict,
                actual: other.kind(),
            }),
        }
    }

    // Lock poisoning cannot corrupt the store (no invariant spans a write),
    // so a poisoned guard is recovered rather than propagated.
    fn read(&self) -> RwLockReadGuard<'_, DictStore> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DictStore> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.read().entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().entries.get(key).cloned()
    }

    /// Checks whether `value` satisfies the content constraint without
    /// storing it. `Unset` is storable in any dictionary.
    pub fn accepts(&self, value: &Value) -> Result<(), GrtError> {
        self.check(&self.read(), value)
    }

    fn check(&self, store: &DictStore, value: &Value) -> Result<(), GrtError> {
        if !value.is_valid() || store.content_type == Type::Any {
            return Ok(());
        }
        if value.kind() != store.content_type {
            return Err(GrtError::BadItem(format!(
                "attempt to insert invalid value into dict: expected a {} value, got {}",
                super::value::type_to_str(store.content_type),
                super::value::type_to_str(value.kind())
            )));
        }
        if let (Value::Object(object), Some(class)) = (value, store.content_class.as_deref()) {
            if !object.is_a(class) {
                return Err(GrtError::BadItem(format!(
                    "attempt to insert invalid value into dict: expected a {} object, got {}",
                    class,
                    object.class_name()
                )));
            }
        }
        Ok(())
    }

    /// Stores `value` under `key`, replacing any prior value. Fails without
    /// mutating if the value violates the content constraint.
    pub fn set(&self, key: &str, value: Value) -> Result<(), GrtError> {
        let mut store = self.write();
        self.check(&store, &value)?;
        let structural = !store.entries.contains_key(key);
        store.entries.insert(key.to_owned(), value);
        if structural {
            store.generation += 1;
        }
        Ok(())
    }

    /// Removes `key`. Removing a missing key is a no-op, not an error.
    pub fn remove(&self, key: &str) {
        let mut store = self.write();
        if store.entries.shift_remove(key).is_some() {
            store.generation += 1;
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The entry at position `index` in iteration order, if any.
    pub fn entry_at(&self, index: usize) -> Option<(String, Value)> {
        self.read()
            .entries
            .get_index(index)
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    pub fn content_type(&self) -> Type {
        self.read().content_type
    }

    /// The content class constraint, or an empty string if unconstrained.
    pub fn content_class_name(&self) -> String {
        self.read().content_class.clone().unwrap_or_default()
    }

    pub fn ptr_eq(&self, other: &DictRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn render(&self, seen: &mut Vec<usize>) -> serde_json::Value {
        let addr = Arc::as_ptr(&self.0) as usize;
        if seen.contains(&addr) {
            return serde_json::Value::String("...".to_owned());
        }
        seen.push(addr);
        let mut map = serde_json::Map::new();
        for (key, value) in self.read().entries.iter() {
            map.insert(key.clone(), value.render(seen));
        }
        seen.pop();
        serde_json::Value::Object(map)
    }

    /// Canonical string rendering of the whole dictionary.
    pub fn to_display_string(&self) -> String {
        self.render(&mut Vec::new()).to_string()
    }
}

impl std::fmt::Debug for DictRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object::ClassRegistry;

    #[test]
    fn insertion_order_is_iteration_order() {
        let dict = DictRef::new_untyped();
        dict.set("c", Value::Int(3)).unwrap();
        dict.set("a", Value::Int(1)).unwrap();
        dict.set("b", Value::Int(2)).unwrap();
        assert_eq!(dict.keys(), vec!["c", "a", "b"]);
        assert_eq!(dict.entry_at(1), Some(("a".to_owned(), Value::Int(1))));
    }

    #[test]
    fn overwrite_keeps_count_and_generation() {
        let dict = DictRef::new_untyped();
        dict.set("k", Value::Int(1)).unwrap();
        let generation = dict.generation();
        dict.set("k", Value::Int(2)).unwrap();
        assert_eq!(dict.count(), 1);
        assert_eq!(dict.generation(), generation);
        assert_eq!(dict.get("k"), Some(Value::Int(2)));
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let dict = DictRef::new_untyped();
        dict.set("k", Value::Int(1)).unwrap();
        let generation = dict.generation();
        dict.remove("absent");
        assert_eq!(dict.generation(), generation);
        dict.remove("k");
        assert_eq!(dict.count(), 0);
        assert!(dict.generation() > generation);
    }

    #[test]
    fn typed_dict_rejects_other_kinds() {
        let dict = DictRef::new_typed(Type::Int, None);
        dict.set("n", Value::Int(1)).unwrap();
        let err = dict.set("s", Value::string("nope")).unwrap_err();
        assert!(matches!(err, GrtError::BadItem(_)));
        // the failed set must not have touched the store
        assert_eq!(dict.count(), 1);
        // explicit unset is storable regardless of the constraint
        dict.set("empty", Value::Unset).unwrap();
    }

    #[test]
    fn object_dict_checks_class_constraint() {
        let mut registry = ClassRegistry::new();
        let base = registry.register("GrtObject", None).unwrap();
        let table = registry.register("db.Table", Some("GrtObject")).unwrap();
        let dict = DictRef::new_typed(Type::Object, Some("db.Table"));

        let err = dict
            .set("o", Value::Object(crate::runtime::object::ObjectRef::new(base)))
            .unwrap_err();
        assert!(matches!(err, GrtError::BadItem(_)));
        dict.set("t", Value::Object(crate::runtime::object::ObjectRef::new(table)))
            .unwrap();
        assert_eq!(dict.count(), 1);
    }

    #[test]
    fn cast_from_rejects_non_dicts() {
        let err = DictRef::cast_from(Value::Int(1)).unwrap_err();
        assert!(matches!(err, GrtError::TypeMismatch { .. }));
        let dict = DictRef::new_untyped();
        let cast = DictRef::cast_from(Value::Dict(dict.clone())).unwrap();
        assert!(cast.ptr_eq(&dict));
    }
}
