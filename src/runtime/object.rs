//! Runtime objects and the metaclass registry.
//!
//! An object is an instance of a registered class. Classes form a single
//! inheritance chain; content-class constraints on dictionaries accept any
//! instance whose chain contains the constraint class.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::value::{GrtError, Value};

/// A registered object class. Held by `Arc` so instances can check their
/// inheritance chain without going back through the registry.
#[derive(Debug)]
pub struct ClassDef {
    name: String,
    parent: Option<Arc<ClassDef>>,
}

impl ClassDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if this class is `name` or inherits from it.
    pub fn is_a(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == name {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }
}

/// The catalog of registered object classes.
pub struct ClassRegistry {
    classes: FxHashMap<String, Arc<ClassDef>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry {
            classes: FxHashMap::default(),
        }
    }

    /// Registers `name`, optionally inheriting from an already registered
    /// parent. Re-registering a name replaces the prior definition.
    pub fn register(&mut self, name: &str, parent: Option<&str>) -> Result<Arc<ClassDef>, GrtError> {
        let parent = match parent {
            Some(parent_name) => Some(
                self.get(parent_name)
                    .ok_or_else(|| GrtError::UnknownClass(parent_name.to_owned()))?,
            ),
            None => None,
        };
        let class = Arc::new(ClassDef {
            name: name.to_owned(),
            parent,
        });
        self.classes.insert(name.to_owned(), class.clone());
        Ok(class)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.classes.get(name).cloned()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct ObjectStore {
    class: Arc<ClassDef>,
    properties: IndexMap<String, Value>,
}

/// Shared handle to an object instance.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<ObjectStore>>);

impl ObjectRef {
    pub fn new(class: Arc<ClassDef>) -> Self {
        ObjectRef(Arc::new(RwLock::new(ObjectStore {
            class,
            properties: IndexMap::new(),
        })))
    }

    fn read(&self) -> RwLockReadGuard<'_, ObjectStore> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn class_name(&self) -> String {
        self.read().class.name().to_owned()
    }

    pub fn is_a(&self, class_name: &str) -> bool {
        self.read().class.is_a(class_name)
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.read().properties.get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .properties
            .insert(name.to_owned(), value);
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn render(&self, seen: &mut Vec<usize>) -> serde_json::Value {
        let addr = Arc::as_ptr(&self.0) as usize;
        if seen.contains(&addr) {
            return serde_json::Value::String("...".to_owned());
        }
        seen.push(addr);
        let store = self.read();
        let mut map = serde_json::Map::new();
        map.insert(
            "__class__".to_owned(),
            serde_json::Value::String(store.class.name().to_owned()),
        );
        for (key, value) in store.properties.iter() {
            map.insert(key.clone(), value.render(seen));
        }
        seen.pop();
        serde_json::Value::Object(map)
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&mut Vec::new()))
    }
}
