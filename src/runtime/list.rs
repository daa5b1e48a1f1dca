//! The runtime list store: a shared, ordered sequence of values.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use super::value::Value;

/// Shared handle to a list store.
#[derive(Clone)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    pub fn new() -> Self {
        ListRef(Arc::new(RwLock::new(Vec::new())))
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        ListRef(Arc::new(RwLock::new(values)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.read().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(value);
    }

    pub fn values(&self) -> Vec<Value> {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn render(&self, seen: &mut Vec<usize>) -> serde_json::Value {
        let addr = Arc::as_ptr(&self.0) as usize;
        if seen.contains(&addr) {
            return serde_json::Value::String("...".to_owned());
        }
        seen.push(addr);
        let rendered = self.read().iter().map(|v| v.render(seen)).collect();
        seen.pop();
        serde_json::Value::Array(rendered)
    }
}

impl Default for ListRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&mut Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_handle_sees_mutation() {
        let list = ListRef::new();
        let alias = list.clone();
        list.push(Value::Int(1));
        assert_eq!(alias.count(), 1);
        assert_eq!(alias.get(0), Some(Value::Int(1)));
        assert!(list.ptr_eq(&alias));
    }
}
