//! Class registry for a reflection context

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{Class, ClassId};
use crate::error::{Result, WeavingError};

/// Classes defined against one reflection context
#[derive(Debug, Default)]
pub struct ClassRegistry {
    state: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Classes in definition order
    classes: Vec<Class>,
    /// Class name to most recently defined class id
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly defined class
    pub fn register(&self, class: Class) -> Result<ClassId> {
        let id = class.id();
        let mut state = self.state.write();
        if state.classes.iter().any(|c| c.id() == id) {
            return Err(WeavingError::ClassAlreadyDefined(class.name().to_string()).into());
        }
        state.name_to_id.insert(class.name().to_string(), id);
        state.classes.push(class);
        Ok(id)
    }

    /// Remove a class (used when its definition fails)
    pub fn remove(&self, id: ClassId) -> Option<Class> {
        let mut state = self.state.write();
        let index = state.classes.iter().position(|c| c.id() == id)?;
        let class = state.classes.remove(index);
        if state.name_to_id.get(class.name()) == Some(&id) {
            state.name_to_id.remove(class.name());
        }
        Some(class)
    }

    /// Get class by id
    pub fn get(&self, id: ClassId) -> Option<Class> {
        self.state
            .read()
            .classes
            .iter()
            .find(|c| c.id() == id)
            .cloned()
    }

    /// Get the most recently defined class with this name
    pub fn get_by_name(&self, name: &str) -> Option<Class> {
        let state = self.state.read();
        let id = state.name_to_id.get(name)?;
        state.classes.iter().find(|c| c.id() == *id).cloned()
    }

    /// All classes in definition order
    pub fn all(&self) -> Vec<Class> {
        self.state.read().classes.clone()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.state.read().classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.state.read().classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Class {
        Class::new(name.to_string(), None, vec![], vec![], None)
    }

    #[test]
    fn test_register_and_get() {
        let registry = ClassRegistry::new();
        let point = class("Point");
        let id = registry.register(point.clone()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).unwrap().ptr_eq(&point));
        assert!(registry.get_by_name("Point").unwrap().ptr_eq(&point));
        assert!(registry.get_by_name("Circle").is_none());
    }

    #[test]
    fn test_redefinition_shadows_name() {
        let registry = ClassRegistry::new();
        let first = class("Service");
        let second = class("Service");
        registry.register(first.clone()).unwrap();
        registry.register(second.clone()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get_by_name("Service").unwrap().ptr_eq(&second));
    }

    #[test]
    fn test_remove() {
        let registry = ClassRegistry::new();
        let point = class("Point");
        let id = registry.register(point.clone()).unwrap();
        assert!(registry.register(point).unwrap_err().is_weaving_error());

        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());
        assert!(registry.get_by_name("Point").is_none());
        assert!(registry.remove(id).is_none());
    }
}
