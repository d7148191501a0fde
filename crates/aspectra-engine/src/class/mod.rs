//! Runtime classes and instances
//!
//! Classes are declared through [`ClassBuilder`] and defined against a
//! [`ReflectContext`](crate::reflect::ReflectContext). Definition is the
//! moment annotations are applied and weaving hooks run.
//!
//! Every callable member of a class (constructor, method, property getter,
//! property setter) lives in a slot keyed by [`MemberKey`]. A slot holds the
//! original implementation and the currently installed callable: the
//! original while the member is unwoven, the weaver's wrapper once woven.
//! Dispatch (`Instance::call`, `get`, `set`, `Class::instantiate`) always
//! goes through the installed callable.

mod builder;
mod registry;

pub use builder::{ClassBuilder, MethodBuilder, PropertyBuilder};
pub use registry::ClassRegistry;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Result, WeavingError};
use crate::value::Value;

/// Unique class identifier (unique across contexts)
pub type ClassId = usize;

/// A callable class member: receives `this` and the call arguments
pub type MemberFn = Arc<dyn Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync>;

/// A constructor body: initializes `this` from the constructor arguments
pub type ConstructorBody = Arc<dyn Fn(&Instance, &[Value]) -> Result<()> + Send + Sync>;

static NEXT_CLASS_ID: AtomicUsize = AtomicUsize::new(1);

/// Identifies a callable slot on a class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// The class constructor
    Constructor,
    /// A method by name
    Method(String),
    /// A property read by property name
    Getter(String),
    /// A property write by property name
    Setter(String),
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Constructor => write!(f, "constructor"),
            MemberKey::Method(name) => write!(f, "{}()", name),
            MemberKey::Getter(name) => write!(f, "get {}", name),
            MemberKey::Setter(name) => write!(f, "set {}", name),
        }
    }
}

/// A replacement callable produced by a factory hook
#[derive(Clone)]
pub struct Replacement {
    /// Slot to replace
    pub key: MemberKey,
    /// Callable to install
    pub member: MemberFn,
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacement").field("key", &self.key).finish()
    }
}

struct MemberSlot {
    original: MemberFn,
    current: MemberFn,
    replaced: bool,
}

impl MemberSlot {
    fn new(original: MemberFn) -> Self {
        Self {
            current: original.clone(),
            original,
            replaced: false,
        }
    }
}

/// Declared property with its default value
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Value assigned when an instance is allocated
    pub default: Value,
}

struct ClassInner {
    id: ClassId,
    name: Arc<str>,
    parent: Option<Class>,
    properties: Vec<PropertyDef>,
    method_names: Vec<String>,
    slots: RwLock<FxHashMap<MemberKey, MemberSlot>>,
}

/// Handle to a defined class
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    fn new(
        name: String,
        parent: Option<Class>,
        properties: Vec<PropertyDef>,
        methods: Vec<(String, MemberFn)>,
        constructor: Option<ConstructorBody>,
    ) -> Self {
        let mut slots = FxHashMap::default();

        let parent_for_ctor = parent.clone();
        let raw_constructor: MemberFn = Arc::new(move |this: &Instance, args: Vec<Value>| {
            if let Some(parent) = &parent_for_ctor {
                parent.constructor()(this, args.clone())?;
            }
            if let Some(body) = &constructor {
                body(this, &args)?;
            }
            Ok(Value::Instance(this.clone()))
        });
        slots.insert(MemberKey::Constructor, MemberSlot::new(raw_constructor));

        for property in &properties {
            let field = property.name.clone();
            let getter: MemberFn = Arc::new(move |this: &Instance, _args: Vec<Value>| {
                Ok(this.field(&field).unwrap_or_default())
            });
            let field = property.name.clone();
            let setter: MemberFn = Arc::new(move |this: &Instance, args: Vec<Value>| {
                this.set_field(&field, args.into_iter().next().unwrap_or_default());
                Ok(Value::Unit)
            });
            slots.insert(MemberKey::Getter(property.name.clone()), MemberSlot::new(getter));
            slots.insert(MemberKey::Setter(property.name.clone()), MemberSlot::new(setter));
        }

        let mut method_names = Vec::with_capacity(methods.len());
        for (name, body) in methods {
            slots.insert(MemberKey::Method(name.clone()), MemberSlot::new(body));
            method_names.push(name);
        }

        Self {
            inner: Arc::new(ClassInner {
                id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
                name: Arc::from(name),
                parent,
                properties,
                method_names,
                slots: RwLock::new(slots),
            }),
        }
    }

    /// Get the class id
    pub fn id(&self) -> ClassId {
        self.inner.id
    }

    /// Get the class name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.inner.name.clone()
    }

    /// Get the parent class
    pub fn parent(&self) -> Option<&Class> {
        self.inner.parent.as_ref()
    }

    /// Iterate over this class and its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent())
    }

    /// Check if this class is `other` or inherits from it
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class.ptr_eq(other))
    }

    /// Check handle identity
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Properties declared by this class (not inherited ones)
    pub fn properties(&self) -> &[PropertyDef] {
        &self.inner.properties
    }

    /// Method names declared by this class, in declaration order
    pub fn method_names(&self) -> &[String] {
        &self.inner.method_names
    }

    /// Check if this class declares a method
    pub fn has_method(&self, name: &str) -> bool {
        self.inner.method_names.iter().any(|m| m == name)
    }

    /// Check if this class declares a property
    pub fn has_property(&self, name: &str) -> bool {
        self.inner.properties.iter().any(|p| p.name == name)
    }

    /// Allocate a new instance and run its constructor
    pub fn instantiate(&self, args: Vec<Value>) -> Result<Instance> {
        let this = Instance::allocate(self.clone());
        match self.constructor()(&this, args)? {
            Value::Instance(instance) if instance.is_instance_of(self) => Ok(instance),
            _ => Err(WeavingError::ConstructorResult {
                class: self.name().to_string(),
            }
            .into()),
        }
    }

    /// Check if the slot installed for `key` has been replaced (woven)
    pub fn is_replaced(&self, key: &MemberKey) -> bool {
        self.inner
            .slots
            .read()
            .get(key)
            .is_some_and(|slot| slot.replaced)
    }

    pub(crate) fn constructor(&self) -> MemberFn {
        // Every class owns a constructor slot from construction onwards.
        self.slot(&MemberKey::Constructor)
            .unwrap_or_else(|| Arc::new(|this: &Instance, _: Vec<Value>| Ok(Value::Instance(this.clone()))))
    }

    /// Currently installed callable declared on this class
    pub(crate) fn slot(&self, key: &MemberKey) -> Option<MemberFn> {
        self.inner.slots.read().get(key).map(|slot| slot.current.clone())
    }

    /// Original implementation declared on this class
    pub(crate) fn original(&self, key: &MemberKey) -> Option<MemberFn> {
        self.inner
            .slots
            .read()
            .get(key)
            .map(|slot| slot.original.clone())
    }

    /// Resolve a member along the class chain
    pub(crate) fn resolve(&self, key: &MemberKey) -> Option<MemberFn> {
        self.ancestors().find_map(|class| class.slot(key))
    }

    /// Install a replacement callable; returns false if the slot does not exist
    pub(crate) fn install(&self, key: &MemberKey, member: MemberFn) -> bool {
        match self.inner.slots.write().get_mut(key) {
            Some(slot) => {
                slot.current = member;
                slot.replaced = true;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .finish()
    }
}

struct InstanceInner {
    class: Class,
    fields: RwLock<FxHashMap<String, Value>>,
}

/// Reference-counted class instance
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    fn allocate(class: Class) -> Self {
        let mut fields = FxHashMap::default();
        let chain: Vec<&Class> = class.ancestors().collect();
        for ancestor in chain.into_iter().rev() {
            for property in ancestor.properties() {
                fields.insert(property.name.clone(), property.default.clone());
            }
        }
        Self {
            inner: Arc::new(InstanceInner {
                class,
                fields: RwLock::new(fields),
            }),
        }
    }

    /// Get the instance's class
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// Check if this instance's class is `class` or inherits from it
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.inner.class.is_subclass_of(class)
    }

    /// Check handle identity
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call a method through its installed slot
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let key = MemberKey::Method(method.to_string());
        let member = self
            .inner
            .class
            .resolve(&key)
            .ok_or_else(|| WeavingError::UnknownMember {
                class: self.inner.class.name().to_string(),
                member: method.to_string(),
            })?;
        member(self, args)
    }

    /// Read a property through its installed getter
    ///
    /// Undeclared properties read the raw field, or [`Value::Unit`].
    pub fn get(&self, property: &str) -> Result<Value> {
        match self.inner.class.resolve(&MemberKey::Getter(property.to_string())) {
            Some(getter) => getter(self, Vec::new()),
            None => Ok(self.field(property).unwrap_or_default()),
        }
    }

    /// Write a property through its installed setter
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.inner.class.resolve(&MemberKey::Setter(property.to_string())) {
            Some(setter) => setter(self, vec![value]).map(|_| ()),
            None => {
                self.set_field(property, value);
                Ok(())
            }
        }
    }

    /// Read a raw field, bypassing property slots
    pub fn field(&self, name: &str) -> Option<Value> {
        self.inner.fields.read().get(name).cloned()
    }

    /// Write a raw field, bypassing property slots
    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        self.inner.fields.write().insert(name.to_string(), value.into());
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:p}",
            self.inner.class.name(),
            Arc::as_ptr(&self.inner)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_class() -> Class {
        Class::new(
            "Point".to_string(),
            None,
            vec![
                PropertyDef {
                    name: "x".to_string(),
                    default: Value::Int(0),
                },
                PropertyDef {
                    name: "y".to_string(),
                    default: Value::Int(0),
                },
            ],
            vec![(
                "sum".to_string(),
                Arc::new(|this: &Instance, _args: Vec<Value>| {
                    let x = this.get("x")?.as_int().unwrap_or(0);
                    let y = this.get("y")?.as_int().unwrap_or(0);
                    Ok(Value::Int(x + y))
                }) as MemberFn,
            )],
            Some(Arc::new(|this: &Instance, args: &[Value]| {
                if let Some(x) = args.first() {
                    this.set_field("x", x.clone());
                }
                if let Some(y) = args.get(1) {
                    this.set_field("y", y.clone());
                }
                Ok(())
            })),
        )
    }

    #[test]
    fn test_instantiate_and_call() {
        let point = point_class();
        let p = point.instantiate(vec![Value::Int(3), Value::Int(4)]).unwrap();

        assert!(p.is_instance_of(&point));
        assert_eq!(p.call("sum", vec![]).unwrap(), Value::Int(7));
        assert_eq!(p.get("x").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_unknown_method() {
        let point = point_class();
        let p = point.instantiate(vec![]).unwrap();
        let err = p.call("missing", vec![]).unwrap_err();
        assert!(err.is_weaving_error());
    }

    #[test]
    fn test_parent_constructor_runs_first() {
        let point = point_class();
        let point3d = Class::new(
            "Point3D".to_string(),
            Some(point.clone()),
            vec![PropertyDef {
                name: "z".to_string(),
                default: Value::Int(0),
            }],
            vec![],
            Some(Arc::new(|this: &Instance, args: &[Value]| {
                this.set_field("z", args.get(2).cloned().unwrap_or_default());
                Ok(())
            })),
        );

        let p = point3d
            .instantiate(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap();
        assert!(p.is_instance_of(&point));
        assert!(p.is_instance_of(&point3d));
        assert!(!point.is_subclass_of(&point3d));
        assert_eq!(p.call("sum", vec![]).unwrap(), Value::Int(3));
        assert_eq!(p.get("z").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_install_replaces_slot() {
        let point = point_class();
        let key = MemberKey::Method("sum".to_string());
        assert!(!point.is_replaced(&key));

        assert!(point.install(&key, Arc::new(|_: &Instance, _: Vec<Value>| Ok(Value::Int(-1)))));
        assert!(point.is_replaced(&key));

        let p = point.instantiate(vec![]).unwrap();
        assert_eq!(p.call("sum", vec![]).unwrap(), Value::Int(-1));
        assert!(!point.install(&MemberKey::Method("nope".to_string()), point.original(&key).unwrap()));
    }
}
