//! Class declaration
//!
//! A [`ClassBuilder`] is the explicit registration call site for a class and
//! the annotations placed on it, its members and its method parameters.
//! `define` creates the class, applies every annotation in declaration order
//! (parameters, then their method, member by member, then the class itself)
//! and runs the class-defined hooks.

use std::sync::Arc;

use super::{Class, ConstructorBody, Instance, MemberFn, PropertyDef};
use crate::annotation::{apply_annotation, AnnotationApplication, AnnotationRegistry, AnnotationTarget};
use crate::class::ClassRegistry;
use crate::error::Result;
use crate::reflect::ReflectContext;
use crate::value::Value;

/// Declares a method and the annotations on it and its parameters
pub struct MethodBuilder {
    name: String,
    body: MemberFn,
    annotations: Vec<AnnotationApplication>,
    parameters: Vec<(usize, AnnotationApplication)>,
}

impl MethodBuilder {
    /// Create a method with its body
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
            annotations: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Annotate the method
    pub fn annotate(mut self, application: AnnotationApplication) -> Self {
        self.annotations.push(application);
        self
    }

    /// Annotate the parameter at `index`
    pub fn annotate_parameter(mut self, index: usize, application: AnnotationApplication) -> Self {
        self.parameters.push((index, application));
        self
    }
}

/// Declares a property, its default value and its annotations
pub struct PropertyBuilder {
    name: String,
    default: Value,
    annotations: Vec<AnnotationApplication>,
}

impl PropertyBuilder {
    /// Create a property defaulting to [`Value::Unit`]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Value::Unit,
            annotations: Vec::new(),
        }
    }

    /// Set the default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Annotate the property
    pub fn annotate(mut self, application: AnnotationApplication) -> Self {
        self.annotations.push(application);
        self
    }
}

/// Declares a class
pub struct ClassBuilder {
    name: String,
    parent: Option<Class>,
    annotations: Vec<AnnotationApplication>,
    constructor: Option<ConstructorBody>,
    properties: Vec<PropertyBuilder>,
    methods: Vec<MethodBuilder>,
}

impl ClassBuilder {
    /// Start declaring a class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            annotations: Vec::new(),
            constructor: None,
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Inherit from a defined class
    pub fn extends(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Annotate the class
    pub fn annotate(mut self, application: AnnotationApplication) -> Self {
        self.annotations.push(application);
        self
    }

    /// Set the constructor body (runs after the parent constructor)
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(body));
        self
    }

    /// Declare a property
    pub fn property(mut self, property: PropertyBuilder) -> Self {
        self.properties.push(property);
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Define the class against a reflection context
    ///
    /// Applies every annotation, giving factory hooks (and so the weaver) a
    /// chance to replace members. If any annotation or hook fails, the class
    /// is discarded and the error is returned.
    pub fn define(self, ctx: &ReflectContext) -> Result<Class> {
        let ClassBuilder {
            name,
            parent,
            annotations,
            constructor,
            properties,
            methods,
        } = self;

        let mut property_defs = Vec::with_capacity(properties.len());
        let mut property_annotations = Vec::with_capacity(properties.len());
        for property in properties {
            property_annotations.push((property.name.clone(), property.annotations));
            property_defs.push(PropertyDef {
                name: property.name,
                default: property.default,
            });
        }

        let mut bodies = Vec::with_capacity(methods.len());
        let mut method_annotations = Vec::with_capacity(methods.len());
        for method in methods {
            method_annotations.push((method.name.clone(), method.annotations, method.parameters));
            bodies.push((method.name, method.body));
        }

        let class = Class::new(name, parent, property_defs, bodies, constructor);

        let mut pending: Vec<(AnnotationTarget, AnnotationApplication)> = Vec::new();
        for (property, applications) in property_annotations {
            let target = AnnotationTarget::property(&class, &property);
            pending.extend(applications.into_iter().map(|a| (target.clone(), a)));
        }
        for (method, applications, mut parameters) in method_annotations {
            parameters.sort_by_key(|(index, _)| *index);
            for (index, application) in parameters {
                pending.push((AnnotationTarget::parameter(&class, &method, index), application));
            }
            let target = AnnotationTarget::method(&class, &method);
            pending.extend(applications.into_iter().map(|a| (target.clone(), a)));
        }
        let target = AnnotationTarget::class(&class);
        pending.extend(annotations.into_iter().map(|a| (target.clone(), a)));

        let classes = ctx.get::<ClassRegistry>()?;
        classes.register(class.clone())?;

        if let Err(err) = Self::apply_all(ctx, &class, pending) {
            classes.remove(class.id());
            if let Ok(registry) = ctx.get::<AnnotationRegistry>() {
                registry.remove_class(class.id());
            }
            for hook in ctx.factory_hooks() {
                hook.on_class_discarded(ctx, &class);
            }
            return Err(err);
        }

        tracing::debug!(class = %class.name(), id = class.id(), "class defined");
        Ok(class)
    }

    fn apply_all(
        ctx: &ReflectContext,
        class: &Class,
        pending: Vec<(AnnotationTarget, AnnotationApplication)>,
    ) -> Result<()> {
        for (target, application) in &pending {
            apply_annotation(ctx, class, target, application)?;
        }
        for hook in ctx.factory_hooks() {
            hook.on_class_defined(ctx, class)?;
        }
        Ok(())
    }
}
