//! Advice declaration

use std::sync::Arc;

use crate::advice::{
    next_sequence, Advice, AdviceContext, AdviceFn, AroundContext, CompileContext, Order,
};
use crate::error::{Error, Result};
use crate::pointcut::PointcutExpression;
use crate::value::Value;

struct Declared {
    name: Option<String>,
    pointcuts: Vec<PointcutExpression>,
    order: Option<Order>,
    func: AdviceFn,
}

/// Collects the advices an aspect declares
pub struct AdviceSet {
    aspect_id: Arc<str>,
    default_order: Order,
    declared: Vec<Declared>,
}

/// Handle on a just-declared advice
pub struct AdviceDeclaration<'s> {
    declared: &'s mut Declared,
}

impl AdviceDeclaration<'_> {
    /// Also match `expression`
    pub fn or(self, expression: PointcutExpression) -> Self {
        self.declared.pointcuts.push(expression);
        self
    }

    /// Set the advice order (lower runs first)
    pub fn order(self, order: impl Into<Order>) -> Self {
        self.declared.order = Some(order.into());
        self
    }

    /// Name the advice (used in logs and errors)
    pub fn named(self, name: impl Into<String>) -> Self {
        self.declared.name = Some(name.into());
        self
    }
}

impl AdviceSet {
    pub(crate) fn new(aspect_id: &str, default_order: Order) -> Self {
        Self {
            aspect_id: Arc::from(aspect_id),
            default_order,
            declared: Vec::new(),
        }
    }

    /// Id of the aspect being registered
    pub fn aspect_id(&self) -> &str {
        &self.aspect_id
    }

    /// Declare a compile advice
    pub fn compile<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&CompileContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::Compile(Arc::new(f)))
    }

    /// Declare a before advice
    pub fn before<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&AdviceContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::Before(Arc::new(f)))
    }

    /// Declare an around advice
    pub fn around<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&mut AroundContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::Around(Arc::new(f)))
    }

    /// Declare an afterReturn advice
    pub fn after_return<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&AdviceContext<'_>, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::AfterReturn(Arc::new(f)))
    }

    /// Declare an afterThrow advice
    pub fn after_throw<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&AdviceContext<'_>, Error) -> Result<Value> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::AfterThrow(Arc::new(f)))
    }

    /// Declare an after advice
    pub fn after<F>(&mut self, expression: PointcutExpression, f: F) -> AdviceDeclaration<'_>
    where
        F: Fn(&AdviceContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.push(expression, AdviceFn::After(Arc::new(f)))
    }

    /// Number of declared advices
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Check if nothing was declared
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    fn push(&mut self, expression: PointcutExpression, func: AdviceFn) -> AdviceDeclaration<'_> {
        self.declared.push(Declared {
            name: None,
            pointcuts: vec![expression],
            order: None,
            func,
        });
        let index = self.declared.len() - 1;
        AdviceDeclaration {
            declared: &mut self.declared[index],
        }
    }

    /// Turn declarations into advices, in declaration order
    pub(crate) fn build(self) -> Vec<Advice> {
        let AdviceSet {
            aspect_id,
            default_order,
            declared,
        } = self;
        declared
            .into_iter()
            .enumerate()
            .map(|(index, d)| {
                let name = d
                    .name
                    .unwrap_or_else(|| format!("{}.{}#{}", aspect_id, d.func.phase(), index));
                Advice::new(
                    aspect_id.clone(),
                    name,
                    d.pointcuts,
                    d.order.unwrap_or(default_order),
                    next_sequence(),
                    d.func,
                )
            })
            .collect()
    }
}
