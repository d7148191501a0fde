//! Advice definitions

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AdviceContext, AroundContext, CompileContext, Order};
use crate::annotation::{AnnotationContext, AnnotationRegistry, AnnotationTarget};
use crate::class::{Class, MemberKey};
use crate::error::{Error, Result};
use crate::pointcut::{Pointcut, PointcutExpression, PointcutPhase};
use crate::value::Value;

/// Unique advice identifier
pub type AdviceId = usize;

/// Validates a target when the advice is first attached to it
pub type CompileFn = Arc<dyn Fn(&CompileContext<'_>) -> Result<()> + Send + Sync>;
/// Runs before the call
pub type BeforeFn = Arc<dyn Fn(&AdviceContext<'_>) -> Result<()> + Send + Sync>;
/// Wraps the call; proceeds through the context's joinpoint
pub type AroundFn = Arc<dyn Fn(&mut AroundContext<'_>) -> Result<Value> + Send + Sync>;
/// Receives the returned value and returns the value to pass on
pub type AfterReturnFn = Arc<dyn Fn(&AdviceContext<'_>, Value) -> Result<Value> + Send + Sync>;
/// Receives the error; `Ok` swallows it, `Err` rethrows or replaces it
pub type AfterThrowFn = Arc<dyn Fn(&AdviceContext<'_>, Error) -> Result<Value> + Send + Sync>;
/// Runs after the call, whatever its outcome
pub type AfterFn = Arc<dyn Fn(&AdviceContext<'_>) -> Result<()> + Send + Sync>;

static NEXT_ADVICE_ID: AtomicUsize = AtomicUsize::new(1);
static NEXT_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

/// Global declaration sequence, used to break order ties
pub(crate) fn next_sequence() -> usize {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Advice callback, by phase
#[derive(Clone)]
pub enum AdviceFn {
    /// Compile phase
    Compile(CompileFn),
    /// Before phase
    Before(BeforeFn),
    /// Around phase
    Around(AroundFn),
    /// AfterReturn phase
    AfterReturn(AfterReturnFn),
    /// AfterThrow phase
    AfterThrow(AfterThrowFn),
    /// After phase
    After(AfterFn),
}

impl AdviceFn {
    /// Phase this callback runs in
    pub fn phase(&self) -> PointcutPhase {
        match self {
            AdviceFn::Compile(_) => PointcutPhase::Compile,
            AdviceFn::Before(_) => PointcutPhase::Before,
            AdviceFn::Around(_) => PointcutPhase::Around,
            AdviceFn::AfterReturn(_) => PointcutPhase::AfterReturn,
            AdviceFn::AfterThrow(_) => PointcutPhase::AfterThrow,
            AdviceFn::After(_) => PointcutPhase::After,
        }
    }
}

struct AdviceInner {
    id: AdviceId,
    aspect_id: Arc<str>,
    name: String,
    pointcuts: Vec<Pointcut>,
    order: Order,
    sequence: usize,
    func: AdviceFn,
}

/// An advice declared by an aspect
#[derive(Clone)]
pub struct Advice {
    inner: Arc<AdviceInner>,
}

impl Advice {
    pub(crate) fn new(
        aspect_id: Arc<str>,
        name: String,
        pointcuts: Vec<PointcutExpression>,
        order: Order,
        sequence: usize,
        func: AdviceFn,
    ) -> Self {
        let phase = func.phase();
        let pointcuts = pointcuts
            .into_iter()
            .map(|expression| Pointcut::new(phase, expression))
            .collect();
        Self {
            inner: Arc::new(AdviceInner {
                id: NEXT_ADVICE_ID.fetch_add(1, Ordering::Relaxed),
                aspect_id,
                name,
                pointcuts,
                order,
                sequence,
                func,
            }),
        }
    }

    /// Advice id
    pub fn id(&self) -> AdviceId {
        self.inner.id
    }

    /// Id of the declaring aspect
    pub fn aspect_id(&self) -> &str {
        &self.inner.aspect_id
    }

    /// Advice name (`<aspect>.<phase>#<n>` unless named)
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Phase
    pub fn phase(&self) -> PointcutPhase {
        self.inner.func.phase()
    }

    /// Pointcuts (OR-ed), all in this advice's phase
    pub fn pointcuts(&self) -> &[Pointcut] {
        &self.inner.pointcuts
    }

    /// Precedence
    pub fn order(&self) -> Order {
        self.inner.order
    }

    /// Declaration sequence
    pub fn sequence(&self) -> usize {
        self.inner.sequence
    }

    pub(crate) fn func(&self) -> &AdviceFn {
        &self.inner.func
    }

    /// Run order: phase, then order, then declaration sequence
    pub fn cmp_precedence(&self, other: &Advice) -> CmpOrdering {
        self.phase()
            .cmp(&other.phase())
            .then(self.order().cmp(&other.order()))
            .then(self.sequence().cmp(&other.sequence()))
    }

    /// Members of `class` this advice intercepts because of `target`
    ///
    /// Each entry carries the annotation contexts that made it match.
    pub fn bindings(
        &self,
        registry: &AnnotationRegistry,
        class: &Class,
        target: &AnnotationTarget,
    ) -> Vec<(MemberKey, Vec<AnnotationContext>)> {
        let mut found: Vec<(MemberKey, Vec<AnnotationContext>)> = Vec::new();
        for Pointcut { expression, .. } in &self.inner.pointcuts {
            let Some(key) = expression.kind().member_key(target) else {
                continue;
            };
            let matched = expression.matches(registry, class, target);
            if matched.is_empty() {
                continue;
            }
            let entry = match found.iter().position(|(k, _)| *k == key) {
                Some(index) => &mut found[index].1,
                None => {
                    found.push((key, Vec::new()));
                    let last = found.len() - 1;
                    &mut found[last].1
                }
            };
            for context in matched {
                if !entry.contains(&context) {
                    entry.push(context);
                }
            }
        }
        found
    }
}

impl PartialEq for Advice {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Advice {}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advice")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("phase", &self.phase())
            .field("order", &self.inner.order)
            .finish()
    }
}

/// An advice attached to a member, with the annotations that matched
#[derive(Debug, Clone)]
pub struct AdviceBinding {
    /// Attached advice
    pub advice: Advice,
    /// Target that triggered the attachment
    pub target: AnnotationTarget,
    /// Matching annotation contexts
    pub annotations: Vec<AnnotationContext>,
}
