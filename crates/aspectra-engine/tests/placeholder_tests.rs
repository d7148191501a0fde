//! Integration tests for the `abstract` placeholder

use std::sync::Arc;

use aspectra_engine::{
    abstract_value, on, AdviceSet, Annotation, AnnotationFactory, AspectError, AspectType,
    ClassBuilder, Error, MethodBuilder, ReflectContext, Value, WeaverConfig,
};

/// Implements annotated methods from their template
struct Implement {
    annotation: Annotation,
}

impl AspectType for Implement {
    fn register(self: Arc<Self>, advices: &mut AdviceSet) {
        advices.around(on::methods().with_annotations(&[&self.annotation]), |ctx| {
            let placeholder = ctx.proceed()?;
            assert!(placeholder.is_abstract());
            let mut items = placeholder.into_template().as_list().map(<[Value]>::to_vec).unwrap_or_default();
            items.push(Value::from("filled"));
            Ok(Value::List(items))
        });
    }
}

fn find_all(ctx: &ReflectContext, annotation: Option<&Annotation>) -> aspectra_engine::Result<Value> {
    let mut method = MethodBuilder::new("findAll", |_, _| abstract_value(Value::List(vec![])));
    if let Some(annotation) = annotation {
        method = method.annotate(annotation.bare());
    }
    let class = ClassBuilder::new("Repository").method(method).define(ctx)?;
    class.instantiate(vec![])?.call("findAll", vec![])
}

#[test]
fn test_woven_placeholder_is_replaced() {
    let ctx = ReflectContext::new();
    let query = AnnotationFactory::new("orm").create("Query");
    ctx.weaver()
        .unwrap()
        .enable_aspect(Implement {
            annotation: query.clone(),
        })
        .unwrap();

    let value = find_all(&ctx, Some(&query)).unwrap();
    assert_eq!(value, Value::List(vec![Value::from("filled")]));
}

#[test]
fn test_unwoven_placeholder_fails() {
    let ctx = ReflectContext::new();
    let err = find_all(&ctx, None).unwrap_err();
    assert_eq!(err, Error::Aspect(AspectError::AbstractPlaceholder));
    assert_eq!(
        err.to_string(),
        "aspect error: \"abstract()\" placeholder should only be used as a return value."
    );
}

#[test]
fn test_placeholder_used_twice_fails() {
    let ctx = ReflectContext::new();
    let query = AnnotationFactory::new("orm").create("Query");
    ctx.weaver()
        .unwrap()
        .enable_aspect(Implement {
            annotation: query.clone(),
        })
        .unwrap();

    let class = ClassBuilder::new("Greedy")
        .method(
            MethodBuilder::new("twice", |_, _| {
                let first = abstract_value(1)?;
                let _second = abstract_value(2)?;
                Ok(first)
            })
            .annotate(query.bare()),
        )
        .define(&ctx)
        .unwrap();

    let err = class.instantiate(vec![]).unwrap().call("twice", vec![]).unwrap_err();
    assert_eq!(err, Error::Aspect(AspectError::AbstractPlaceholder));
}

#[test]
fn test_placeholder_must_be_returned() {
    let query = AnnotationFactory::new("orm").create("Query");
    let define = |ctx: &ReflectContext| {
        ClassBuilder::new("Leaky")
            .method(
                MethodBuilder::new("leak", |_, _| {
                    let _ = abstract_value(0)?;
                    Ok(Value::Int(7))
                })
                .annotate(query.bare()),
            )
            .define(ctx)
            .unwrap()
    };

    // Any advice weaves the member; a before advice leaves the result alone.
    struct Observe(Annotation);
    impl AspectType for Observe {
        fn register(self: Arc<Self>, advices: &mut AdviceSet) {
            advices.before(on::methods().with_annotations(&[&self.0]), |_| Ok(()));
        }
    }

    let strict = ReflectContext::new();
    strict.weaver().unwrap().enable_aspect(Observe(query.clone())).unwrap();
    let err = define(&strict).instantiate(vec![]).unwrap().call("leak", vec![]).unwrap_err();
    assert_eq!(err, Error::Aspect(AspectError::AbstractPlaceholder));

    let lenient = ReflectContext::with_config(WeaverConfig {
        verify_abstract_return: false,
        ..WeaverConfig::default()
    });
    lenient.weaver().unwrap().enable_aspect(Observe(query.clone())).unwrap();
    let value = define(&lenient).instantiate(vec![]).unwrap().call("leak", vec![]).unwrap();
    assert_eq!(value, Value::Int(7));
}
