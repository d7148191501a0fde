//! Integration tests for aspect registration and replacement

use std::sync::Arc;

use aspectra_engine::{
    on, AdviceRegistry, AdviceSet, Annotation, AnnotationFactory, AspectError, AspectOptions,
    AspectRegistry, AspectType, ClassBuilder, DuplicateAspectPolicy, Error, MemberKey, MethodBuilder,
    ReflectContext, Value, WeaverConfig, WeavingError,
};
use parking_lot::Mutex;

/// Tags the return value of annotated methods
#[derive(Debug)]
struct Tagger {
    id: Option<&'static str>,
    tag: &'static str,
    annotation: Annotation,
}

impl Tagger {
    fn new(id: Option<&'static str>, tag: &'static str, annotation: &Annotation) -> Self {
        Self {
            id,
            tag,
            annotation: annotation.clone(),
        }
    }
}

impl AspectType for Tagger {
    fn options(&self) -> AspectOptions {
        match self.id {
            Some(id) => AspectOptions::new().id(id),
            None => AspectOptions::new(),
        }
    }

    fn register(self: Arc<Self>, advices: &mut AdviceSet) {
        let tag = self.tag;
        advices
            .after_return(on::methods().with_annotations(&[&self.annotation]), move |_, value| {
                Ok(Value::from(format!("{}+{}", value.as_str().unwrap_or_default(), tag)))
            })
            .named(format!("tag-{tag}"));
    }
}

fn tagged_class(ctx: &ReflectContext, annotation: &Annotation) -> aspectra_engine::Class {
    ClassBuilder::new("Tagged")
        .method(MethodBuilder::new("run", |_, _| Ok(Value::from("run"))).annotate(annotation.bare()))
        .define(ctx)
        .unwrap()
}

fn run(class: &aspectra_engine::Class) -> Value {
    class.instantiate(vec![]).unwrap().call("run", vec![]).unwrap()
}

#[test]
fn test_same_id_replaces_previous_aspect() {
    let ctx = ReflectContext::new();
    let tagged = AnnotationFactory::new("test").create("Tagged");
    let weaver = ctx.weaver().unwrap();

    weaver.enable_aspect(Tagger::new(Some("audit"), "v1", &tagged)).unwrap();
    let class = tagged_class(&ctx, &tagged);
    assert_eq!(run(&class), Value::from("run+v1"));

    weaver.enable_aspect(Tagger::new(Some("audit"), "v2", &tagged)).unwrap();
    assert_eq!(run(&class), Value::from("run+v2"));
    assert_eq!(weaver.advice_count(&class, &MemberKey::Method("run".to_string())), 1);

    let aspects = ctx.get::<AspectRegistry>().unwrap();
    assert_eq!(aspects.ids(), vec!["audit".to_string()]);
    let current = weaver.get_aspect::<Tagger>().unwrap();
    assert_eq!(current.tag, "v2");
}

#[test]
fn test_reject_policy_refuses_duplicate_ids() {
    let config = WeaverConfig {
        duplicate_aspects: DuplicateAspectPolicy::Reject,
        ..WeaverConfig::default()
    };
    let ctx = ReflectContext::with_config(config);
    let tagged = AnnotationFactory::new("test").create("Tagged");
    let weaver = ctx.weaver().unwrap();

    weaver.enable_aspect(Tagger::new(Some("audit"), "v1", &tagged)).unwrap();
    let err = weaver
        .enable_aspect(Tagger::new(Some("audit"), "v2", &tagged))
        .unwrap_err();
    assert_eq!(err, Error::Weaving(WeavingError::DuplicateAspect("audit".to_string())));

    let class = tagged_class(&ctx, &tagged);
    assert_eq!(run(&class), Value::from("run+v1"));
}

#[test]
fn test_distinct_instances_keep_their_advices() {
    let ctx = ReflectContext::new();
    let tagged = AnnotationFactory::new("test").create("Tagged");
    let weaver = ctx.weaver().unwrap();

    let first = weaver.enable_aspect(Tagger::new(None, "a", &tagged)).unwrap();
    let second = weaver.enable_aspect(Tagger::new(None, "b", &tagged)).unwrap();

    let advices = ctx.get::<AdviceRegistry>().unwrap();
    let of_first = advices.get_advices_by_aspect(&first).unwrap();
    let of_second = advices.get_advices_by_aspect(&second).unwrap();
    assert_eq!(of_first.len(), 1);
    assert_eq!(of_second.len(), 1);
    assert_ne!(of_first[0].id(), of_second[0].id());
    assert_eq!(of_first[0].name(), "tag-a");
    assert_ne!(of_first[0].aspect_id(), of_second[0].aspect_id());
    assert!(of_first[0].aspect_id().starts_with("Tagger#"));

    let class = tagged_class(&ctx, &tagged);
    assert_eq!(run(&class), Value::from("run+a+b"));
}

#[test]
fn test_enabling_same_instance_twice_is_a_no_op() {
    let ctx = ReflectContext::new();
    let tagged = AnnotationFactory::new("test").create("Tagged");
    let weaver = ctx.weaver().unwrap();

    let aspect: Arc<dyn AspectType> = Arc::new(Tagger::new(Some("once"), "x", &tagged));
    weaver.enable([aspect.clone()]).unwrap();
    weaver.enable([aspect]).unwrap();

    let class = tagged_class(&ctx, &tagged);
    assert_eq!(run(&class), Value::from("run+x"));
    assert_eq!(ctx.get::<AdviceRegistry>().unwrap().aspect_count(), 1);
}

#[test]
fn test_unknown_aspect_has_no_advices() {
    let ctx = ReflectContext::new();
    let tagged = AnnotationFactory::new("test").create("Tagged");
    let stray = Arc::new(Tagger::new(None, "stray", &tagged));

    let err = ctx
        .get::<AdviceRegistry>()
        .unwrap()
        .get_advices_by_aspect(&stray)
        .unwrap_err();
    assert!(matches!(err, Error::Aspect(AspectError::NotAnAspect(_))));
    assert!(ctx.weaver().unwrap().get_aspect::<Tagger>().is_none());
}

/// Records which advice ran, declared with explicit orders
struct Ordered {
    annotation: Annotation,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl AspectType for Ordered {
    fn options(&self) -> AspectOptions {
        AspectOptions::new().order(10)
    }

    fn register(self: Arc<Self>, advices: &mut AdviceSet) {
        let pointcut = || on::methods().with_annotations(&[&self.annotation]);

        let log = self.log.clone();
        advices.before(pointcut(), move |_| {
            log.lock().push("default");
            Ok(())
        });
        let log = self.log.clone();
        advices
            .before(pointcut(), move |_| {
                log.lock().push("first");
                Ok(())
            })
            .order(1);
        let log = self.log.clone();
        advices
            .before(pointcut(), move |_| {
                log.lock().push("last");
                Ok(())
            })
            .order(aspectra_engine::Order::LOWEST_PRECEDENCE);
    }
}

#[test]
fn test_advice_order_overrides_aspect_default() {
    let ctx = ReflectContext::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let tagged = AnnotationFactory::new("test").create("Tagged");
    ctx.weaver()
        .unwrap()
        .enable_aspect(Ordered {
            annotation: tagged.clone(),
            log: log.clone(),
        })
        .unwrap();

    let class = tagged_class(&ctx, &tagged);
    run(&class);
    assert_eq!(*log.lock(), vec!["first", "default", "last"]);
}
