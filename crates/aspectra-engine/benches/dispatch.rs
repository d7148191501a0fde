use std::sync::Arc;

use aspectra_engine::{
    on, AdviceSet, Annotation, AnnotationFactory, AspectType, Class, ClassBuilder, MethodBuilder,
    ReflectContext, Value,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

struct Passthrough {
    annotation: Annotation,
    arounds: usize,
}

impl AspectType for Passthrough {
    fn register(self: Arc<Self>, advices: &mut AdviceSet) {
        let pointcut = || on::methods().with_annotations(&[&self.annotation]);
        advices.before(pointcut(), |_| Ok(()));
        for _ in 0..self.arounds {
            advices.around(pointcut(), |ctx| ctx.proceed());
        }
        advices.after_return(pointcut(), |_, value| Ok(value));
    }
}

fn adder(ctx: &ReflectContext, annotation: &Annotation) -> Class {
    ClassBuilder::new("Adder")
        .method(
            MethodBuilder::new("add", |_, args| {
                Ok(Value::Int(args.iter().filter_map(Value::as_int).sum()))
            })
            .annotate(annotation.bare()),
        )
        .define(ctx)
        .unwrap()
}

fn bench_unwoven(c: &mut Criterion) {
    let ctx = ReflectContext::new();
    let annotation = AnnotationFactory::new("bench").create("Traced");
    let instance = adder(&ctx, &annotation).instantiate(vec![]).unwrap();

    c.bench_function("call_unwoven", |b| {
        b.iter(|| {
            instance
                .call("add", black_box(vec![Value::Int(1), Value::Int(2)]))
                .unwrap()
        });
    });
}

fn bench_woven(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_woven");

    for arounds in [0usize, 1, 4, 16] {
        let ctx = ReflectContext::new();
        let annotation = AnnotationFactory::new("bench").create("Traced");
        ctx.weaver()
            .unwrap()
            .enable_aspect(Passthrough {
                annotation: annotation.clone(),
                arounds,
            })
            .unwrap();
        let instance = adder(&ctx, &annotation).instantiate(vec![]).unwrap();

        group.bench_with_input(BenchmarkId::new("arounds", arounds), &instance, |b, instance| {
            b.iter(|| {
                instance
                    .call("add", black_box(vec![Value::Int(1), Value::Int(2)]))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_define(c: &mut Criterion) {
    let ctx = ReflectContext::new();
    let annotation = AnnotationFactory::new("bench").create("Traced");
    ctx.weaver()
        .unwrap()
        .enable_aspect(Passthrough {
            annotation: annotation.clone(),
            arounds: 1,
        })
        .unwrap();

    c.bench_function("define_woven_class", |b| {
        b.iter(|| adder(black_box(&ctx), &annotation));
    });
}

criterion_group!(benches, bench_unwoven, bench_woven, bench_define);
criterion_main!(benches);
