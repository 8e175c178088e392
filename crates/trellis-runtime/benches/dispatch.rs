use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::Value;
use trellis_runtime::{BehaviorBuilder, ClassBuilder, Component, Handler, Runtime};

fn bench_runtime() -> Runtime {
    let runtime = Runtime::new();
    runtime
        .register_class(
            ClassBuilder::new("widget")
                .field("width", 640i64)
                .field("height", 480i64)
                .getter("area", |obj| {
                    let w = obj.field_value("width").and_then(Value::as_int).unwrap_or(0);
                    let h = obj.field_value("height").and_then(Value::as_int).unwrap_or(0);
                    Ok(Value::Int(w * h))
                }),
        )
        .unwrap();
    runtime
        .register_behavior(BehaviorBuilder::new("tagging").field("tag", "benched"))
        .unwrap();
    runtime
}

fn widget(runtime: &Runtime) -> Component {
    runtime.create(&"widget".into()).unwrap()
}

fn bench_property_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("property");
    let runtime = bench_runtime();

    let mut by_field = widget(&runtime);
    group.bench_function("get_field", |b| {
        b.iter(|| by_field.get(black_box("width")).unwrap());
    });

    let mut by_getter = widget(&runtime);
    group.bench_function("get_accessor", |b| {
        b.iter(|| by_getter.get(black_box("area")).unwrap());
    });

    let mut delegated = widget(&runtime);
    delegated.attach_behavior("tagger", "tagging").unwrap();
    group.bench_function("get_delegated", |b| {
        b.iter(|| delegated.get(black_box("tag")).unwrap());
    });

    let mut writer = widget(&runtime);
    group.bench_function("set_field", |b| {
        b.iter(|| writer.set(black_box("width"), Value::Int(7)).unwrap());
    });

    group.finish();
}

fn bench_trigger(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigger");
    let runtime = bench_runtime();

    for &handlers in &[1usize, 4, 8, 16] {
        let mut emitter = widget(&runtime);
        for _ in 0..handlers {
            emitter
                .on_with(
                    "tick",
                    Handler::func(|event| {
                        black_box(&event.data);
                        Ok(())
                    }),
                    Value::Null,
                    true,
                )
                .unwrap();
        }
        group.bench_with_input(
            BenchmarkId::new("handlers", handlers),
            &handlers,
            |b, _| {
                b.iter(|| emitter.trigger(black_box("tick")).unwrap());
            },
        );
    }

    let mut silent = widget(&runtime);
    group.bench_function("no_handlers", |b| {
        b.iter(|| silent.trigger(black_box("tick")).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_property_access, bench_trigger);
criterion_main!(benches);
