use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ifc_core::{mixin, Callable, ClassType, Contract, ContractBuilder, Value};

/// Diamond-heavy hierarchy: `width` siblings over one shared root, each
/// adding a field and a default for it.
fn diamond(width: usize) -> Contract {
    let root = ContractBuilder::new("Root")
        .field("id")
        .own_default("id", Callable::constant(Value::Integer(0)))
        .method("describe", Callable::constant(Value::Null))
        .build()
        .expect("root declares");

    let mut bottom = ContractBuilder::new("Bottom");
    for i in 0..width {
        let name = format!("Side{}", i);
        let field = format!("f{}", i);
        let side = ContractBuilder::new(name)
            .extends(&root)
            .field(field.clone())
            .own_default(field, Callable::constant(Value::Integer(i as i64)))
            .build()
            .expect("side declares");
        bottom = bottom.extends(&side);
    }
    bottom.build().expect("bottom declares")
}

fn bench_mixin(c: &mut Criterion) {
    let contract = diamond(16);
    c.bench_function("mixin_diamond_16", |b| {
        b.iter(|| {
            let mut target = ClassType::new("Target");
            mixin(black_box(&contract), &mut target).expect("conforms");
            black_box(target.prototype().len())
        })
    });
}

criterion_group!(benches, bench_mixin);
criterion_main!(benches);
