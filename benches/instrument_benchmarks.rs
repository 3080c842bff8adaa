//! Performance benchmarks for the Instrumentation Engine.
//!
//! Measures `instrument()` throughput across handlees of increasing method
//! count, and the Handler Spec Analyzer's cost against interfaces of
//! increasing intercepted-method count.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use weave_core::{AccessFlags, ClassTree, MethodNode};
use weave_spec::analyze;

fn counter_interface(intercepted_methods: usize) -> ClassTree {
    let mut iface = ClassTree::new(
        "pkg/Counter",
        weave_core::AGENT_CAPABLE_BASELINE,
        AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT,
    );
    iface.methods.push(MethodNode::new("counter", "()Lpkg/Counter;", AccessFlags::PUBLIC | AccessFlags::ABSTRACT));
    iface.methods.push(MethodNode::new(
        "setCounter",
        "(Lpkg/Counter;)V",
        AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
    ));
    for i in 0..intercepted_methods {
        iface.methods.push(MethodNode::new(
            format!("tick{i}"),
            "(Lpkg/Counter;)V",
            AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
        ));
    }
    iface
}

fn handlee_for(intercepted_methods: usize) -> ClassTree {
    let mut handlee = ClassTree::new("pkg/Handlee", weave_core::AGENT_CAPABLE_BASELINE, AccessFlags::PUBLIC);
    for i in 0..intercepted_methods {
        handlee.methods.push(MethodNode::new(format!("tick{i}"), "()V", AccessFlags::PUBLIC));
    }
    handlee
}

fn analyzer_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("spec/analyze");
    for &count in &[1usize, 10, 50] {
        let iface = counter_interface(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("{count}_intercepted_methods"), |b| {
            b.iter(|| black_box(analyze(black_box(&iface), None, None).unwrap()));
        });
    }
    group.finish();
}

fn instrument_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/instrument");
    for &count in &[1usize, 10, 50] {
        let spec = analyze(&counter_interface(count), None, None).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("{count}_intercepted_methods"), |b| {
            b.iter(|| {
                let mut handlee = handlee_for(count);
                weave_engine::instrument(black_box(&mut handlee), black_box(&spec)).unwrap();
                black_box(handlee)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, analyzer_benchmarks, instrument_benchmarks);
criterion_main!(benches);
