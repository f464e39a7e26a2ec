use brrtbridge::bridge::DispatchBridge;
use brrtbridge::codec::JsonCodec;
use brrtbridge::config::BridgeConfig;
use brrtbridge::dispatcher::{DispatcherRegistry, ResourceDispatcher};
use brrtbridge::greeter::{register_greeter_resources, HelloReply, HelloRequest, SAY_HELLO};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn greeter_registry() -> Arc<DispatcherRegistry> {
    let mut resources = ResourceDispatcher::new();
    register_greeter_resources(&mut resources).expect("failed to register resources");
    let registry = Arc::new(DispatcherRegistry::new());
    registry
        .bind("greeter", Arc::new(resources))
        .expect("failed to bind dispatcher");
    registry
}

fn greeter_config() -> BridgeConfig {
    BridgeConfig::builder()
        .dispatcher("greeter")
        .method(SAY_HELLO)
        .build()
        .expect("failed to build config")
}

fn bench_bridge_throughput(c: &mut Criterion) {
    let request = HelloRequest {
        name: "benchmark".into(),
    };

    let protobuf = DispatchBridge::new(greeter_config(), greeter_registry());
    c.bench_function("say_hello_protobuf", |b| {
        b.iter(|| {
            let reply: Result<HelloReply, _> = protobuf.invoke(SAY_HELLO, black_box(&request));
            black_box(&reply);
        })
    });

    let json = DispatchBridge::with_codec(greeter_config(), greeter_registry(), JsonCodec);
    c.bench_function("say_hello_json", |b| {
        b.iter(|| {
            let reply: Result<HelloReply, _> = json.invoke(SAY_HELLO, black_box(&request));
            black_box(&reply);
        })
    });

    c.bench_function("resolve_declared_method", |b| {
        let config = greeter_config();
        b.iter(|| {
            let route = config.resolve(black_box("/helloworld.Greeter/SayHello"));
            black_box(&route);
        })
    });
}

criterion_group!(benches, bench_bridge_throughput);
criterion_main!(benches);
