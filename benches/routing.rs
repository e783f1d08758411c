use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_host::{Context, ControllerBase, HandlerResult, HostConfig, HttpHost, Method, Request, Router, ServiceCollection};

fn noop(_: &mut Context) -> HandlerResult<String> {
    Ok(String::new())
}

fn router_with(count: usize) -> Router {
    let mut router = Router::new();
    for i in 0..count {
        router
            .add_route(Method::GET, &format!("/resource{i}/{{id:int}}/items/{{item}}"), noop)
            .unwrap();
    }
    router
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_match");
    for count in [10usize, 100] {
        let router = router_with(count);
        let last = format!("/resource{}/42/items/widget", count - 1);

        group.bench_with_input(BenchmarkId::new("first", count), &router, |b, router| {
            b.iter(|| black_box(router.match_route(&Method::GET, "/resource0/42/items/widget")))
        });
        group.bench_with_input(BenchmarkId::new("last", count), &router, |b, router| {
            b.iter(|| black_box(router.match_route(&Method::GET, &last)))
        });
        group.bench_with_input(BenchmarkId::new("miss", count), &router, |b, router| {
            b.iter(|| black_box(router.match_route(&Method::GET, "/nothing/here")))
        });
    }
    group.finish();
}

fn bench_host_round_trip(c: &mut Criterion) {
    let mut host = HttpHost::new(ServiceCollection::new().build(), HostConfig::default());
    let mut api = ControllerBase::new("/api");
    api.get("/items/{id:int}", |ctx| Ok(ctx.param("id").unwrap_or_default().to_string()));
    host.add_routes(&api).unwrap();

    c.bench_function("host_handle_hit", |b| {
        b.iter(|| black_box(host.handle(Request::get("/api/items/7"))))
    });
    c.bench_function("host_handle_404", |b| {
        b.iter(|| black_box(host.handle(Request::get("/api/missing"))))
    });
}

criterion_group!(benches, bench_match, bench_host_round_trip);
criterion_main!(benches);
