use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use std::hint::black_box;
use webtrie::middleware::TracingMiddleware;
use webtrie::{HttpServer, RecordingSink, Router};

const ROUTES: &[(Method, &str)] = &[
    (Method::GET, "/"),
    (Method::GET, "/zoo/animals"),
    (Method::POST, "/zoo/animals"),
    (Method::GET, "/zoo/animals/:id"),
    (Method::PUT, "/zoo/animals/:id"),
    (Method::DELETE, "/zoo/animals/:id"),
    (Method::GET, "/zoo/animals/:id/toys/:toy_id([0-9]+)"),
    (Method::GET, "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id"),
    (Method::POST, "/inventory/:warehouse/feeds/:feed/items/:item/batches/:batch"),
    (Method::GET, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
    (Method::GET, "/static/*"),
];

fn zoo_router() -> Router<usize> {
    let mut router = Router::new();
    for (i, (method, path)) in ROUTES.iter().enumerate() {
        router
            .add_route(method.clone(), path, i)
            .expect("bench routes do not conflict");
    }
    router
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = zoo_router();
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
            (Method::GET, "/static/css/site/main.css"),
            (Method::GET, "/does/not/exist"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = router.find_route(method, path);
                black_box(&res);
            }
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut server = HttpServer::new(vec![TracingMiddleware.build()]);
    server
        .get("/zoo/animals/:id", |ctx| {
            let id = ctx.path_value("id").to_i64().unwrap_or(0);
            ctx.resp_body = id.to_string().into_bytes();
        })
        .expect("bench route registers");
    let service = server.into_service();
    c.bench_function("serve_param_route", |b| {
        b.iter(|| {
            let req = http::Request::get("/zoo/animals/42")
                .body(Vec::new())
                .expect("valid request");
            let mut sink = RecordingSink::new();
            service.serve(req, &mut sink);
            black_box(sink.body().len());
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_pipeline);
criterion_main!(benches);
