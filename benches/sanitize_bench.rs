/// Sanitizer benchmarks
/// Measures value sanitization and the full middleware round trip
use axum::{body::Body, extract::Request, http::header, routing::post, Router};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nosql_sanitize::{create_sanitize_middleware, OptionResolver, PartialOptions, Sanitizer};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use tower::ServiceExt;

/// Object with `width` fields per level, `depth` levels deep.
fn nested_document(width: usize, depth: usize) -> Value {
    let mut fields = serde_json::Map::new();
    for i in 0..width {
        fields.insert(format!("$field.{}", i), json!(format!("value.{}$", i)));
    }
    fields.insert(
        "tags".to_string(),
        json!(["a.b", "$c", "d", "a.b", "user@example.com"]),
    );
    if depth > 0 {
        fields.insert("child".to_string(), nested_document(width, depth - 1));
    }
    Value::Object(fields)
}

fn value_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_value");
    group.measurement_time(Duration::from_secs(5));

    let defaults = OptionResolver::resolve(PartialOptions::new()).unwrap();
    let rich = OptionResolver::resolve(
        PartialOptions::new()
            .with_remove_matches(true)
            .with_remove_empty(true)
            .with_denied_keys(["password"]),
    )
    .unwrap();

    for (width, depth) in [(4, 2), (16, 4), (64, 8)] {
        let document = nested_document(width, depth);
        let size = serde_json::to_vec(&document).unwrap().len();
        group.throughput(Throughput::Bytes(size as u64));
        let id = format!("{}x{}", width, depth);

        group.bench_with_input(BenchmarkId::new("defaults", &id), &document, |b, doc| {
            let sanitizer = Sanitizer::new(&defaults);
            b.iter(|| sanitizer.sanitize(doc.clone()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("remove_matches", &id), &document, |b, doc| {
            let sanitizer = Sanitizer::new(&rich);
            b.iter(|| sanitizer.sanitize(doc.clone()).unwrap())
        });
    }

    group.finish();
}

fn middleware_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("middleware");

    let app = Router::new()
        .route("/users", post(|body: String| async move { body }))
        .layer(create_sanitize_middleware(PartialOptions::new()).unwrap());
    let body = serde_json::to_vec(&nested_document(16, 4)).unwrap();

    group.bench_function("json_body", |b| {
        b.to_async(&rt).iter(|| {
            let app = app.clone();
            let body = body.clone();
            async move {
                let request = Request::builder()
                    .method("POST")
                    .uri("/users?%24where=1&name=a.b")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap();
                app.oneshot(request).await.unwrap()
            }
        })
    });

    group.finish();
}

criterion_group!(benches, value_benchmarks, middleware_benchmarks);
criterion_main!(benches);
