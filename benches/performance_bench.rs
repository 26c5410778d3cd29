//! 性能基准测试
//! 使用criterion进行性能测试

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marketcore::{domain::Role, infrastructure::jwt, infrastructure::validation, metrics};

fn bench_metrics_rendering(c: &mut Criterion) {
    c.bench_function("render_prometheus_metrics", |b| {
        b.iter(|| {
            // 模拟一些指标
            metrics::count_ok("bench_endpoint");
            metrics::count_err("bench_endpoint");
            black_box(metrics::render_prometheus())
        })
    });
}

fn bench_metrics_counting(c: &mut Criterion) {
    c.bench_function("count_metrics", |b| {
        b.iter(|| {
            metrics::count_ok(black_box("test_endpoint"));
            metrics::count_err(black_box("test_endpoint"));
        })
    });
}

/// slug生成在商品/店铺创建路径上
fn bench_slugify(c: &mut Criterion) {
    c.bench_function("slugify_product_name", |b| {
        b.iter(|| {
            black_box(validation::slugify(black_box(
                "Cafeteira Elétrica Programável 110V Edição Especial",
            )))
        })
    });
}

/// JWT签发+校验，认证链每个请求都要过一次校验
fn bench_jwt_roundtrip(c: &mut Criterion) {
    std::env::set_var("JWT_SECRET", "bench_secret_key_for_jwt_signing_0123456789");
    let user_id = uuid::Uuid::new_v4();

    c.bench_function("jwt_generate", |b| {
        b.iter(|| black_box(jwt::generate_token(user_id, "bench@example.com", Role::Buyer).unwrap()))
    });

    let token = jwt::generate_token(user_id, "bench@example.com", Role::Buyer).unwrap();
    c.bench_function("jwt_verify", |b| {
        b.iter(|| black_box(jwt::verify_token(black_box(&token)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_metrics_rendering,
    bench_metrics_counting,
    bench_slugify,
    bench_jwt_roundtrip
);
criterion_main!(benches);
