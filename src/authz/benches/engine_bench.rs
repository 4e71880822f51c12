//! Permission engine benchmarks
//!
//! Measures the hot path (cached role map) against a live rebuild per check,
//! and the full guard pipeline in front of a no-op handler.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tenancy_authz::{
    seed_defaults, EngineConfig, GuardPipeline, InMemoryStore, Membership, MembershipStore, Method,
    PermissionAction, PermissionCheck, PermissionEngine, PermissionResource, Principal, Repositories,
    RequestContext, Requirement, Role,
};
use tokio::runtime::Runtime;

fn build_engine(rt: &Runtime, enable_cache: bool, members: usize) -> Arc<PermissionEngine> {
    rt.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        seed_defaults(&*store).await.unwrap();
        for i in 0..members {
            let role = Role::ALL[i % Role::ALL.len()];
            store
                .save(Membership::new(format!("user-{}", i), "org-bench", role))
                .await
                .unwrap();
        }
        Arc::new(PermissionEngine::new(
            EngineConfig { enable_cache },
            Repositories::from_shared(store),
        ))
    })
}

fn bench_has_permission(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("has_permission");

    for enable_cache in [true, false] {
        let engine = build_engine(&rt, enable_cache, 100);
        let label = if enable_cache { "cached" } else { "uncached" };

        group.bench_function(BenchmarkId::new(label, 100), |b| {
            b.to_async(&rt).iter(|| {
                let engine = engine.clone();
                async move {
                    engine
                        .has_permission(
                            black_box("user-1"),
                            black_box("org-bench"),
                            PermissionResource::Task,
                            PermissionAction::Delete,
                        )
                        .await
                        .unwrap()
                }
            })
        });
    }

    group.finish();
}

fn bench_effective_permissions(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = build_engine(&rt, true, 10);

    c.bench_function("effective_permissions", |b| {
        b.to_async(&rt).iter(|| {
            let engine = engine.clone();
            async move { engine.effective_permissions(black_box("user-2"), "org-bench").await.unwrap() }
        })
    });
}

fn bench_guard_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = build_engine(&rt, true, 10);
    let pipeline = GuardPipeline::new(engine);
    let requirement = Requirement::any_permission([
        PermissionCheck::new(PermissionResource::Task, PermissionAction::Manage),
        PermissionCheck::new(PermissionResource::Task, PermissionAction::Delete),
    ]);

    c.bench_function("guard_pipeline_any_of", |b| {
        b.to_async(&rt).iter(|| {
            let pipeline = pipeline.clone();
            let requirement = requirement.clone();
            async move {
                let mut request = RequestContext::new(Method::Delete, "/tasks/t1")
                    .with_principal(Principal::new("user-1", "user-1@example.com"))
                    .with_path_param("organizationId", "org-bench");
                pipeline.authorize(&requirement, &mut request).await.unwrap();
                request
            }
        })
    });
}

criterion_group!(
    benches,
    bench_has_permission,
    bench_effective_permissions,
    bench_guard_pipeline
);
criterion_main!(benches);
