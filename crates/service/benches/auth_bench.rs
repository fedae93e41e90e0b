use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::access::{authorize, Action};
use service::auth::service::{AuthService, AuthConfig};
use service::auth::domain::{RegisterInput, LoginInput};
use service::store::memory::MemoryStore;
use models::user::Role;

fn bench_login(c: &mut Criterion) {
    let svc = AuthService::new(Arc::new(MemoryStore::default()), AuthConfig::default());

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _ = rt.block_on(svc.register(RegisterInput {
        email: "bench@example.com".into(),
        username: "bench".into(),
        password: "Benchmark1".into(),
        role: None,
        bio: None,
    }));

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let _ = rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
        });
    });
}

fn bench_authorize(c: &mut Criterion) {
    c.bench_function("access_authorize_all", |b| {
        b.iter(|| {
            for role in [Role::Student, Role::Instructor, Role::Admin] {
                for action in Action::ALL {
                    criterion::black_box(authorize(role, action));
                }
            }
        });
    });
}

criterion_group!(benches, bench_login, bench_authorize);
criterion_main!(benches);
