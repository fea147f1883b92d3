//! Performance benchmarks for StudySpace core operations
//!
//! Run with: `cargo bench -p studyspace-core`
//!
//! These benchmarks measure critical path performance:
//! - Component creation through the workspace service
//! - Cascade deletes over a populated tree
//! - Full workspace load (1000 components)

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use studyspace_core::auth::OpenGate;
use studyspace_core::models::{ComponentType, Position};
use studyspace_core::store::LocalStore;
use studyspace_core::workspace::WorkspaceService;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Setup a loaded workspace over a fresh local store.
async fn setup_workspace() -> (WorkspaceService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp_dir.path().join("bench.json")));
    let mut service = WorkspaceService::new(store, Arc::new(OpenGate));
    service.load().await.unwrap();
    (service, temp_dir)
}

const LEAF_TYPES: [ComponentType; 4] = [
    ComponentType::Notes,
    ComponentType::Assignment,
    ComponentType::Test,
    ComponentType::Ai,
];

/// Seed `courses` trees, each with `parts` parts, `subjects` subjects per
/// part and `leaves` leaf components per subject. Returns the course ids.
async fn seed_tree(
    service: &mut WorkspaceService,
    courses: usize,
    parts: usize,
    subjects: usize,
    leaves: usize,
) -> Vec<String> {
    let mut course_ids = Vec::with_capacity(courses);
    for _ in 0..courses {
        let course = service
            .add_component(ComponentType::Course, None, Position::default())
            .await
            .unwrap();
        for _ in 0..parts {
            let part = service
                .add_component(ComponentType::Part, Some(&course.id), Position::default())
                .await
                .unwrap();
            for _ in 0..subjects {
                let subject = service
                    .add_component(ComponentType::Subject, Some(&part.id), Position::default())
                    .await
                    .unwrap();
                for leaf in 0..leaves {
                    service
                        .add_component(
                            LEAF_TYPES[leaf % LEAF_TYPES.len()],
                            Some(&subject.id),
                            Position::default(),
                        )
                        .await
                        .unwrap();
                }
            }
        }
        course_ids.push(course.id);
    }
    course_ids
}

/// Benchmark component creation through the full validate/persist/commit
/// path.
fn bench_component_creation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("add_component", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (mut service, _temp) = setup_workspace().await;

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    let course = service
                        .add_component(ComponentType::Course, None, Position::default())
                        .await
                        .unwrap();
                    black_box(course.id);
                }
                start.elapsed()
            })
        });
    });
}

/// Benchmark cascade delete of a course subtree (85 components), timing
/// the delete plus the reconcile reload it triggers.
fn bench_cascade_delete(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("cascade_delete");
    group.sample_size(10); // Fewer samples for expensive operations

    group.bench_function("85_component_subtree", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let mut total = std::time::Duration::ZERO;

                for _ in 0..iters {
                    let (mut service, _temp) = setup_workspace().await;
                    let course_ids = seed_tree(&mut service, 1, 4, 4, 4).await;

                    let start = std::time::Instant::now();
                    let receipt = service.delete_component(&course_ids[0]).await.unwrap();
                    total += start.elapsed();

                    black_box(receipt.count());
                }

                total
            })
        });
    });

    group.finish();
}

/// Benchmark a cold workspace load of 1000 persisted components,
/// including the children rebuild.
fn bench_workspace_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("workspace_load");
    group.sample_size(20);

    group.bench_function("1000_components", |b| {
        // Seed once; every iteration loads the same file fresh.
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bench.json");
        rt.block_on(async {
            let store = Arc::new(LocalStore::new(path.clone()));
            let mut service = WorkspaceService::new(store, Arc::new(OpenGate));
            service.load().await.unwrap();
            // 8 x (1 + 4 x (1 + 5 x (1 + 5))) = 1000
            seed_tree(&mut service, 8, 4, 5, 5).await;
            assert_eq!(service.len(), 1000);
        });

        b.iter_custom(|iters| {
            let path = path.clone();
            rt.block_on(async {
                let mut total = std::time::Duration::ZERO;

                for _ in 0..iters {
                    let store = Arc::new(LocalStore::new(path.clone()));
                    let mut service = WorkspaceService::new(store, Arc::new(OpenGate));

                    let start = std::time::Instant::now();
                    let count = service.load().await.unwrap();
                    total += start.elapsed();

                    black_box(count);
                }

                total
            })
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_component_creation,
    bench_cascade_delete,
    bench_workspace_load
);
criterion_main!(benches);
