//! Tree Workflow Tests
//!
//! Exercises multi-level tree scenarios against `WorkspaceService`:
//! cascade deletes, structural consistency after mixed mutations,
//! failure injection at the adapter boundary, and export/import.

#[cfg(test)]
mod tree_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::auth::OpenGate;
    use crate::models::{
        Component, ComponentDraft, ComponentPatch, ComponentType, Position, ValidationError,
    };
    use crate::store::{ComponentStore, LocalStore, StoreDeleteReceipt, StoreError};
    use crate::workspace::{
        SelectionState, StoreState, WorkspaceError, WorkspaceExport, WorkspaceService,
    };

    /// Adapter double that fails on demand, delegating to a real
    /// `LocalStore` otherwise.
    struct FlakyStore {
        inner: LocalStore,
        fail_list: AtomicBool,
        fail_create: AtomicBool,
        fail_update: AtomicBool,
        fail_delete: AtomicBool,
    }

    impl FlakyStore {
        fn new(inner: LocalStore) -> Self {
            Self {
                inner,
                fail_list: AtomicBool::new(false),
                fail_create: AtomicBool::new(false),
                fail_update: AtomicBool::new(false),
                fail_delete: AtomicBool::new(false),
            }
        }

        fn injected() -> StoreError {
            StoreError::http(503, "injected backend failure")
        }
    }

    #[async_trait]
    impl ComponentStore for FlakyStore {
        async fn list(&self) -> Result<Vec<Component>, StoreError> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Self::injected());
            }
            self.inner.list().await
        }

        async fn create(&self, draft: ComponentDraft) -> Result<Component, StoreError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(Self::injected());
            }
            self.inner.create(draft).await
        }

        async fn update(&self, id: &str, patch: ComponentPatch) -> Result<Component, StoreError> {
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(Self::injected());
            }
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<StoreDeleteReceipt, StoreError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(Self::injected());
            }
            self.inner.delete(id).await
        }

        async fn delete_all(&self) -> Result<StoreDeleteReceipt, StoreError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(Self::injected());
            }
            self.inner.delete_all().await
        }
    }

    /// Helper to create a loaded service over a fresh local store.
    async fn create_test_service() -> (WorkspaceService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::new(temp_dir.path().join("workspace.json")));
        let mut service = WorkspaceService::new(store, Arc::new(OpenGate));
        service.load().await.unwrap();
        (service, temp_dir)
    }

    /// Helper to create a loaded service over a failure-injecting store.
    async fn create_flaky_service() -> (WorkspaceService, Arc<FlakyStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let flaky = Arc::new(FlakyStore::new(LocalStore::new(
            temp_dir.path().join("workspace.json"),
        )));
        let mut service = WorkspaceService::new(flaky.clone(), Arc::new(OpenGate));
        service.load().await.unwrap();
        (service, flaky, temp_dir)
    }

    /// Seed a course -> part -> subject -> notes chain, returning the ids
    /// top-down.
    async fn seed_chain(service: &mut WorkspaceService) -> (String, String, String, String) {
        let course = service
            .add_component(ComponentType::Course, None, Position::default())
            .await
            .unwrap();
        let part = service
            .add_component(ComponentType::Part, Some(&course.id), Position::default())
            .await
            .unwrap();
        let subject = service
            .add_component(ComponentType::Subject, Some(&part.id), Position::default())
            .await
            .unwrap();
        let notes = service
            .add_component(ComponentType::Notes, Some(&subject.id), Position::default())
            .await
            .unwrap();
        (course.id, part.id, subject.id, notes.id)
    }

    /// Structural invariants that must hold after any sequence of
    /// operations: parent/children pointers agree in both directions,
    /// roots are courses, and every edge satisfies the nesting rules.
    fn assert_consistent(service: &WorkspaceService) {
        for component in service.components() {
            match &component.parent_id {
                None => assert!(
                    component.component_type.is_root_allowed(),
                    "root component {} has non-root type {}",
                    component.id,
                    component.component_type
                ),
                Some(parent_id) => {
                    let parent = service
                        .get_component(parent_id)
                        .unwrap_or_else(|| panic!("parent {} missing from cache", parent_id));
                    assert!(
                        parent.children.contains(&component.id),
                        "parent {} does not list child {}",
                        parent.id,
                        component.id
                    );
                    assert!(
                        component
                            .component_type
                            .can_nest(Some(parent.component_type)),
                        "edge {} -> {} violates nesting rules",
                        parent.id,
                        component.id
                    );
                }
            }
            for child_id in &component.children {
                let child = service
                    .get_component(child_id)
                    .unwrap_or_else(|| panic!("child {} missing from cache", child_id));
                assert_eq!(
                    child.parent_id.as_deref(),
                    Some(component.id.as_str()),
                    "child {} does not point back at {}",
                    child_id,
                    component.id
                );
            }
        }
    }

    #[tokio::test]
    async fn test_full_workspace_workflow() {
        let (mut service, _temp) = create_test_service().await;

        // 1. Build the container levels
        let course = service
            .add_component(ComponentType::Course, None, Position::new(50.0, 50.0))
            .await
            .unwrap();
        let part = service
            .add_component(ComponentType::Part, Some(&course.id), Position::default())
            .await
            .unwrap();
        let subject = service
            .add_component(ComponentType::Subject, Some(&part.id), Position::default())
            .await
            .unwrap();

        // 2. Every leaf type nests under the subject
        for leaf in [
            ComponentType::Notes,
            ComponentType::Assignment,
            ComponentType::Test,
            ComponentType::Ai,
        ] {
            service
                .add_component(leaf, Some(&subject.id), Position::default())
                .await
                .unwrap();
        }

        assert_eq!(service.len(), 7);
        assert_eq!(service.get_children(&subject.id).len(), 4);
        assert_eq!(service.roots().len(), 1);
        assert_consistent(&service);

        // 3. A second course opens a second tree in the forest
        service
            .add_component(ComponentType::Course, None, Position::default())
            .await
            .unwrap();
        assert_eq!(service.roots().len(), 2);
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_entire_branch() {
        let (mut service, _temp) = create_test_service().await;
        let (course_id, part_id, subject_id, notes_id) = seed_chain(&mut service).await;

        let receipt = service.delete_component(&part_id).await.unwrap();

        assert_eq!(receipt.count(), 3);
        assert!(receipt.deleted_ids.contains(&part_id));
        assert!(receipt.deleted_ids.contains(&subject_id));
        assert!(receipt.deleted_ids.contains(&notes_id));

        assert_eq!(service.len(), 1);
        assert!(service.get_component(&part_id).is_none());
        assert!(service.get_component(&subject_id).is_none());
        assert!(service.get_component(&notes_id).is_none());
        assert!(service
            .get_component(&course_id)
            .unwrap()
            .children
            .is_empty());
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_cascade_delete_leaves_siblings_alone() {
        let (mut service, _temp) = create_test_service().await;

        let course = service
            .add_component(ComponentType::Course, None, Position::default())
            .await
            .unwrap();
        let part_a = service
            .add_component(ComponentType::Part, Some(&course.id), Position::default())
            .await
            .unwrap();
        let part_b = service
            .add_component(ComponentType::Part, Some(&course.id), Position::default())
            .await
            .unwrap();
        let subject_a = service
            .add_component(ComponentType::Subject, Some(&part_a.id), Position::default())
            .await
            .unwrap();

        let receipt = service.delete_component(&part_a.id).await.unwrap();

        assert_eq!(receipt.count(), 2);
        assert!(service.get_component(&subject_a.id).is_none());
        assert!(service.get_component(&part_b.id).is_some());
        let children = service.get_component(&course.id).unwrap().children.clone();
        assert!(!children.contains(&part_a.id));
        assert!(children.contains(&part_b.id));
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found() {
        let (mut service, _temp) = create_test_service().await;
        let result = service.delete_component("ghost").await;
        assert!(matches!(
            result,
            Err(WorkspaceError::NotFound { id }) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cache_unchanged() {
        let (mut service, flaky, _temp) = create_flaky_service().await;
        let (_, _, subject_id, _) = seed_chain(&mut service).await;
        let before = service.len();

        flaky.fail_create.store(true, Ordering::SeqCst);
        let result = service
            .add_component(
                ComponentType::Assignment,
                Some(&subject_id),
                Position::default(),
            )
            .await;

        assert!(matches!(result, Err(WorkspaceError::Persistence { .. })));
        assert_eq!(service.len(), before);
        assert_eq!(service.state(), StoreState::Ready);
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_last_known_good() {
        let (mut service, flaky, _temp) = create_flaky_service().await;
        let (course_id, _, _, _) = seed_chain(&mut service).await;

        flaky.fail_update.store(true, Ordering::SeqCst);
        let result = service
            .update_component(
                &course_id,
                ComponentPatch {
                    title: Some("Doomed".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(WorkspaceError::Persistence { .. })));
        assert_eq!(
            service.get_component(&course_id).unwrap().title,
            "New Course"
        );
        assert_eq!(service.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_subtree() {
        let (mut service, flaky, _temp) = create_flaky_service().await;
        let (_, part_id, subject_id, notes_id) = seed_chain(&mut service).await;

        flaky.fail_delete.store(true, Ordering::SeqCst);
        let result = service.delete_component(&part_id).await;

        assert!(matches!(result, Err(WorkspaceError::Persistence { .. })));
        assert_eq!(service.len(), 4);
        assert!(service.get_component(&subject_id).is_some());
        assert!(service.get_component(&notes_id).is_some());
        assert_eq!(service.state(), StoreState::Ready);
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_load_failure_preserves_previous_snapshot() {
        let (mut service, flaky, _temp) = create_flaky_service().await;
        seed_chain(&mut service).await;
        assert_eq!(service.len(), 4);

        flaky.fail_list.store(true, Ordering::SeqCst);
        let result = service.load().await;

        assert!(matches!(result, Err(WorkspaceError::Persistence { .. })));
        assert_eq!(service.len(), 4);
        assert_eq!(service.state(), StoreState::Ready);
        assert_consistent(&service);
    }

    #[tokio::test]
    async fn test_reload_rebuilds_children_from_parent_pointers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.json");

        let store = Arc::new(LocalStore::new(path.clone()));
        let mut service = WorkspaceService::new(store, Arc::new(OpenGate));
        service.load().await.unwrap();
        let (course_id, part_id, _, _) = seed_chain(&mut service).await;

        // A second service over the same file sees the same tree.
        let store2 = Arc::new(LocalStore::new(path));
        let mut second = WorkspaceService::new(store2, Arc::new(OpenGate));
        let count = second.load().await.unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            second.get_component(&course_id).unwrap().children,
            vec![part_id]
        );
        assert_consistent(&second);
    }

    #[tokio::test]
    async fn test_clear_empties_workspace() {
        let (mut service, _temp) = create_test_service().await;
        seed_chain(&mut service).await;

        let receipt = service.clear().await.unwrap();

        assert_eq!(receipt.count(), 4);
        assert!(service.is_empty());
        assert_eq!(service.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let (mut service, _temp) = create_test_service().await;
        let (course_id, part_id, subject_id, notes_id) = seed_chain(&mut service).await;
        service
            .update_component(
                &notes_id,
                ComponentPatch {
                    title: Some("Week 1 Notes".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let export = service.export_workspace();
        assert_eq!(export.component_count, 4);

        let target_dir = TempDir::new().unwrap();
        let target_store = Arc::new(LocalStore::new(target_dir.path().join("workspace.json")));
        let mut target = WorkspaceService::new(target_store, Arc::new(OpenGate));
        target.load().await.unwrap();

        let report = target.import_workspace(export).await.unwrap();

        assert_eq!(report.imported_count, 4);
        assert_eq!(target.len(), 4);

        // Structure carries over under adapter-assigned ids.
        let new_course = &report.id_map[&course_id];
        let new_part = &report.id_map[&part_id];
        let new_subject = &report.id_map[&subject_id];
        let new_notes = &report.id_map[&notes_id];
        assert_ne!(new_notes, &notes_id);

        assert_eq!(
            target.get_component(new_part).unwrap().parent_id.as_deref(),
            Some(new_course.as_str())
        );
        assert_eq!(
            target
                .get_component(new_notes)
                .unwrap()
                .parent_id
                .as_deref(),
            Some(new_subject.as_str())
        );
        assert_eq!(
            target.get_component(new_notes).unwrap().title,
            "Week 1 Notes"
        );
        assert_consistent(&target);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_payloads() {
        let (mut service, _temp) = create_test_service().await;

        // Non-course at the root
        let stray = Component::new(ComponentType::Subject, "Stray", None);
        let result = service
            .import_workspace(WorkspaceExport {
                export_date: Utc::now(),
                component_count: 1,
                components: vec![stray],
            })
            .await;
        assert!(matches!(result, Err(WorkspaceError::ImportRejected { .. })));
        assert!(service.is_empty());

        // Parent id that never resolves inside the payload
        let orphan = Component::new(ComponentType::Part, "Orphan", Some("elsewhere".to_string()));
        let result = service
            .import_workspace(WorkspaceExport {
                export_date: Utc::now(),
                component_count: 1,
                components: vec![orphan],
            })
            .await;
        assert!(matches!(result, Err(WorkspaceError::ImportRejected { .. })));
        assert!(service.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_titles_the_update_path_rejects() {
        let (mut service, _temp) = create_test_service().await;

        // Titles over the cap fail the same field rules updates go through.
        let oversized = Component::new(ComponentType::Course, "x".repeat(300), None);
        let result = service
            .import_workspace(WorkspaceExport {
                export_date: Utc::now(),
                component_count: 1,
                components: vec![oversized],
            })
            .await;
        assert!(matches!(result, Err(WorkspaceError::ImportRejected { .. })));
        assert!(service.is_empty());

        let blank = Component::new(ComponentType::Course, "   ", None);
        let result = service
            .import_workspace(WorkspaceExport {
                export_date: Utc::now(),
                component_count: 1,
                components: vec![blank],
            })
            .await;
        assert!(matches!(result, Err(WorkspaceError::ImportRejected { .. })));
        assert!(service.is_empty());

        // The update path agrees on the cap.
        let course = service
            .add_component(ComponentType::Course, None, Position::default())
            .await
            .unwrap();
        let result = service
            .update_component(
                &course.id,
                ComponentPatch {
                    title: Some("x".repeat(300)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(WorkspaceError::Validation(ValidationError::TitleTooLong(300)))
        ));
    }

    #[tokio::test]
    async fn test_selection_pruned_after_cascade_delete() {
        let (mut service, _temp) = create_test_service().await;
        let (course_id, part_id, subject_id, _) = seed_chain(&mut service).await;

        let mut selection = SelectionState::new();
        selection.enter_context(subject_id.clone());
        selection.select(subject_id.clone());

        service.delete_component(&part_id).await.unwrap();
        selection.retain_existing(&service);

        assert!(selection.selected().is_empty());
        assert_eq!(selection.context(), None);

        // Surviving ids stay selected.
        selection.select(course_id.clone());
        selection.retain_existing(&service);
        assert!(selection.is_selected(&course_id));
    }
}
