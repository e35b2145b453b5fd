use ::common::storage::{ListFilter, list_workspace_objects};

use crate::common::{MetaOp, StoreOp, TestApp, png_bytes};

mod workspace_lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_writes_marker() {
        let app = TestApp::spawn().await;
        let info = app.workspaces.create("sketches").await.unwrap();

        assert_eq!(info.name, "sketches");
        assert!(!info.is_current);
        assert!(app.exists("image/sketches/.keep").await);
    }

    #[tokio::test]
    async fn duplicate_and_invalid_names_are_rejected() {
        let app = TestApp::spawn().await;
        for name in ["demo", "", "a/b", ".."] {
            let err = app.workspaces.create(name).await.unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "name {name:?}");
        }
        assert_eq!(app.metadata.workspaces().len(), 1);
    }

    #[tokio::test]
    async fn marker_failure_removes_row() {
        let app = TestApp::spawn().await;
        app.objects.fail(StoreOp::Put, "broken/.keep");

        let err = app.workspaces.create("broken").await.unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert!(app.metadata.workspaces().iter().all(|w| w.name != "broken"));
    }

    #[tokio::test]
    async fn marker_failure_with_failed_row_cleanup_is_reported() {
        let app = TestApp::spawn().await;
        app.objects.fail(StoreOp::Put, "broken/.keep");
        app.metadata.fail(MetaOp::DeleteWorkspace);

        let err = app.workspaces.create("broken").await.unwrap_err();

        assert_eq!(err.code(), "CONSISTENCY_ROLLBACK_ERROR");
        assert!(app.metadata.workspaces().iter().any(|w| w.name == "broken"));
    }

    #[tokio::test]
    async fn delete_removes_objects_and_rows() {
        let app = TestApp::spawn().await;
        app.create_workspace("trash").await;
        app.pipeline
            .upload("trash", "a.png", &png_bytes(8, 8))
            .await
            .unwrap();
        app.pipeline
            .upload("trash", "b.png", &png_bytes(8, 8))
            .await
            .unwrap();
        app.pipeline
            .upload("demo", "keep.png", &png_bytes(8, 8))
            .await
            .unwrap();

        app.workspaces.delete("trash").await.unwrap();

        let keys = app.objects.keys().await;
        assert!(keys.iter().all(|k| !k.starts_with("image/trash/")));
        assert!(keys.contains(&"image/demo/keep.png".to_string()));
        assert!(app.metadata.workspaces().iter().all(|w| w.name != "trash"));
        assert_eq!(app.metadata.images().len(), 1);

        let err = app.workspaces.delete("trash").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_stops_when_objects_cannot_be_removed() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "a.png", &png_bytes(8, 8))
            .await
            .unwrap();
        app.objects.fail(StoreOp::List, "image/demo/");

        let err = app.workspaces.delete("demo").await.unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert_eq!(app.metadata.workspaces().len(), 1);
        assert_eq!(app.metadata.images().len(), 1);
    }
}

mod current_workspace {
    use super::*;

    fn current_names(app: &TestApp) -> Vec<String> {
        app.metadata
            .workspaces()
            .into_iter()
            .filter(|w| w.is_current)
            .map(|w| w.name)
            .collect()
    }

    #[tokio::test]
    async fn at_most_one_workspace_is_current() {
        let app = TestApp::spawn().await;
        app.create_workspace("a").await;
        app.create_workspace("b").await;

        for name in ["a", "b", "demo", "b"] {
            app.workspaces.set_current(name).await.unwrap();
            assert_eq!(current_names(&app), vec![name.to_string()]);
        }

        let current = app.workspaces.current().await.unwrap();
        assert_eq!(current.workspace.unwrap().name, "b");
    }

    #[tokio::test]
    async fn switching_to_missing_workspace_keeps_previous() {
        let app = TestApp::spawn().await;

        let err = app.workspaces.set_current("missing").await.unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(current_names(&app), vec!["demo".to_string()]);
    }

    #[tokio::test]
    async fn list_puts_current_first() {
        let app = TestApp::spawn().await;
        app.create_workspace("later").await;

        let listed = app.workspaces.list().await.unwrap();
        let names: Vec<_> = listed.workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["demo", "later"]);
        assert!(listed.workspaces[0].is_current);
        assert!(listed.workspaces[0].created_at.ends_with('Z'));
    }
}

mod object_listing {
    use super::*;

    #[tokio::test]
    async fn originals_only_skips_marker_and_thumbnails() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "a.png", &png_bytes(8, 8))
            .await
            .unwrap();
        assert!(app.exists("image/demo/a_thumb.png").await);

        let originals = list_workspace_objects(
            app.objects.as_ref(),
            app.keys(),
            "demo",
            ListFilter::OriginalsOnly,
        )
        .await
        .unwrap();
        let keys: Vec<_> = originals.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["image/demo/a.png"]);

        let all = list_workspace_objects(app.objects.as_ref(), app.keys(), "demo", ListFilter::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
