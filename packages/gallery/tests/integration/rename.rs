use crate::common::{MetaOp, StoreOp, TestApp, png_bytes};

const OLD: &str = "image/demo/old.png";
const OLD_THUMB: &str = "image/demo/old_thumb.png";
const NEW: &str = "image/demo/new.png";
const NEW_THUMB: &str = "image/demo/new_thumb.png";

async fn app_with_old_png() -> TestApp {
    let app = TestApp::spawn().await;
    app.pipeline
        .upload("demo", "old.png", &png_bytes(40, 20))
        .await
        .unwrap();
    assert!(app.exists(OLD_THUMB).await);
    app
}

mod rename_success {
    use super::*;

    #[tokio::test]
    async fn moves_original_and_thumbnail() {
        let app = app_with_old_png().await;
        let original = app.objects.get_object(OLD).await;

        let info = app.pipeline.rename(OLD, "new.png", "demo").await.unwrap();

        assert_eq!(info.name, "new.png");
        assert_eq!(info.path, NEW);
        assert_eq!(info.url, format!("https://cdn.test/{NEW}"));
        assert_eq!(info.thumbnail_url, format!("https://cdn.test/{NEW_THUMB}"));

        assert_eq!(app.objects.get_object(NEW).await, original);
        assert!(app.exists(NEW_THUMB).await);
        assert!(!app.exists(OLD).await);
        assert!(!app.exists(OLD_THUMB).await);

        let row = app.metadata.image_by_path(NEW).unwrap();
        assert_eq!(row.thumbnail_path.as_deref(), Some(NEW_THUMB));
        assert!(app.metadata.image_by_path(OLD).is_none());
    }

    #[tokio::test]
    async fn image_without_thumbnail_moves_alone() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "notes.png", b"plain bytes")
            .await
            .unwrap();

        let info = app
            .pipeline
            .rename("image/demo/notes.png", "memo.png", "demo")
            .await
            .unwrap();

        assert_eq!(info.path, "image/demo/memo.png");
        assert_eq!(info.thumbnail_url, "");
        assert_eq!(app.object_keys().await, vec!["image/demo/memo.png"]);
    }

    #[tokio::test]
    async fn same_name_returns_unchanged() {
        let app = app_with_old_png().await;
        let before = app.metadata.image_by_path(OLD).unwrap();

        let info = app.pipeline.rename(OLD, "old.png", "demo").await.unwrap();

        assert_eq!(info.path, OLD);
        assert_eq!(app.metadata.image_by_path(OLD).unwrap(), before);
        assert!(app.exists(OLD).await);
    }
}

mod rename_rollback {
    use super::*;

    #[tokio::test]
    async fn thumbnail_move_failure_restores_original() {
        let app = app_with_old_png().await;
        app.objects.fail(StoreOp::Copy, "old_thumb.png");

        let err = app.pipeline.rename(OLD, "new.png", "demo").await.unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert!(app.exists(OLD).await);
        assert!(app.exists(OLD_THUMB).await);
        assert!(!app.exists(NEW).await);
        assert!(!app.exists(NEW_THUMB).await);
        assert!(app.metadata.image_by_path(OLD).is_some());
    }

    #[tokio::test]
    async fn metadata_failure_restores_both_objects() {
        let app = app_with_old_png().await;
        app.metadata.fail(MetaOp::UpdateImage);

        let err = app.pipeline.rename(OLD, "new.png", "demo").await.unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert!(app.exists(OLD).await);
        assert!(app.exists(OLD_THUMB).await);
        assert!(!app.exists(NEW).await);
        assert!(!app.exists(NEW_THUMB).await);
        let row = app.metadata.image_by_path(OLD).unwrap();
        assert_eq!(row.name, "old.png");
        assert_eq!(row.thumbnail_path.as_deref(), Some(OLD_THUMB));
    }

    #[tokio::test]
    async fn failed_undo_reports_leftovers() {
        let app = app_with_old_png().await;
        app.metadata.fail(MetaOp::UpdateImage);
        app.objects.fail(StoreOp::Copy, "/new.png");

        let err = app.pipeline.rename(OLD, "new.png", "demo").await.unwrap_err();

        assert_eq!(err.code(), "CONSISTENCY_ROLLBACK_ERROR");
        assert!(err.to_string().ends_with(NEW));
        assert!(app.exists(NEW).await);
        assert!(!app.exists(OLD).await);
        assert!(app.exists(OLD_THUMB).await);
        assert!(!app.exists(NEW_THUMB).await);
    }
}

mod rename_validation {
    use super::*;

    #[tokio::test]
    async fn empty_or_invalid_name_is_rejected() {
        let app = app_with_old_png().await;
        for name in ["", "  ", "a/b.png", "new_thumb.png"] {
            let err = app.pipeline.rename(OLD, name, "demo").await.unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "name {name:?}");
        }
        assert!(app.exists(OLD).await);
    }

    #[tokio::test]
    async fn taken_name_is_rejected() {
        let app = app_with_old_png().await;
        app.pipeline
            .upload("demo", "new.png", &png_bytes(8, 8))
            .await
            .unwrap();
        let taken = app.objects.get_object(NEW).await;

        let err = app.pipeline.rename(OLD, "new.png", "demo").await.unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(app.exists(OLD).await);
        assert_eq!(app.objects.get_object(NEW).await, taken);
    }

    #[tokio::test]
    async fn unknown_path_or_foreign_workspace_is_not_found() {
        let app = app_with_old_png().await;
        app.create_workspace("other").await;

        let err = app
            .pipeline
            .rename("image/demo/ghost.png", "new.png", "demo")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = app.pipeline.rename(OLD, "new.png", "other").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(app.exists(OLD).await);
    }
}
