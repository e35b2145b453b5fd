use crate::common::{BASE_URL, MetaOp, StoreOp, TestApp, dimensions, jpeg_bytes, png_bytes};

mod upload_success {
    use super::*;

    #[tokio::test]
    async fn jpeg_upload_derives_scaled_thumbnail() {
        let app = TestApp::spawn().await;

        let res = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(200, 100))
            .await
            .unwrap();

        assert_eq!(res.path, "image/demo/cat.jpg");
        assert_eq!(res.url, format!("{BASE_URL}/image/demo/cat.jpg"));

        let thumb = app.objects.get_object("image/demo/cat_thumb.jpg").await;
        assert_eq!(dimensions(&thumb), (100, 50));

        let row = app.metadata.image_by_path("image/demo/cat.jpg").unwrap();
        assert_eq!(row.name, "cat.jpg");
        assert_eq!(row.source_type, "upload");
        assert_eq!(row.mime_type, "image/jpeg");
        assert_eq!(row.thumbnail_path.as_deref(), Some("image/demo/cat_thumb.jpg"));
        assert_eq!(
            row.thumbnail_url.as_deref(),
            Some("https://cdn.test/image/demo/cat_thumb.jpg")
        );
        assert!(row.prompt.is_none());
    }

    #[tokio::test]
    async fn png_thumbnail_stays_png() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "tall.png", &png_bytes(50, 200))
            .await
            .unwrap();

        let thumb = app.objects.get_object("image/demo/tall_thumb.png").await;
        assert!(thumb.starts_with(b"\x89PNG"));
        assert_eq!(dimensions(&thumb), (25, 100));
    }

    #[tokio::test]
    async fn undecodable_bytes_upload_without_thumbnail() {
        let app = TestApp::spawn().await;
        let res = app
            .pipeline
            .upload("demo", "notes.png", b"not an image")
            .await
            .unwrap();

        assert!(app.exists(&res.path).await);
        assert!(!app.exists("image/demo/notes_thumb.png").await);
        let row = app.metadata.image_by_path(&res.path).unwrap();
        assert!(row.thumbnail_path.is_none());
        assert_eq!(row.size, 12);

        let listed = app.pipeline.list("demo").await.unwrap();
        assert_eq!(listed.images[0].thumbnail_url, "");
    }

    #[tokio::test]
    async fn thumbnail_write_failure_is_not_fatal() {
        let app = TestApp::spawn().await;
        app.objects.fail(StoreOp::Put, "_thumb");

        let res = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(200, 100))
            .await
            .unwrap();

        assert!(app.exists(&res.path).await);
        assert!(app.metadata.image_by_path(&res.path).unwrap().thumbnail_path.is_none());
    }

    #[tokio::test]
    async fn unknown_extension_defaults_to_jpeg_mime() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "scan", &jpeg_bytes(10, 10))
            .await
            .unwrap();

        let row = app.metadata.image_by_path("image/demo/scan").unwrap();
        assert_eq!(row.mime_type, "image/jpeg");
        assert_eq!(row.thumbnail_path.as_deref(), Some("image/demo/scan_thumb"));
    }
}

mod upload_failures {
    use super::*;

    #[tokio::test]
    async fn metadata_failure_removes_written_objects() {
        let app = TestApp::spawn().await;
        app.metadata.fail(MetaOp::CreateImage);

        let err = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(200, 100))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert!(app.object_keys().await.is_empty());
        assert!(app.metadata.images().is_empty());
        assert!(!app.exists("image/demo/cat.jpg").await);
    }

    #[tokio::test]
    async fn failed_cleanup_reports_leftovers() {
        let app = TestApp::spawn().await;
        app.metadata.fail(MetaOp::CreateImage);
        app.objects.fail(StoreOp::Delete, "cat.jpg");

        let err = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(200, 100))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "CONSISTENCY_ROLLBACK_ERROR");
        assert!(err.to_string().contains("image/demo/cat.jpg"));
        assert_eq!(app.object_keys().await, vec!["image/demo/cat.jpg"]);
        assert!(app.metadata.images().is_empty());
    }

    #[tokio::test]
    async fn original_write_failure_writes_nothing() {
        let app = TestApp::spawn().await;
        app.objects.fail(StoreOp::Put, "cat.jpg");

        let err = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(20, 10))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "STORE_WRITE_ERROR");
        assert!(app.object_keys().await.is_empty());
        assert!(app.metadata.images().is_empty());
    }

    #[tokio::test]
    async fn unknown_workspace_is_not_found() {
        let app = TestApp::spawn().await;
        let err = app
            .pipeline
            .upload("missing", "cat.jpg", &jpeg_bytes(20, 10))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert!(app.object_keys().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_names_are_rejected() {
        let app = TestApp::spawn().await;
        for name in ["", "sub/cat.jpg", "..", "cat_thumb.jpg", ".keep"] {
            let err = app
                .pipeline
                .upload("demo", name, &jpeg_bytes(20, 10))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "name {name:?}");
        }
        assert!(app.object_keys().await.is_empty());
    }

    #[tokio::test]
    async fn existing_name_is_not_overwritten() {
        let app = TestApp::spawn().await;
        let first = jpeg_bytes(20, 10);
        app.pipeline.upload("demo", "cat.jpg", &first).await.unwrap();

        let err = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(40, 40))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(app.objects.get_object("image/demo/cat.jpg").await, first);
        assert_eq!(app.metadata.images().len(), 1);
    }

    #[tokio::test]
    async fn losing_a_concurrent_upload_keeps_the_winners_objects() {
        let app = TestApp::spawn().await;
        app.metadata.race_next_create();

        let err = app
            .pipeline
            .upload("demo", "cat.jpg", &jpeg_bytes(200, 100))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        let winner = app.metadata.image_by_path("image/demo/cat.jpg").unwrap();
        assert_eq!(app.metadata.images().len(), 1);
        assert!(app.exists(&winner.object_path).await);
        assert!(app.exists(winner.thumbnail_path.as_deref().unwrap()).await);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn newest_first_without_heavy_fields() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "first.png", &png_bytes(8, 8))
            .await
            .unwrap();
        app.pipeline
            .upload("demo", "second.png", &png_bytes(8, 8))
            .await
            .unwrap();

        let listed = app.pipeline.list("demo").await.unwrap();
        let names: Vec<_> = listed.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["second.png", "first.png"]);

        let first = &listed.images[1];
        assert_eq!(first.path, "image/demo/first.png");
        assert_eq!(first.source_type, "upload");
        assert!(first.updated.ends_with('Z'));
        assert!(first.prompt.is_none());
        assert!(first.message_list.is_none());
    }

    #[tokio::test]
    async fn listing_is_scoped_to_workspace() {
        let app = TestApp::spawn().await;
        app.create_workspace("other").await;
        app.pipeline
            .upload("other", "a.png", &png_bytes(8, 8))
            .await
            .unwrap();

        assert!(app.pipeline.list("demo").await.unwrap().images.is_empty());
        assert_eq!(app.pipeline.list("other").await.unwrap().images.len(), 1);
        assert_eq!(
            app.pipeline.list("nope").await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn detail_includes_empty_history_for_uploads() {
        let app = TestApp::spawn().await;
        app.pipeline
            .upload("demo", "a.png", &png_bytes(8, 8))
            .await
            .unwrap();
        let row = app.metadata.image_by_path("image/demo/a.png").unwrap();

        let detail = app.pipeline.image_detail(row.id).await.unwrap();
        assert_eq!(detail.ref_images, Some(vec![]));
        assert_eq!(detail.message_list, Some(vec![]));
        assert_eq!(
            app.pipeline.image_detail(row.id + 1000).await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }
}
