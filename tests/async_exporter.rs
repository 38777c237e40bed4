#![cfg(feature = "dom")]
//! Integration tests for the worker-backed async facade

use domsnap::dom::DomHost;
use domsnap::{DocumentHost, Error, Exporter, ExporterConfig, SnapshotRequest};
use std::sync::Once;
use tiny_http::{Response, Server};

const RECAP_PAGE: &str =
    r#"<html><body><div id="recap">Watched 42 shows in 2024</div></body></html>"#;

static INIT: Once = Once::new();

fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18093").unwrap();
            for request in server.incoming_requests() {
                let _ = request.respond(Response::from_string(RECAP_PAGE));
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18093".to_string()
}

#[tokio::test]
async fn export_from_a_loaded_url() {
    let base_url = start_test_server();

    let exporter = Exporter::new(None).await.expect("create exporter");
    exporter.load_url(&base_url).await.expect("load url");
    exporter
        .export_element_as_image("recap", "anime_recap_2024.png")
        .await
        .expect("export failed");

    exporter.close().await.unwrap();
}

#[tokio::test]
async fn export_via_async_facade() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExporterConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let exporter = Exporter::new(Some(config)).await.expect("create exporter");
    exporter.set_content(RECAP_PAGE).await.expect("set content");
    exporter
        .export_element_as_image("recap", "anime_recap_2024.png")
        .await
        .expect("export failed");

    let bytes = std::fs::read(dir.path().join("anime_recap_2024.png")).expect("download missing");
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");

    exporter.close().await.unwrap();
}

#[tokio::test]
async fn missing_element_propagates_through_facade() {
    let exporter = Exporter::new(None).await.expect("create exporter");
    exporter
        .set_content("<html><body></body></html>")
        .await
        .unwrap();

    let err = exporter
        .export(SnapshotRequest::new("recap", "recap.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)));

    exporter.close().await.unwrap();
}

#[tokio::test]
async fn concurrent_exports_each_win_their_own_download() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExporterConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let exporter = Exporter::new(Some(config)).await.unwrap();
    exporter.set_content(RECAP_PAGE).await.unwrap();

    // Clones share the worker; commands serialize, downloads stay independent
    let a = exporter.clone();
    let b = exporter.clone();
    let (ra, rb) = tokio::join!(
        a.export_element_as_image("recap", "first.png"),
        b.export_element_as_image("recap", "second.png"),
    );
    ra.unwrap();
    rb.unwrap();

    assert!(dir.path().join("first.png").exists());
    assert!(dir.path().join("second.png").exists());

    exporter.close().await.unwrap();
}

#[tokio::test]
async fn with_backend_accepts_a_custom_factory() {
    let exporter = Exporter::with_backend(|| DomHost::new(ExporterConfig::default()))
        .await
        .expect("create exporter");

    exporter.set_content(RECAP_PAGE).await.unwrap();
    exporter
        .export_element_as_image("recap", "recap.png")
        .await
        .expect("export failed");

    exporter.close().await.unwrap();
}
