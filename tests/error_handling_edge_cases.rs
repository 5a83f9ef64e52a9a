//! Error handling and edge case testing
//!
//! Failure classification at the image boundaries (load vs. access),
//! configuration validation and degenerate inputs.

use designs4u::{
    config::{OutputFormat, RemovalConfig, UploadConfig},
    error::{Result, StoreError},
    processor::{BackgroundRemovalProcessor, ImageSource},
    services::{prepare_for_upload, upload_image, ImageIOService, LocalObjectStore, ObjectStore},
};
use image::{DynamicImage, RgbaImage};
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve a single canned HTTP response and return the address
async fn serve_once(status_line: &'static str, body: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        }
    });

    addr
}

#[tokio::test]
async fn test_forbidden_remote_image_is_access_error() {
    let addr = serve_once("403 Forbidden", b"").await;
    let url = format!("http://{addr}/private.png");

    let err = ImageIOService::fetch_remote(&url).await.unwrap_err();
    assert!(matches!(err, StoreError::Access(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unauthorized_remote_image_is_access_error() {
    let addr = serve_once("401 Unauthorized", b"").await;
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();

    let err = processor
        .process_source(&ImageSource::Url(format!("http://{addr}/a.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Access(_)), "got {err:?}");
}

#[tokio::test]
async fn test_missing_remote_image_is_load_error() {
    let addr = serve_once("404 Not Found", b"").await;

    let err = ImageIOService::fetch_remote(&format!("http://{addr}/gone.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Load(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_host_is_load_error() {
    // Bind and drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let err = ImageIOService::fetch_remote(&format!("http://{addr}/a.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Load(_)), "got {err:?}");
}

#[tokio::test]
async fn test_remote_body_that_is_not_an_image_is_load_error() {
    let addr = serve_once("200 OK", b"<html>not an image</html>").await;
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();

    let err = processor
        .process_source(&ImageSource::Url(format!("http://{addr}/a.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Load(_)), "got {err:?}");
}

#[test]
fn test_missing_file_is_load_error() {
    let temp = TempDir::new().unwrap();
    let err = ImageIOService::load_image(temp.path().join("nope.png")).unwrap_err();
    assert!(matches!(err, StoreError::Load(_)), "got {err:?}");
}

#[test]
fn test_garbage_bytes_are_load_errors() {
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
    assert!(matches!(
        processor.process_bytes(b"").unwrap_err(),
        StoreError::Load(_)
    ));
    assert!(matches!(
        processor.process_bytes(&[0x89, b'P', b'N', b'G', 0, 0]).unwrap_err(),
        StoreError::Load(_)
    ));
}

#[test]
fn test_raw_buffer_length_mismatch_is_access_error() {
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();
    let err = processor
        .process_rgba_buffer(4, 4, vec![0u8; 4 * 4 * 3])
        .unwrap_err();
    assert!(matches!(err, StoreError::Access(_)), "got {err:?}");
}

#[test]
fn test_zero_area_image_is_returned_unchanged() -> Result<()> {
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default())?;
    let result = processor.process_image(&DynamicImage::ImageRgba8(RgbaImage::new(0, 7)))?;

    assert_eq!(result.dimensions(), (0, 7));
    assert!(result.background.is_none());
    assert_eq!(result.statistics.total_pixels, 0);
    Ok(())
}

#[test]
fn test_sample_size_larger_than_image() -> Result<()> {
    let config = RemovalConfig::builder().sample_size(500).build()?;
    let image = RgbaImage::from_pixel(3, 2, image::Rgba([12, 34, 56, 255]));

    let mut processor = BackgroundRemovalProcessor::new(config)?;
    let result = processor.process_image(&DynamicImage::ImageRgba8(image))?;
    let bg = result.background.expect("non-empty image");
    assert!((bg.b - 56.0).abs() < 1e-9);
    assert_eq!(result.statistics.transparent_pixels, 6);
    Ok(())
}

#[test]
fn test_config_validation_edge_cases() -> Result<()> {
    let config = RemovalConfig::builder()
        .jpeg_quality(0)
        .webp_quality(100)
        .threshold(0.0)
        .feather(0.0)
        .sample_size(1)
        .build()?;
    assert!(config.validate().is_ok());

    // Builder clamps quality
    let config = RemovalConfig::builder().jpeg_quality(150).build()?;
    assert_eq!(config.jpeg_quality, 100);

    let mut config = RemovalConfig::default();
    config.jpeg_quality = 101;
    let error = config.validate().unwrap_err();
    assert!(matches!(error, StoreError::InvalidConfig(_)));
    assert!(error.to_string().contains("JPEG quality"));
    assert!(error.to_string().contains("101"));

    for bad in [f64::NAN, f64::INFINITY, -0.5] {
        assert!(RemovalConfig::builder().threshold(bad).build().is_err());
        assert!(RemovalConfig::builder().feather(bad).build().is_err());
    }
    assert!(RemovalConfig::builder().sample_size(0).build().is_err());
    assert!(BackgroundRemovalProcessor::new(RemovalConfig {
        sample_size: 0,
        ..RemovalConfig::default()
    })
    .is_err());
    Ok(())
}

#[test]
fn test_config_file_errors() {
    let temp = TempDir::new().unwrap();
    let missing = RemovalConfig::from_json_file(temp.path().join("none.json")).unwrap_err();
    assert!(matches!(missing, StoreError::Io(_) | StoreError::Load(_)));

    let broken = temp.path().join("broken.json");
    std::fs::write(&broken, "{ threshold: ").unwrap();
    assert!(matches!(
        RemovalConfig::from_json_file(&broken).unwrap_err(),
        StoreError::InvalidConfig(_)
    ));

    let invalid = temp.path().join("invalid.json");
    std::fs::write(&invalid, r#"{ "feather": -1.0 }"#).unwrap();
    assert!(matches!(
        RemovalConfig::from_json_file(&invalid).unwrap_err(),
        StoreError::InvalidConfig(_)
    ));
}

#[test]
fn test_upload_config_edge_cases() {
    let zero = UploadConfig {
        max_upload_bytes: 0,
        ..UploadConfig::default()
    };
    assert!(matches!(
        prepare_for_upload(b"abc", &zero).unwrap_err(),
        StoreError::InvalidConfig(_)
    ));

    let raw = UploadConfig {
        format: OutputFormat::Rgba8,
        ..UploadConfig::default()
    };
    assert!(matches!(
        raw.validate().unwrap_err(),
        StoreError::UnsupportedFormat(_)
    ));

    // Small payloads skip resizing but must still be images.
    assert!(matches!(
        prepare_for_upload(b"abc", &UploadConfig::default()).unwrap_err(),
        StoreError::UnsupportedFormat(_)
    ));
}

#[tokio::test]
async fn test_oversized_non_image_upload_fails_to_decode() {
    let temp = TempDir::new().unwrap();
    let store = LocalObjectStore::new(temp.path(), "product-images", "http://localhost");
    let config = UploadConfig {
        max_upload_bytes: 4,
        ..UploadConfig::default()
    };

    let err = upload_image(&store, b"definitely not an image", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Load(_)), "got {err:?}");
}

#[tokio::test]
async fn test_small_non_image_upload_is_refused() {
    let temp = TempDir::new().unwrap();
    let store = LocalObjectStore::new(temp.path(), "product-images", "http://localhost");

    let err = upload_image(&store, b"hello, not an image", &UploadConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedFormat(_)), "got {err:?}");
    assert!(!temp.path().join("product-images").exists());
}

#[tokio::test]
async fn test_object_names_cannot_escape_the_bucket() {
    let temp = TempDir::new().unwrap();
    let store = LocalObjectStore::new(temp.path(), "product-images", "http://localhost");

    for name in ["", "../x.png", "a/b.png", "a\\b.png", "..", "."] {
        let err = store
            .upload(name, vec![1, 2, 3], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Upload(_)), "name {name:?}: {err:?}");
    }
}
