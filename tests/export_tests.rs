// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the photo export routes

use image::{Rgba, RgbaImage};
use selfie_cam::pipelines::photo::{
    EncodingQuality, ExportMethod, PhotoEncoder, PhotoExporter, SaveLink,
};

fn canvas() -> RgbaImage {
    RgbaImage::from_pixel(40, 30, Rgba([20, 120, 220, 255]))
}

fn exporter(root: &std::path::Path) -> PhotoExporter {
    PhotoExporter::new(
        PhotoEncoder::new(EncodingQuality::High),
        root.join("downloads"),
        root.join("staging"),
        "mySelfie.jpg",
    )
}

#[test]
fn test_blob_save_writes_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let mut link = SaveLink::default();

    let path = exporter(dir.path())
        .export(&canvas(), ExportMethod::BlobSave, &mut link)
        .unwrap();

    assert_eq!(path, dir.path().join("downloads").join("mySelfie.jpg"));
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 30));
    // Blob save never touches the link
    assert_eq!(link, SaveLink::default());
}

#[test]
fn test_anchor_download_leaves_nothing_staged() {
    let dir = tempfile::tempdir().unwrap();
    let mut link = SaveLink::default();

    let path = exporter(dir.path())
        .export(&canvas(), ExportMethod::AnchorDownload, &mut link)
        .unwrap();

    assert!(path.exists());
    assert_eq!(
        std::fs::read_dir(dir.path().join("staging")).unwrap().count(),
        0
    );
    assert!(link.href.is_none());
}

#[test]
fn test_downloads_do_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = exporter(dir.path());
    let mut link = SaveLink::default();

    let first = exporter
        .export(&canvas(), ExportMethod::BlobSave, &mut link)
        .unwrap();
    let second = exporter
        .export(&canvas(), ExportMethod::AnchorDownload, &mut link)
        .unwrap();

    assert_eq!(first.file_name().unwrap(), "mySelfie.jpg");
    assert_eq!(second.file_name().unwrap(), "mySelfie (1).jpg");
}

#[test]
fn test_link_click_uses_download_name() {
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("0f3a.jpg");
    std::fs::write(&staged, b"jpeg").unwrap();

    let mut link = SaveLink {
        href: Some(staged.clone()),
        download: Some("portrait.jpg".to_string()),
    };
    let saved = link.click(&dir.path().join("out")).unwrap();

    assert_eq!(saved, dir.path().join("out").join("portrait.jpg"));
    assert!(!staged.exists());
    assert_eq!(std::fs::read(saved).unwrap(), b"jpeg");
}
