//! End-to-end background removal workflows
//!
//! Synthetic product shots (a flat studio backdrop with a colored object)
//! are pushed through the public entry points and checked pixel by pixel.

use designs4u::{
    image_processing::{estimate_background, remove_uniform_background},
    processor::{BackgroundRemovalProcessor, ImageSource},
    remove_background_from_bytes, remove_background_from_image,
    services::{
        upload::downscaled_dimensions, prepare_for_upload, upload_removal_result, LocalObjectStore,
    },
    OutputFormat, OutputFormatHandler, RemovalConfig, RemovalParams, Result, UploadConfig,
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use tempfile::TempDir;

const BACKDROP: Rgba<u8> = Rgba([240, 240, 240, 255]);
const PRODUCT: Rgba<u8> = Rgba([150, 20, 60, 255]);

/// Backdrop with a centered rectangle covering the middle half
fn product_shot(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside_x = x >= width / 4 && x < width * 3 / 4;
        let inside_y = y >= height / 4 && y < height * 3 / 4;
        if inside_x && inside_y {
            PRODUCT
        } else {
            BACKDROP
        }
    })
}

#[test]
fn test_uniform_backdrop_is_removed_and_product_kept() -> Result<()> {
    let shot = product_shot(64, 48);
    let result = remove_background_from_image(
        &DynamicImage::ImageRgba8(shot.clone()),
        &RemovalConfig::default(),
    )?;

    assert_eq!(result.dimensions(), (64, 48));
    let background = result.background.expect("background estimated");
    assert!((background.r - 240.0).abs() < f64::EPSILON);

    let output = result.image.to_rgba8();
    assert_eq!(output.get_pixel(0, 0)[3], 0);
    assert_eq!(output.get_pixel(63, 47)[3], 0);
    assert_eq!(*output.get_pixel(32, 24), PRODUCT);

    let product_pixels = u64::from(32u32 * 24);
    assert_eq!(result.statistics.untouched_pixels, product_pixels);
    assert_eq!(
        result.statistics.transparent_pixels,
        u64::from(64u32 * 48) - product_pixels
    );
    Ok(())
}

#[test]
fn test_rgb_channels_are_never_modified() -> Result<()> {
    let mut shot = product_shot(60, 60);
    // A gradient strip between the corner patches and the product crosses
    // every classification band.
    for x in 0..40 {
        let v = 240u8.saturating_sub((x * 3) as u8);
        shot.put_pixel(x, 12, Rgba([v, v, v, 255]));
    }

    let output = remove_uniform_background(&shot, &RemovalParams::default());
    for (before, after) in shot.pixels().zip(output.image.pixels()) {
        assert_eq!(before.0[0..3], after.0[0..3]);
    }
    assert!(output.statistics.feathered_pixels > 0);
    Ok(())
}

#[test]
fn test_feather_band_is_linear() {
    let mut shot = RgbaImage::from_pixel(30, 30, Rgba([0, 0, 0, 255]));
    // Distances 60, 65, 70, 75 and 80 from a black backdrop.
    for (i, red) in [60u8, 65, 70, 75, 80].iter().enumerate() {
        shot.put_pixel(10 + i as u32, 15, Rgba([*red, 0, 0, 255]));
    }

    let output = remove_uniform_background(&shot, &RemovalParams::default());
    let alphas: Vec<u8> = (10..15).map(|x| output.image.get_pixel(x, 15)[3]).collect();
    assert_eq!(alphas, vec![0, 64, 128, 191, 255]);
}

#[test]
fn test_corner_patches_drive_the_estimate() {
    let mut shot = RgbaImage::from_pixel(50, 50, Rgba([10, 10, 10, 255]));
    // Only the top-left patch is bright; the estimate averages all four.
    for y in 0..10 {
        for x in 0..10 {
            shot.put_pixel(x, y, Rgba([210, 210, 210, 255]));
        }
    }

    let bg = estimate_background(&shot, 10).expect("non-empty image");
    assert!((bg.r - 60.0).abs() < 1e-9);
    assert!((bg.g - 60.0).abs() < 1e-9);
}

#[test]
fn test_zero_feather_is_a_hard_cut() -> Result<()> {
    let config = RemovalConfig::builder().feather(0.0).threshold(10.0).build()?;
    let mut shot = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
    shot.put_pixel(5, 5, Rgba([10, 0, 0, 255]));
    shot.put_pixel(6, 5, Rgba([11, 0, 0, 255]));

    let result = remove_background_from_image(&DynamicImage::ImageRgba8(shot), &config)?;
    let output = result.image.to_rgba8();
    assert_eq!(output.get_pixel(5, 5)[3], 0);
    assert_eq!(output.get_pixel(6, 5)[3], 255);
    assert_eq!(result.statistics.feathered_pixels, 0);
    Ok(())
}

#[test]
fn test_jpeg_upload_round_trip() -> Result<()> {
    let shot = DynamicImage::ImageRgba8(product_shot(48, 48));
    let jpeg = OutputFormatHandler::encode(&shot, OutputFormat::Jpeg, 95)?;

    let result = remove_background_from_bytes(&jpeg, &RemovalConfig::default())?;
    assert_eq!(result.metadata.input_format, "jpg");
    assert_eq!(result.image.to_rgba8().get_pixel(0, 0)[3], 0);
    assert_eq!(result.image.to_rgba8().get_pixel(24, 24)[3], 255);
    Ok(())
}

#[test]
fn test_file_workflow_saves_transparent_png() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("abaya.png");
    DynamicImage::ImageRgba8(product_shot(32, 32)).save(&input)?;

    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default())?;
    let mut result = processor.process_file(&input)?;
    let output = temp.path().join("out").join("abaya_bg_removed.png");
    result.save_timed(&output, OutputFormat::Png, 100)?;

    assert!(result.timings().image_encode_ms.is_some());
    let reloaded = image::open(&output)?;
    assert_eq!(reloaded.dimensions(), (32, 32));
    assert_eq!(reloaded.to_rgba8().get_pixel(1, 1)[3], 0);
    assert_eq!(reloaded.to_rgba8().get_pixel(16, 16)[3], 255);
    Ok(())
}

#[tokio::test]
async fn test_raw_source_and_cutout_upload() -> Result<()> {
    let shot = product_shot(16, 16);
    let source = ImageSource::Raw {
        width: 16,
        height: 16,
        pixels: shot.into_raw(),
    };

    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default())?;
    let result = processor.process_source(&source).await?;

    let temp = TempDir::new()?;
    let store = LocalObjectStore::new(temp.path(), "product-images", "https://cdn.example.com/");
    let url = upload_removal_result(&store, &result).await?;

    assert!(url.starts_with("https://cdn.example.com/product-images/"));
    assert!(url.ends_with("_bg_removed.png"));

    let name = url.rsplit('/').next().unwrap_or_default();
    let stored = std::fs::read(store.bucket_dir().join(name))?;
    let decoded = image::load_from_memory(&stored)?;
    assert_eq!(decoded.dimensions(), (16, 16));
    assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);
    Ok(())
}

#[test]
fn test_oversized_upload_is_downscaled() -> Result<()> {
    // Noise keeps PNG from compressing the payload below the limit.
    let noisy = RgbaImage::from_fn(200, 100, |x, y| {
        let v = ((x * 7919 + y * 104_729) % 251) as u8;
        Rgba([v, v.wrapping_mul(3), v.wrapping_add(91), 255])
    });
    let png = OutputFormatHandler::encode(&DynamicImage::ImageRgba8(noisy), OutputFormat::Png, 100)?;

    let config = UploadConfig {
        max_upload_bytes: (png.len() / 4) as u64,
        format: OutputFormat::Png,
        quality: 100,
    };
    let prepared = prepare_for_upload(&png, &config)?;
    let expected = downscaled_dimensions(200, 100, png.len() as u64, config.max_upload_bytes);

    assert!(prepared.resized);
    assert!(expected.0 <= 100 && expected.0 >= 99);
    assert_eq!(prepared.dimensions, Some(expected));
    assert_eq!(prepared.content_type, "image/png");
    let decoded = image::load_from_memory(&prepared.bytes)?;
    assert_eq!(decoded.dimensions(), expected);
    Ok(())
}
