//! 体积收敛公开 API 的端到端测试。
//!
//! 发布路径需要真实系统剪贴板，相关用例默认 `#[ignore]`。

use clipboard_resize::clipboard;
use clipboard_resize::image_fit::{FitConfig, FitError, SourceImage, fit_to_budget};
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};

fn solid_image(width: u32, height: u32) -> DynamicImage {
    let buf = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 60, 255]));
    DynamicImage::ImageRgba8(buf)
}

fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state = 0x0123_4567_89AB_CDEFu64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let buf = ImageBuffer::from_fn(width, height, |_, _| {
        let v = next();
        Rgba([v as u8, (v >> 8) as u8, (v >> 16) as u8, 255])
    });
    DynamicImage::ImageRgba8(buf)
}

fn png_source(image: DynamicImage) -> SourceImage {
    SourceImage {
        image,
        format_hint: Some(ImageFormat::Png),
    }
}

#[test]
fn small_image_passes_through_untouched() {
    let config = FitConfig::default();

    let fitted = fit_to_budget(png_source(solid_image(128, 128)), &config)
        .expect("fit should succeed");

    assert_eq!(fitted.scale, 1.0);
    assert_eq!(fitted.attempts, 1);
    assert_eq!(fitted.image.dimensions(), (128, 128));
    assert_eq!(fitted.payload.format, ImageFormat::Png);
}

#[test]
fn clipboard_source_without_hint_encodes_as_png() {
    let config = FitConfig::default();
    let source = SourceImage {
        image: solid_image(32, 32),
        format_hint: None,
    };

    let fitted = fit_to_budget(source, &config).expect("fit should succeed");

    assert_eq!(fitted.payload.format, ImageFormat::Png);
    // PNG 魔数开头，负载可直接落盘或写入 PNG 槽位
    assert_eq!(&fitted.payload.bytes[0..4], &[0x89, b'P', b'N', b'G']);
}

#[test]
fn oversized_noise_image_converges_by_scaling() {
    let image = noise_image(320, 240);
    let probe = fit_to_budget(png_source(image.clone()), &FitConfig::default())
        .expect("probe fit should succeed");

    // 预算压到探测产物的一半，强制进入缩放循环
    let mut config = FitConfig::default();
    config.max_payload_bytes = (probe.payload.bytes.len() as u64) / 2;

    let fitted = fit_to_budget(png_source(image), &config).expect("fit should converge");

    assert!(fitted.scale < 1.0);
    assert!(fitted.scale > 0.0);
    assert!(fitted.payload.bytes.len() as u64 <= config.max_payload_bytes);

    let expected = (
        (320.0 * fitted.scale).floor() as u32,
        (240.0 * fitted.scale).floor() as u32,
    );
    assert_eq!(fitted.image.dimensions(), expected);
}

#[test]
fn impossible_budget_reports_last_attempt() {
    let mut config = FitConfig::default();
    config.max_payload_bytes = 4;

    let result = fit_to_budget(png_source(noise_image(96, 96)), &config);

    match result {
        Err(FitError::BudgetUnreachable {
            last_size,
            last_scale,
        }) => {
            assert!(last_size > 4);
            assert!(last_scale > 0.0);
        }
        Ok(_) => panic!("4-byte budget must be unreachable"),
        Err(other) => panic!("expected BudgetUnreachable, got {other}"),
    }
}

#[test]
fn custom_scale_parameters_are_honored() {
    let image = noise_image(200, 200);
    let probe = fit_to_budget(png_source(image.clone()), &FitConfig::default())
        .expect("probe fit should succeed");

    let mut config = FitConfig::default();
    config.max_payload_bytes = (probe.payload.bytes.len() as u64) * 7 / 10;
    config.scale_start = 0.5;
    config.scale_step = 0.25;

    let fitted = fit_to_budget(png_source(image), &config).expect("fit should converge");

    // 首个候选比例就是 scale_start
    assert!(fitted.scale <= 0.5);
}

#[test]
#[ignore = "requires system clipboard access"]
fn publish_roundtrip_on_real_clipboard() {
    let config = FitConfig::default();
    let fitted = fit_to_budget(png_source(solid_image(64, 64)), &config)
        .expect("fit should succeed");

    clipboard::publish(&fitted.image, Some(&fitted.payload), &config)
        .expect("publish should succeed");

    #[cfg(target_os = "windows")]
    {
        let entries = clipboard::list_formats().expect("enumeration should succeed");
        assert!(entries.iter().any(|e| e.name == "CF_DIB"));
        assert!(entries.iter().any(|e| e.name == "PNG"));
        assert!(entries.iter().any(|e| e.name == "Preferred DropEffect"));
    }
}
