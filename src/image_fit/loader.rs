//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（剪贴板 / 本地文件）的源图像获取，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 签名校验 + 解码，容器格式作为编码提示保留。
//! - 剪贴板：`arboard` 读取 RGBA 像素；无容器来源，编码提示留空（下游回退 PNG）。
//! - 多路径/零路径的过滤不在此层处理，调用方只会传入单个路径。

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba};

use super::source::SourceImage;
use super::{FitConfig, FitError};

/// 从本地路径加载并解码源图像。
pub(crate) fn load_from_file(path: &str, config: &FitConfig) -> Result<SourceImage, FitError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path);

    let file_path = Path::new(path);
    if !file_path.exists() {
        return Err(FitError::FileSystem(format!("文件不存在：{}", path)));
    }

    let metadata = std::fs::metadata(file_path)
        .map_err(|e| FitError::FileSystem(format!("无法读取文件信息：{}", e)))?;

    if metadata.len() > config.max_file_size {
        return Err(FitError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = std::fs::read(file_path)
        .map_err(|e| FitError::FileSystem(format!("无法读取图片文件：{}", e)))?;
    validate_image_signature(&bytes)?;

    let format_hint = image::guess_format(&bytes).ok();
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| FitError::Decode(format!("图片解码失败：{}", e)))?;

    Ok(SourceImage {
        image: decoded,
        format_hint,
    })
}

/// 从系统剪贴板读取当前图像。
///
/// 剪贴板交付的是裸 RGBA 像素，没有容器格式提示。
pub(crate) fn load_from_clipboard() -> Result<SourceImage, FitError> {
    log::info!("📋 开始读取剪贴板图像");

    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| FitError::Clipboard(format!("无法访问剪贴板：{}", e)))?;

    let data = clipboard
        .get_image()
        .map_err(|e| FitError::Clipboard(format!("剪贴板上没有可用图像：{}", e)))?;

    let width = data.width as u32;
    let height = data.height as u32;
    let bytes = data.bytes.into_owned();

    let buf = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, bytes)
        .ok_or_else(|| FitError::Decode("剪贴板像素数据长度异常".to_string()))?;

    log::info!("✅ 剪贴板图像读取成功 - {}x{}", width, height);

    Ok(SourceImage {
        image: DynamicImage::ImageRgba8(buf),
        format_hint: None,
    })
}

/// 通过文件签名快速判断内容是否为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), FitError> {
    if bytes.is_empty() {
        return Err(FitError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| FitError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(FitError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buf = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        let img = DynamicImage::ImageRgba8(buf);
        let mut cursor = std::io::Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn missing_file_is_rejected() {
        let config = FitConfig::default();

        let result = load_from_file("/nonexistent/path/image.png", &config);

        assert!(matches!(result, Err(FitError::FileSystem(_))));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut config = FitConfig::default();
        config.max_file_size = 16;

        let dir = std::env::temp_dir();
        let path = dir.join("clipboard_resize_oversized_test.png");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(&png_bytes(8, 8)))
            .expect("failed to write test file");

        let result = load_from_file(path.to_str().expect("utf8 path"), &config);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(FitError::ResourceLimit(_))));
    }

    #[test]
    fn non_image_signature_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("clipboard_resize_not_an_image.png");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(b"%PDF-1.7 definitely not pixels"))
            .expect("failed to write test file");

        let result = load_from_file(path.to_str().expect("utf8 path"), &FitConfig::default());
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(FitError::InvalidFormat(_))));
    }

    #[test]
    fn png_file_keeps_its_format_hint() {
        let dir = std::env::temp_dir();
        let path = dir.join("clipboard_resize_hint_test.png");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(&png_bytes(12, 9)))
            .expect("failed to write test file");

        let source = load_from_file(path.to_str().expect("utf8 path"), &FitConfig::default())
            .expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(source.format_hint, Some(ImageFormat::Png));
        assert_eq!(source.encode_format(), ImageFormat::Png);
    }

    #[test]
    fn empty_signature_is_rejected() {
        assert!(matches!(
            validate_image_signature(&[]),
            Err(FitError::InvalidFormat(_))
        ));
    }
}
