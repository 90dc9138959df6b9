//! # 编码与缩放模块
//!
//! ## 设计思路
//!
//! 将“图像 → 容器字节”与“按比例缩放”集中管理，供收敛引擎与发布方共用。
//! 优化编码是无损的：PNG 切换到最高压缩档 + 自适应滤波，不触碰像素。
//!
//! ## 实现思路
//!
//! 1. 普通编码走 `DynamicImage::write_to`
//! 2. 优化编码仅对 PNG 生效，其余容器退化为普通编码
//! 3. 缩放目标尺寸 = `floor(原始尺寸 * scale)`，始终相对原图计算
//! 4. 缩放优先使用 `fast_image_resize`，失败时回退 `image::resize_exact`

use std::io::Cursor;

use fast_image_resize as fr;
use image::codecs::png::{CompressionType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};

use super::FitError;

/// 将图像编码为指定容器格式的完整字节。
///
/// `optimize` 开启时执行无损优化编码；对没有无损优化档位的容器等同普通编码。
pub(crate) fn encode_image(
    image: &DynamicImage,
    format: ImageFormat,
    optimize: bool,
) -> Result<Vec<u8>, FitError> {
    match format {
        ImageFormat::Png if optimize => {
            let mut buf = Vec::new();
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            image
                .write_with_encoder(encoder)
                .map_err(|e| FitError::EncodingFailed(format!("PNG 优化编码失败：{}", e)))?;
            Ok(buf)
        }
        ImageFormat::Bmp | ImageFormat::Jpeg => {
            // 这两类容器不携带透明通道，统一摊平为 RGB 再编码，
            // 避免缩放产物（RGBA）直接喂给编码器被拒。
            let flattened = DynamicImage::ImageRgb8(image.to_rgb8());
            let mut cursor = Cursor::new(Vec::new());
            flattened
                .write_to(&mut cursor, format)
                .map_err(|e| FitError::EncodingFailed(format!("{:?} 编码失败：{}", format, e)))?;
            Ok(cursor.into_inner())
        }
        other => {
            let mut cursor = Cursor::new(Vec::new());
            image
                .write_to(&mut cursor, other)
                .map_err(|e| {
                    FitError::EncodingFailed(format!("{:?} 编码失败：{}", other, e))
                })?;
            Ok(cursor.into_inner())
        }
    }
}

/// 按比例缩放图像，目标尺寸相对 `image`（原图）向下取整。
///
/// 比例导致任一边取整为 0 时返回错误，由调用方判定收敛失败。
pub(crate) fn resize_to_scale(
    image: &DynamicImage,
    scale: f64,
    filter: FilterType,
) -> Result<DynamicImage, FitError> {
    let (width, height) = image.dimensions();
    let target_width = (width as f64 * scale).floor() as u32;
    let target_height = (height as f64 * scale).floor() as u32;

    if target_width == 0 || target_height == 0 {
        return Err(FitError::ResourceLimit(format!(
            "缩放比例 {:.2} 使尺寸 {}x{} 退化为零",
            scale, width, height
        )));
    }

    match resize_with_fast_image_resize(image, target_width, target_height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}",
                err
            );
            Ok(image.resize_exact(target_width, target_height, filter))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<DynamicImage, FitError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| FitError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| FitError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        target_width,
        target_height,
        dst_image.into_vec(),
    )
    .ok_or_else(|| FitError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
