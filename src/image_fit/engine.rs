//! # 体积收敛引擎
//!
//! ## 设计思路
//!
//! 在尽量少的编码次数内，把图像的编码负载压到体积预算以内。
//! 策略按代价从低到高排列：
//! 1. 原始尺寸直接编码（命中即返回，常见的廉价路径）
//! 2. 无损优化编码（优先于任何几何缩放，分辨率零损失）
//! 3. 单调递减的缩放循环（0.9 → 0.8 → …，每轮相对原图计算）
//!
//! ## 实现思路
//!
//! - 10% 粗粒度步进是刻意的简单性取舍：重编码开销远大于多走一两步，
//!   接近预算的图像通常 1~2 轮即收敛，二分搜索不划算。
//! - 每轮缩放都从原图出发，避免多次重采样叠加的舍入与质量损失。
//! - 比例下探到 0（或目标尺寸取整为 0）视为收敛失败，显式报错，
//!   绝不静默返回超预算负载，也绝不无限循环。

use image::GenericImageView;

use super::encoder::{encode_image, resize_to_scale};
use super::source::{EncodedPayload, FittedImage, SourceImage};
use super::{FitConfig, FitError};

/// 将源图像收敛到体积预算之内。
///
/// 返回最终图像与其编码负载，保证 `payload.bytes.len() <= max_payload_bytes`；
/// 无法收敛时返回 [`FitError::BudgetUnreachable`]。
pub fn fit_to_budget(source: SourceImage, config: &FitConfig) -> Result<FittedImage, FitError> {
    let budget = config.max_payload_bytes;
    let format = source.encode_format();
    let (width, height) = source.image.dimensions();
    let mut attempts = 0u32;

    // ── 1. 原始尺寸、无特殊参数编码 ──
    let plain = encode_image(&source.image, format, false)?;
    attempts += 1;
    log::info!(
        "📐 初始编码 - {}x{} format={:?} size={} 字节（预算 {} 字节）",
        width,
        height,
        format,
        plain.len(),
        budget
    );

    if plain.len() as u64 <= budget {
        log::info!("✅ 图像已在预算内，无需处理");
        return Ok(FittedImage {
            image: source.image,
            payload: EncodedPayload {
                format,
                bytes: plain,
            },
            scale: 1.0,
            attempts,
        });
    }

    // ── 2. 无损优化编码，严格优先于几何缩放 ──
    let optimized = encode_image(&source.image, format, true)?;
    attempts += 1;
    log::info!("🔧 优化编码 - size={} 字节", optimized.len());

    if optimized.len() as u64 <= budget {
        log::info!("✅ 优化编码已满足预算，未触发缩放");
        return Ok(FittedImage {
            image: source.image,
            payload: EncodedPayload {
                format,
                bytes: optimized,
            },
            scale: 1.0,
            attempts,
        });
    }

    // ── 3. 单调缩放循环，比例始终相对原图 ──
    let mut scale = config.scale_start;
    let mut last_size = optimized.len() as u64;
    let mut last_scale = 1.0f64;

    while scale > 0.0 {
        let candidate = match resize_to_scale(&source.image, scale, config.resize_filter) {
            Ok(resized) => resized,
            // 目标尺寸退化为零：线性缩放已无法继续收敛
            Err(FitError::ResourceLimit(_)) => break,
            Err(other) => return Err(other),
        };

        let bytes = encode_image(&candidate, format, true)?;
        attempts += 1;
        let size = bytes.len() as u64;
        log::debug!(
            "🔄 缩放尝试 - scale={:.2} dims={}x{} size={} 字节",
            scale,
            candidate.width(),
            candidate.height(),
            size
        );

        if size <= budget {
            log::info!(
                "✅ 收敛完成 - scale={:.2} size={} 字节（共 {} 次编码）",
                scale,
                size,
                attempts
            );
            return Ok(FittedImage {
                image: candidate,
                payload: EncodedPayload { format, bytes },
                scale,
                attempts,
            });
        }

        last_size = size;
        last_scale = scale;
        scale -= config.scale_step;
    }

    log::warn!(
        "🛑 收敛失败 - 最后尝试 scale={:.2} size={} 字节",
        last_scale,
        last_size
    );
    Err(FitError::BudgetUnreachable {
        last_size,
        last_scale,
    })
}
